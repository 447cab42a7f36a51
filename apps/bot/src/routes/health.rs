//! `/health` probes for the callback server

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Liveness {
    status: &'static str,
    version: &'static str,
}

/// `GET /` plain "OK", `GET /live` JSON with the build version
///
/// Neither probe touches Spotify or Ollama.
pub fn health_router() -> Router {
    Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/live", get(live))
}

async fn live() -> Json<Liveness> {
    Json(Liveness {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = health_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_plain_probe() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_live_reports_version() {
        let (status, body) = get_body("/live").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "alive");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
