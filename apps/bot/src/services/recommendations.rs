//! Recommendation hydration pipeline
//!
//! The model suggests tracks as JSON; nothing it says is trusted. Each
//! suggestion is looked up in the live catalog and only verified matches
//! survive, carrying catalog names and links instead of model text.

use std::future::Future;

use futures_util::{stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use tunelink_spotify_client::Track;

use crate::error::{BotError, BotResult};

/// Upper bound on candidates taken from one model response
pub const MAX_CANDIDATES: usize = 10;

/// Catalog searches in flight at once
const SEARCH_CONCURRENCY: usize = 4;

/// Unverified suggestion from the model
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub reason: String,
}

/// Suggestion confirmed against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydratedRecommendation {
    /// Title as the catalog spells it
    pub title: String,
    /// Artists as the catalog lists them
    pub artist: String,
    /// Canonical track link
    pub url: Option<String>,
    /// Largest album cover
    pub cover_url: Option<String>,
    /// The model's explanation, kept verbatim
    pub reason: String,
}

impl HydratedRecommendation {
    fn from_match(candidate: Candidate, track: &Track) -> Self {
        Self {
            title: track.name.clone(),
            artist: track.artist_names(),
            url: track.url().map(str::to_string),
            cover_url: track.cover_url().map(str::to_string),
            reason: candidate.reason,
        }
    }
}

/// Accepted shapes: a bare array, or an object wrapping one
#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateList {
    Bare(Vec<Candidate>),
    Wrapped { recommendations: Vec<Candidate> },
}

/// Slice out the outermost JSON array or object (models like to add prose)
fn extract_json(text: &str) -> &str {
    let Some(start) = text.find(|c: char| c == '[' || c == '{') else {
        return text;
    };
    let close = if text[start..].starts_with('[') { ']' } else { '}' };

    match text.rfind(close) {
        Some(end) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse model output into candidates
///
/// Every entry needs a non-blank title and artist or the whole response is
/// rejected. At most [`MAX_CANDIDATES`] are kept.
pub fn parse_candidates(raw: &str) -> BotResult<Vec<Candidate>> {
    let json = extract_json(raw);

    let list: CandidateList = serde_json::from_str(json)
        .map_err(|e| BotError::MalformedModelOutput(format!("not a candidate list: {}", e)))?;

    let mut candidates = match list {
        CandidateList::Bare(items) | CandidateList::Wrapped { recommendations: items } => items,
    };

    for candidate in &mut candidates {
        candidate.title = candidate.title.trim().to_string();
        candidate.artist = candidate.artist.trim().to_string();
        candidate.reason = candidate.reason.trim().to_string();

        if candidate.title.is_empty() || candidate.artist.is_empty() {
            return Err(BotError::MalformedModelOutput(
                "candidate with blank title or artist".to_string(),
            ));
        }
    }

    candidates.truncate(MAX_CANDIDATES);
    Ok(candidates)
}

/// Parse `raw` and keep only the candidates `search` can find
///
/// Malformed output yields an empty list. Output order follows the model's
/// order; unmatched candidates are dropped.
pub async fn hydrate<F, Fut>(raw: &str, search: F) -> Vec<HydratedRecommendation>
where
    F: Fn(Candidate) -> Fut,
    Fut: Future<Output = Option<Track>>,
{
    match parse_candidates(raw) {
        Ok(candidates) => hydrate_candidates(candidates, search).await,
        Err(e) => {
            warn!(error = %e, response_len = raw.len(), "Discarding model output");
            Vec::new()
        }
    }
}

/// Search the catalog for each candidate, preserving input order
pub async fn hydrate_candidates<F, Fut>(
    candidates: Vec<Candidate>,
    search: F,
) -> Vec<HydratedRecommendation>
where
    F: Fn(Candidate) -> Fut,
    Fut: Future<Output = Option<Track>>,
{
    let total = candidates.len();
    let search = &search;

    let hydrated: Vec<HydratedRecommendation> = stream::iter(candidates)
        .map(|candidate| async move {
            match search(candidate.clone()).await {
                Some(track) => Some(HydratedRecommendation::from_match(candidate, &track)),
                None => {
                    debug!(title = %candidate.title, artist = %candidate.artist, "No catalog match");
                    None
                }
            }
        })
        .buffered(SEARCH_CONCURRENCY)
        .filter_map(|item| async move { item })
        .collect()
        .await;

    debug!(total, verified = hydrated.len(), "Recommendations hydrated");
    hydrated
}

/// Prompt asking for `count` suggestions seeded by the user's top tracks
pub fn build_prompt(seeds: &[Track], count: usize) -> String {
    let mut prompt = format!(
        "Recommend {} songs the listener does not already know. \
         Respond with JSON only, in the form \
         {{\"recommendations\": [{{\"title\": \"...\", \"artist\": \"...\", \"reason\": \"...\"}}]}}. \
         Keep each reason to one sentence.\n",
        count
    );

    if seeds.is_empty() {
        prompt.push_str("The listener has no history yet; suggest widely loved songs.\n");
    } else {
        prompt.push_str("Their current favourites:\n");
        for track in seeds {
            prompt.push_str(&format!("- {} by {}\n", track.name, track.artist_names()));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn track(title: &str, artist: &str) -> Track {
        serde_json::from_value(json!({
            "id": title.to_lowercase(),
            "name": title,
            "artists": [{"name": artist}],
            "album": {"name": "Album", "images": [
                {"url": "https://img/small", "width": 64, "height": 64},
                {"url": "https://img/large", "width": 640, "height": 640}
            ]},
            "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", title.to_lowercase())}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_bare_array() {
        let raw = r#"[{"title":"Teardrop","artist":"Massive Attack","reason":"moody"}]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].artist, "Massive Attack");
    }

    #[test]
    fn test_parse_wrapped_object_with_prose() {
        let raw = "Sure! Here you go:\n{\"recommendations\": [{\"title\": \" Roads \", \"artist\": \"Portishead\"}]}\nEnjoy!";
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates[0].title, "Roads");
        assert_eq!(candidates[0].reason, "");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert_matches!(
            parse_candidates(r#"[{"title":"Roads"}]"#),
            Err(BotError::MalformedModelOutput(_))
        );
    }

    #[test]
    fn test_parse_rejects_blank_artist() {
        assert_matches!(
            parse_candidates(r#"[{"title":"Roads","artist":"  "}]"#),
            Err(BotError::MalformedModelOutput(_))
        );
    }

    #[test]
    fn test_parse_caps_candidates() {
        let items: Vec<_> = (0..15)
            .map(|i| json!({"title": format!("Song {}", i), "artist": "Band"}))
            .collect();
        let candidates = parse_candidates(&json!(items).to_string()).unwrap();
        assert_eq!(candidates.len(), MAX_CANDIDATES);
    }

    #[tokio::test]
    async fn test_hydrate_malformed_returns_empty() {
        let searches = AtomicUsize::new(0);
        let result = hydrate("I'm sorry, I can't help with that.", |_| {
            searches.fetch_add(1, Ordering::SeqCst);
            async { None::<Track> }
        })
        .await;

        assert!(result.is_empty());
        assert_eq!(searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hydrate_drops_misses_and_keeps_order() {
        let raw = json!([
            {"title": "Teardrop", "artist": "Massive Attack", "reason": "first"},
            {"title": "Made Up Song", "artist": "Nobody", "reason": "second"},
            {"title": "Roads", "artist": "Portishead", "reason": "third"}
        ])
        .to_string();

        let result = hydrate(&raw, |candidate| async move {
            (candidate.artist != "Nobody").then(|| track(&candidate.title, &candidate.artist))
        })
        .await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].title, "Teardrop");
        assert_eq!(result[0].reason, "first");
        assert_eq!(result[1].title, "Roads");
        assert_eq!(result[1].cover_url.as_deref(), Some("https://img/large"));
        assert_eq!(
            result[1].url.as_deref(),
            Some("https://open.spotify.com/track/roads")
        );
    }

    #[tokio::test]
    async fn test_hydrate_uses_catalog_spelling() {
        let raw = r#"[{"title":"teardrop","artist":"massive attack","reason":"r"}]"#;
        let result = hydrate(raw, |_| async { Some(track("Teardrop", "Massive Attack")) }).await;
        assert_eq!(result[0].title, "Teardrop");
        assert_eq!(result[0].artist, "Massive Attack");
    }

    #[test]
    fn test_build_prompt_lists_seeds() {
        let prompt = build_prompt(&[track("Roads", "Portishead")], 5);
        assert!(prompt.contains("Recommend 5 songs"));
        assert!(prompt.contains("- Roads by Portishead"));
        assert!(prompt.contains("\"recommendations\""));
    }

    #[test]
    fn test_extract_json_prefers_first_opener() {
        assert_eq!(extract_json("x [1, {\"a\":2}] y"), "[1, {\"a\":2}]");
        assert_eq!(extract_json("no json here"), "no json here");
    }
}
