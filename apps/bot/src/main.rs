use std::future::IntoFuture;

use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunelink_bot::commands::{run_console, Dispatcher};
use tunelink_bot::config::Config;
use tunelink_bot::App;
use tunelink_ollama_client::OllamaClient;

/// Pending commands buffered before adapters see backpressure
const DISPATCH_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunelink_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!(
        environment = %config.environment(),
        "Starting tunelink bot on port {}",
        config.port
    );

    match config.ollama() {
        Some(ollama) => check_ollama(OllamaClient::new(ollama)?).await,
        None => tracing::warn!("OLLAMA_URL not set, /recommend and /summary are disabled"),
    }

    let app = App::new(&config)?;

    // Command dispatcher, fed by the console adapter
    let (sender, dispatcher) = Dispatcher::channel(app.commands.clone(), DISPATCH_BUFFER);
    let dispatcher_task = tokio::spawn(dispatcher.run());
    let console_task = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = run_console(stdin, tokio::io::stdout(), sender).await {
            tracing::warn!(error = %e, "Console adapter stopped");
        }
    });

    // Callback server
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {} (OAuth redirect: {})", addr, config.spotify().redirect_uri);

    tokio::select! {
        result = axum::serve(listener, app.router()).into_future() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
    }

    console_task.abort();
    dispatcher_task.abort();
    tracing::info!("tunelink bot stopped");

    Ok(())
}

/// Warn early when the generative service is unreachable or missing the model
async fn check_ollama(client: OllamaClient) {
    match client.health_check().await {
        Ok(true) => match client.has_model().await {
            Ok(true) => tracing::info!(model = %client.config().model, "Ollama ready"),
            Ok(false) => tracing::warn!(
                model = %client.config().model,
                "Ollama model not pulled; AI commands will fail until it is"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not list Ollama models"),
        },
        Ok(false) => tracing::warn!("Ollama health check returned an error status"),
        Err(e) => tracing::warn!(error = %e, "Ollama unreachable; AI commands will fail until it is up"),
    }
}
