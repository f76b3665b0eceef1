use events_relay::{AppState, Config, handlers::routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");
    let port = config.port;
    let state = AppState::new(config)?;

    tracing::info!("events relay listening on 0.0.0.0:{}", port);
    warp::serve(routes(state)).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
