use anyhow::Context;
use film_todo::adapters::{AppState, HttpServer, HttpServerConfig};
use film_todo::config::Config;
use film_todo::core::Film;
use film_todo::render::FragmentRenderer;
use film_todo::seed;
use film_todo::storage::SqliteTodoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let store = SqliteTodoStore::connect(&config)
        .await
        .context("could not connect to database")?;
    seed::run_demo(&store)
        .await
        .context("startup todo sequence failed")?;

    let renderer = FragmentRenderer::new(&config.template_dir, config.template_reload)
        .with_context(|| format!("could not load templates from {}", config.template_dir.display()))?;
    let state = AppState::new(renderer, Film::catalog());

    let http_server = HttpServer::new(state, HttpServerConfig::from(&config)).await?;
    http_server.run().await
}
