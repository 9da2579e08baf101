use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Form, Router,
    extract::{Request, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde::Deserialize;
use tokio::net;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{AppError, FILMS_SECTION, Film, FilmSections};
use crate::render::{FILM_FRAGMENT, FragmentRenderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub port: u16,
    pub request_timeout: Duration,
}

impl From<&Config> for HttpServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            port: config.port,
            request_timeout: config.request_timeout,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<FragmentRenderer>,
    /// Read-only list shown on the index page.
    pub films: Arc<Vec<Film>>,
}

impl AppState {
    pub fn new(renderer: FragmentRenderer, films: Vec<Film>) -> Self {
        Self {
            renderer: Arc::new(renderer),
            films: Arc::new(films),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddFilmForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub director: String,
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let sections = FilmSections::from([(FILMS_SECTION.to_string(), state.films.to_vec())]);
    Ok(Html(state.renderer.render_full(&sections).await?))
}

/// Answers the HTMX form post with the new list item only.
pub async fn add_film(
    State(state): State<AppState>,
    Form(form): Form<AddFilmForm>,
) -> Result<Html<String>, AppError> {
    let film = Film::new(form.title, form.director);
    debug!(title = %film.title, director = %film.director, "rendering added film");
    Ok(Html(
        state.renderer.render_fragment(FILM_FRAGMENT, &film).await?,
    ))
}

async fn health_route() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    with_middleware(routes(), request_timeout).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/add-film/", post(add_film))
        .route("/health", get(health_route))
}

/// Request tracing plus a per-request deadline; a request that misses it gets
/// `408 Request Timeout`.
pub(crate) fn with_middleware(
    routes: Router<AppState>,
    request_timeout: Duration,
) -> Router<AppState> {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let uri = request.uri().to_string();
        tracing::info_span!("http_request", method = ?request.method(), uri)
    });

    routes
        .layer(TimeoutLayer::new(request_timeout))
        .layer(trace_layer)
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: HttpServerConfig) -> anyhow::Result<Self> {
        let router = router(state, config.request_timeout);
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to listen on port {}", config.port))?;
        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("listener has no local address")
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
