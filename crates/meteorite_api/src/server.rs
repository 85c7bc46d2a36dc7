//! HTTP server assembly.

use crate::routes::{health_routes, meteorite_routes, METEORITES_BASE_PATH};
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::Router;
use log::{info, warn};
use meteorite_core::config::ServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Builds the full router: health check at the root, queries under
/// [`METEORITES_BASE_PATH`], CORS applied to everything.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(health_routes())
        .nest(METEORITES_BASE_PATH, meteorite_routes(state))
        .layer(cors_layer(&config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_origin_ignored module=api origin={origin}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        let router = build_router(state, &config);
        Self { config, router }
    }

    /// Serves until ctrl-c.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr.as_str()).await?;
        info!("event=http_listen module=api status=ok addr={addr} base_path={METEORITES_BASE_PATH}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("event=http_shutdown module=api status=ok");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=http_shutdown module=api status=error error={err}");
        std::future::pending::<()>().await;
    }
}
