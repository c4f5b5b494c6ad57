//! HTTP surface of the portal.
//!
//! - `pages` - quiz and study-selection pages
//! - `auth` - login entry point and the provider handshake
//! - `health` - liveness probe (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod auth;
pub mod health;
pub mod openapi;
pub mod pages;

use crate::AppState;
use crate::oidc::IdentityProvider;
use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Assemble every route, static assets and the API docs.
pub fn build_router<P: IdentityProvider>(state: AppState<P>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .merge(pages::router::<P>())
        .merge(auth::router::<P>())
        .routes(routes!(health::health))
        .with_state(state)
        .split_for_parts();

    router
        .merge(Redoc::with_url("/api-docs", api))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

/// Starts the web server on the configured address.
#[tracing::instrument(skip(state))]
pub async fn start_webserver<P: IdentityProvider>(state: AppState<P>) -> color_eyre::Result<()> {
    let addr = state.config.listen_addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
