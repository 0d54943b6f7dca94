use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use color_eyre::{eyre::WrapErr, Result};
use signbook_core::accounts::Accounts;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod handlers;
pub mod response;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn Accounts>,
}

/// Build the account router with CORS and request tracing applied.
pub fn router(accounts: Arc<dyn Accounts>, cors_origin: Option<&str>) -> Result<Router> {
    let app = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/verify-user", post(handlers::verify_user))
        .route("/reset-password", post(handlers::reset_password))
        .route("/users", get(handlers::list_users))
        .with_state(AppState { accounts })
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    let layer = match origin {
        Some(origin) => layer.allow_origin(
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("invalid CORS origin: {origin}"))?,
        ),
        None => layer.allow_origin(Any),
    };
    Ok(layer)
}
