//! API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{
    handlers,
    middleware::{recovery_layer, require_auth},
};
use crate::auth::AuthService;

/// Build the `/api/auth` router
pub fn create_auth_routes(service: Arc<AuthService>) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route(
            "/api/auth/permissions/:resource/:action",
            get(handlers::check_permission),
        )
        .route_layer(middleware::from_fn_with_state(service.clone(), require_auth));

    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .merge(protected)
        .layer(recovery_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
