//! Bearer authentication and permission guards

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::auth::{errors::AuthError, types::AuthenticatedUser, AuthService};

/// Resolve the `Authorization` header to an identity and attach it to the request
pub async fn require_auth(
    State(service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?
            .to_string(),
        None => String::new(),
    };

    let identity = service.authenticate_header(&header).await?;
    tracing::debug!(user_id = identity.id, "request authenticated");

    req.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(req).await)
}

/// Panic-to-response converter used by [`recovery_layer`]
pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Layer that answers a panicking handler with a 500 instead of dropping the connection
pub fn recovery_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AuthError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// State for [`require_permission`]: the pair a route demands
#[derive(Clone)]
pub struct PermissionGuard {
    service: Arc<AuthService>,
    resource: &'static str,
    action: &'static str,
}

impl PermissionGuard {
    pub fn new(service: Arc<AuthService>, resource: &'static str, action: &'static str) -> Self {
        Self { service, resource, action }
    }
}

/// Reject with 403 unless the authenticated user holds the guard's permission.
///
/// Must run after [`require_auth`].
///
/// ```ignore
/// Router::new()
///     .route("/api/blogs", post(create_blog))
///     .route_layer(from_fn_with_state(PermissionGuard::new(svc.clone(), "blog", "create"), require_permission))
///     .route_layer(from_fn_with_state(svc, require_auth))
/// ```
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::MissingHeader)?;

    if !guard
        .service
        .check_permission(Some(&user.0), guard.resource, guard.action)
    {
        tracing::warn!(
            user_id = user.0.id,
            resource = guard.resource,
            action = guard.action,
            "permission denied"
        );
        return Err(AuthError::PermissionDenied {
            resource: guard.resource.to_string(),
            action: guard.action.to_string(),
        });
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingHeader)
    }
}
