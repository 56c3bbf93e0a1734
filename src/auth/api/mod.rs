//! HTTP interface layer

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::{recovery_layer, require_auth, require_permission, PanicHandler, PermissionGuard};
pub use routes::create_auth_routes;
