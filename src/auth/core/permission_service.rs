//! Permission evaluation

use crate::auth::types::Identity;

/// Decides (resource, action) access from the identity's role grants.
///
/// No wildcards or hierarchy: each pair must be granted explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionService;

impl PermissionService {
    pub fn new() -> Self {
        Self
    }

    /// True iff the identity's role grants exactly `(resource, action)`
    pub fn has_permission(&self, identity: Option<&Identity>, resource: &str, action: &str) -> bool {
        identity
            .and_then(|identity| identity.role.as_ref())
            .map(|role| role.permissions.iter().any(|p| p.matches(resource, action)))
            .unwrap_or(false)
    }
}
