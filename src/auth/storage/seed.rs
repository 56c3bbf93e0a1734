//! Default roles and permissions

use crate::auth::types::{Permission, Role};

pub const ADMIN_ROLE_ID: u64 = 1;
pub const USER_ROLE_ID: u64 = 2;

const RESOURCES: [&str; 2] = ["blog", "user"];
const ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

/// Every blog/user CRUD permission
pub fn default_permissions() -> Vec<Permission> {
    let mut permissions = Vec::with_capacity(RESOURCES.len() * ACTIONS.len());
    let mut id = 0;
    for resource in RESOURCES {
        for action in ACTIONS {
            id += 1;
            permissions.push(Permission {
                id,
                name: format!("{}_{}", action, resource),
                resource: resource.to_string(),
                action: action.to_string(),
                description: describe(resource, action),
            });
        }
    }
    permissions
}

fn describe(resource: &str, action: &str) -> String {
    match resource {
        "blog" => format!("Can {} blog posts", action),
        _ if action == "read" => "Can read user information".to_string(),
        _ if action == "update" => "Can update user information".to_string(),
        _ => format!("Can {} users", action),
    }
}

/// `admin` holds everything, `user` holds the read permissions only
pub fn default_roles() -> Vec<Role> {
    let permissions = default_permissions();

    vec![
        Role {
            id: ADMIN_ROLE_ID,
            name: "admin".to_string(),
            description: "Administrator with all permissions".to_string(),
            permissions: permissions.clone(),
        },
        Role {
            id: USER_ROLE_ID,
            name: "user".to_string(),
            description: "Regular user with limited permissions".to_string(),
            permissions: permissions.into_iter().filter(|p| p.action == "read").collect(),
        },
    ]
}
