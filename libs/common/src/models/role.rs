//! Role and permission entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization grouping of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Built-in roles that cannot be removed
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fine-grained capability descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntity {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The resource the permission applies to (e.g. `users`)
    pub resource: String,
    /// The action it grants on the resource (e.g. `read`)
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_without_description() {
        let role: Role = serde_json::from_value(json!({
            "id": "r-1",
            "name": "admin",
            "displayName": "Administrator",
            "isSystem": true,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert!(role.is_system);
        assert_eq!(role.description, None);

        let value = serde_json::to_value(&role).unwrap();
        assert!(value.get("description").is_none());
        assert_eq!(value["displayName"], "Administrator");
    }

    #[test]
    fn test_permission_null_description() {
        let permission: PermissionEntity = serde_json::from_value(json!({
            "id": "p-1",
            "name": "users:read",
            "displayName": "Read users",
            "description": null,
            "resource": "users",
            "action": "read"
        }))
        .unwrap();

        assert_eq!(permission.description, None);
        assert_eq!(permission.resource, "users");
        assert_eq!(permission.action, "read");
    }
}
