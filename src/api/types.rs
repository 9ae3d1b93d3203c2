use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Group {
    pub fn permission_ids(&self) -> Vec<i64> {
        self.permissions.iter().map(|p| p.id).collect()
    }
}

/// A group as attached to a user by `GET /user/{id}/permissions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermission {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_name: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expiration: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiration_refresh_token: Option<String>,
    pub user_info: UserInfo,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .field("user_info", &self.user_info)
            .finish()
    }
}

/// Fields of the create/update user form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub user_name: String,
    pub full_name: String,
    pub password: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl Default for UserInput {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            full_name: String::new(),
            password: String::new(),
            is_active: true,
            is_superuser: false,
        }
    }
}

impl UserInput {
    /// Query parameters, in the order the backend documents them
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user_name", self.user_name.clone()),
            ("full_name", self.full_name.clone()),
            ("is_active", self.is_active.to_string()),
            ("is_superuser", self.is_superuser.to_string()),
            ("password", self.password.clone()),
        ]
    }
}

/// Body of the create/update group requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupInput {
    pub name: String,
    pub description: String,
    pub permission_ids: Vec<i64>,
}

/// Fields of the create permission form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionInput {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: String,
    pub endpoint: String,
    pub method: String,
}

impl PermissionInput {
    /// Query parameters; empty optional fields are left out
    pub fn params(&self) -> Vec<(&'static str, String)> {
        [
            ("name", &self.name),
            ("resource", &self.resource),
            ("action", &self.action),
            ("description", &self.description),
            ("endpoint", &self.endpoint),
            ("method", &self.method),
        ]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k, v.trim().to_string()))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_deserializes_with_missing_fields() {
        let group: Group = serde_json::from_str(r#"{"id":3,"name":"ops"}"#).unwrap();
        assert!(!group.is_active);
        assert!(group.permissions.is_empty());
    }

    #[test]
    fn test_login_response_debug_hides_token() {
        let body = r#"{"access_token":"tok-123","expiration":"2030-01-01T00:00:00","user_info":{"user_name":"admin","is_superuser":true}}"#;
        let response: LoginResponse = serde_json::from_str(body).unwrap();
        assert!(response.user_info.is_superuser);
        assert!(!format!("{response:?}").contains("tok-123"));
    }

    #[test]
    fn test_permission_params_skip_empty_fields() {
        let input = PermissionInput {
            name: "read users".into(),
            resource: "user".into(),
            action: "read".into(),
            method: "  ".into(),
            ..Default::default()
        };
        let keys: Vec<_> = input.params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "resource", "action"]);
    }
}
