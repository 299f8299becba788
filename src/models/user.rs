use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Usuário armazenado na collection `users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,  // PRIMARY IDENTIFIER
    pub name: String,
    pub email: String,
    pub password: String,  // bcrypt hash
    #[serde(default)]
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Projeção pública do usuário (nunca inclui o hash da senha)
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        UserInfo {
            id: u.user_id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_user_when_missing() {
        let json = serde_json::json!({
            "user_id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "password": "$2b$12$hash",
            "created_at": 0,
            "updated_at": 0
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_user_info_hides_password() {
        let user = User {
            id: None,
            user_id: "u1".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "$2b$12$hash".into(),
            role: Role::Admin,
            created_at: 10,
            updated_at: 10,
        };
        let json = serde_json::to_value(UserInfo::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["id"], "u1");
    }
}
