use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Validade do token de reset de senha (1 hora)
pub const RESET_TOKEN_TTL_SECS: i64 = 3600;

/// Token de uso único para redefinição de senha
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub used: bool,
    pub created_at: i64,
}

impl ResetToken {
    pub fn issue(user_id: &str, now: i64) -> Self {
        ResetToken {
            id: None,
            user_id: user_id.to_string(),
            token: uuid::Uuid::new_v4().to_string(),
            expires_at: now + RESET_TOKEN_TTL_SECS,
            used: false,
            created_at: now,
        }
    }

    pub fn is_usable(&self, now: i64) -> bool {
        !self.used && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expires_after_one_hour() {
        let token = ResetToken::issue("u1", 1_000);
        assert!(token.is_usable(1_000));
        assert!(token.is_usable(1_000 + RESET_TOKEN_TTL_SECS - 1));
        assert!(!token.is_usable(1_000 + RESET_TOKEN_TTL_SECS));
    }

    #[test]
    fn test_used_token_is_rejected() {
        let mut token = ResetToken::issue("u1", 1_000);
        token.used = true;
        assert!(!token.is_usable(1_001));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(ResetToken::issue("u1", 0).token, ResetToken::issue("u1", 0).token);
    }
}
