use crate::{
    config::Config,
    database::{is_duplicate_key, MongoDB, RESET_TOKENS, USERS},
    models::{
        ChangePasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        ResetToken, Role, UpdateProfileRequest, User, UserInfo,
    },
    utils::{
        error::AppError,
        validation::{normalize_email, require_non_empty, validate_password},
    },
};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const AUTH_COOKIE: &str = "token";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub iss: String,           // issuer
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn generate_jwt(user: &User, config: &Config) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.jwt_expiration_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        iss: config.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);

    let mut issuers = HashSet::new();
    issuers.insert(config.jwt_issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// httpOnly cookie carrying the session JWT
pub fn auth_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(config.jwt_expiration_hours))
        .finish()
}

pub fn clear_auth_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}

async fn find_user_by_email(db: &MongoDB, email: &str) -> Result<Option<User>, AppError> {
    Ok(db.collection::<User>(USERS).find_one(doc! { "email": email }).await?)
}

pub async fn find_user(db: &MongoDB, user_id: &str) -> Result<User, AppError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<User, AppError> {
    let name = require_non_empty("Name", &request.name)?;
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;

    if find_user_by_email(db, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let now = Utc::now().timestamp();
    let user = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        name,
        email,
        password: hash_password(&request.password)?,
        role: Role::User,
        created_at: now,
        updated_at: now,
    };

    // O índice único cobre a corrida entre o find_one e o insert
    db.collection::<User>(USERS)
        .insert_one(&user)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("User already exists".into())
            } else {
                AppError::Database(e)
            }
        })?;

    log::info!("✅ User registered successfully: {}", user.email);
    Ok(user)
}

pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<User, AppError> {
    let email = request.email.trim().to_lowercase();

    let user = find_user_by_email(db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !verify(&request.password, &user.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    Ok(user)
}

pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, AppError> {
    Ok(UserInfo::from(find_user(db, user_id).await?))
}

pub async fn update_profile(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> Result<User, AppError> {
    let mut update = doc! { "updated_at": Utc::now().timestamp() };

    if let Some(name) = &request.name {
        update.insert("name", require_non_empty("Name", name)?);
    }

    if let Some(email) = &request.email {
        let email = normalize_email(email)?;
        if let Some(other) = find_user_by_email(db, &email).await? {
            if other.user_id != user_id {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }
        update.insert("email", email);
    }

    let result = db
        .collection::<User>(USERS)
        .update_one(doc! { "user_id": user_id }, doc! { "$set": update })
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("Email already in use".into())
            } else {
                AppError::Database(e)
            }
        })?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    find_user(db, user_id).await
}

pub async fn change_password(
    db: &MongoDB,
    user_id: &str,
    request: &ChangePasswordRequest,
) -> Result<(), AppError> {
    let user = find_user(db, user_id).await?;

    if !verify(&request.current_password, &user.password)? {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }
    validate_password(&request.new_password)?;

    db.collection::<User>(USERS)
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": {
                "password": hash_password(&request.new_password)?,
                "updated_at": Utc::now().timestamp(),
            }},
        )
        .await?;

    Ok(())
}

pub fn reset_link(config: &Config, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        config.frontend_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

/// Creates a reset token when the email belongs to a user. Returns the reset
/// link, or None for unknown emails (the caller answers the same either way).
pub async fn forgot_password(
    db: &MongoDB,
    config: &Config,
    email: &str,
) -> Result<Option<String>, AppError> {
    let email = normalize_email(email)?;

    let Some(user) = find_user_by_email(db, &email).await? else {
        return Ok(None);
    };

    let tokens = db.collection::<ResetToken>(RESET_TOKENS);

    // Apenas o token mais recente vale
    tokens
        .update_many(
            doc! { "user_id": &user.user_id, "used": false },
            doc! { "$set": { "used": true } },
        )
        .await?;

    let token = ResetToken::issue(&user.user_id, Utc::now().timestamp());
    tokens.insert_one(&token).await?;

    Ok(Some(reset_link(config, &token.token)))
}

pub async fn reset_password(db: &MongoDB, request: &ResetPasswordRequest) -> Result<(), AppError> {
    validate_password(&request.password)?;

    let tokens = db.collection::<ResetToken>(RESET_TOKENS);
    let now = Utc::now().timestamp();

    let token = tokens
        .find_one(doc! { "token": request.token.trim() })
        .await?
        .filter(|t| t.is_usable(now))
        .ok_or_else(|| AppError::Validation("Invalid or expired reset token".into()))?;

    // Marca como usado de forma condicional: dois resets simultâneos não passam
    let claimed = tokens
        .update_one(
            doc! { "token": &token.token, "used": false },
            doc! { "$set": { "used": true } },
        )
        .await?;

    if claimed.modified_count == 0 {
        return Err(AppError::Validation("Invalid or expired reset token".into()));
    }

    let result = db
        .collection::<User>(USERS)
        .update_one(
            doc! { "user_id": &token.user_id },
            doc! { "$set": {
                "password": hash_password(&request.password)?,
                "updated_at": now,
            }},
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: None,
            user_id: "64b7f0000000000000000001".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: bcrypt::hash("secret123", 4).unwrap(),
            role,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let config = Config::for_tests();
        let token = generate_jwt(&user(Role::Admin), &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, "64b7f0000000000000000001");
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let config = Config::for_tests();
        let token = generate_jwt(&user(Role::User), &config).unwrap();

        let other = Config { jwt_secret: "another-secret".into(), ..Config::for_tests() };
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_jwt_rejects_wrong_issuer() {
        let config = Config::for_tests();
        let token = generate_jwt(&user(Role::User), &config).unwrap();

        let other = Config { jwt_issuer: "someone-else".into(), ..Config::for_tests() };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_auth_cookie_is_http_only() {
        let config = Config::for_tests();
        let cookie = auth_cookie("abc".into(), &config);

        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(1)));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_auth_cookie(&Config::for_tests());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    #[test]
    fn test_reset_link_encodes_token() {
        let config = Config { frontend_url: "https://shop.example.com/".into(), ..Config::for_tests() };
        assert_eq!(
            reset_link(&config, "a b"),
            "https://shop.example.com/reset-password?token=a%20b"
        );
    }
}
