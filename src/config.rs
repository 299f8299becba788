use crate::utils::error::AppError;
use std::env;

/// Credenciais da conta Cloudinary usada para hospedar imagens de produtos
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiration_hours: i64,
    pub cookie_secure: bool,
    pub frontend_url: String,
    pub cloudinary: Option<CloudinaryConfig>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub free_shipping_threshold: f64,
    pub shipping_flat_rate: f64,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, AppError> {
    optional(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let cloudinary = match (
            optional("CLOUDINARY_CLOUD_NAME"),
            optional("CLOUDINARY_API_KEY"),
            optional("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let jwt_expiration_hours = parsed("JWT_EXPIRATION_HOURS", 168i64)?;
        if jwt_expiration_hours <= 0 {
            return Err(AppError::Config("JWT_EXPIRATION_HOURS must be positive".into()));
        }

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 3002u16)?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: optional("JWT_ISSUER").unwrap_or_else(|| "storefront-service".to_string()),
            jwt_expiration_hours,
            cookie_secure: parsed("COOKIE_SECURE", false)?,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            cloudinary,
            admin_email: optional("ADMIN_EMAIL").map(|e| e.trim().to_lowercase()),
            admin_password: optional("ADMIN_PASSWORD"),
            free_shipping_threshold: parsed("FREE_SHIPPING_THRESHOLD", 100.0f64)?,
            shipping_flat_rate: parsed("SHIPPING_FLAT_RATE", 10.0f64)?,
        })
    }

    /// Configuração fixa usada pelos testes (sem variáveis de ambiente)
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3002,
            database_url: "mongodb://localhost:27017/storefront_test".into(),
            jwt_secret: "test-secret".into(),
            jwt_issuer: "storefront-service".into(),
            jwt_expiration_hours: 1,
            cookie_secure: false,
            frontend_url: "http://localhost:3000".into(),
            cloudinary: Some(CloudinaryConfig {
                cloud_name: "demo".into(),
                api_key: "1234".into(),
                api_secret: "abcd".into(),
            }),
            admin_email: None,
            admin_password: None,
            free_shipping_threshold: 100.0,
            shipping_flat_rate: 10.0,
        }
    }
}
