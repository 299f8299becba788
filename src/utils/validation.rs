use crate::utils::error::AppError;
use mongodb::bson::oid::ObjectId;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validação simples de formato: `local@dominio.tld`
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn require_non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {} ID", what)))
}

/// "Men's T-Shirts" -> "men-s-t-shirts"
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@shop.co.uk"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email("ana@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("ana@example."));
    }

    #[test]
    fn test_normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(matches!(normalize_email("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Men's T-Shirts"), "men-s-t-shirts");
        assert_eq!(slugify("  Shoes  "), "shoes");
        assert_eq!(slugify("Hats & Caps!!"), "hats-caps");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(12.345678), 12.35);
        assert_eq!(round_cents(19.999), 20.0);
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("507f1f77bcf86cd799439011", "product").is_ok());
        let err = parse_object_id("nope", "product").unwrap_err();
        assert_eq!(err.to_string(), "Invalid product ID");
    }
}
