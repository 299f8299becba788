use crate::config::Config;
use crate::database::{MongoDB, CATEGORIES, USERS};
use crate::models::{Category, CreateCategoryRequest, RegisterRequest, Role, User};
use crate::services::{auth_service, category_service};
use mongodb::bson::doc;

const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("T-Shirts", "Everyday tees and basics"),
    ("Shirts", "Button-downs and casual shirts"),
    ("Pants", "Jeans, chinos and trousers"),
    ("Dresses", "Dresses for every occasion"),
    ("Accessories", "Bags, belts, caps and more"),
];

/// Seed das categorias padrão. Só insere se a collection estiver vazia.
pub async fn seed_default_categories(db: &MongoDB) {
    let collection = db.collection::<Category>(CATEGORIES);

    let count = collection.count_documents(doc! {}).await.unwrap_or(0);
    if count > 0 {
        log::info!("🗂️ Categories: {} already in DB, skipping seed", count);
        return;
    }

    log::info!("🗂️ Categories: seeding {} defaults into MongoDB...", DEFAULT_CATEGORIES.len());

    let categories = match build_default_categories(chrono::Utc::now().timestamp()) {
        Ok(categories) => categories,
        Err(e) => {
            log::error!("   ❌ Failed to build default categories: {}", e);
            return;
        }
    };

    match collection.insert_many(&categories).await {
        Ok(result) => {
            log::info!("   ✅ Inserted {} default categories", result.inserted_ids.len());
        }
        Err(e) => {
            log::error!("   ❌ Failed to seed default categories: {}", e);
        }
    }
}

fn build_default_categories(now: i64) -> Result<Vec<Category>, crate::utils::error::AppError> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, description)| {
            category_service::new_category(
                &CreateCategoryRequest {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    image: None,
                },
                now,
            )
        })
        .collect()
}

/// Garante o admin inicial definido por ADMIN_EMAIL / ADMIN_PASSWORD
pub async fn ensure_admin_user(db: &MongoDB, config: &Config) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        log::info!("👑 ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap");
        return;
    };

    let users = db.collection::<User>(USERS);

    match users.find_one(doc! { "email": email }).await {
        Ok(Some(user)) if user.role == Role::Admin => {
            log::info!("👑 Admin {} already exists", email);
            return;
        }
        Ok(Some(_)) => {
            log::info!("👑 Promoting existing user {} to admin", email);
        }
        Ok(None) => {
            let request = RegisterRequest {
                name: "Admin".to_string(),
                email: email.clone(),
                password: password.clone(),
            };
            if let Err(e) = auth_service::register(db, &request).await {
                log::error!("   ❌ Failed to create admin {}: {}", email, e);
                return;
            }
            log::info!("👑 Admin account created: {}", email);
        }
        Err(e) => {
            log::error!("   ❌ Admin lookup failed: {}", e);
            return;
        }
    }

    if let Err(e) = users
        .update_one(
            doc! { "email": email },
            doc! { "$set": { "role": Role::Admin.as_str(), "updated_at": chrono::Utc::now().timestamp() } },
        )
        .await
    {
        log::error!("   ❌ Failed to grant admin role to {}: {}", email, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_categories_have_unique_slugs() {
        let categories = build_default_categories(0).unwrap();
        let slugs: HashSet<_> = categories.iter().map(|c| c.slug.as_str()).collect();

        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(slugs.len(), categories.len());
        assert!(slugs.contains("t-shirts"));
    }
}
