use crate::{
    database::{is_duplicate_key, MongoDB, FAVORITES, PRODUCTS},
    models::{Favorite, FavoriteResponse, Product, ProductResponse},
    services::product_service,
    utils::error::AppError,
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use std::collections::HashMap;

/// Favoritos do usuário com o produto embutido; favoritos órfãos são omitidos
pub async fn list_favorites(db: &MongoDB, user_id: &str) -> Result<Vec<FavoriteResponse>, AppError> {
    let favorites: Vec<Favorite> = db
        .collection::<Favorite>(FAVORITES)
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    let ids: Vec<ObjectId> = favorites
        .iter()
        .filter_map(|f| ObjectId::parse_str(&f.product_id).ok())
        .collect();

    let mut products: HashMap<String, Product> = db
        .collection::<Product>(PRODUCTS)
        .find(doc! { "_id": { "$in": ids } })
        .await?
        .try_collect::<Vec<Product>>()
        .await?
        .into_iter()
        .map(|p| (p.id_hex(), p))
        .collect();

    Ok(favorites
        .into_iter()
        .filter_map(|f| {
            let product = products.remove(&f.product_id)?;
            Some(FavoriteResponse::new(f, Some(ProductResponse::from(product))))
        })
        .collect())
}

/// Returns the favorite and whether it was created by this call
pub async fn add_favorite(
    db: &MongoDB,
    user_id: &str,
    product_id: &str,
) -> Result<(Favorite, bool), AppError> {
    let product = product_service::get_product(db, product_id).await?;
    let product_id = product.id_hex();
    let collection = db.collection::<Favorite>(FAVORITES);

    let filter = doc! { "user_id": user_id, "product_id": &product_id };
    if let Some(existing) = collection.find_one(filter.clone()).await? {
        return Ok((existing, false));
    }

    let mut favorite = Favorite {
        id: None,
        user_id: user_id.to_string(),
        product_id,
        created_at: chrono::Utc::now().timestamp(),
    };

    match collection.insert_one(&favorite).await {
        Ok(result) => {
            favorite.id = result.inserted_id.as_object_id();
            Ok((favorite, true))
        }
        // Requisição concorrente já criou o mesmo favorito
        Err(e) if is_duplicate_key(&e) => {
            let existing = collection
                .find_one(filter)
                .await?
                .ok_or_else(|| AppError::Internal("Favorite vanished after duplicate key".into()))?;
            Ok((existing, false))
        }
        Err(e) => Err(AppError::Database(e)),
    }
}

pub async fn remove_favorite(db: &MongoDB, user_id: &str, product_id: &str) -> Result<(), AppError> {
    let result = db
        .collection::<Favorite>(FAVORITES)
        .delete_one(doc! { "user_id": user_id, "product_id": product_id.trim() })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Favorite not found".into()));
    }
    Ok(())
}

pub async fn is_favorite(db: &MongoDB, user_id: &str, product_id: &str) -> Result<bool, AppError> {
    let count = db
        .collection::<Favorite>(FAVORITES)
        .count_documents(doc! { "user_id": user_id, "product_id": product_id.trim() })
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{connect, insert_product, unique_user};

    #[actix_rt::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_add_favorite_is_idempotent() {
        let db = connect().await;
        let user_id = unique_user();
        let shirt = insert_product(&db, "Linen Shirt", 50.0, 5).await;
        let product_id = shirt.id_hex();

        let (first, created) = add_favorite(&db, &user_id, &product_id).await.unwrap();
        assert!(created);

        let (again, created) = add_favorite(&db, &user_id, &product_id).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, again.id);

        let favorites = list_favorites(&db, &user_id).await.unwrap();
        assert_eq!(favorites.len(), 1);

        remove_favorite(&db, &user_id, &product_id).await.unwrap();
        assert!(!is_favorite(&db, &user_id, &product_id).await.unwrap());
    }
}
