// ==================== SHOPPING CART ====================
// Um documento por usuário. Linhas são identificadas por
// (product_id, size, color) e a quantidade é sempre limitada ao estoque atual.

use crate::{
    database::{MongoDB, CARTS},
    models::{
        AddToCartRequest, Cart, CartItem, LineKey, RemoveCartItemRequest, StockAdjustment,
        UpdateCartItemRequest,
    },
    services::product_service,
    utils::{error::AppError, validation::parse_object_id},
};
use mongodb::bson::doc;

/// Picks the variant option for a product. Products that declare options
/// require one of them; products without options ignore the request.
pub fn resolve_variant(
    options: &[String],
    requested: Option<&str>,
    what: &str,
) -> Result<Option<String>, AppError> {
    if options.is_empty() {
        return Ok(None);
    }

    match requested {
        None => Err(AppError::Validation(format!("Please select a {}", what))),
        Some(value) => options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(value))
            .cloned()
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {}: {}", what, value))),
    }
}

pub async fn get_cart(db: &MongoDB, user_id: &str) -> Result<Cart, AppError> {
    Ok(db
        .collection::<Cart>(CARTS)
        .find_one(doc! { "user_id": user_id })
        .await?
        .unwrap_or_else(|| Cart::empty(user_id)))
}

async fn save_cart(db: &MongoDB, cart: &mut Cart) -> Result<(), AppError> {
    cart.updated_at = chrono::Utc::now().timestamp();
    db.collection::<Cart>(CARTS)
        .replace_one(doc! { "user_id": &cart.user_id }, &*cart)
        .upsert(true)
        .await?;
    Ok(())
}

pub async fn add_to_cart(
    db: &MongoDB,
    user_id: &str,
    request: &AddToCartRequest,
) -> Result<(Cart, Option<String>), AppError> {
    if request.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }

    let product = product_service::get_product(db, &request.product_id).await?;
    let key = LineKey::new(&request.product_id, request.size.as_deref(), request.color.as_deref());

    let size = resolve_variant(&product.sizes, key.size.as_deref(), "size")?;
    let color = resolve_variant(&product.colors, key.color.as_deref(), "color")?;

    if !product.in_stock() {
        return Err(AppError::Conflict(format!("{} is out of stock", product.name)));
    }

    let mut cart = get_cart(db, user_id).await?;
    let adjustment = cart.add_item(
        CartItem {
            product_id: product.id_hex(),
            name: product.name.clone(),
            price: product.price,
            image: product.main_image(),
            size,
            color,
            quantity: request.quantity,
        },
        product.stock,
    );

    save_cart(db, &mut cart).await?;

    if adjustment.clamped {
        log::warn!("⚠️ Cart quantity for {} clamped to stock ({})", product.name, product.stock);
    }

    Ok((cart, adjustment.warning()))
}

pub async fn update_item(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateCartItemRequest,
) -> Result<(Cart, Option<String>), AppError> {
    if request.quantity < 0 {
        return Err(AppError::Validation("Quantity cannot be negative".into()));
    }

    let key = LineKey::new(&request.product_id, request.size.as_deref(), request.color.as_deref());
    let mut cart = get_cart(db, user_id).await?;

    // Produto removido do catálogo conta como estoque zero
    let product_id = parse_object_id(&key.product_id, "product")?;
    let product = product_service::find_product(db, &product_id).await?;
    let stock = product.as_ref().map(|p| p.stock).unwrap_or(0);

    let adjustment: StockAdjustment = cart
        .set_quantity(&key, request.quantity, stock)
        .ok_or_else(|| AppError::NotFound("Item not found in cart".into()))?;

    if let Some(product) = &product {
        if let Some(idx) = cart.position(&key) {
            cart.items[idx].price = product.price;
        }
    }

    save_cart(db, &mut cart).await?;

    let warning = match (&product, adjustment.clamped) {
        (None, _) => Some("Product is no longer available".to_string()),
        (Some(_), true) => adjustment.warning(),
        (Some(_), false) => None,
    };

    Ok((cart, warning))
}

pub async fn remove_item(
    db: &MongoDB,
    user_id: &str,
    request: &RemoveCartItemRequest,
) -> Result<Cart, AppError> {
    let key = LineKey::new(&request.product_id, request.size.as_deref(), request.color.as_deref());
    let mut cart = get_cart(db, user_id).await?;

    if !cart.remove_item(&key) {
        return Err(AppError::NotFound("Item not found in cart".into()));
    }

    save_cart(db, &mut cart).await?;
    Ok(cart)
}

pub async fn clear_cart(db: &MongoDB, user_id: &str) -> Result<(), AppError> {
    db.collection::<Cart>(CARTS)
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": { "items": [], "updated_at": chrono::Utc::now().timestamp() } },
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> Vec<String> {
        vec!["S".into(), "M".into(), "L".into()]
    }

    #[test]
    fn test_variant_required_when_product_has_options() {
        let err = resolve_variant(&sizes(), None, "size").unwrap_err();
        assert_eq!(err.to_string(), "Please select a size");
    }

    #[test]
    fn test_variant_must_be_one_of_the_options() {
        assert_eq!(resolve_variant(&sizes(), Some("m"), "size").unwrap(), Some("M".into()));
        assert!(resolve_variant(&sizes(), Some("XL"), "size").is_err());
    }

    #[test]
    fn test_variant_ignored_when_product_has_no_options() {
        assert_eq!(resolve_variant(&[], Some("red"), "color").unwrap(), None);
        assert_eq!(resolve_variant(&[], None, "color").unwrap(), None);
    }

    #[actix_rt::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_update_item_on_deleted_product_drops_the_line() {
        use crate::database::test_support::{connect, insert_product, unique_user};
        use crate::database::PRODUCTS;
        use crate::models::Product;

        let db = connect().await;
        let user_id = unique_user();
        let shirt = insert_product(&db, "Linen Shirt", 50.0, 5).await;

        add_to_cart(
            &db,
            &user_id,
            &AddToCartRequest { product_id: shirt.id_hex(), size: None, color: None, quantity: 2 },
        )
        .await
        .unwrap();

        // Remoção direta, sem a limpeza em cascata do product_service
        db.collection::<Product>(PRODUCTS)
            .delete_one(doc! { "_id": shirt.id.unwrap() })
            .await
            .unwrap();

        let (cart, warning) = update_item(
            &db,
            &user_id,
            &UpdateCartItemRequest { product_id: shirt.id_hex(), size: None, color: None, quantity: 1 },
        )
        .await
        .unwrap();

        assert_eq!(warning.as_deref(), Some("Product is no longer available"));
        assert!(cart.items.is_empty());
        assert!(get_cart(&db, &user_id).await.unwrap().items.is_empty());
    }
}
