// ==================== PRODUCT CATALOG ====================
// Listagem com filtros/paginação, CRUD administrativo e limpeza de
// referências (favoritos e linhas de carrinho) ao remover um produto

use crate::{
    database::{MongoDB, CARTS, CATEGORIES, FAVORITES, PRODUCTS},
    models::{
        CreateProductRequest, Product, ProductListResponse, ProductQuery, ProductResponse,
        ProductSort, UpdateProductRequest,
    },
    utils::{
        error::AppError,
        validation::{parse_object_id, require_non_empty},
    },
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Escapa metacaracteres para usar texto do usuário dentro de `$regex`
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn build_filter(query: &ProductQuery) -> Document {
    let mut filter = Document::new();

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert("category", category.to_lowercase());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "description": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    let mut price = Document::new();
    if let Some(min) = query.min_price.filter(|p| p.is_finite()) {
        price.insert("$gte", min);
    }
    if let Some(max) = query.max_price.filter(|p| p.is_finite()) {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        filter.insert("price", price);
    }

    if let Some(featured) = query.featured {
        filter.insert("featured", featured);
    }

    filter
}

pub fn sort_document(sort: ProductSort) -> Document {
    match sort {
        ProductSort::Newest => doc! { "created_at": -1 },
        ProductSort::PriceAsc => doc! { "price": 1, "created_at": -1 },
        ProductSort::PriceDesc => doc! { "price": -1, "created_at": -1 },
        ProductSort::Name => doc! { "name": 1 },
    }
}

/// (page, limit, skip) já normalizados
pub fn pagination(query: &ProductQuery) -> (u64, i64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    // O driver rejeita skip acima de i64::MAX
    let skip = (page - 1).saturating_mul(limit as u64).min(i64::MAX as u64);
    (page, limit, skip)
}

pub async fn list_products(db: &MongoDB, query: &ProductQuery) -> Result<ProductListResponse, AppError> {
    let collection = db.collection::<Product>(PRODUCTS);
    let filter = build_filter(query);
    let (page, limit, skip) = pagination(query);

    let total = collection.count_documents(filter.clone()).await?;

    let products: Vec<Product> = collection
        .find(filter)
        .sort(sort_document(query.sort.unwrap_or_default()))
        .skip(skip)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let pages = total.div_ceil(limit as u64);

    Ok(ProductListResponse {
        success: true,
        products: products.into_iter().map(ProductResponse::from).collect(),
        total,
        page,
        pages,
    })
}

pub async fn find_product(db: &MongoDB, id: &ObjectId) -> Result<Option<Product>, AppError> {
    Ok(db.collection::<Product>(PRODUCTS).find_one(doc! { "_id": id }).await?)
}

pub async fn get_product(db: &MongoDB, product_id: &str) -> Result<Product, AppError> {
    let id = parse_object_id(product_id, "product")?;
    find_product(db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

/// Remove vazios e duplicados preservando a ordem
pub fn normalize_options(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !out.iter().any(|existing| existing == v) {
            out.push(v.to_string());
        }
    }
    out
}

pub fn validate_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Validation("Price must be greater than zero".into()));
    }
    Ok(price)
}

pub fn validate_stock(stock: i64) -> Result<i64, AppError> {
    if stock < 0 {
        return Err(AppError::Validation("Stock cannot be negative".into()));
    }
    Ok(stock)
}

async fn ensure_category_exists(db: &MongoDB, slug: &str) -> Result<String, AppError> {
    let slug = require_non_empty("Category", slug)?.to_lowercase();
    let exists = db
        .collection::<Document>(CATEGORIES)
        .count_documents(doc! { "slug": &slug })
        .await?;

    if exists == 0 {
        return Err(AppError::Validation(format!("Category '{}' does not exist", slug)));
    }
    Ok(slug)
}

pub async fn create_product(db: &MongoDB, request: &CreateProductRequest) -> Result<Product, AppError> {
    let now = chrono::Utc::now().timestamp();

    let mut product = Product {
        id: None,
        name: require_non_empty("Name", &request.name)?,
        description: request.description.trim().to_string(),
        price: validate_price(request.price)?,
        category: ensure_category_exists(db, &request.category).await?,
        images: normalize_options(&request.images),
        sizes: normalize_options(&request.sizes),
        colors: normalize_options(&request.colors),
        stock: validate_stock(request.stock)?,
        featured: request.featured,
        created_at: now,
        updated_at: now,
    };

    let result = db.collection::<Product>(PRODUCTS).insert_one(&product).await?;
    product.id = result.inserted_id.as_object_id();

    log::info!("✅ Product created: {} ({})", product.name, product.id_hex());
    Ok(product)
}

pub async fn update_product(
    db: &MongoDB,
    product_id: &str,
    request: &UpdateProductRequest,
) -> Result<Product, AppError> {
    let id = parse_object_id(product_id, "product")?;
    let mut update = doc! { "updated_at": chrono::Utc::now().timestamp() };

    if let Some(name) = &request.name {
        update.insert("name", require_non_empty("Name", name)?);
    }
    if let Some(description) = &request.description {
        update.insert("description", description.trim());
    }
    if let Some(price) = request.price {
        update.insert("price", validate_price(price)?);
    }
    if let Some(category) = &request.category {
        update.insert("category", ensure_category_exists(db, category).await?);
    }
    if let Some(images) = &request.images {
        update.insert("images", normalize_options(images));
    }
    if let Some(sizes) = &request.sizes {
        update.insert("sizes", normalize_options(sizes));
    }
    if let Some(colors) = &request.colors {
        update.insert("colors", normalize_options(colors));
    }
    if let Some(stock) = request.stock {
        update.insert("stock", validate_stock(stock)?);
    }
    if let Some(featured) = request.featured {
        update.insert("featured", featured);
    }

    let collection = db.collection::<Product>(PRODUCTS);
    let result = collection.update_one(doc! { "_id": id }, doc! { "$set": update }).await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    find_product(db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

pub async fn delete_product(db: &MongoDB, product_id: &str) -> Result<(), AppError> {
    let id = parse_object_id(product_id, "product")?;

    let result = db.collection::<Product>(PRODUCTS).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    let hex = id.to_hex();

    let favorites = db
        .collection::<Document>(FAVORITES)
        .delete_many(doc! { "product_id": &hex })
        .await?;

    let carts = db
        .collection::<Document>(CARTS)
        .update_many(
            doc! { "items.product_id": &hex },
            doc! { "$pull": { "items": { "product_id": &hex } } },
        )
        .await?;

    log::info!(
        "🗑️ Product {} deleted ({} favorites removed, {} carts updated)",
        hex,
        favorites.deleted_count,
        carts.modified_count
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_has_empty_filter() {
        assert!(build_filter(&ProductQuery::default()).is_empty());
    }

    #[test]
    fn test_filter_combines_category_price_and_featured() {
        let query = ProductQuery {
            category: Some(" Shoes ".into()),
            min_price: Some(10.0),
            max_price: Some(50.0),
            featured: Some(true),
            ..Default::default()
        };
        let filter = build_filter(&query);

        assert_eq!(filter.get_str("category").unwrap(), "shoes");
        let price = filter.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 50.0);
        assert!(filter.get_bool("featured").unwrap());
    }

    #[test]
    fn test_search_is_escaped_case_insensitive_regex() {
        let query = ProductQuery { search: Some("t-shirt (v2)".into()), ..Default::default() };
        let filter = build_filter(&query);

        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let name = clauses[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "t-shirt \\(v2\\)");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ProductQuery { search: Some("   ".into()), ..Default::default() };
        assert!(build_filter(&query).is_empty());
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(pagination(&ProductQuery::default()), (1, DEFAULT_PAGE_SIZE, 0));

        let query = ProductQuery { page: Some(3), limit: Some(500), ..Default::default() };
        assert_eq!(pagination(&query), (3, MAX_PAGE_SIZE, 200));

        let query = ProductQuery { page: Some(0), limit: Some(0), ..Default::default() };
        assert_eq!(pagination(&query), (1, 1, 0));
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let query = ProductQuery { page: Some(u64::MAX), limit: Some(100), ..Default::default() };
        let (page, limit, skip) = pagination(&query);

        assert_eq!(page, u64::MAX);
        assert_eq!(limit, 100);
        assert_eq!(skip, i64::MAX as u64);

        let query = ProductQuery { page: Some(u64::MAX / 50), limit: Some(100), ..Default::default() };
        assert!(pagination(&query).2 <= i64::MAX as u64);
    }

    #[test]
    fn test_sort_documents() {
        assert_eq!(sort_document(ProductSort::Newest), doc! { "created_at": -1 });
        assert_eq!(sort_document(ProductSort::PriceAsc).get_i32("price").unwrap(), 1);
        assert_eq!(sort_document(ProductSort::PriceDesc).get_i32("price").unwrap(), -1);
    }

    #[test]
    fn test_normalize_options() {
        let raw = vec![" M ".to_string(), "".into(), "L".into(), "M".into()];
        assert_eq!(normalize_options(&raw), vec!["M".to_string(), "L".to_string()]);
    }

    #[test]
    fn test_price_and_stock_validation() {
        assert!(validate_price(0.0).is_err());
        assert!(validate_price(-3.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert_eq!(validate_price(9.9).unwrap(), 9.9);
        assert!(validate_stock(-1).is_err());
        assert_eq!(validate_stock(0).unwrap(), 0);
    }

    #[test]
    fn test_product_sort_from_query_string() {
        let sort: ProductSort = serde_json::from_value(serde_json::json!("price_desc")).unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
    }

    #[actix_rt::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_delete_product_cascades_to_favorites_and_carts() {
        use crate::database::test_support::{connect, insert_product, unique_user};
        use crate::models::{AddToCartRequest, Cart};
        use crate::services::{cart_service, favorite_service};

        let db = connect().await;
        let user_id = unique_user();
        let shirt = insert_product(&db, "Linen Shirt", 50.0, 5).await;
        let cap = insert_product(&db, "Canvas Cap", 20.0, 5).await;
        let shirt_id = shirt.id_hex();

        favorite_service::add_favorite(&db, &user_id, &shirt_id).await.unwrap();
        for product in [&shirt, &cap] {
            cart_service::add_to_cart(
                &db,
                &user_id,
                &AddToCartRequest {
                    product_id: product.id_hex(),
                    size: None,
                    color: None,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        }

        delete_product(&db, &shirt_id).await.unwrap();

        assert!(!favorite_service::is_favorite(&db, &user_id, &shirt_id).await.unwrap());
        let cart: Cart = cart_service::get_cart(&db, &user_id).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id, cap.id_hex());

        let err = delete_product(&db, &shirt_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
