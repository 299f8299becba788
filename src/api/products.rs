use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{
        CreateProductRequest, ProductListResponse, ProductQuery, ProductResponse,
        UpdateProductRequest,
    },
    services::product_service,
    utils::error::AppError,
};

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(
        ("category" = Option<String>, Query, description = "Category slug"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on name or description"),
        ("min_price" = Option<f64>, Query, description = "Minimum price"),
        ("max_price" = Option<f64>, Query, description = "Maximum price"),
        ("featured" = Option<bool>, Query, description = "Only featured products"),
        ("sort" = Option<String>, Query, description = "newest | price_asc | price_desc | name"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 12, max 100)")
    ),
    responses(
        (status = 200, description = "Paginated product list", body = ProductListResponse)
    )
)]
pub async fn list_products(
    db: web::Data<MongoDB>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🛍️ GET /api/products - {:?}", query);

    let response = product_service::list_products(&db, &query).await?;
    log::info!("✅ {} of {} products returned", response.products.len(), response.total);

    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 400, description = "Invalid product ID"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("🔍 GET /api/products/{}", product_id);

    let product = product_service::get_product(&db, &product_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "product": ProductResponse::from(product)
    })))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_product(
    db: web::Data<MongoDB>,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /api/products - name: {}", request.name);

    let product = product_service::create_product(&db, &request).await?;
    log::info!("✅ Product created: {}", product.id_hex());

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "product": ProductResponse::from(product)
    })))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_product(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("✏️ PUT /api/products/{}", product_id);

    let product = product_service::update_product(&db, &product_id, &request).await?;
    log::info!("✅ Product updated: {}", product_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "product": ProductResponse::from(product)
    })))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_product(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("🗑️ DELETE /api/products/{}", product_id);

    product_service::delete_product(&db, &product_id).await?;
    log::info!("✅ Product deleted: {}", product_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Product deleted"
    })))
}
