use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{CategoryResponse, CreateCategoryRequest},
    services::category_service,
    utils::error::AppError,
};

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    responses(
        (status = 200, description = "Categories with product counts", body = [CategoryResponse])
    )
)]
pub async fn list_categories(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🗂️ GET /api/categories");

    let categories = category_service::list_categories(&db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "categories": categories
    })))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 409, description = "Slug already exists")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_category(
    db: web::Data<MongoDB>,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /api/categories - name: {}", request.name);

    let category = category_service::create_category(&db, &request).await?;
    log::info!("✅ Category created: {}", category.slug);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "category": CategoryResponse::new(category, 0)
    })))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has products")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_category(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let category_id = path.into_inner();
    log::info!("🗑️ DELETE /api/categories/{}", category_id);

    category_service::delete_category(&db, &category_id).await?;
    log::info!("✅ Category deleted: {}", category_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Category deleted"
    })))
}
