use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{AddFavoriteRequest, FavoriteResponse},
    services::{auth_service::Claims, favorite_service},
    utils::error::AppError,
};

#[utoipa::path(
    get,
    path = "/api/favorites",
    tag = "Favorites",
    responses(
        (status = 200, description = "Favorites joined with their products", body = [FavoriteResponse])
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_favorites(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("❤️ GET /api/favorites - user: {}", user.sub);

    let favorites = favorite_service::list_favorites(&db, &user.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "favorites": favorites
    })))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    tag = "Favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite created", body = FavoriteResponse),
        (status = 200, description = "Already a favorite", body = FavoriteResponse),
        (status = 404, description = "Product not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn add_favorite(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<AddFavoriteRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("❤️ POST /api/favorites - user: {}, product: {}", user.sub, request.product_id);

    let (favorite, created) = favorite_service::add_favorite(&db, &user.sub, &request.product_id).await?;
    let body = serde_json::json!({
        "success": true,
        "favorite": FavoriteResponse::new(favorite, None)
    });

    if created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{product_id}",
    tag = "Favorites",
    params(("product_id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Favorite removed"),
        (status = 404, description = "Favorite not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn remove_favorite(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("💔 DELETE /api/favorites/{} - user: {}", product_id, user.sub);

    favorite_service::remove_favorite(&db, &user.sub, &product_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Removed from favorites"
    })))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{product_id}",
    tag = "Favorites",
    params(("product_id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Whether the product is a favorite")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn check_favorite(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("❤️ GET /api/favorites/{} - user: {}", product_id, user.sub);

    let is_favorite = favorite_service::is_favorite(&db, &user.sub, &product_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "is_favorite": is_favorite
    })))
}
