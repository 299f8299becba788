use actix_web::{web, HttpResponse};
use serde::Serialize;
use crate::{
    database::MongoDB,
    models::{AddToCartRequest, Cart, CartResponse, RemoveCartItemRequest, UpdateCartItemRequest},
    services::{auth_service::Claims, cart_service},
    utils::error::AppError,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartEnvelope {
    pub success: bool,
    pub cart: CartResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CartEnvelope {
    fn new(cart: Cart, warning: Option<String>) -> Self {
        CartEnvelope {
            success: true,
            cart: CartResponse::from(cart),
            warning,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Current cart (empty when none exists)", body = CartEnvelope)
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_cart(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("🛒 GET /api/cart - user: {}", user.sub);

    let cart = cart_service::get_cart(&db, &user.sub).await?;
    Ok(HttpResponse::Ok().json(CartEnvelope::new(cart, None)))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    tag = "Cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added; `warning` set when clamped to stock", body = CartEnvelope),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product out of stock")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn add_to_cart(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🛒 POST /api/cart - user: {}, product: {}, qty: {}",
        user.sub, request.product_id, request.quantity
    );

    let (cart, warning) = cart_service::add_to_cart(&db, &user.sub, &request).await?;
    if let Some(w) = &warning {
        log::warn!("⚠️ Cart quantity clamped for {}: {}", user.sub, w);
    }

    Ok(HttpResponse::Ok().json(CartEnvelope::new(cart, warning)))
}

#[utoipa::path(
    put,
    path = "/api/cart",
    tag = "Cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated (0 removes the line)", body = CartEnvelope),
        (status = 404, description = "Item not found in cart")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_cart_item(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🛒 PUT /api/cart - user: {}, product: {}, qty: {}",
        user.sub, request.product_id, request.quantity
    );

    let (cart, warning) = cart_service::update_item(&db, &user.sub, &request).await?;
    if let Some(w) = &warning {
        log::warn!("⚠️ Cart line adjusted for {}: {}", user.sub, w);
    }

    Ok(HttpResponse::Ok().json(CartEnvelope::new(cart, warning)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/item",
    tag = "Cart",
    request_body = RemoveCartItemRequest,
    responses(
        (status = 200, description = "Line removed", body = CartEnvelope),
        (status = 404, description = "Item not found in cart")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn remove_cart_item(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<RemoveCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🛒 DELETE /api/cart/item - user: {}, product: {}", user.sub, request.product_id);

    let cart = cart_service::remove_item(&db, &user.sub, &request).await?;
    Ok(HttpResponse::Ok().json(CartEnvelope::new(cart, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart cleared")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn clear_cart(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("🧹 DELETE /api/cart - user: {}", user.sub);

    cart_service::clear_cart(&db, &user.sub).await?;
    Ok(HttpResponse::Ok().json(CartEnvelope::new(Cart::empty(&user.sub), None)))
}
