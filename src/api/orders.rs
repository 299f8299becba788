use actix_web::{web, HttpResponse};
use crate::{
    config::Config,
    database::MongoDB,
    models::{CreateOrderRequest, OrderResponse},
    services::{auth_service::Claims, order_service},
    utils::error::AppError,
};

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed from the cart", body = OrderResponse),
        (status = 400, description = "Empty cart or incomplete shipping address"),
        (status = 409, description = "Not enough stock")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_order(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💳 POST /api/orders - user: {}", user.sub);

    let order = order_service::create_order(&db, &config, &user.sub, &request).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "order": OrderResponse::from(order)
    })))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = [OrderResponse])
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_orders(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("📦 GET /api/orders - user: {}", user.sub);

    let orders = order_service::list_user_orders(&db, &user.sub).await?;
    let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": orders.len(),
        "orders": orders
    })))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_order(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    log::info!("📦 GET /api/orders/{} - user: {}", order_id, user.sub);

    let order = order_service::get_order(&db, &user, &order_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "order": OrderResponse::from(order)
    })))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled and stock restored", body = OrderResponse),
        (status = 400, description = "Order is no longer pending"),
        (status = 404, description = "Order not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn cancel_order(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    log::info!("❌ PUT /api/orders/{}/cancel - user: {}", order_id, user.sub);

    let order = order_service::cancel_order(&db, &user.sub, &order_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "order": OrderResponse::from(order)
    })))
}
