use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{OrderResponse, OrderStatus, OrderStatusQuery, UpdateOrderStatusRequest, UserInfo},
    services::{admin_service::{self, StoreStats}, auth_service::Claims, order_service},
    utils::error::AppError,
};

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin",
    params(("status" = Option<String>, Query, description = "Filter by order status")),
    responses(
        (status = 200, description = "All orders, newest first", body = [OrderResponse]),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Admin only")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_orders(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<OrderStatusQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🧾 GET /api/admin/orders - admin: {}, status: {:?}", admin.sub, query.status);

    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<OrderStatus>()?),
        None => None,
    };

    let orders = order_service::list_all_orders(&db, status).await?;
    let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": orders.len(),
        "orders": orders
    })))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    tag = "Admin",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order changed concurrently")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_order_status(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    log::info!(
        "🚚 PUT /api/admin/orders/{}/status -> {} (admin: {})",
        order_id, request.status, admin.sub
    );

    let order = order_service::update_status(&db, &order_id, request.status).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "order": OrderResponse::from(order)
    })))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users (without password hashes)", body = [UserInfo])
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_users(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("👥 GET /api/admin/users - admin: {}", admin.sub);

    let users = admin_service::list_users(&db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": users.len(),
        "users": users
    })))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Store dashboard figures", body = StoreStats)
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_stats(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("📊 GET /api/admin/stats - admin: {}", admin.sub);

    let stats = admin_service::store_stats(&db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "stats": stats
    })))
}
