use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> HttpResponse {
    let db_ok = db.ping().await;

    let body = HealthResponse {
        status: if db_ok { "healthy" } else { "degraded" }.to_string(),
        service: "storefront-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if db_ok { "connected" } else { "unreachable" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if db_ok {
        HttpResponse::Ok().json(body)
    } else {
        log::warn!("⚠️ Health check: MongoDB ping failed");
        HttpResponse::ServiceUnavailable().json(body)
    }
}
