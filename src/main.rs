mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service as _, guard, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::AuthMiddleware;
use crate::services::{CloudinaryClient, DisabledImageHost, ImageHost};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("❌ {}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    log::info!("🚀 Starting Storefront Service...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to MongoDB", e))?;
    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seeds
    seeds::catalog_seed::seed_default_categories(&db).await;
    seeds::catalog_seed::ensure_admin_user(&db, &config).await;

    // 🧹 Background jobs
    log::info!("📅 Starting background jobs...");
    jobs::reset_token_cleanup::start_reset_token_cleanup(db.clone()).await;
    log::info!("✅ Background jobs started");

    let image_host: Arc<dyn ImageHost> = match config.cloudinary.clone() {
        Some(cloudinary) => {
            log::info!("🖼️ Cloudinary uploads enabled (cloud: {})", cloudinary.cloud_name);
            Arc::new(CloudinaryClient::new(cloudinary))
        }
        None => {
            log::warn!("⚠️ CLOUDINARY_* not set, image uploads disabled");
            Arc::new(DisabledImageHost)
        }
    };

    let host = config.host.clone();
    let port = config.port;
    let frontend_url = config.frontend_url.clone();

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);
    let image_host_data: web::Data<dyn ImageHost> = web::Data::from(image_host);

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        // Cookie de sessão exige origem explícita + credentials
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
                actix_web::http::header::PRAGMA,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(image_host_data.clone())
            .app_data(web::JsonConfig::default().limit(15 * 1024 * 1024))
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                srv.call(req)
            })
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))

            // ==================== AUTH ====================
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/logout", web::post().to(api::auth::logout))
                    .route("/forgot-password", web::post().to(api::auth::forgot_password))
                    .route("/reset-password", web::post().to(api::auth::reset_password))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware::user())
                            .route("/me", web::get().to(api::auth::get_me))
                            .route("/profile", web::put().to(api::auth::update_profile))
                            .route("/password", web::put().to(api::auth::change_password))
                    )
            )

            // ==================== CATALOG ====================
            .service(
                web::scope("/api/products")
                    // Guards por método: leitura pública, escrita só admin
                    .service(
                        web::resource("")
                            .guard(guard::Get())
                            .route(web::get().to(api::products::list_products))
                    )
                    .service(
                        web::resource("")
                            .wrap(AuthMiddleware::admin())
                            .route(web::post().to(api::products::create_product))
                    )
                    .service(
                        web::resource("/{id}")
                            .guard(guard::Get())
                            .route(web::get().to(api::products::get_product))
                    )
                    .service(
                        web::resource("/{id}")
                            .wrap(AuthMiddleware::admin())
                            .route(web::put().to(api::products::update_product))
                            .route(web::delete().to(api::products::delete_product))
                    )
            )
            .service(
                web::scope("/api/categories")
                    .service(
                        web::resource("")
                            .guard(guard::Get())
                            .route(web::get().to(api::categories::list_categories))
                    )
                    .service(
                        web::resource("")
                            .wrap(AuthMiddleware::admin())
                            .route(web::post().to(api::categories::create_category))
                    )
                    .service(
                        web::resource("/{id}")
                            .wrap(AuthMiddleware::admin())
                            .route(web::delete().to(api::categories::delete_category))
                    )
            )

            // ==================== SHOPPING (JWT) ====================
            .service(
                web::scope("/api/cart")
                    .wrap(AuthMiddleware::user())
                    .route("", web::get().to(api::cart::get_cart))
                    .route("", web::post().to(api::cart::add_to_cart))
                    .route("", web::put().to(api::cart::update_cart_item))
                    .route("", web::delete().to(api::cart::clear_cart))
                    .route("/item", web::delete().to(api::cart::remove_cart_item))
            )
            .service(
                web::scope("/api/favorites")
                    .wrap(AuthMiddleware::user())
                    .route("", web::get().to(api::favorites::list_favorites))
                    .route("", web::post().to(api::favorites::add_favorite))
                    .route("/{product_id}", web::get().to(api::favorites::check_favorite))
                    .route("/{product_id}", web::delete().to(api::favorites::remove_favorite))
            )
            .service(
                web::scope("/api/orders")
                    .wrap(AuthMiddleware::user())
                    .route("", web::post().to(api::orders::create_order))
                    .route("", web::get().to(api::orders::list_orders))
                    .route("/{id}", web::get().to(api::orders::get_order))
                    .route("/{id}/cancel", web::put().to(api::orders::cancel_order))
            )

            // ==================== ADMIN (JWT + role) ====================
            .service(
                web::scope("/api/upload")
                    .wrap(AuthMiddleware::admin())
                    .route("", web::post().to(api::upload::upload_image))
                    .route("/{public_id:.*}", web::delete().to(api::upload::delete_image))
            )
            .service(
                web::scope("/api/admin")
                    .wrap(AuthMiddleware::admin())
                    .route("/orders", web::get().to(api::admin::list_orders))
                    .route("/orders/{id}/status", web::put().to(api::admin::update_order_status))
                    .route("/users", web::get().to(api::admin::list_users))
                    .route("/stats", web::get().to(api::admin::get_stats))
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
