use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Service API",
        version = "1.0.0",
        description = "REST API for the storefront and its admin panel.\n\n**Authentication:** the session JWT travels in the httpOnly `token` cookie set by login/register. Non-browser clients may send it as a Bearer token instead.\n\n**Features:**\n- Account registration, login and password reset\n- Product catalog with filters and pagination\n- Categories\n- Cart and favorites\n- Checkout and order tracking\n- Image uploads (Cloudinary)\n- Admin dashboard",
        contact(
            name = "Storefront Team",
            email = "support@storefront.local"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::get_me,
        crate::api::auth::update_profile,
        crate::api::auth::change_password,
        crate::api::auth::forgot_password,
        crate::api::auth::reset_password,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Catalog
        crate::api::products::list_products,
        crate::api::products::get_product,
        crate::api::products::create_product,
        crate::api::products::update_product,
        crate::api::products::delete_product,
        crate::api::categories::list_categories,
        crate::api::categories::create_category,
        crate::api::categories::delete_category,

        // Shopping
        crate::api::cart::get_cart,
        crate::api::cart::add_to_cart,
        crate::api::cart::update_cart_item,
        crate::api::cart::remove_cart_item,
        crate::api::cart::clear_cart,
        crate::api::favorites::list_favorites,
        crate::api::favorites::add_favorite,
        crate::api::favorites::remove_favorite,
        crate::api::favorites::check_favorite,
        crate::api::orders::create_order,
        crate::api::orders::list_orders,
        crate::api::orders::get_order,
        crate::api::orders::cancel_order,

        // Uploads
        crate::api::upload::upload_image,
        crate::api::upload::delete_image,

        // Admin
        crate::api::admin::list_orders,
        crate::api::admin::update_order_status,
        crate::api::admin::list_users,
        crate::api::admin::get_stats,
    ),
    components(
        schemas(
            // Auth
            crate::models::Role,
            crate::models::UserInfo,
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::UpdateProfileRequest,
            crate::models::ChangePasswordRequest,
            crate::models::ForgotPasswordRequest,
            crate::models::ResetPasswordRequest,
            crate::models::AuthResponse,

            // Health & Metrics
            crate::api::health::HealthResponse,

            // Catalog
            crate::models::ProductResponse,
            crate::models::ProductListResponse,
            crate::models::CreateProductRequest,
            crate::models::UpdateProductRequest,
            crate::models::CategoryResponse,
            crate::models::CreateCategoryRequest,

            // Shopping
            crate::models::CartItem,
            crate::models::CartResponse,
            crate::models::AddToCartRequest,
            crate::models::UpdateCartItemRequest,
            crate::models::RemoveCartItemRequest,
            crate::api::cart::CartEnvelope,
            crate::models::FavoriteResponse,
            crate::models::AddFavoriteRequest,
            crate::models::OrderStatus,
            crate::models::OrderItem,
            crate::models::ShippingAddress,
            crate::models::OrderResponse,
            crate::models::CreateOrderRequest,
            crate::models::UpdateOrderStatusRequest,

            // Uploads
            crate::services::upload_service::UploadRequest,
            crate::services::upload_service::UploadedImage,

            // Admin
            crate::services::admin_service::StoreStats,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login/logout via httpOnly cookie, profile and password reset."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
        (name = "Products", description = "Product catalog. Reads are public; writes require an admin."),
        (name = "Categories", description = "Product categories. Reads are public; writes require an admin."),
        (name = "Cart", description = "The signed-in user's shopping cart."),
        (name = "Favorites", description = "The signed-in user's favorite products."),
        (name = "Orders", description = "Checkout and order history for the signed-in user."),
        (name = "Upload", description = "Image hosting for product pictures (admin)."),
        (name = "Admin", description = "Order management, user list and dashboard figures (admin)."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    crate::services::auth_service::AUTH_COOKIE,
                    "Session JWT set by /api/auth/login",
                ))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Same JWT, for non-browser clients"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_storefront_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/cart"));
        assert!(paths.contains_key("/api/orders/{id}/cancel"));
        assert!(paths.contains_key("/api/admin/stats"));

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("cookie_auth"));
        assert!(schemes.contains_key("bearer_auth"));
    }
}
