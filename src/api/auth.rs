use actix_web::{web, HttpResponse};
use crate::{
    config::Config,
    database::MongoDB,
    models::{
        AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
        RegisterRequest, ResetPasswordRequest, UpdateProfileRequest, UserInfo,
    },
    services::auth_service::{self, Claims},
    utils::error::AppError,
};

/// Resposta padrão de login/registro: cookie httpOnly + token no corpo
fn session_response(
    mut builder: actix_web::HttpResponseBuilder,
    user: crate::models::User,
    config: &Config,
) -> Result<HttpResponse, AppError> {
    let token = auth_service::generate_jwt(&user, config)?;
    Ok(builder
        .cookie(auth_service::auth_cookie(token.clone(), config))
        .json(AuthResponse {
            success: true,
            token,
            user: UserInfo::from(user),
        }))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /api/auth/register - email: {}", request.email);

    let user = auth_service::register(&db, &request).await?;
    log::info!("✅ Registration successful: {}", user.email);

    session_response(HttpResponse::Created(), user, &config)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /api/auth/login - email: {}", request.email);

    let user = match auth_service::login(&db, &request).await {
        Ok(user) => user,
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            return Err(e);
        }
    };
    log::info!("✅ Login successful: {}", user.email);

    session_response(HttpResponse::Ok(), user, &config)
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session cookie cleared")
    )
)]
pub async fn logout(config: web::Data<Config>) -> HttpResponse {
    log::info!("👋 POST /api/auth/logout");

    HttpResponse::Ok()
        .cookie(auth_service::clear_auth_cookie(&config))
        .json(serde_json::json!({
            "success": true,
            "message": "Logged out"
        }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Unauthorized")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_me(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /api/auth/me - user: {}", user.sub);

    let info = auth_service::get_current_user(&db, &user.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": info
    })))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AuthResponse),
        (status = 409, description = "Email already in use")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️ PUT /api/auth/profile - user: {}", user.sub);

    let updated = auth_service::update_profile(&db, &user.sub, &request).await?;
    log::info!("✅ Profile updated: {}", user.sub);

    // Reemite o cookie para que nome/email das claims acompanhem o perfil
    session_response(HttpResponse::Ok(), updated, &config)
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password incorrect or new password too short")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn change_password(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔑 PUT /api/auth/password - user: {}", user.sub);

    auth_service::change_password(&db, &user.sub, &request).await?;
    log::info!("✅ Password changed: {}", user.sub);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password updated"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset instructions sent if the account exists")
    )
)]
pub async fn forgot_password(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📧 POST /api/auth/forgot-password - email: {}", request.email);

    match auth_service::forgot_password(&db, &config, &request.email).await {
        Ok(Some(link)) => log::info!("🔗 Password reset link for {}: {}", request.email, link),
        Ok(None) => log::info!("ℹ️ Password reset requested for unknown email {}", request.email),
        // Email malformado recebe a mesma resposta genérica
        Err(AppError::Validation(msg)) => log::warn!("⚠️ Password reset rejected: {}", msg),
        Err(e) => return Err(e),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "If that email is registered, a reset link has been sent"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn reset_password(
    db: web::Data<MongoDB>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔄 POST /api/auth/reset-password");

    auth_service::reset_password(&db, &request).await?;
    log::info!("✅ Password reset completed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password has been reset"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_rt::test]
    async fn test_logout_expires_cookie() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/logout", web::post().to(logout)),
        )
        .await;

        let req = test::TestRequest::post().uri("/logout").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == auth_service::AUTH_COOKIE)
            .expect("logout should set the auth cookie");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
