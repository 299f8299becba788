use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::config::Config;
use crate::services::auth_service::{self, AUTH_COOKIE};
use crate::utils::error::AppError;

pub use crate::services::auth_service::Claims;

/// Verifies the session JWT (httpOnly cookie, or `Authorization: Bearer`
/// for non-browser clients) and exposes its [`Claims`] to handlers through
/// `web::ReqData<Claims>`.
pub struct AuthMiddleware {
    admin_only: bool,
}

impl AuthMiddleware {
    pub fn user() -> Self {
        AuthMiddleware { admin_only: false }
    }

    pub fn admin() -> Self {
        AuthMiddleware { admin_only: true }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            admin_only: self.admin_only,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    admin_only: bool,
}

/// Candidate tokens in priority order: cookie first, then the Authorization header
pub fn extract_tokens(req: &ServiceRequest) -> Vec<String> {
    let cookie = req
        .cookie(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    cookie.into_iter().chain(bearer).collect()
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match authorize(&req, self.admin_only) {
            Ok(claims) => claims,
            Err(e) => {
                log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                return Box::pin(async move { Err(e.into()) });
            }
        };

        req.extensions_mut().insert(claims);

        let service = Rc::clone(&self.service);
        Box::pin(async move { service.call(req).await })
    }
}

fn authorize(req: &ServiceRequest, admin_only: bool) -> Result<Claims, AppError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::Config("Config not registered in app data".into()))?;

    // Cookie vencido não bloqueia um Bearer válido; sem nenhum válido, vale o erro do primeiro
    let mut first_error = None;
    let mut verified = None;
    for token in extract_tokens(req) {
        match auth_service::verify_token(&token, config) {
            Ok(claims) => {
                verified = Some(claims);
                break;
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    let claims = match (verified, first_error) {
        (Some(claims), _) => claims,
        (None, Some(e)) => return Err(e),
        (None, None) => return Err(AppError::Unauthorized("Missing authorization token".into())),
    };

    if admin_only && !claims.is_admin() {
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    Ok(claims)
}
