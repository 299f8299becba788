use actix_web::{web, HttpResponse};
use crate::{
    services::upload_service::{self, ImageHost, UploadRequest, UploadedImage},
    utils::error::AppError,
};

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Upload",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Image hosted", body = UploadedImage),
        (status = 400, description = "Missing, malformed or oversized file"),
        (status = 502, description = "Image host rejected the upload")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn upload_image(
    host: web::Data<dyn ImageHost>,
    request: web::Json<UploadRequest>,
) -> Result<HttpResponse, AppError> {
    let folder = upload_service::sanitize_folder(request.folder.as_deref());
    log::info!("📤 POST /api/upload - folder: {}", folder);

    upload_service::validate_source(&request.file)?;
    let image = host.upload(request.file.trim(), &folder).await?;
    log::info!("✅ Image uploaded: {}", image.public_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "url": image.url,
        "public_id": image.public_id
    })))
}

#[utoipa::path(
    delete,
    path = "/api/upload/{public_id}",
    tag = "Upload",
    params(("public_id" = String, Path, description = "Hosted image public ID (may contain folders)")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 404, description = "Image not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_image(
    host: web::Data<dyn ImageHost>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let public_id = path.into_inner();
    log::info!("🗑️ DELETE /api/upload/{}", public_id);

    if public_id.trim().is_empty() {
        return Err(AppError::Validation("public_id is required".into()));
    }

    host.destroy(&public_id).await?;
    log::info!("✅ Image deleted: {}", public_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Image deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DisabledImageHost;
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeHost {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageHost for FakeHost {
        async fn upload(&self, _file: &str, folder: &str) -> Result<UploadedImage, AppError> {
            self.uploads.lock().unwrap().push(folder.to_string());
            Ok(UploadedImage {
                url: format!("https://res.cloudinary.com/demo/{}/abc.png", folder),
                public_id: format!("{}/abc", folder),
            })
        }

        async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
            if public_id == "products/abc" {
                Ok(())
            } else {
                Err(AppError::NotFound("Image not found".into()))
            }
        }
    }

    fn host_data(host: Arc<dyn ImageHost>) -> web::Data<dyn ImageHost> {
        web::Data::from(host)
    }

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[actix_rt::test]
    async fn test_upload_returns_url_and_public_id() {
        let fake = Arc::new(FakeHost::default());
        let app = test::init_service(
            App::new()
                .app_data(host_data(fake.clone()))
                .route("/upload", web::post().to(upload_image)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .set_json(serde_json::json!({ "file": PNG, "folder": "../banners" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["public_id"], "banners/abc");
        assert_eq!(fake.uploads.lock().unwrap().as_slice(), ["banners".to_string()]);
    }

    #[actix_rt::test]
    async fn test_upload_rejects_non_image_before_calling_host() {
        let fake = Arc::new(FakeHost::default());
        let app = test::init_service(
            App::new()
                .app_data(host_data(fake.clone()))
                .route("/upload", web::post().to(upload_image)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .set_json(serde_json::json!({ "file": "data:text/plain;base64,aGk=" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(fake.uploads.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_delete_unknown_image_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(host_data(Arc::new(FakeHost::default())))
                .route("/upload/{public_id:.*}", web::delete().to(delete_image)),
        )
        .await;

        let ok = test::TestRequest::delete().uri("/upload/products/abc").to_request();
        assert_eq!(test::call_service(&app, ok).await.status(), StatusCode::OK);

        let missing = test::TestRequest::delete().uri("/upload/products/zzz").to_request();
        assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_disabled_host_reports_configuration_error() {
        let app = test::init_service(
            App::new()
                .app_data(host_data(Arc::new(DisabledImageHost)))
                .route("/upload", web::post().to(upload_image)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .set_json(serde_json::json!({ "file": PNG }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Image uploads are not configured");
    }
}
