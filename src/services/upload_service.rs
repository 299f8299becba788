// ==================== IMAGE UPLOADS (Cloudinary) ====================
// Upload assinado via API REST do Cloudinary. O arquivo chega como data URI
// (base64) ou URL remota e é repassado sem passar por disco.

use crate::{config::CloudinaryConfig, utils::error::AppError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "products";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UploadRequest {
    /// `data:image/...;base64,...` ou URL http(s)
    pub file: String,
    pub folder: Option<String>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file: &str, folder: &str) -> Result<UploadedImage, AppError>;
    async fn destroy(&self, public_id: &str) -> Result<(), AppError>;
}

/// Checks an upload source: an image data URI within the size limit, or a
/// remote http(s) URL for Cloudinary to fetch.
pub fn validate_source(file: &str) -> Result<(), AppError> {
    let file = file.trim();
    if file.is_empty() {
        return Err(AppError::Validation("No file provided".into()));
    }

    if file.starts_with("https://") || file.starts_with("http://") {
        return Ok(());
    }

    let rest = file
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Validation("File must be a data URI or an http(s) URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Validation("Malformed data URI".into()))?;

    let mime = meta.split(';').next().unwrap_or("");
    if !mime.starts_with("image/") {
        return Err(AppError::Validation(format!("Unsupported file type: {}", mime)));
    }
    if !meta.ends_with(";base64") {
        return Err(AppError::Validation("Data URI must be base64 encoded".into()));
    }

    // Tamanho decodificado ~ 3/4 do base64; evita decodificar arquivos enormes
    if payload.len() / 4 * 3 > MAX_UPLOAD_BYTES + 3 {
        return Err(AppError::Validation("File exceeds the 10 MB limit".into()));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| AppError::Validation("Invalid base64 payload".into()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("File is empty".into()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation("File exceeds the 10 MB limit".into()));
    }

    Ok(())
}

/// Mantém só `[A-Za-z0-9_-/]` sem segmentos vazios; vazio cai no folder padrão
pub fn sanitize_folder(folder: Option<&str>) -> String {
    let filtered: String = folder
        .unwrap_or(DEFAULT_FOLDER)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
        .collect();

    let cleaned = filtered
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if cleaned.is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        cleaned
    }
}

/// Cloudinary request signature: params sorted by key, joined as
/// `k=v&k=v`, secret appended, SHA-256 hex digest.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        CloudinaryClient {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }

    async fn post(&self, action: &str, params: Vec<(&str, &str)>) -> Result<serde_json::Value, AppError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| *k != "file")
            .copied()
            .collect();
        signed.push(("timestamp", timestamp.as_str()));
        let signature = sign_params(&signed, &self.config.api_secret);

        let mut form: Vec<(&str, &str)> = params;
        form.push(("timestamp", timestamp.as_str()));
        form.push(("api_key", self.config.api_key.as_str()));
        form.push(("signature", signature.as_str()));
        form.push(("signature_algorithm", "sha256"));

        let response = self
            .http
            .post(self.endpoint(action))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid Cloudinary response: {}", e)))?;

        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::Upload(format!("Cloudinary {} failed: {}", action, message)));
        }

        Ok(body)
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, file: &str, folder: &str) -> Result<UploadedImage, AppError> {
        let body = self.post("upload", vec![("file", file), ("folder", folder)]).await?;

        let url = body["secure_url"]
            .as_str()
            .ok_or_else(|| AppError::Upload("Cloudinary response without secure_url".into()))?;
        let public_id = body["public_id"]
            .as_str()
            .ok_or_else(|| AppError::Upload("Cloudinary response without public_id".into()))?;

        Ok(UploadedImage {
            url: url.to_string(),
            public_id: public_id.to_string(),
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        let body = self.post("destroy", vec![("public_id", public_id)]).await?;

        match body["result"].as_str() {
            Some("ok") => Ok(()),
            Some("not found") => Err(AppError::NotFound("Image not found".into())),
            other => Err(AppError::Upload(format!(
                "Unexpected destroy result: {}",
                other.unwrap_or("none")
            ))),
        }
    }
}

/// Usado quando as credenciais do Cloudinary não estão configuradas
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _file: &str, _folder: &str) -> Result<UploadedImage, AppError> {
        Err(AppError::Config("Image uploads are not configured".into()))
    }

    async fn destroy(&self, _public_id: &str) -> Result<(), AppError> {
        Err(AppError::Config("Image uploads are not configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let signature = sign_params(&[("timestamp", "1315060510"), ("folder", "products")], "secret");

        let mut hasher = Sha256::new();
        hasher.update(b"folder=products&timestamp=1315060510secret");
        assert_eq!(signature, format!("{:x}", hasher.finalize()));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signature_skips_empty_params() {
        assert_eq!(
            sign_params(&[("folder", ""), ("timestamp", "1")], "s"),
            sign_params(&[("timestamp", "1")], "s")
        );
    }

    #[test]
    fn test_validate_source_accepts_image_data_uri_and_urls() {
        let png = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode([0x89, b'P', b'N', b'G'])
        );
        assert!(validate_source(&png).is_ok());
        assert!(validate_source("https://example.com/cat.jpg").is_ok());
    }

    #[test]
    fn test_validate_source_rejects_bad_input() {
        assert!(validate_source("").is_err());
        assert!(validate_source("/etc/passwd").is_err());
        assert!(validate_source("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_source("data:image/png;base64,@@@").is_err());
        assert!(validate_source("data:image/png,rawbytes").is_err());
    }

    #[test]
    fn test_validate_source_enforces_size_limit() {
        let big = base64::engine::general_purpose::STANDARD.encode(vec![0u8; MAX_UPLOAD_BYTES + 1]);
        let err = validate_source(&format!("data:image/jpeg;base64,{}", big)).unwrap_err();
        assert_eq!(err.to_string(), "File exceeds the 10 MB limit");
    }

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder(None), "products");
        assert_eq!(sanitize_folder(Some("/banners/home/")), "banners/home");
        assert_eq!(sanitize_folder(Some("../../x y")), "xy");
        assert_eq!(sanitize_folder(Some("***")), "products");
    }
}
