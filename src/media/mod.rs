use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;

const UPLOAD_FOLDER: &str = "product-images";
const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug)]
pub enum MediaError {
    Http(reqwest::Error),
    Api { status: u16, message: String },
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Http(err) => write!(f, "media request failed: {}", err),
            MediaError::Api { status, message } => {
                write!(f, "media service returned {}: {}", status, message)
            }
        }
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Http(err)
    }
}

// 上传成功的返回：公开访问 URL 加可用于删除的引用ID
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

// 托管媒体服务适配层（Cloudinary 兼容 HTTP API）
#[derive(Clone)]
pub struct MediaStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl MediaStore {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            cloud_name: config.media_cloud_name.clone(),
            api_key: config.media_api_key.clone(),
            api_secret: config.media_api_secret.clone(),
        }
    }

    // 上传一张图片，返回公开 URL 与引用ID
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<UploadResult, MediaError> {
        let public_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_request(
            &[
                ("folder", UPLOAD_FOLDER),
                ("public_id", &public_id),
                ("timestamp", &timestamp),
            ],
            &self.api_secret,
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", UPLOAD_FOLDER)
            .text("public_id", public_id)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!("{}/{}/image/upload", API_BASE, self.cloud_name);
        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json::<UploadResult>().await?)
    }

    // 按引用ID删除媒体对象
    pub async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_request(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.api_secret,
        );
        let params = [
            ("public_id", public_id),
            ("timestamp", &timestamp),
            ("api_key", &self.api_key),
            ("signature", &signature),
            ("signature_algorithm", "sha256"),
        ];

        let url = format!("{}/{}/image/destroy", API_BASE, self.cloud_name);
        let response = self.client.post(&url).form(&params[..]).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

async fn api_error(response: reqwest::Response) -> MediaError {
    let status = response.status().as_u16();
    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => "unknown media service error".to_string(),
    };
    MediaError::Api { status, message }
}

// 服务端要求的请求签名：参数按键名排序拼成 k=v&k=v，再附加密钥做 SHA-256
fn sign_request(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|&(key, _)| key);
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
