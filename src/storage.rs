use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::{AppConfig, CloudinaryConfig},
    error::{AppError, AppResult},
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const LOCAL_URL_PREFIX: &str = "/uploads/";
const CLOUD_URL_PREFIX: &str = "https://res.cloudinary.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageLocation {
    Cloud,
    Local,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredImage {
    pub url: String,
    pub location: ImageLocation,
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
}

/// Writes uploaded images to the cloud store, falling back to the local
/// upload directory when the provider is not configured or fails.
pub struct ImageStorage {
    client: reqwest::Client,
    cloudinary: Option<CloudinaryConfig>,
    upload_dir: PathBuf,
}

impl ImageStorage {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloudinary: config.cloudinary.clone(),
            upload_dir: PathBuf::from(&config.upload_dir),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn store(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> AppResult<StoredImage> {
        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::BadRequest("Only jpeg, png, webp or gif images are allowed".into())
        })?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest("Image must be at most 5 MB".into()));
        }

        if let Some(cloud) = &self.cloudinary {
            match self
                .upload_to_cloud(cloud, bytes.clone(), file_name, content_type)
                .await
            {
                Ok(url) => {
                    return Ok(StoredImage {
                        url,
                        location: ImageLocation::Cloud,
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "cloud upload failed, storing image locally");
                }
            }
        }

        let url = self.store_local(&bytes, ext).await?;
        Ok(StoredImage {
            url,
            location: ImageLocation::Local,
        })
    }

    async fn upload_to_cloud(
        &self,
        cloud: &CloudinaryConfig,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            cloud.cloud_name
        );
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .text("upload_preset", cloud.upload_preset.clone())
            .text("folder", cloud.folder.clone())
            .part("file", part);

        let uploaded: CloudinaryUpload = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(uploaded.secure_url)
    }

    async fn store_local(&self, bytes: &[u8], ext: &str) -> AppResult<String> {
        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let name = format!("{}.{ext}", Uuid::new_v4());
        fs::write(self.upload_dir.join(&name), bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(format!("{LOCAL_URL_PREFIX}{name}"))
    }
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub fn classify_url(url: &str) -> Option<ImageLocation> {
    if url.starts_with(CLOUD_URL_PREFIX) && url.len() > CLOUD_URL_PREFIX.len() {
        Some(ImageLocation::Cloud)
    } else if url.starts_with(LOCAL_URL_PREFIX)
        && url.len() > LOCAL_URL_PREFIX.len()
        && !url.contains("..")
    {
        Some(ImageLocation::Local)
    } else {
        None
    }
}

/// Returns the trimmed url when it points at the cloud store or `/uploads/`.
pub fn normalize_image_url(url: &str) -> AppResult<String> {
    let url = url.trim();
    match classify_url(url) {
        Some(_) => Ok(url.to_string()),
        None => Err(AppError::BadRequest(format!(
            "Unsupported image url: {url}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_and_local_urls_are_recognised() {
        assert_eq!(
            classify_url("https://res.cloudinary.com/toko/image/upload/v1/bakpia.jpg"),
            Some(ImageLocation::Cloud)
        );
        assert_eq!(classify_url("/uploads/abc.png"), Some(ImageLocation::Local));
    }

    #[test]
    fn foreign_and_traversal_urls_are_rejected() {
        assert_eq!(classify_url("https://example.com/a.png"), None);
        assert_eq!(classify_url("/uploads/../etc/passwd"), None);
        assert_eq!(classify_url("/uploads/"), None);
        assert!(normalize_image_url("ftp://x").is_err());
    }

    #[test]
    fn accepted_urls_come_back_trimmed() {
        assert_eq!(
            normalize_image_url("  /uploads/bakpia.png \n").ok().as_deref(),
            Some("/uploads/bakpia.png")
        );
    }

    #[test]
    fn only_image_types_have_extensions() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[tokio::test]
    async fn images_fall_back_to_local_directory() {
        let dir = std::env::temp_dir().join(format!("toko-uploads-{}", Uuid::new_v4()));
        let storage = ImageStorage {
            client: reqwest::Client::new(),
            cloudinary: None,
            upload_dir: dir.clone(),
        };

        let stored = storage
            .store(vec![0xFF, 0xD8, 0xFF], "proof.jpg", "image/jpeg")
            .await
            .expect("stored");
        assert_eq!(stored.location, ImageLocation::Local);
        assert!(stored.url.starts_with(LOCAL_URL_PREFIX));
        assert!(stored.url.ends_with(".jpg"));

        let name = stored.url.trim_start_matches(LOCAL_URL_PREFIX);
        assert!(dir.join(name).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn non_images_are_refused() {
        let storage = ImageStorage {
            client: reqwest::Client::new(),
            cloudinary: None,
            upload_dir: std::env::temp_dir(),
        };
        let err = storage
            .store(vec![1, 2, 3], "notes.txt", "text/plain")
            .await
            .expect_err("rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
