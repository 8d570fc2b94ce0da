//! 规程图片存储

use radiohelper_core::{RadioError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::is_valid_id;

/// 允许的图片扩展名
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// `imageUrl` 的前缀
pub const IMAGE_URL_PREFIX: &str = "guide_images";

/// 图片存储管理器，文件名为 `{protocol_id}.{ext}`
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
}

impl ImageStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 存储图片并返回 `imageUrl`
    pub async fn store_image(&self, protocol_id: &str, ext: &str, data: &[u8]) -> Result<String> {
        if !is_valid_id(protocol_id) {
            warn!("Rejected image for unsafe protocol id {:?}", protocol_id);
            return Err(RadioError::Validation(format!(
                "protocol id '{}' is not a valid file name",
                protocol_id
            )));
        }
        let ext = normalize_extension(ext)?;
        if data.is_empty() {
            return Err(RadioError::Validation("image is empty".to_string()));
        }

        tokio::fs::create_dir_all(&self.base_path).await?;

        let file_name = format!("{}.{}", protocol_id, ext);
        let full_path = self.base_path.join(&file_name);
        tokio::fs::write(&full_path, data).await?;

        info!("Stored image {} ({} bytes)", full_path.display(), data.len());
        Ok(format!("{}/{}", IMAGE_URL_PREFIX, file_name))
    }

    /// 删除 `imageUrl` 指向的文件
    ///
    /// 文件不存在视为成功；其他失败只记录警告，不影响记录本身的变更。
    pub async fn delete_image(&self, image_url: &str) {
        let Some(path) = self.resolve(image_url) else {
            warn!("Ignoring image url outside the image store: {}", image_url);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Deleted image {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete image {}: {}", path.display(), e),
        }
    }

    /// 把 `imageUrl` 映射到存储目录中的文件，只取文件名部分
    pub fn resolve(&self, image_url: &str) -> Option<PathBuf> {
        let file_name = Path::new(image_url).file_name()?;
        Some(self.base_path.join(file_name))
    }
}

fn normalize_extension(ext: &str) -> Result<String> {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(RadioError::Validation(format!(
            "unsupported image type '{}', expected one of {}",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_delete_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("guide_images"));

        let url = store.store_image("ct_head", ".PNG", b"fake-png").await.unwrap();
        assert_eq!(url, "guide_images/ct_head.png");

        let path = store.resolve(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fake-png");

        store.delete_image(&url).await;
        assert!(!path.exists());

        // 再次删除不会出错
        store.delete_image(&url).await;
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let result = store.store_image("ct_head", "exe", b"data").await;
        assert!(matches!(result, Err(RadioError::Validation(_))));

        let result = store.store_image("ct_head", "jpg", b"").await;
        assert!(matches!(result, Err(RadioError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_in_protocol_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("guide_images"));

        for id in ["../../escaped", "nested/ct_head", "..", ""] {
            let result = store.store_image(id, "png", b"data").await;
            assert!(matches!(result, Err(RadioError::Validation(_))), "{} accepted", id);
        }
        assert!(!dir.path().join("escaped.png").exists());
        assert!(!dir.path().join("guide_images").exists());
    }

    #[test]
    fn test_resolve_strips_directories() {
        let store = ImageStore::new("/data/guide_images");
        assert_eq!(
            store.resolve("guide_images/../../etc/passwd").unwrap(),
            PathBuf::from("/data/guide_images/passwd")
        );
    }
}
