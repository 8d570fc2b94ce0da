//! 指南存储
//!
//! `guide.json` 保存有序的规程列表、版本号和最后更新时间，图片保存在同级目录。
//! 所有变更先作用于副本，写盘成功后才替换内存中的数据。

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use radiohelper_core::{RadioError, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::images::ImageStore;
use crate::models::{GuideData, Protocol, ProtocolFilter, ProtocolUpdate};

/// 指南存储
#[derive(Debug)]
pub struct GuideStore {
    json_path: PathBuf,
    images: ImageStore,
    data: RwLock<GuideData>,
}

impl GuideStore {
    /// 打开存储；文件不存在时从空指南开始
    pub async fn open(json_path: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Result<Self> {
        let json_path = json_path.into();
        let data = match tokio::fs::read_to_string(&json_path).await {
            Ok(contents) => {
                let data: GuideData = serde_json::from_str(&contents)?;
                info!(
                    "Loaded guide {} (version {}, {} protocols)",
                    json_path.display(),
                    data.version,
                    data.protocols.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Guide file {} not found, starting empty", json_path.display());
                GuideData::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            json_path,
            images: ImageStore::new(images_dir),
            data: RwLock::new(data),
        })
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// 按过滤条件列出规程，保持原有顺序
    pub async fn list(&self, filter: &ProtocolFilter) -> Vec<Protocol> {
        let data = self.data.read().await;
        data.protocols
            .iter()
            .filter(|protocol| filter.matches(protocol))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<Protocol> {
        let data = self.data.read().await;
        data.protocols
            .iter()
            .find(|protocol| protocol.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// 新增规程，id 必须唯一
    pub async fn add(&self, mut protocol: Protocol) -> Result<Protocol> {
        protocol.validate()?;
        // 图片只能通过 set_image 关联
        protocol.image_url = None;

        let mut guard = self.data.write().await;
        if guard.protocols.iter().any(|p| p.id == protocol.id) {
            return Err(RadioError::Conflict(format!(
                "protocol with id '{}' already exists",
                protocol.id
            )));
        }

        let mut data = guard.clone();
        data.protocols.push(protocol.clone());
        self.persist(&mut data).await?;
        *guard = data;

        info!("Added protocol {}", protocol.id);
        Ok(protocol)
    }

    /// 更新可编辑字段
    pub async fn update(&self, id: &str, changes: ProtocolUpdate) -> Result<Protocol> {
        let mut guard = self.data.write().await;
        let mut data = guard.clone();

        let protocol = data
            .protocols
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        changes.apply_to(protocol);
        protocol.validate()?;
        let updated = protocol.clone();

        self.persist(&mut data).await?;
        *guard = data;

        info!("Updated protocol {}", id);
        Ok(updated)
    }

    /// 删除规程及其图片
    pub async fn delete(&self, id: &str) -> Result<Protocol> {
        let mut guard = self.data.write().await;
        let mut data = guard.clone();

        let index = data
            .protocols
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = data.protocols.remove(index);

        self.persist(&mut data).await?;
        *guard = data;

        if let Some(image_url) = &removed.image_url {
            self.images.delete_image(image_url).await;
        }

        info!("Deleted protocol {}", id);
        Ok(removed)
    }

    /// 设置或替换规程图片
    ///
    /// 新文件先写入；保存成功后才删除旧文件，保存失败时删除新文件。
    pub async fn set_image(&self, id: &str, bytes: &[u8], ext: &str) -> Result<Protocol> {
        let mut guard = self.data.write().await;
        let mut data = guard.clone();

        let protocol = data
            .protocols
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        let new_url = self.images.store_image(id, ext, bytes).await?;
        // 同名文件已被覆盖，不再单独删除
        let old_url = protocol
            .image_url
            .replace(new_url.clone())
            .filter(|old_url| *old_url != new_url);
        let updated = protocol.clone();

        if let Err(e) = self.persist(&mut data).await {
            let committed = guard
                .protocols
                .iter()
                .find(|p| p.id == id)
                .and_then(|p| p.image_url.as_deref());
            // 覆盖了已提交的同名文件时保留
            if committed != Some(new_url.as_str()) {
                self.images.delete_image(&new_url).await;
            }
            return Err(e);
        }
        *guard = data;

        if let Some(old_url) = &old_url {
            self.images.delete_image(old_url).await;
        }

        info!("Set image for protocol {}", id);
        Ok(updated)
    }

    /// 更新版本号，必须为正数
    pub async fn set_version(&self, version: serde_json::Number) -> Result<GuideData> {
        let positive = version.as_f64().is_some_and(|v| v.is_finite() && v > 0.0);
        if !positive {
            return Err(RadioError::Validation(format!(
                "version must be a positive number, got {}",
                version
            )));
        }

        let mut guard = self.data.write().await;
        let mut data = guard.clone();
        data.version = version;

        self.persist(&mut data).await?;
        *guard = data.clone();

        info!("Guide version set to {}", data.version);
        Ok(data)
    }

    /// 导出完整文档
    pub async fn export(&self) -> GuideData {
        self.data.read().await.clone()
    }

    /// 用导入的文档整体替换
    pub async fn import(&self, mut imported: GuideData) -> Result<GuideData> {
        imported.validate()?;

        let mut guard = self.data.write().await;
        self.persist(&mut imported).await?;
        *guard = imported.clone();

        info!("Imported guide with {} protocols", imported.protocols.len());
        Ok(imported)
    }

    /// 写入 guide.json 并更新时间戳
    async fn persist(&self, data: &mut GuideData) -> Result<()> {
        data.last_updated = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        if let Some(parent) = self.json_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(data)?;
        let tmp_path = self.json_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.json_path).await?;

        debug!("Saved guide to {}", self.json_path.display());
        Ok(())
    }
}

fn not_found(id: &str) -> RadioError {
    RadioError::NotFound(format!("protocol '{}'", id))
}
