//! 检查规程指南数据模型
//!
//! 与 `guide.json` 的字段名保持一致（`type`、`imageUrl`、`lastUpdated`）。

use radiohelper_core::{utils::is_blank, RadioError, Result};
use serde::{Deserialize, Serialize};

/// 检查类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolType {
    Ct,
    Rentgen,
}

/// 身体部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyRegion {
    Head,
    Chest,
    Spine,
    Abdomen,
    Pelvis,
    Limbs,
    All,
}

/// 检查规程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub protocol_type: ProtocolType,
    pub region: BodyRegion,
    /// 管电压，自由文本，例如 "120 kV"
    pub kv: String,
    /// 曝光量，自由文本，例如 "200-300 mAs"
    pub mas: String,
    pub description: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl Protocol {
    /// 校验必填字段
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.id) {
            return Err(RadioError::Validation("protocol id is required".to_string()));
        }
        if !is_valid_id(&self.id) {
            return Err(RadioError::Validation(format!(
                "protocol id '{}' may only contain ASCII letters, digits, '_' and '-'",
                self.id
            )));
        }

        let missing: Vec<&str> = [
            ("title", &self.title),
            ("kv", &self.kv),
            ("mas", &self.mas),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(RadioError::Validation(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

/// 可编辑字段，id 不可修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolUpdate {
    pub title: String,
    #[serde(rename = "type")]
    pub protocol_type: ProtocolType,
    pub region: BodyRegion,
    pub kv: String,
    pub mas: String,
    pub description: String,
}

impl ProtocolUpdate {
    pub fn apply_to(self, protocol: &mut Protocol) {
        protocol.title = self.title;
        protocol.protocol_type = self.protocol_type;
        protocol.region = self.region;
        protocol.kv = self.kv;
        protocol.mas = self.mas;
        protocol.description = self.description;
    }
}

/// 指南文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideData {
    pub version: serde_json::Number,
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub protocols: Vec<Protocol>,
}

impl Default for GuideData {
    fn default() -> Self {
        Self {
            version: serde_json::Number::from(1),
            last_updated: None,
            protocols: Vec::new(),
        }
    }
}

/// id 同时用作图片文件名，只允许 ASCII 字母、数字、`_` 和 `-`
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl GuideData {
    /// 校验整个文档：每条规程合法且 id 唯一
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for protocol in &self.protocols {
            protocol.validate()?;
            if !seen.insert(protocol.id.as_str()) {
                return Err(RadioError::Conflict(format!("duplicate protocol id '{}'", protocol.id)));
            }
        }
        Ok(())
    }
}

/// 列表过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolFilter {
    #[serde(rename = "type")]
    pub protocol_type: Option<ProtocolType>,
    pub region: Option<BodyRegion>,
}

impl ProtocolFilter {
    pub fn matches(&self, protocol: &Protocol) -> bool {
        self.protocol_type.map_or(true, |t| protocol.protocol_type == t)
            && self.region.map_or(true, |r| protocol.region == r)
    }
}
