//! 核心数据模型定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 扫描区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Head,
    Trunk,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Head, Region::Trunk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::Trunk => "Trunk",
        }
    }

    /// 解析界面标签（英文键、显示名或原表单的俄文标签）
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "head" | "голова" => Some(Self::Head),
            "trunk" | "body" | "туловище" => Some(Self::Trunk),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 年龄分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgeBracket {
    #[serde(rename = ">15y")]
    Over15,
    #[serde(rename = "15y")]
    Years15,
    #[serde(rename = "10y")]
    Years10,
    #[serde(rename = "5y")]
    Years5,
    #[serde(rename = "1y")]
    Years1,
    #[serde(rename = "0-1y")]
    Infant,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 6] = [
        AgeBracket::Over15,
        AgeBracket::Years15,
        AgeBracket::Years10,
        AgeBracket::Years5,
        AgeBracket::Years1,
        AgeBracket::Infant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Over15 => ">15y",
            Self::Years15 => "15y",
            Self::Years10 => "10y",
            Self::Years5 => "5y",
            Self::Years1 => "1y",
            Self::Infant => "0-1y",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace('–', "-");
        match normalized.as_str() {
            ">15y" | ">15 лет" => Some(Self::Over15),
            "15y" | "15 лет" => Some(Self::Years15),
            "10y" | "10 лет" => Some(Self::Years10),
            "5y" | "5 лет" => Some(Self::Years5),
            "1y" | "1 год" => Some(Self::Years1),
            "0-1y" | "0-1 год" => Some(Self::Infant),
            _ => None,
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 有效剂量估算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseEstimate {
    pub region: Region,
    pub age: AgeBracket,
    pub dlp: f64,
    pub coefficient: f64,
    /// 未舍入的剂量 (mSv)
    pub dose_msv: f64,
    pub text: String,
}

impl DoseEstimate {
    /// 显示用剂量，保留两位小数
    pub fn display_dose(&self) -> f64 {
        crate::utils::round_half_up(self.dose_msv, 2)
    }
}

/// 外伤类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trauma {
    #[default]
    #[serde(alias = "Нет")]
    None,
    #[serde(alias = "Бытовая")]
    Domestic,
    #[serde(alias = "Спортивная")]
    Sports,
    #[serde(alias = "ДТП")]
    TrafficAccident,
    #[serde(alias = "Уличная")]
    Street,
    #[serde(alias = "Производственная")]
    Occupational,
}

impl Trauma {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Domestic => "domestic",
            Self::Sports => "sports",
            Self::TrafficAccident => "traffic accident",
            Self::Street => "street",
            Self::Occupational => "occupational",
        }
    }
}

/// 手术史/植入物
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operations {
    #[default]
    #[serde(alias = "Нет")]
    None,
    #[serde(alias = "В анамнезе")]
    History,
    #[serde(alias = "Металлоконструкции")]
    MetalImplants,
    #[serde(alias = "Кардиостимулятор")]
    Pacemaker,
    #[serde(alias = "Стентирование")]
    Stenting,
}

impl Operations {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::History => "in history",
            Self::MetalImplants => "metal implants",
            Self::Pacemaker => "pacemaker",
            Self::Stenting => "stenting",
        }
    }
}

/// 造影剂过敏
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrastAllergy {
    #[default]
    #[serde(alias = "Нет")]
    No,
    #[serde(alias = "Есть")]
    Yes,
    #[serde(alias = "Неизвестно")]
    Unknown,
}

impl ContrastAllergy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
            Self::Unknown => "unknown",
        }
    }
}

/// 妊娠状态，`NotApplicable` 时不写入记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pregnancy {
    #[default]
    #[serde(alias = "Не актуально")]
    NotApplicable,
    #[serde(alias = "Отрицает")]
    Denies,
    #[serde(alias = "Возможна")]
    Possible,
    #[serde(alias = "Подтверждена")]
    Confirmed,
}

impl Pregnancy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not applicable",
            Self::Denies => "denies",
            Self::Possible => "possible",
            Self::Confirmed => "confirmed",
        }
    }
}

/// 病史表单字段
///
/// `Default` 即清空后的表单状态。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnamnesisFieldSet {
    pub complaints: String,
    pub trauma: Trauma,
    pub operations: Operations,
    pub operations_detail: String,
    pub contrast_allergy: ContrastAllergy,
    pub pregnancy: Pregnancy,
    pub preparation: String,
    pub referrer_comment: String,
    pub risk_notes: String,
}

/// DLP输入，既可以是数字也可以是字符串（支持逗号小数点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DlpValue {
    Number(f64),
    Text(String),
}

/// 剂量计算请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseRequest {
    /// 缺失或为 null 时视为空输入
    #[serde(default)]
    pub dlp: Option<DlpValue>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_age")]
    pub age: String,
}

fn default_region() -> String {
    Region::Head.as_str().to_string()
}

fn default_age() -> String {
    AgeBracket::Over15.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_labels() {
        assert_eq!(Region::from_label("Голова"), Some(Region::Head));
        assert_eq!(Region::from_label(" trunk "), Some(Region::Trunk));
        assert_eq!(Region::from_label("Туловище"), Some(Region::Trunk));
        assert_eq!(Region::from_label("Legs"), None);
    }

    #[test]
    fn test_age_labels() {
        assert_eq!(AgeBracket::from_label(">15 лет"), Some(AgeBracket::Over15));
        assert_eq!(AgeBracket::from_label("0-1 год"), Some(AgeBracket::Infant));
        assert_eq!(AgeBracket::from_label("0–1y"), Some(AgeBracket::Infant));
        assert_eq!(AgeBracket::from_label("1y"), Some(AgeBracket::Years1));
        assert_eq!(AgeBracket::from_label("20 лет"), None);
    }

    #[test]
    fn test_field_set_accepts_original_labels() {
        let fields: AnamnesisFieldSet = serde_json::from_str(
            r#"{"trauma": "ДТП", "operations": "pacemaker", "pregnancy": "Возможна"}"#,
        )
        .unwrap();
        assert_eq!(fields.trauma, Trauma::TrafficAccident);
        assert_eq!(fields.operations, Operations::Pacemaker);
        assert_eq!(fields.pregnancy, Pregnancy::Possible);
        assert_eq!(fields.contrast_allergy, ContrastAllergy::No);
        assert!(fields.complaints.is_empty());
    }

    #[test]
    fn test_dlp_value_untagged() {
        let request: DoseRequest =
            serde_json::from_str(r#"{"dlp": "800,5", "region": "Head"}"#).unwrap();
        assert_eq!(request.dlp, Some(DlpValue::Text("800,5".to_string())));
        assert_eq!(request.age, ">15y");

        let request: DoseRequest =
            serde_json::from_str(r#"{"dlp": 300, "region": "Trunk", "age": "0-1y"}"#).unwrap();
        assert_eq!(request.dlp, Some(DlpValue::Number(300.0)));

        let request: DoseRequest = serde_json::from_str(r#"{"region": "Head"}"#).unwrap();
        assert!(request.dlp.is_none());
    }
}
