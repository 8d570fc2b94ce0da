//! 有效剂量估算
//!
//! 根据DLP（mGy·cm）、扫描区域和年龄分组查表计算有效剂量（mSv）：
//! `E = DLP × k`。系数表是进程级常量，按两个封闭枚举索引。

use tracing::{debug, error};

use crate::error::{RadioError, Result};
use crate::models::{AgeBracket, DlpValue, DoseEstimate, DoseRequest, Region};
use crate::utils::{normalize_decimal, round_half_up};

/// 换算系数 k (mSv / mGy·cm)，行对应 [`Region`]，列对应 [`AgeBracket`]
static COEFFICIENTS: [[f64; 6]; 2] = [
    // Head: >15y, 15y, 10y, 5y, 1y, 0-1y
    [0.0023, 0.00276, 0.0046, 0.00736, 0.01173, 0.02185],
    // Trunk
    [0.0081, 0.00972, 0.01458, 0.02106, 0.03240, 0.06399],
];

fn region_index(region: Region) -> usize {
    match region {
        Region::Head => 0,
        Region::Trunk => 1,
    }
}

fn age_index(age: AgeBracket) -> usize {
    match age {
        AgeBracket::Over15 => 0,
        AgeBracket::Years15 => 1,
        AgeBracket::Years10 => 2,
        AgeBracket::Years5 => 3,
        AgeBracket::Years1 => 4,
        AgeBracket::Infant => 5,
    }
}

/// 查找换算系数
///
/// 对封闭枚举总能命中；查不到说明系数表本身有缺陷。
pub fn coefficient(region: Region, age: AgeBracket) -> Result<f64> {
    COEFFICIENTS
        .get(region_index(region))
        .and_then(|row| row.get(age_index(age)))
        .copied()
        .filter(|k| k.is_finite() && *k > 0.0)
        .ok_or_else(|| {
            error!("Coefficient table has no entry for {} / {}", region, age);
            RadioError::UnknownCoefficient {
                region: region.to_string(),
                age: age.to_string(),
            }
        })
}

/// 解析DLP文本
pub fn parse_dlp(raw: &str) -> Result<f64> {
    let normalized = normalize_decimal(raw);
    if normalized.is_empty() {
        return Err(RadioError::EmptyInput);
    }

    let dlp: f64 = normalized
        .parse()
        .map_err(|_| RadioError::InvalidNumber(raw.trim().to_string()))?;
    if !dlp.is_finite() {
        return Err(RadioError::InvalidNumber(raw.trim().to_string()));
    }

    Ok(dlp)
}

impl DlpValue {
    /// 转换为数值，字符串按 [`parse_dlp`] 规则解析
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Ok(*value),
            Self::Number(value) => Err(RadioError::InvalidNumber(value.to_string())),
            Self::Text(raw) => parse_dlp(raw),
        }
    }
}

/// 计算有效剂量
pub fn estimate_dose(dlp: f64, region: Region, age: AgeBracket) -> Result<DoseEstimate> {
    if !dlp.is_finite() {
        return Err(RadioError::InvalidNumber(dlp.to_string()));
    }
    if dlp <= 0.0 {
        return Err(RadioError::NonPositiveValue(dlp));
    }

    let k = coefficient(region, age)?;
    let dose_msv = dlp * k;
    let text = format!(
        "Effective dose: {:.2} mSv (DLP={:.0}, k={})",
        round_half_up(dose_msv, 2),
        dlp,
        k
    );

    debug!("Estimated dose {} mSv for {} / {} (DLP={})", dose_msv, region, age, dlp);

    Ok(DoseEstimate {
        region,
        age,
        dlp,
        coefficient: k,
        dose_msv,
        text,
    })
}

/// 从界面字符串计算有效剂量
///
/// 区域或年龄标签无法识别时返回 `UnknownCoefficient`。
pub fn estimate_dose_from_input(raw_dlp: &str, region: &str, age: &str) -> Result<DoseEstimate> {
    let dlp = parse_dlp(raw_dlp)?;
    let (region, age) = resolve_labels(region, age)?;
    estimate_dose(dlp, region, age)
}

impl DoseRequest {
    pub fn estimate(&self) -> Result<DoseEstimate> {
        let dlp = self.dlp.as_ref().ok_or(RadioError::EmptyInput)?.to_f64()?;
        let (region, age) = resolve_labels(&self.region, &self.age)?;
        estimate_dose(dlp, region, age)
    }
}

fn resolve_labels(region: &str, age: &str) -> Result<(Region, AgeBracket)> {
    match (Region::from_label(region), AgeBracket::from_label(age)) {
        (Some(region), Some(age)) => Ok((region, age)),
        _ => Err(RadioError::UnknownCoefficient {
            region: region.trim().to_string(),
            age: age.trim().to_string(),
        }),
    }
}
