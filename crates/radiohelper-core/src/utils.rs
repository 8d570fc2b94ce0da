//! 通用工具函数

/// 统一小数分隔符：把逗号替换为点并去除首尾空白
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

/// 四舍五入（远离零方向）到指定小数位
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// 去除首尾空白后是否为空
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
