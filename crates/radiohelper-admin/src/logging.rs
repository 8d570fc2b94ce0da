//! 日志初始化

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing 订阅器
///
/// `RUST_LOG` 存在时优先生效，否则使用配置中的级别。重复初始化返回错误。
pub fn init_logging(level: &str) -> Result<()> {
    let filter = build_filter(level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level: {}", level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_level() {
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("radiohelper_web=debug,tower_http=info").is_ok());
        assert!(build_filter("info").is_ok());
    }
}
