//! # RadioHelper Admin
//!
//! 服务运维相关功能：配置加载与校验、日志初始化。

pub mod config;
pub mod logging;

pub use crate::config::{AiConfig, ConfigValidator, GuideConfig, LoggingConfig, RadioConfig, ServerConfig};
pub use crate::logging::init_logging;
