//! 配置管理
//!
//! 配置按以下顺序叠加：内置默认值 ← TOML 文件 ← `RADIOHELPER__*` 环境变量。
//! 例如 `RADIOHELPER__SERVER__PORT=8080`。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// 未显式配置密钥时读取的环境变量
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// 系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadioConfig {
    /// HTTP服务配置
    pub server: ServerConfig,
    /// 语言模型配置
    pub ai: AiConfig,
    /// 规程指南存储配置
    pub guide: GuideConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 前端静态文件目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
}

/// 语言模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// chat-completions 接口地址
    pub endpoint: String,
    pub model: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// `HTTP-Referer` 请求头
    pub referer: String,
    /// `X-Title` 请求头
    pub title: String,
    /// 服务端默认密钥，请求未携带密钥时使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// 规程指南存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideConfig {
    /// guide.json 路径
    pub json_path: String,
    /// 图片目录
    pub images_dir: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别或 EnvFilter 指令
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "google/gemini-3-flash-preview".to_string(),
            timeout_secs: 20,
            temperature: 0.3,
            max_tokens: 256,
            referer: "radiohelper-web".to_string(),
            title: "radiohelper-webapp".to_string(),
            api_key: None,
        }
    }
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            json_path: "./guide.json".to_string(),
            images_dir: "./guide_images".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RadioConfig {
    /// 加载配置
    ///
    /// 通常在日志初始化之前调用，因此这里不输出加载信息，由调用方在初始化日志后记录。
    /// 显式给出的文件必须存在；未给出时尝试当前目录下可选的 `radiohelper.toml`。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("radiohelper").required(false),
        };

        let settings = Config::builder()
            .add_source(
                Config::try_from(&RadioConfig::default())
                    .context("Failed to build default configuration")?,
            )
            .add_source(file)
            .add_source(
                Environment::with_prefix("RADIOHELPER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let mut config: RadioConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.fill_api_key(std::env::var(API_KEY_ENV).ok());

        ConfigValidator::new().validate(&config)?;
        Ok(config)
    }

    /// 配置中没有密钥时使用环境变量中的值
    pub fn fill_api_key(&mut self, from_env: Option<String>) {
        let configured = self.ai.api_key.as_deref().is_some_and(|key| !key.trim().is_empty());
        if !configured {
            self.ai.api_key = from_env.filter(|key| !key.trim().is_empty());
        }
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数，返回 false 表示不通过
    check: fn(&RadioConfig) -> bool,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                check: |config| config.server.port != 0,
                error_message: "Server port cannot be 0",
            },
            ValidationRule {
                field_path: "ai.timeout_secs",
                check: |config| config.ai.timeout_secs > 0,
                error_message: "AI request timeout must be positive",
            },
            ValidationRule {
                field_path: "ai.endpoint",
                check: |config| !config.ai.endpoint.trim().is_empty(),
                error_message: "AI endpoint cannot be empty",
            },
            ValidationRule {
                field_path: "ai.temperature",
                check: |config| (0.0..=2.0).contains(&config.ai.temperature),
                error_message: "AI temperature must be within 0..=2",
            },
            ValidationRule {
                field_path: "guide.json_path",
                check: |config| !config.guide.json_path.trim().is_empty(),
                error_message: "Guide file path cannot be empty",
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &RadioConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if !(rule.check)(config) {
                error!("Configuration validation failed for {}", rule.field_path);
                return Err(anyhow::anyhow!("{}: {}", rule.field_path, rule.error_message));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RadioConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        assert_eq!(config.ai.timeout_secs, 20);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radiohelper.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[guide]
json_path = "/srv/radiohelper/guide.json"
images_dir = "/srv/radiohelper/guide_images"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = RadioConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.guide.json_path, "/srv/radiohelper/guide.json");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ai.max_tokens, 256);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(RadioConfig::load(Some(path.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = RadioConfig::default();
        config.server.port = 0;
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_fill_api_key() {
        let mut config = RadioConfig::default();
        config.fill_api_key(Some("  ".to_string()));
        assert!(config.ai.api_key.is_none());

        config.fill_api_key(Some("from-env".to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("from-env"));

        config.fill_api_key(Some("other".to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("from-env"));
    }
}
