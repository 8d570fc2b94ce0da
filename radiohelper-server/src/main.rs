//! RadioHelper服务器主程序

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use radiohelper_admin::{init_logging, AiConfig, ConfigValidator, RadioConfig};
use radiohelper_ai::{OpenRouterClient, RewriterConfig};
use radiohelper_guide::GuideStore;
use radiohelper_web::{AppState, WebServer};
use tracing::{error, info, warn};

/// RadioHelper服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "radiohelper-server")]
#[command(about = "RadioHelper 放射科辅助服务：剂量估算、病史记录、检查规程指南")]
struct Args {
    /// 服务器端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 监听地址，覆盖配置文件
    #[arg(long)]
    host: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 指南JSON文件路径
    #[arg(long)]
    guide_path: Option<String>,

    /// 指南图片目录
    #[arg(long)]
    images_dir: Option<String>,
}

fn rewriter_config(ai: &AiConfig) -> RewriterConfig {
    RewriterConfig {
        endpoint: ai.endpoint.clone(),
        model: ai.model.clone(),
        timeout: Duration::from_secs(ai.timeout_secs),
        temperature: ai.temperature,
        max_tokens: ai.max_tokens,
        referer: ai.referer.clone(),
        title: ai.title.clone(),
    }
}

/// 命令行参数覆盖配置文件和环境变量
fn apply_overrides(config: &mut RadioConfig, args: Args) {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(path) = args.guide_path {
        config.guide.json_path = path;
    }
    if let Some(dir) = args.images_dir {
        config.guide.images_dir = dir;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone();

    let mut config = RadioConfig::load(config_path.as_deref())?;
    apply_overrides(&mut config, args);

    // 初始化日志，之后的配置信息才会输出
    init_logging(&config.logging.level)?;

    match &config_path {
        Some(path) => info!("Configuration loaded from: {}", path),
        None => info!("Configuration loaded from defaults and environment"),
    }
    // 命令行覆盖后重新校验
    ConfigValidator::new().validate(&config)?;

    info!("Starting RadioHelper server...");
    info!("  Listen: {}:{}", config.server.host, config.server.port);
    info!("  Guide: {}", config.guide.json_path);
    info!("  Images: {}", config.guide.images_dir);
    info!("  Model: {}", config.ai.model);
    if config.ai.api_key.is_none() {
        warn!("No default API key configured, clients must supply their own");
    }

    let rewriter = OpenRouterClient::new(rewriter_config(&config.ai))?;
    let guide = GuideStore::open(&config.guide.json_path, &config.guide.images_dir).await?;

    let state = AppState::new(Arc::new(guide), Arc::new(rewriter))
        .with_default_api_key(config.ai.api_key.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let server = WebServer::new(addr, state, config.server.static_dir.map(PathBuf::from));
    if let Err(e) = server.run().await {
        error!("Server failed: {}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "radiohelper-server",
            "--port",
            "8080",
            "--log-level",
            "debug",
            "--guide-path",
            "/data/guide.json",
        ]);
        let mut config = RadioConfig::default();
        apply_overrides(&mut config, args);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.guide.json_path, "/data/guide.json");
        assert_eq!(config.guide.images_dir, "./guide_images");
    }

    #[test]
    fn test_overridden_config_is_validated() {
        let args = Args::parse_from(["radiohelper-server", "--port", "0"]);
        let mut config = RadioConfig::default();
        apply_overrides(&mut config, args);
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_rewriter_config_mapping() {
        let config = RadioConfig::default();
        let rewriter = rewriter_config(&config.ai);
        assert_eq!(rewriter.timeout, Duration::from_secs(20));
        assert_eq!(rewriter.model, config.ai.model);
    }
}
