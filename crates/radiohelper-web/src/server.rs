//! Web服务器

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use radiohelper_ai::ComplaintRewriter;
use radiohelper_guide::GuideStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::guide::{
    create_protocol, delete_protocol, export_guide, get_protocol, import_guide, list_protocols,
    set_version, update_protocol, upload_image,
};
use crate::handlers::{
    anamnesis_defaults, api_root, calculate_dose, compose_note_handler, health,
    improve_complaints,
};

/// 图片上传大小上限
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub guide: Arc<GuideStore>,
    pub rewriter: Arc<dyn ComplaintRewriter>,
    /// 请求未携带密钥时使用
    pub default_api_key: Option<String>,
}

impl AppState {
    pub fn new(guide: Arc<GuideStore>, rewriter: Arc<dyn ComplaintRewriter>) -> Self {
        Self {
            guide,
            rewriter,
            default_api_key: None,
        }
    }

    pub fn with_default_api_key(mut self, api_key: Option<String>) -> Self {
        self.default_api_key = api_key;
        self
    }
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState, static_dir: Option<PathBuf>) -> Self {
        let app = create_app(state, static_dir);
        Self { addr, app }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

        info!("Web server stopped");
        Ok(())
    }
}

/// 构建完整路由
pub fn create_app(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let images_dir = state.guide.images().base_path().to_path_buf();

    let mut app = Router::new()
        // 根路径
        .route("/", get(api_root))
        // 健康检查
        .route("/health", get(health))
        // API路由
        .nest("/api", api_routes())
        // 规程图片
        .nest_service("/guide_images", ServeDir::new(images_dir));

    // 前端静态文件
    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.with_state(state).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    )
}

/// API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/calculate-dose", post(calculate_dose))
        .route("/compose-note", post(compose_note_handler))
        .route("/anamnesis/defaults", get(anamnesis_defaults))
        .route("/improve-complaints", post(improve_complaints))
        .nest("/guide", guide_routes())
}

/// 规程指南路由
fn guide_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(export_guide).put(import_guide))
        .route("/version", put(set_version))
        .route("/protocols", get(list_protocols).post(create_protocol))
        .route(
            "/protocols/:id",
            get(get_protocol).put(update_protocol).delete(delete_protocol),
        )
        .route(
            "/protocols/:id/image",
            put(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
