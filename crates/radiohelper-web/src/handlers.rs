//! HTTP处理器：剂量计算、病史记录生成、主诉改写

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use radiohelper_ai::{resolve_api_key, spawn_rewrite};
use radiohelper_core::{
    compose_note, utils::is_blank, AnamnesisFieldSet, DoseEstimate, DoseRequest, RadioError,
    NO_COMPLAINTS,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::server::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "RadioHelper API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "calculate_dose": "/api/calculate-dose",
            "compose_note": "/api/compose-note",
            "anamnesis_defaults": "/api/anamnesis/defaults",
            "improve_complaints": "/api/improve-complaints",
            "guide": "/api/guide"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 剂量计算响应
#[derive(Debug, Serialize)]
pub struct DoseResponse {
    /// 保留两位小数
    pub dose_msv: f64,
    pub dose_text: String,
}

impl From<&DoseEstimate> for DoseResponse {
    fn from(estimate: &DoseEstimate) -> Self {
        Self {
            dose_msv: estimate.display_dose(),
            dose_text: estimate.text.clone(),
        }
    }
}

/// 计算有效剂量
pub async fn calculate_dose(
    payload: Result<Json<DoseRequest>, JsonRejection>,
) -> ApiResult<Json<DoseResponse>> {
    let Json(request) = payload?;
    let estimate = request.estimate()?;
    info!(
        "Calculated dose {:.2} mSv ({} / {})",
        estimate.dose_msv, estimate.region, estimate.age
    );
    Ok(Json(DoseResponse::from(&estimate)))
}

/// 病史记录生成请求
#[derive(Debug, Deserialize)]
pub struct ComposeNoteRequest {
    #[serde(flatten)]
    pub fields: AnamnesisFieldSet,
    /// 之前计算过剂量时附带，服务端重新计算后写入最后一行
    #[serde(default)]
    pub dose: Option<DoseRequest>,
}

#[derive(Debug, Serialize)]
pub struct ComposeNoteResponse {
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<DoseResponse>,
}

/// 生成病史记录
pub async fn compose_note_handler(
    payload: Result<Json<ComposeNoteRequest>, JsonRejection>,
) -> ApiResult<Json<ComposeNoteResponse>> {
    let Json(request) = payload?;
    let estimate = request.dose.as_ref().map(DoseRequest::estimate).transpose()?;
    let note = compose_note(&request.fields, estimate.as_ref());

    info!("Composed note with {} lines", note.lines().count());
    Ok(Json(ComposeNoteResponse {
        note,
        dose: estimate.as_ref().map(DoseResponse::from),
    }))
}

/// 表单默认值（重置用）
pub async fn anamnesis_defaults() -> impl IntoResponse {
    Json(json!({
        "fields": AnamnesisFieldSet::default(),
        "no_complaints": NO_COMPLAINTS
    }))
}

/// 主诉改写请求
#[derive(Debug, Deserialize)]
pub struct ImproveComplaintsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImproveComplaintsResponse {
    pub improved_text: String,
}

/// 主诉改写
///
/// 文本为空或没有可用密钥时在发起网络请求前返回 400。
pub async fn improve_complaints(
    State(state): State<AppState>,
    payload: Result<Json<ImproveComplaintsRequest>, JsonRejection>,
) -> ApiResult<Json<ImproveComplaintsResponse>> {
    let Json(request) = payload?;
    if is_blank(&request.text) {
        return Err(RadioError::Validation("complaints text is empty".to_string()).into());
    }
    let api_key = resolve_api_key(request.api_key.as_deref(), state.default_api_key.as_deref())?;

    let task = spawn_rewrite(state.rewriter.clone(), &request.text, &api_key)?;
    match task.outcome().await {
        Ok(improved_text) => Ok(Json(ImproveComplaintsResponse { improved_text })),
        Err(failure) => {
            warn!(
                "Rewrite failed, keeping original text ({} chars)",
                failure.original.chars().count()
            );
            Err(failure.error.into())
        }
    }
}
