//! 规程指南 HTTP 接口

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use radiohelper_guide::{GuideData, Protocol, ProtocolFilter, ProtocolUpdate};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::server::AppState;

pub async fn list_protocols(
    State(state): State<AppState>,
    Query(filter): Query<ProtocolFilter>,
) -> Json<Vec<Protocol>> {
    info!("Listing protocols with filter: {:?}", filter);
    Json(state.guide.list(&filter).await)
}

pub async fn get_protocol(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Protocol>> {
    Ok(Json(state.guide.get(&id).await?))
}

pub async fn create_protocol(
    State(state): State<AppState>,
    payload: Result<Json<Protocol>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Protocol>)> {
    let Json(protocol) = payload?;
    let created = state.guide.add(protocol).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_protocol(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProtocolUpdate>, JsonRejection>,
) -> ApiResult<Json<Protocol>> {
    let Json(changes) = payload?;
    Ok(Json(state.guide.update(&id, changes).await?))
}

pub async fn delete_protocol(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Protocol>> {
    Ok(Json(state.guide.delete(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    /// 文件扩展名：png、jpg、jpeg、gif
    pub ext: String,
}

/// 上传规程图片，请求体为原始图片字节
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ImageQuery>,
    body: Bytes,
) -> ApiResult<Json<Protocol>> {
    Ok(Json(state.guide.set_image(&id, &body, &query.ext).await?))
}

pub async fn export_guide(State(state): State<AppState>) -> Json<GuideData> {
    Json(state.guide.export().await)
}

pub async fn import_guide(
    State(state): State<AppState>,
    payload: Result<Json<GuideData>, JsonRejection>,
) -> ApiResult<Json<GuideData>> {
    let Json(data) = payload?;
    Ok(Json(state.guide.import(data).await?))
}

#[derive(Debug, Deserialize)]
pub struct VersionRequest {
    pub version: serde_json::Number,
}

pub async fn set_version(
    State(state): State<AppState>,
    payload: Result<Json<VersionRequest>, JsonRejection>,
) -> ApiResult<Json<GuideData>> {
    let Json(request) = payload?;
    Ok(Json(state.guide.set_version(request.version).await?))
}
