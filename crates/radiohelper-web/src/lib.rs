//! # RadioHelper Web
//!
//! HTTP接口层：剂量计算、病史记录生成、主诉改写和规程指南管理。

pub mod error;
pub mod guide;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{create_app, AppState, WebServer};
