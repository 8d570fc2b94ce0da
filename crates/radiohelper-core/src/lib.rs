//! # RadioHelper Core
//!
//! 放射技师助手的核心模块：错误定义、数据模型、有效剂量估算和病史记录生成。

pub mod dose;
pub mod error;
pub mod models;
pub mod note;
pub mod utils;

pub use dose::{coefficient, estimate_dose, estimate_dose_from_input, parse_dlp};
pub use error::{RadioError, Result};
pub use models::*;
pub use note::{compose_note, CLARIFY_PLACEHOLDER, DENIES, NO_COMPLAINTS};
