//! # RadioHelper Guide
//!
//! 检查规程指南的存储：JSON文档中的有序记录列表，以及按记录 id 命名的图片文件。

pub mod images;
pub mod models;
pub mod store;

pub use images::{ImageStore, ALLOWED_EXTENSIONS, IMAGE_URL_PREFIX};
pub use models::*;
pub use store::GuideStore;
