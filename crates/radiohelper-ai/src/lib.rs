//! # RadioHelper AI
//!
//! 主诉文本的语言模型改写：
//! - [`ComplaintRewriter`] 可替换的改写接口
//! - [`OpenRouterClient`] 基于 chat-completions 的实现
//! - [`spawn_rewrite`] / [`dispatch_rewrite`] 脱离调用线程的异步派发

pub mod client;
pub mod dispatch;

pub use client::{ComplaintRewriter, OpenRouterClient, RewriterConfig, SYSTEM_PROMPT};
pub use dispatch::{dispatch_rewrite, resolve_api_key, spawn_rewrite, RewriteFailure, RewriteTask};
