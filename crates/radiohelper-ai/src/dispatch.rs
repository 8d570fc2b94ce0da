//! 异步改写任务
//!
//! 每次调用只产生一个结果：改写后的文本，或者一次终止性失败（附带原始文本）。
//! 不重试，不支持取消。

use std::sync::Arc;

use radiohelper_core::{utils::is_blank, RadioError, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::ComplaintRewriter;

/// 改写失败，原始文本保持不变以便用户重试或手动处理
#[derive(Debug)]
pub struct RewriteFailure {
    pub original: String,
    pub error: RadioError,
}

/// 选择本次调用使用的 API 密钥：请求中的优先，其次是配置中的
///
/// 两者都为空时立即失败，不发起任何网络请求。
pub fn resolve_api_key(requested: Option<&str>, configured: Option<&str>) -> Result<String> {
    requested
        .filter(|key| !is_blank(key))
        .or(configured.filter(|key| !is_blank(key)))
        .map(|key| key.trim().to_string())
        .ok_or_else(|| RadioError::Config("API key is not set".to_string()))
}

/// 正在执行的改写任务
pub struct RewriteTask {
    original: String,
    handle: JoinHandle<Result<String>>,
}

impl RewriteTask {
    /// 等待任务结束
    pub async fn outcome(self) -> std::result::Result<String, RewriteFailure> {
        match self.handle.await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(error)) => Err(RewriteFailure {
                original: self.original,
                error,
            }),
            Err(join_error) => Err(RewriteFailure {
                original: self.original,
                error: RadioError::Internal(format!("rewrite task aborted: {}", join_error)),
            }),
        }
    }
}

/// 在 tokio 任务中执行改写
///
/// 空文本返回 `Validation`，缺少密钥返回 `Config`，二者都在派发前同步返回。
pub fn spawn_rewrite(
    rewriter: Arc<dyn ComplaintRewriter>,
    text: &str,
    api_key: &str,
) -> Result<RewriteTask> {
    let original = text.to_string();
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(RadioError::Validation("complaints text is empty".to_string()));
    }
    let api_key = resolve_api_key(Some(api_key), None)?;

    info!("Dispatching complaints rewrite ({} chars)", text.chars().count());

    // 原文保持调用方输入不变，只把去除首尾空白的副本发给模型
    let handle = tokio::spawn(async move { rewriter.rewrite(&text, &api_key).await });

    Ok(RewriteTask { original, handle })
}

/// 回调风格的派发：成功和失败各一个后续处理，恰好调用其中一个
pub fn dispatch_rewrite<S, F>(
    rewriter: Arc<dyn ComplaintRewriter>,
    text: &str,
    api_key: &str,
    on_success: S,
    on_failure: F,
) -> Result<JoinHandle<()>>
where
    S: FnOnce(String) + Send + 'static,
    F: FnOnce(RewriteFailure) + Send + 'static,
{
    let task = spawn_rewrite(rewriter, text, api_key)?;

    Ok(tokio::spawn(async move {
        match task.outcome().await {
            Ok(text) => on_success(text),
            Err(failure) => {
                warn!("Complaints rewrite failed: {}", failure.error);
                on_failure(failure)
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    struct UppercaseRewriter;

    #[async_trait]
    impl ComplaintRewriter for UppercaseRewriter {
        async fn rewrite(&self, text: &str, _api_key: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct FailingRewriter;

    #[async_trait]
    impl ComplaintRewriter for FailingRewriter {
        async fn rewrite(&self, _text: &str, _api_key: &str) -> Result<String> {
            Err(RadioError::Unauthorized)
        }
    }

    #[derive(Default)]
    struct CountingRewriter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ComplaintRewriter for CountingRewriter {
        async fn rewrite(&self, text: &str, _api_key: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_string())
        }
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(Some("abc"), Some("cfg")).unwrap(), "abc");
        assert_eq!(resolve_api_key(Some("  "), Some("cfg")).unwrap(), "cfg");
        assert_eq!(resolve_api_key(None, Some(" cfg ")).unwrap(), "cfg");
        assert!(matches!(resolve_api_key(None, None), Err(RadioError::Config(_))));
        assert!(matches!(resolve_api_key(Some(""), Some("")), Err(RadioError::Config(_))));
    }

    #[tokio::test]
    async fn test_spawn_rewrite_success() {
        let task = spawn_rewrite(Arc::new(UppercaseRewriter), " headache ", "key").unwrap();
        assert_eq!(task.outcome().await.unwrap(), "HEADACHE");
    }

    #[tokio::test]
    async fn test_failure_keeps_original() {
        let task = spawn_rewrite(Arc::new(FailingRewriter), "knee pain", "key").unwrap();
        let failure = task.outcome().await.unwrap_err();
        assert_eq!(failure.original, "knee pain");
        assert!(matches!(failure.error, RadioError::Unauthorized));

        let task = spawn_rewrite(Arc::new(FailingRewriter), "  knee pain\n", "key").unwrap();
        let failure = task.outcome().await.unwrap_err();
        assert_eq!(failure.original, "  knee pain\n");
        assert!(matches!(failure.error, RadioError::Unauthorized));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_call() {
        let rewriter = Arc::new(CountingRewriter::default());
        let result = spawn_rewrite(rewriter.clone(), "knee pain", "  ");
        assert!(matches!(result, Err(RadioError::Config(_))));

        let result = spawn_rewrite(rewriter.clone(), "   ", "key");
        assert!(matches!(result, Err(RadioError::Validation(_))));

        assert_eq!(rewriter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_calls_exactly_one_continuation() {
        let (tx_ok, rx_ok) = oneshot::channel();
        let (tx_err, rx_err) = oneshot::channel::<RewriteFailure>();
        let handle = dispatch_rewrite(
            Arc::new(UppercaseRewriter),
            "cough",
            "key",
            move |text| {
                let _ = tx_ok.send(text);
            },
            move |failure| {
                let _ = tx_err.send(failure);
            },
        )
        .unwrap();
        handle.await.unwrap();

        assert_eq!(rx_ok.await.unwrap(), "COUGH");
        assert!(rx_err.await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_failure_continuation() {
        let (tx_ok, rx_ok) = oneshot::channel::<String>();
        let (tx_err, rx_err) = oneshot::channel();
        let handle = dispatch_rewrite(
            Arc::new(FailingRewriter),
            "cough",
            "key",
            move |text| {
                let _ = tx_ok.send(text);
            },
            move |failure| {
                let _ = tx_err.send(failure);
            },
        )
        .unwrap();
        handle.await.unwrap();

        let failure = rx_err.await.unwrap();
        assert_eq!(failure.original, "cough");
        assert!(rx_ok.await.is_err());
    }
}
