//! 语言模型改写客户端
//!
//! 通过 OpenRouter 的 chat-completions 接口把主诉文本改写为简洁的临床记录风格。
//! 核心逻辑不依赖它的可用性，调用方通过 [`ComplaintRewriter`] 注入实现。

use std::time::Duration;

use async_trait::async_trait;
use radiohelper_core::{RadioError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

/// 固定系统提示词
pub const SYSTEM_PROMPT: &str = "You are a medical editor. Rewrite the patient's complaints/history \
concisely and professionally in the style of clinical notes, in the same language as the source text. \
Requirements: 1-3 short sentences, no lists and no quotes; do not add facts that are not in the source; \
keep negations such as 'denies' / 'does not deny' exactly; drop introductory words about the patient; \
fix grammar and syntax but never invent new data.";

/// 主诉改写接口
#[async_trait]
pub trait ComplaintRewriter: Send + Sync {
    /// 改写主诉文本，成功时返回去除首尾空白的结果
    async fn rewrite(&self, text: &str, api_key: &str) -> Result<String>;
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct RewriterConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    /// `HTTP-Referer` 请求头
    pub referer: String,
    /// `X-Title` 请求头
    pub title: String,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
            temperature: 0.3,
            max_tokens: 256,
            referer: "radiohelper-web".to_string(),
            title: "radiohelper-webapp".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// chat-completions 响应（只取需要的字段）
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// 提取第一个候选的文本
    pub fn into_text(self) -> Result<String> {
        let choice = self
            .choices
            .and_then(|choices| choices.into_iter().next())
            .ok_or_else(|| RadioError::Collaborator("empty response from model".to_string()))?;

        let content = choice
            .message
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(RadioError::Collaborator("model returned no text".to_string()));
        }

        Ok(content)
    }
}

/// OpenRouter 客户端
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: RewriterConfig,
}

impl OpenRouterClient {
    pub fn new(config: RewriterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RadioError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }
}

#[async_trait]
impl ComplaintRewriter for OpenRouterClient {
    async fn rewrite(&self, text: &str, api_key: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Sending rewrite request to {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!("Rewrite request failed: {}", e);
                if e.is_timeout() {
                    RadioError::Collaborator(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    RadioError::Collaborator(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Language model rejected the API key");
            return Err(RadioError::Unauthorized);
        }
        if !status.is_success() {
            warn!("Language model responded with HTTP {}", status);
            return Err(RadioError::Collaborator(format!("HTTP {}", status)));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RadioError::Collaborator(format!("malformed response: {}", e)))?;

        let text = body.into_text()?;
        info!("Complaints rewritten ({} chars)", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/chat/completions", addr)
    }

    fn client_for(endpoint: String) -> OpenRouterClient {
        OpenRouterClient::new(RewriterConfig {
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_response() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "  Headache for 3 days.  "}}]
        }))
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "Headache for 3 days.");

        let body: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(body.into_text(), Err(RadioError::Collaborator(_))));

        let body: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": ""}}]})).unwrap();
        assert!(matches!(body.into_text(), Err(RadioError::Collaborator(_))));

        let body: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(body.into_text().is_err());
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(request): Json<Value>| async move {
                assert_eq!(request["messages"][0]["role"], "system");
                assert_eq!(request["messages"][1]["content"], "pain in knee since yesterday");
                Json(json!({"choices": [{"message": {"content": "Knee pain since yesterday."}}]}))
            }),
        );
        let client = client_for(serve(app).await);

        let text = client.rewrite("pain in knee since yesterday", "key").await.unwrap();
        assert_eq!(text, "Knee pain since yesterday.");
    }

    #[tokio::test]
    async fn test_rewrite_unauthorized() {
        let app = Router::new().route("/chat/completions", post(|| async { StatusCode::UNAUTHORIZED }));
        let client = client_for(serve(app).await);

        let err = client.rewrite("text", "bad-key").await.unwrap_err();
        assert!(matches!(err, RadioError::Unauthorized));
    }

    #[tokio::test]
    async fn test_rewrite_server_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = client_for(serve(app).await);

        let err = client.rewrite("text", "key").await.unwrap_err();
        assert!(err.is_collaborator());
    }
}
