//! 错误定义模块

use thiserror::Error;

/// RadioHelper统一错误类型
#[derive(Error, Debug)]
pub enum RadioError {
    #[error("DLP value is empty")]
    EmptyInput,

    #[error("DLP is not a valid number: {0}")]
    InvalidNumber(String),

    #[error("DLP must be a positive number, got {0}")]
    NonPositiveValue(f64),

    #[error("no dose coefficient for region '{region}' and age '{age}'")]
    UnknownCoefficient { region: String, age: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("language model rejected the API key, check OPENROUTER_API_KEY")]
    Unauthorized,

    #[error("language model error: {0}")]
    Collaborator(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RadioError {
    /// 用户输入错误：可恢复，不改变任何状态
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::InvalidNumber(_)
                | Self::NonPositiveValue(_)
                | Self::UnknownCoefficient { .. }
                | Self::Validation(_)
        )
    }

    /// 外部协作方（语言模型）错误
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Collaborator(_))
    }
}

/// RadioHelper统一结果类型
pub type Result<T> = std::result::Result<T, RadioError>;
