/// 极光推送错误类型
#[derive(Debug, thiserror::Error)]
pub enum JPushError {
    /// 请求体无法序列化
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 网络、TLS 或超时错误
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 服务端返回非 200 状态，body 为原始响应内容
    #[error("Delivery failed with status {status}: {body}")]
    Delivery { status: u16, body: String },

    /// 状态码正常，但响应体无法解析
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl JPushError {
    /// 服务端返回的 HTTP 状态码（仅 Delivery 错误有值）
    pub fn status(&self) -> Option<u16> {
        match self {
            JPushError::Delivery { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = JPushError> = std::result::Result<T, E>;
