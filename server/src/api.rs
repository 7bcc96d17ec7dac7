use serde::{Deserialize, Serialize};

/// 中继响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse<T> {
    /// 是否成功
    pub success: bool,
    /// 极光返回的数据
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// 错误信息，投递失败时为极光的原始响应
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> RelayResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
