//! 极光推送 REST API v3 客户端

use async_trait::async_trait;

pub mod audience;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod payload;

pub use audience::{Audience, AudienceOp, AudienceRule, RuleSet};
pub use client::JPushClient;
pub use config::JPushConfig;
pub use device::{SetTagsAndAlias, TagAndAliasView, TagChanges};
pub use error::{JPushError, Result};
pub use payload::{
    AlertType, AndroidNotification, Extras, IosNotification, Message, Notification, Options,
    Platform, PushReply, PushRequest, WinPhoneNotification,
};

/// 推送服务能力trait（用于dyn兼容）
#[async_trait]
pub trait PushService: Send + Sync {
    /// 执行消息推送
    async fn push(&self, req: &PushRequest) -> Result<PushReply>;

    /// 校验推送请求
    async fn validate(&self, req: &PushRequest) -> Result<PushReply>;

    /// 查看设备标签和别名
    async fn tags_and_alias(&self, registration_id: &str) -> Result<TagAndAliasView>;

    /// 设置设备标签和别名
    async fn set_tags_and_alias(&self, params: &SetTagsAndAlias) -> Result<()>;
}

#[async_trait]
impl PushService for JPushClient {
    async fn push(&self, req: &PushRequest) -> Result<PushReply> {
        JPushClient::push(self, req).await
    }

    async fn validate(&self, req: &PushRequest) -> Result<PushReply> {
        JPushClient::validate(self, req).await
    }

    async fn tags_and_alias(&self, registration_id: &str) -> Result<TagAndAliasView> {
        JPushClient::tags_and_alias(self, registration_id).await
    }

    async fn set_tags_and_alias(&self, params: &SetTagsAndAlias) -> Result<()> {
        JPushClient::set_tags_and_alias(self, params).await
    }
}
