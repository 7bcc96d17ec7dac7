use base64::{Engine, engine::general_purpose::STANDARD};
use log::*;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::JPushConfig;
use crate::error::{JPushError, Result};
use crate::payload::{PushReply, PushRequest};

const PUSH_PATH: &str = "/v3/push";
const VALIDATE_PATH: &str = "/v3/push/validate";

/// 极光推送客户端
///
/// 构造后只持有不可变配置，可通过 `Arc` 在多个任务间共享。
pub struct JPushClient {
    config: JPushConfig,
    basic_auth: String,
    http_client: Client,
}

impl JPushClient {
    pub fn new(config: JPushConfig) -> Result<Self> {
        config.validate()?;

        if config.danger_accept_invalid_certs {
            warn!(
                "TLS certificate verification is DISABLED for {}; do not use this in production",
                config.base_url
            );
        }

        let http_client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(|e| JPushError::Config(e.to_string()))?;

        let basic_auth = STANDARD.encode(format!("{}:{}", config.app_key, config.app_secret));

        Ok(Self {
            config,
            basic_auth,
            http_client,
        })
    }

    pub fn app_key(&self) -> &str {
        &self.config.app_key
    }

    pub fn config(&self) -> &JPushConfig {
        &self.config
    }

    /// 执行消息推送
    pub async fn push(&self, req: &PushRequest) -> Result<PushReply> {
        self.call(req, PUSH_PATH).await
    }

    /// 校验推送请求，不会真正下发
    pub async fn validate(&self, req: &PushRequest) -> Result<PushReply> {
        self.call(req, VALIDATE_PATH).await
    }

    /// 向所有用户推送通知
    pub async fn push_to_all(&self, content: &str) -> Result<PushReply> {
        self.push(&PushRequest::broadcast(content)).await
    }

    /// 推送通知给指定注册 ID 的设备
    pub async fn push_to_user<I, S>(&self, content: &str, ids: I) -> Result<PushReply>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = PushRequest::to_registration_ids(content, ids);
        self.push(&req).await
    }

    /// 推送通知给拥有任一标签的用户
    pub async fn push_to_any_tag<I, S>(&self, content: &str, tags: I) -> Result<PushReply>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = PushRequest::to_any_tag(content, tags);
        self.push(&req).await
    }

    async fn call(&self, req: &PushRequest, path: &str) -> Result<PushReply> {
        let body = serde_json::to_vec(req).map_err(JPushError::Serialization)?;
        let url = self.config.endpoint(path);
        debug!("POST {url} ({} bytes)", body.len());

        let builder = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.authorization())
            .body(body);

        let (status, text) = self.execute(builder).await?;
        decode_reply(status, text)
    }

    /// 带通用请求头发送请求，并把响应体解析为 `R`
    pub(crate) async fn send_json<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R> {
        let (status, text) = self.execute(self.with_common_headers(builder)).await?;
        decode_reply(status, text)
    }

    /// 带通用请求头发送请求，只要求状态码为 200
    pub(crate) async fn send_no_reply(&self, builder: RequestBuilder) -> Result<()> {
        let (status, text) = self.execute(self.with_common_headers(builder)).await?;
        if status != StatusCode::OK {
            return Err(JPushError::Delivery {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    fn with_common_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(AUTHORIZATION, self.authorization())
    }

    fn authorization(&self) -> String {
        format!("Basic {}", self.basic_auth)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("JPush responded with status {status}");
        Ok((status, text))
    }
}

fn decode_reply<R: DeserializeOwned>(status: StatusCode, text: String) -> Result<R> {
    if status != StatusCode::OK {
        return Err(JPushError::Delivery {
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(JPushError::Deserialization)
}
