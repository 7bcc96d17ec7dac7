//! 在服务器端查询、设置设备的 tag、alias 信息

use log::*;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::client::JPushClient;
use crate::error::{JPushError, Result};

const DEVICES_PATH: [&str; 2] = ["v3", "devices"];

/// 设备的标签、别名和手机号
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAndAliasView {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub mobile: String,
}

/// 标签增删
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChanges {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl TagChanges {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// 设置标签和别名的参数，空字段不会发送
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTagsAndAlias {
    #[serde(skip)]
    pub registration_id: String,
    #[serde(default, skip_serializing_if = "TagChanges::is_empty")]
    pub tags: TagChanges,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mobile: String,
}

impl SetTagsAndAlias {
    pub fn new(registration_id: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            ..Default::default()
        }
    }

    pub fn add_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.add.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn remove_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.remove.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }
}

impl JPushClient {
    /// 查看指定注册 ID 的标签和别名
    pub async fn tags_and_alias(&self, registration_id: &str) -> Result<TagAndAliasView> {
        let url = self.device_url(registration_id)?;
        debug!("GET {url}");
        self.send_json(self.http_client().get(url)).await
    }

    /// 设置标签和别名
    pub async fn set_tags_and_alias(&self, params: &SetTagsAndAlias) -> Result<()> {
        let url = self.device_url(&params.registration_id)?;
        let body = serde_json::to_vec(params).map_err(JPushError::Serialization)?;
        debug!("POST {url} ({} bytes)", body.len());
        self.send_no_reply(self.http_client().post(url).body(body))
            .await
    }

    /// 注册 ID 作为单个路径段追加，`/`、`?`、`#` 等字符会被转义
    fn device_url(&self, registration_id: &str) -> Result<Url> {
        if matches!(registration_id, "" | "." | "..") {
            return Err(JPushError::InvalidArgument(format!(
                "invalid registration id '{registration_id}'"
            )));
        }
        let mut url = self.config().parsed_base_url()?;
        url.path_segments_mut()
            .map_err(|_| {
                JPushError::Config(format!(
                    "base_url cannot be a base: {}",
                    self.config().base_url
                ))
            })?
            .pop_if_empty()
            .extend(DEVICES_PATH)
            .push(registration_id);
        Ok(url)
    }
}
