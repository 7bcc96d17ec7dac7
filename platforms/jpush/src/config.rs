use std::time::Duration;

use ::config::{Config, Environment};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{JPushError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.jpush.cn";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// 极光推送客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JPushConfig {
    pub app_key: String,
    pub app_secret: String,
    /// API 网关地址，测试时可指向本地桩服务
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 跳过证书校验（危险，仅用于调试）
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

impl JPushConfig {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            danger_accept_invalid_certs: false,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }

    /// 从 `JPUSH_` 前缀的环境变量读取配置
    ///
    /// `JPUSH_APP_KEY` 与 `JPUSH_APP_SECRET` 必填，其余可选。
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::with_prefix("JPUSH"))
    }

    fn from_environment(env: Environment) -> Result<Self> {
        Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| JPushError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 校验必填项
    pub fn validate(&self) -> Result<()> {
        if self.app_key.is_empty() || self.app_secret.is_empty() {
            return Err(JPushError::Config(
                "app_key and app_secret must not be empty".to_string(),
            ));
        }
        let url = self.parsed_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(JPushError::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// 拼接 API 地址
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| JPushError::Config(format!("invalid base_url {}: {e}", self.base_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = JPushConfig::new("key", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.danger_accept_invalid_certs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: JPushConfig =
            serde_json::from_str(r#"{"app_key":"k","app_secret":"s"}"#).unwrap();
        assert_eq!(config, JPushConfig::new("k", "s"));
    }

    #[test]
    fn test_config_validation() {
        assert!(JPushConfig::new("", "secret").validate().is_err());
        assert!(
            JPushConfig::new("key", "secret")
                .base_url("api.jpush.cn")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_endpoint_joins_path() {
        let config = JPushConfig::new("k", "s").base_url("http://localhost:8080/");
        assert_eq!(config.endpoint("/v3/push"), "http://localhost:8080/v3/push");
    }

    #[test]
    fn test_config_from_environment() {
        let vars = [
            ("JPUSH_APP_KEY", "key"),
            ("JPUSH_APP_SECRET", "secret"),
            ("JPUSH_TIMEOUT_SECS", "5"),
            ("JPUSH_DANGER_ACCEPT_INVALID_CERTS", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config =
            JPushConfig::from_environment(Environment::with_prefix("JPUSH").source(Some(vars)))
                .unwrap();
        assert_eq!(config.app_key, "key");
        assert_eq!(config.app_secret, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.danger_accept_invalid_certs);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_from_environment_requires_credentials() {
        let vars = [("JPUSH_APP_KEY".to_string(), "key".to_string())]
            .into_iter()
            .collect();
        let result =
            JPushConfig::from_environment(Environment::with_prefix("JPUSH").source(Some(vars)));
        assert!(matches!(result, Err(JPushError::Config(_))));
    }
}
