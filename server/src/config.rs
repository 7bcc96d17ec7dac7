use ::config::{Config, Environment};
use anyhow::{Context, Result};
use jpush::JPushConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

/// 服务配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub jpush: JPushConfig,
}

impl ServerConfig {
    /// 读取环境变量，`.env` 需在调用前加载
    pub fn from_env() -> Result<Self> {
        let jpush = JPushConfig::from_env().context("failed to load JPush configuration")?;
        let bind_addr = Self::bind_addr(Environment::default())?;

        Ok(Self { bind_addr, jpush })
    }

    fn bind_addr(env: Environment) -> Result<String> {
        Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .add_source(env)
            .build()?
            .get_string("bind_addr")
            .context("failed to read BIND_ADDR")
    }
}
