use std::{path::Path, time::Duration};

use config::Config;
use serde::Deserialize;

use crate::error::ClientResult;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
    /// How long a borrow may wait for a free pooled connection.
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_max_idle() -> usize {
    3
}

fn default_idle_timeout_secs() -> u64 {
    240
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_idle: default_max_idle(),
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_ms: None,
            response_timeout_ms: None,
            wait_timeout_ms: None,
        }
    }
}

impl Settings {
    /// Layers an optional `kvswitch.toml` under `KVSWITCH_*` environment variables.
    pub fn read() -> ClientResult<Self> {
        let settings = Config::builder()
            .add_source(config::File::new("kvswitch.toml", config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("KVSWITCH").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let settings = Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}
