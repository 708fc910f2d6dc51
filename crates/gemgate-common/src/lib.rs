use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8790";
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STREAM_DELAY_MS: u64 = 10;
const COOKIE_FILE_RELATIVE: &str = "cookies/gemini_cookies.json";

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
}

/// Final, merged configuration used by the running process.
///
/// Built once at startup and never re-read per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Primary upstream secret. Required.
    pub secure_1psid: String,
    pub secure_1psidts: Option<String>,
    pub data_dir: String,
    /// Where the last working credential pair is cached.
    pub cookie_file: PathBuf,
    /// Base URL of the upstream bridge service.
    pub upstream_url: String,
    /// Optional outbound proxy (for upstream egress).
    pub proxy: Option<String>,
    pub init_timeout_secs: u64,
    pub stream_delay_ms: u64,
    /// Attempt the upstream handshake in the background right after startup.
    pub warm_up: bool,
}

impl GlobalConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.stream_delay_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients should configure, as advertised by `GET /`.
    pub fn public_base_url(&self) -> String {
        format!("http://{}:{}/v1", self.host, self.port)
    }
}

/// Optional layer used for merging config sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure_1psid: Option<String>,
    pub secure_1psidts: Option<String>,
    pub data_dir: Option<String>,
    pub cookie_file: Option<PathBuf>,
    pub upstream_url: Option<String>,
    pub proxy: Option<String>,
    pub init_timeout_secs: Option<u64>,
    pub stream_delay_ms: Option<u64>,
    pub warm_up: Option<bool>,
}

impl GlobalConfigPatch {
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.secure_1psid.is_some() {
            self.secure_1psid = other.secure_1psid;
        }
        if other.secure_1psidts.is_some() {
            self.secure_1psidts = other.secure_1psidts;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.cookie_file.is_some() {
            self.cookie_file = other.cookie_file;
        }
        if other.upstream_url.is_some() {
            self.upstream_url = other.upstream_url;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.init_timeout_secs.is_some() {
            self.init_timeout_secs = other.init_timeout_secs;
        }
        if other.stream_delay_ms.is_some() {
            self.stream_delay_ms = other.stream_delay_ms;
        }
        if other.warm_up.is_some() {
            self.warm_up = other.warm_up;
        }
    }

    pub fn into_config(self) -> Result<GlobalConfig, GlobalConfigError> {
        let secure_1psid = self
            .secure_1psid
            .filter(|value| !value.trim().is_empty())
            .ok_or(GlobalConfigError::MissingField("secure_1psid"))?;
        let data_dir = self.data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let cookie_file = self.cookie_file.unwrap_or_else(|| {
            PathBuf::from(data_dir.trim_end_matches('/')).join(COOKIE_FILE_RELATIVE)
        });
        Ok(GlobalConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            secure_1psid,
            secure_1psidts: self.secure_1psidts,
            data_dir,
            cookie_file,
            upstream_url: self
                .upstream_url
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            proxy: self.proxy,
            init_timeout_secs: self.init_timeout_secs.unwrap_or(DEFAULT_INIT_TIMEOUT_SECS),
            stream_delay_ms: self.stream_delay_ms.unwrap_or(DEFAULT_STREAM_DELAY_MS),
            warm_up: self.warm_up.unwrap_or(true),
        })
    }
}
