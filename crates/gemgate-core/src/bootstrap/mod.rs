use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gemgate_common::{GlobalConfig, GlobalConfigPatch};
use gemgate_storage::FileCredentialStore;
use gemgate_upstream::{BridgeBackend, BridgeConfig, Credentials};

use crate::client::ClientManager;
use crate::gateway::{Gateway, GatewayOptions};

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "gemgate",
    version,
    about = "OpenAI-compatible gateway for Gemini web sessions"
)]
pub struct CliArgs {
    /// Primary upstream cookie (required).
    #[arg(long = "secure-1psid", env = "SECURE_1PSID", hide_env_values = true)]
    pub secure_1psid: Option<String>,

    /// Secondary upstream cookie.
    #[arg(long = "secure-1psidts", env = "SECURE_1PSIDTS", hide_env_values = true)]
    pub secure_1psidts: Option<String>,

    /// Bind host.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Directory for persisted state.
    #[arg(long, env = "GEMGATE_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Credential cache file. Defaults to `<data_dir>/cookies/gemini_cookies.json`.
    #[arg(long, env = "GEMGATE_COOKIE_FILE")]
    pub cookie_file: Option<String>,

    /// Base URL of the upstream bridge.
    #[arg(long, env = "GEMGATE_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "GEMGATE_PROXY")]
    pub proxy: Option<String>,

    /// Upper bound for one upstream handshake, in seconds.
    #[arg(long, env = "GEMGATE_INIT_TIMEOUT_SECS")]
    pub init_timeout_secs: Option<String>,

    /// Pause between streamed chunks, in milliseconds.
    #[arg(long, env = "GEMGATE_STREAM_DELAY_MS")]
    pub stream_delay_ms: Option<String>,

    /// Initialize the upstream client in the background at startup.
    #[arg(long, env = "GEMGATE_WARM_UP")]
    pub warm_up: Option<String>,
}

pub struct Bootstrap {
    pub config: GlobalConfig,
    pub gateway: Arc<Gateway>,
}

pub fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    let args = CliArgs::parse();
    bootstrap(args)
}

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let config = config_from_args(args)?;
    info!(
        event = "config_loaded",
        bind = %config.bind_addr(),
        upstream_url = %config.upstream_url,
        cookie_file = %config.cookie_file.display(),
        secure_1psidts = config.secure_1psidts.is_some(),
        init_timeout_secs = config.init_timeout_secs,
        stream_delay_ms = config.stream_delay_ms,
        "configuration loaded"
    );

    let bridge = BridgeConfig {
        proxy: config.proxy.clone(),
        ..BridgeConfig::new(config.upstream_url.clone())
    };
    let backend = BridgeBackend::new(bridge).context("build upstream bridge client")?;
    let store = FileCredentialStore::new(config.cookie_file.clone());
    let client = ClientManager::new(
        Arc::new(backend),
        Arc::new(store),
        Credentials::new(config.secure_1psid.clone(), config.secure_1psidts.clone()),
        config.init_timeout(),
    );
    let gateway = Gateway::new(
        client,
        GatewayOptions {
            stream_delay: config.stream_delay(),
            public_base_url: config.public_base_url(),
        },
    );

    Ok(Bootstrap {
        config,
        gateway: Arc::new(gateway),
    })
}

/// CLI > ENV precedence is applied by clap per field; this only sanitizes,
/// parses, and fills defaults.
pub fn config_from_args(args: CliArgs) -> anyhow::Result<GlobalConfig> {
    let patch = GlobalConfigPatch {
        host: sanitize_optional_env_value(args.host),
        port: parse_u16_env_value(args.port, "PORT")?,
        secure_1psid: sanitize_optional_env_value(args.secure_1psid),
        secure_1psidts: sanitize_optional_env_value(args.secure_1psidts),
        data_dir: sanitize_optional_env_value(args.data_dir),
        cookie_file: sanitize_optional_env_value(args.cookie_file).map(PathBuf::from),
        upstream_url: sanitize_optional_env_value(args.upstream_url),
        proxy: sanitize_optional_env_value(args.proxy),
        init_timeout_secs: parse_u64_env_value(
            args.init_timeout_secs,
            "GEMGATE_INIT_TIMEOUT_SECS",
        )?,
        stream_delay_ms: parse_u64_env_value(args.stream_delay_ms, "GEMGATE_STREAM_DELAY_MS")?,
        warm_up: parse_bool_env_value(args.warm_up, "GEMGATE_WARM_UP")?,
    };

    let mut merged = GlobalConfigPatch::default();
    merged.overlay(patch);
    merged.into_config().context("finalize global config")
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Some PaaS systems may inject unresolved placeholders like `${VAR}`.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

fn parse_u16_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u16>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u16>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

fn parse_u64_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u64>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u64>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

fn parse_bool_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<bool>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => return Err(anyhow::anyhow!("invalid {env_name} value: {raw}")),
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{CliArgs, config_from_args, sanitize_optional_env_value};

    fn with_secret(psid: &str) -> CliArgs {
        CliArgs {
            secure_1psid: Some(psid.to_string()),
            ..CliArgs::default()
        }
    }

    #[test]
    fn explicit_flags_parse() {
        // Flags take precedence over the environment.
        let args = CliArgs::try_parse_from([
            "gemgate",
            "--secure-1psid",
            "sid",
            "--port",
            "9000",
            "--warm-up",
            "off",
        ])
        .unwrap();
        assert_eq!(args.secure_1psid.as_deref(), Some("sid"));
        assert_eq!(args.port.as_deref(), Some("9000"));
        assert_eq!(args.warm_up.as_deref(), Some("off"));
    }

    #[test]
    fn placeholders_count_as_unset() {
        assert_eq!(sanitize_optional_env_value(Some("${PORT}".to_string())), None);
        assert_eq!(sanitize_optional_env_value(Some("   ".to_string())), None);
        assert_eq!(
            sanitize_optional_env_value(Some(" 9000 ".to_string())),
            Some("9000".to_string())
        );
    }

    #[test]
    fn flags_build_config() {
        let config = config_from_args(CliArgs {
            port: Some("9000".to_string()),
            data_dir: Some("/var/lib/gemgate".to_string()),
            warm_up: Some("off".to_string()),
            ..with_secret("sid")
        })
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.cookie_file,
            PathBuf::from("/var/lib/gemgate/cookies/gemini_cookies.json")
        );
        assert!(!config.warm_up);
    }

    #[test]
    fn blank_primary_secret_is_fatal() {
        let err = config_from_args(with_secret("  ")).unwrap_err();
        assert!(format!("{err:#}").contains("secure_1psid"));
    }

    #[test]
    fn bad_numbers_are_fatal() {
        let err = config_from_args(CliArgs {
            port: Some("http".to_string()),
            ..with_secret("sid")
        })
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
