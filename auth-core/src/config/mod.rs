use crate::error::AuthError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `AUTHCTL_ENDPOINT`.
pub const ENV_PREFIX: &str = "AUTHCTL";

/// Directory under the user's home holding the session and config files.
pub const CONFIG_DIR_NAME: &str = ".authctl";

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// gRPC endpoint of the cluster's auth API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where the session credential is persisted.
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,
    /// Authorization link shown to the operator when an external proof is needed.
    #[serde(default = "default_identity_provider_url")]
    pub identity_provider_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    /// OTLP collector; tracing export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:30650".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_identity_provider_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

/// `~/.authctl`, or a relative `.authctl` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(CONFIG_DIR_NAME)
}

fn default_credential_path() -> PathBuf {
    config_dir().join("session.json")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            credential_path: default_credential_path(),
            identity_provider_url: default_identity_provider_url(),
            log_level: default_log_level(),
            json_logs: false,
            otlp_endpoint: None,
        }
    }
}

impl ClientConfig {
    /// Load from `./authctl.*`, `~/.authctl/config.*` and `AUTHCTL_*` variables,
    /// later sources overriding earlier ones.
    pub fn load() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let user_config = config_dir().join("config");
        let config = Cfg::builder()
            .add_source(File::with_name(&user_config.to_string_lossy()).required(false))
            .add_source(File::with_name("authctl").required(false))
            .add_source(env_source())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from an explicit file, still honouring `AUTHCTL_*` overrides.
    pub fn load_from(path: &Path) -> Result<Self, AuthError> {
        let config = Cfg::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(env_source())
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
