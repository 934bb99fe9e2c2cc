use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use phonebook_core::DEFAULT_NOTIFICATION_TTL_SECS;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const APP_DIR: &str = "phonebook";
const CONFIG_FILENAME: &str = "config.toml";

pub const API_URL_ENV: &str = "PHONEBOOK_API_URL";
pub const API_TOKEN_ENV: &str = "PHONEBOOK_API_TOKEN";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_RETRY_STATUSES: [u16; 4] = [429, 502, 503, 504];
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notification_ttl_secs: i64,
    pub api: ApiConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay: Duration,
    pub statuses: Vec<u16>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notification_ttl_secs: DEFAULT_NOTIFICATION_TTL_SECS,
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid base_url {value}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("invalid {field} value: {value}")]
    InvalidDuration { field: &'static str, value: i64 },
    #[error("invalid max_retries value: {0}")]
    InvalidMaxRetries(u32),
    #[error("invalid retry status: {0}")]
    InvalidRetryStatus(u16),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    notification_ttl_secs: Option<i64>,
    api: Option<ApiFile>,
    retry: Option<RetryFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiFile {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<i64>,
    connect_timeout_secs: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetryFile {
    max_retries: Option<u32>,
    delay_ms: Option<i64>,
    statuses: Option<Vec<u16>>,
}

#[derive(Debug, Default, Clone)]
struct EnvOverrides {
    base_url: Option<String>,
    token: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            base_url: non_empty_env(API_URL_ENV),
            token: non_empty_env(API_TOKEN_ENV),
        }
    }
}

/// Loads the config file (if any) and applies `PHONEBOOK_API_URL` and
/// `PHONEBOOK_API_TOKEN` on top.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let parsed = match resolve_config_path(config_path) {
        Ok(path) => read_config_file(&path, required)?,
        Err(ConfigError::MissingHomeDir) if !required => None,
        Err(ConfigError::InvalidConfigPath(_)) if !required => None,
        Err(err) => return Err(err),
    };
    merge_config(parsed.unwrap_or_default(), EnvOverrides::from_env())
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

fn read_config_file(path: &Path, required: bool) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(parsed))
}

fn merge_config(parsed: ConfigFile, overrides: EnvOverrides) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(ttl) = parsed.notification_ttl_secs {
        config.notification_ttl_secs = positive(ttl, "notification_ttl_secs")? as i64;
    }

    let api = parsed.api.unwrap_or_default();
    if let Some(base_url) = overrides.base_url.or(api.base_url) {
        config.api.base_url = parse_base_url(&base_url)?;
    }
    config.api.token = overrides
        .token
        .or(api.token)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if let Some(secs) = api.timeout_secs {
        config.api.timeout = Duration::from_secs(positive(secs, "timeout_secs")?);
    }
    if let Some(secs) = api.connect_timeout_secs {
        config.api.connect_timeout =
            Duration::from_secs(positive(secs, "connect_timeout_secs")?);
    }

    if let Some(retry) = parsed.retry {
        if let Some(max_retries) = retry.max_retries {
            if max_retries > MAX_RETRIES_LIMIT {
                return Err(ConfigError::InvalidMaxRetries(max_retries));
            }
            config.retry.max_retries = max_retries;
        }
        if let Some(delay_ms) = retry.delay_ms {
            if delay_ms < 0 {
                return Err(ConfigError::InvalidDuration {
                    field: "delay_ms",
                    value: delay_ms,
                });
            }
            config.retry.delay = Duration::from_millis(delay_ms as u64);
        }
        if let Some(statuses) = retry.statuses {
            if let Some(bad) = statuses.iter().find(|s| !(400..=599).contains(*s)) {
                return Err(ConfigError::InvalidRetryStatus(*bad));
            }
            config.retry.statuses = statuses;
        }
    }

    Ok(config)
}

fn positive(value: i64, field: &'static str) -> Result<u64> {
    if value <= 0 {
        return Err(ConfigError::InvalidDuration { field, value });
    }
    Ok(value as u64)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
