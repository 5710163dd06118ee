use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dictate_core::{parse_time_zone, DEFAULT_FALLBACK_TZ};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "dictate";
const CONFIG_FILENAME: &str = "config.toml";

pub const TOKEN_ENV_VAR: &str = "NORMALIZER_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub fallback_tz: String,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fallback_tz: DEFAULT_FALLBACK_TZ.to_string(),
            auth: AuthConfig::default(),
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
    #[error("invalid fallback_tz value: {0}")]
    InvalidFallbackTz(String),
    #[error("invalid auth.token value: token cannot be empty")]
    EmptyAuthToken,
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

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    fallback_tz: Option<String>,
    auth: Option<AuthFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthFile {
    token: Option<String>,
}

/// Loads the config file (required when `config_path` is given) and applies
/// the `NORMALIZER_TOKEN` override.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let config = load_file(config_path)?;
    Ok(apply_env_token(config, env::var(TOKEN_ENV_VAR).ok()))
}

fn load_file(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
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

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
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
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(zone) = parsed.fallback_tz {
        let tz = parse_time_zone(&zone).map_err(|_| ConfigError::InvalidFallbackTz(zone))?;
        config.fallback_tz = tz.name().to_string();
    }

    if let Some(auth) = parsed.auth {
        if let Some(token) = auth.token {
            let token = token.trim();
            if token.is_empty() {
                return Err(ConfigError::EmptyAuthToken);
            }
            config.auth.token = Some(token.to_string());
        }
    }

    Ok(config)
}

fn apply_env_token(mut config: AppConfig, env_token: Option<String>) -> AppConfig {
    if let Some(token) = env_token.filter(|value| !value.trim().is_empty()) {
        config.auth.token = Some(token);
    }
    config
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
