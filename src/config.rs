//! Configuration management for tubevault.
//!
//! Settings are resolved from built-in defaults, then a config file, then the
//! `--target` flag, then environment variables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;
use crate::harvest::HarvestOptions;
use crate::repository::{redact_url_password, DbContext, DbError};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "tubevault.db";

/// Application name used for config file discovery.
const APP_NAME: &str = "tubevault";

const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_API_BASE_URL: &str = "TUBEVAULT_API_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("invalid database_server settings: {0}")]
    DatabaseServer(String),
}

/// Application settings.
#[derive(Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Data API key.
    pub api_key: Option<String>,
    /// Data API endpoint.
    pub api_base_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Ingestion tunables.
    pub harvest: HarvestOptions,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> home dir -> current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubevault");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: 30,
            user_agent: format!("tubevault/{}", env!("CARGO_PKG_VERSION")),
            harvest: HarvestOptions::default(),
        }
    }
}

// The API key must never reach a log line.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("data_dir", &self.data_dir)
            .field("database_filename", &self.database_filename)
            .field(
                "database_url",
                &self.database_url.as_deref().map(redact_url_password),
            )
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("harvest", &self.harvest)
            .finish()
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    pub fn has_database_url(&self) -> bool {
        self.database_url.is_some()
    }

    /// Full path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// For SQLite: whether the database file exists. Server databases are
    /// assumed to exist; connection errors surface on first use.
    pub fn database_exists(&self) -> bool {
        self.has_database_url() || self.database_path().exists()
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.has_database_url() {
            return Ok(());
        }
        tracing::debug!("Ensuring data directory {}", self.data_dir.display());
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Connect to the configured database. Fails here, before any work
    /// starts, when the store is unreachable.
    pub async fn create_db_context(&self) -> Result<DbContext, DbError> {
        let url = self.database_url();
        tracing::debug!("Opening database {}", redact_url_password(&url));
        DbContext::connect(&url).await
    }
}

/// `[database_server]` section: parts of a PostgreSQL URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseServer {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Database name.
    pub name: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

impl DatabaseServer {
    /// Assemble a `postgres://` URL, percent-encoding credentials.
    pub fn url(&self) -> Result<String, ConfigError> {
        let mut url = url::Url::parse(&format!("postgres://{}", self.host))
            .map_err(|e| ConfigError::DatabaseServer(format!("host '{}': {}", self.host, e)))?;

        let invalid = |what: &str| ConfigError::DatabaseServer(format!("cannot set {what}"));
        if let Some(user) = &self.user {
            url.set_username(user).map_err(|_| invalid("user"))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| invalid("password"))?;
        }
        url.set_port(self.port).map_err(|_| invalid("port"))?;
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_server: Option<DatabaseServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest: Option<HarvestOptions>,
    /// Where this config was read from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load the config file `prefer` discovers for this app, or defaults.
    pub async fn load() -> Result<Self, ConfigError> {
        let discovered = match prefer::load(APP_NAME).await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        };
        Self::from_discovered(discovered.as_deref()).await
    }

    /// Read a discovered config file. No file means defaults.
    pub async fn from_discovered(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::debug!("Using config file {}", path.display());
                Self::load_from_path(path).await
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension; anything unknown is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// The config file's directory, if it came from a file.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; relative paths are joined onto `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(
        &self,
        settings: &mut Settings,
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref api_key) = self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(ref base_url) = self.api_base_url {
            settings.api_base_url = base_url.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(ref server) = self.database_server {
            settings.database_url = Some(server.url()?);
        }
        if let Some(ref harvest) = self.harvest {
            settings.harvest = harvest.clone();
        }
        Ok(())
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (`--target` flag).
    pub target: Option<PathBuf>,
}

/// Where a `--target` path puts the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub data_dir: PathBuf,
    pub database_filename: String,
}

impl ResolvedTarget {
    /// A `.db`/`.sqlite`/`.sqlite3` path (or an existing file) names the
    /// database itself; anything else is the data directory.
    pub fn from_path(path: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };

        let is_db_file = path
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
            || path.is_file();

        if is_db_file {
            let database_filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_DATABASE_FILENAME)
                .to_string();
            let data_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            Self {
                data_dir,
                database_filename,
            }
        } else {
            Self {
                data_dir: path,
                database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            }
        }
    }
}

/// Apply environment overrides. `lookup` returns a variable's value; empty
/// values count as unset.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_API_KEY) {
        tracing::debug!("Using {} from environment", ENV_API_KEY);
        settings.api_key = Some(key);
    }
    if let Some(database_url) = get(ENV_DATABASE_URL) {
        tracing::debug!(
            "Using {} from environment: {}",
            ENV_DATABASE_URL,
            redact_url_password(&database_url)
        );
        settings.database_url = Some(database_url);
    }
    if let Some(base_url) = get(ENV_API_BASE_URL) {
        tracing::debug!("Using {} from environment: {}", ENV_API_BASE_URL, base_url);
        settings.api_base_url = base_url;
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd()
    } else {
        config.base_dir().unwrap_or_else(cwd)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;

    if let Some(ref target) = options.target {
        let resolved = ResolvedTarget::from_path(target);
        settings.data_dir = resolved.data_dir;
        settings.database_filename = resolved.database_filename;
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    Ok((settings, config))
}
