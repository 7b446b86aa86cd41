use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML at line {line}, column {column}: {message}")]
    InvalidToml {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub card: CardConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub blobs: BlobsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Who is looking at the cards. Without a uid every card is read-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    pub uid: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_photo_prefix")]
    pub photo_prefix: String,
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: u64,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            photo_prefix: default_photo_prefix(),
            max_photo_bytes: default_max_photo_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobsConfig {
    pub directory: Option<String>,
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct ConfigOverrides {
    uid: Option<String>,
    display_name: Option<String>,
    log_level: Option<String>,
}

pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 1_000_000;

fn default_collection() -> String {
    "tweets".to_string()
}

fn default_photo_prefix() -> String {
    "tweets".to_string()
}

fn default_max_photo_bytes() -> u64 {
    DEFAULT_MAX_PHOTO_BYTES
}

fn default_public_url() -> String {
    "http://localhost:8080/blobs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const DEFAULT_CONFIG_TOML: &str = r#"[identity]
# uid = "u1"
# display_name = "Alice"

[card]
collection = "tweets"
photo_prefix = "tweets"
max_photo_bytes = 1000000

[storage]
# path = "~/.local/share/chirp/chirp.db"

[blobs]
# directory = "~/.local/share/chirp/blobs"
public_url = "http://localhost:8080/blobs"

[logging]
level = "info"
"#;

/// Return the resolved platform-appropriate configuration file path.
#[cfg(feature = "native")]
pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("social", "chirp", "chirp") {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

/// Return the platform data directory, used for the default database and
/// blob directory locations.
#[cfg(feature = "native")]
pub fn data_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("social", "chirp", "chirp") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    }
}

/// Load configuration from the platform config path, merging environment
/// variable overrides.
#[cfg(feature = "native")]
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load configuration from a specific path. A missing file is created with
/// commented defaults and the defaults are returned.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    load_config_from_with_overrides(path, config_overrides_from_env())
}

/// Parse configuration from a TOML string directly.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    load_config_from_str_with_overrides(toml_str, config_overrides_from_env())
}

fn load_config_from_with_overrides(
    path: &Path,
    overrides: ConfigOverrides,
) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            create_default_config(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            DEFAULT_CONFIG_TOML.to_string()
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    load_config_from_str_with_overrides(&contents, overrides)
}

fn load_config_from_str_with_overrides(
    toml_str: &str,
    overrides: ConfigOverrides,
) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(toml_str).map_err(|e| {
        let (line, column) = e.span().map_or((0, 0), |span| {
            let before = &toml_str[..span.start];
            let line = before.chars().filter(|&c| c == '\n').count() + 1;
            let column = before
                .rfind('\n')
                .map_or(span.start + 1, |nl| span.start - nl);
            (line, column)
        });
        ConfigError::InvalidToml {
            line,
            column,
            message: e.message().to_string(),
        }
    })?;

    apply_overrides(&mut config, overrides);
    validate(&config)?;

    Ok(config)
}

fn config_overrides_from_env() -> ConfigOverrides {
    ConfigOverrides {
        uid: std::env::var("CHIRP_UID").ok(),
        display_name: std::env::var("CHIRP_DISPLAY_NAME").ok(),
        log_level: std::env::var("CHIRP_LOG_LEVEL").ok(),
    }
}

fn apply_overrides(config: &mut Config, overrides: ConfigOverrides) {
    if let Some(uid) = overrides.uid {
        config.identity.uid = Some(uid);
    }
    if let Some(name) = overrides.display_name {
        config.identity.display_name = Some(name);
    }
    if let Some(level) = overrides.log_level {
        config.logging.level = level;
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            message: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
        });
    }

    if config.card.max_photo_bytes == 0 {
        return Err(ConfigError::InvalidValue {
            field: "card.max_photo_bytes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    for (field, value) in [
        ("card.collection", &config.card.collection),
        ("card.photo_prefix", &config.card.photo_prefix),
        ("blobs.public_url", &config.blobs.public_url),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }

    if matches!(config.identity.uid.as_deref(), Some(uid) if uid.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: "identity.uid".to_string(),
            message: "must not be empty when set".to_string(),
        });
    }

    Ok(())
}

fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)?;
    Ok(())
}
