use std::path::{Path, PathBuf};

use chirp_core::config::Config;

pub const DATABASE_FILE_NAME: &str = "chirp.db";
pub const BLOB_DIRECTORY_NAME: &str = "blobs";

/// On-disk locations the host opens, resolved from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub database: PathBuf,
    pub blobs: PathBuf,
    pub logs: PathBuf,
}

impl Paths {
    pub fn resolve(config: &Config, data_dir: &Path) -> Self {
        let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let configured = |raw: Option<&String>, fallback: PathBuf| {
            raw.map(|raw| expand_home(raw, home.as_deref()))
                .unwrap_or(fallback)
        };

        Self {
            database: configured(
                config.storage.path.as_ref(),
                data_dir.join(DATABASE_FILE_NAME),
            ),
            blobs: configured(
                config.blobs.directory.as_ref(),
                data_dir.join(BLOB_DIRECTORY_NAME),
            ),
            logs: data_dir.to_path_buf(),
        }
    }
}

fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
