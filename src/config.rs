//! Configuration file handling for findash.
//!
//! The configuration file is stored at `$FINDASH_HOME/config.json`. It names the directory that
//! holds the partitioned transactions store.

use crate::db::TransactionsDb;
use crate::error::{fail, ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "findash";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const TRANS_DB_PATH: &str = "transactions";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINDASH_HOME` and from there it loads `$FINDASH_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, an initial `config.json` and the (empty) store root.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory, e.g. `$HOME/findash`
    /// - `trans_db_path` - Where the transactions store lives. Relative paths are resolved against
    ///   `dir`. Defaults to `transactions`.
    ///
    /// # Errors
    /// - Returns `ErrorType::Config` if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, trans_db_path: Option<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the findash home directory")
            .pub_result(ErrorType::Config)?;
        let root = utils::canonicalize(&maybe_relative)
            .await
            .pub_result(ErrorType::Config)?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::new(trans_db_path);
        config_file
            .save(&config_path)
            .await
            .pub_result(ErrorType::Config)?;

        let config = Self {
            root,
            config_path,
            config_file,
        };
        utils::make_dir(&config.trans_db_path())
            .await
            .context("Unable to create the transactions store directory")
            .pub_result(ErrorType::Config)?;
        Ok(config)
    }

    /// Validates that `findash_home` and its config file exist, then loads the config file.
    pub async fn load(findash_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = findash_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("findash home is missing, run 'findash init' first")
            .pub_result(ErrorType::Config)?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            fail!(
                ErrorType::Config,
                "The config file is missing '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile::load(&config_path)
            .await
            .pub_result(ErrorType::Config)?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the store directory if it is absolute, otherwise resolves it against the root.
    pub fn trans_db_path(&self) -> PathBuf {
        let p = self.config_file.trans_db_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Loads every partition of the configured store.
    pub fn open_db(&self) -> Result<TransactionsDb> {
        TransactionsDb::open(self.trans_db_path())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "findash",
///   "config_version": 1,
///   "trans_db_path": "transactions"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "findash"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the transactions store (optional, relative to config.json or absolute)
    /// Defaults to $FINDASH_HOME/transactions if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    trans_db_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ConfigFile {
    fn new(trans_db_path: Option<PathBuf>) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            trans_db_path,
        }
    }

    /// Loads a ConfigFile from `path` and validates its `app_name`.
    async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// If None, defaults to `transactions`, i.e. `$FINDASH_HOME/transactions`.
    fn trans_db_path(&self) -> PathBuf {
        self.trans_db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TRANS_DB_PATH))
    }
}
