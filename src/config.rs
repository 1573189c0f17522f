//! Configuration management for kvfs
//!
//! Values come from an optional `config.toml` with `KVFS_` environment
//! overrides layered on top. Every key has a built-in default, so an empty
//! configuration is valid.

use config::{Config, Environment, File};
use serde::Deserialize;

/// Complete filesystem configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KvfsConfig {
    /// Root path a new session starts in
    pub root_path: String,

    pub scan: ScanOptions,

    pub transfer: TransferOptions,

    /// What make-directory (and writes) do about missing ancestors
    pub parent_policy: ParentPolicy,

    /// Use the store's atomic batches for rename and directory deletion
    /// when it offers them
    pub atomic_rename: bool,
}

/// Page sizes for the cursor scans
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScanOptions {
    /// Directory markers fetched per scan call while listing
    pub dir_page_size: usize,

    /// File keys fetched per scan call while listing
    pub file_page_size: usize,

    /// Marker keys removed per round of directory deletion
    pub delete_page_size: usize,
}

/// Streaming limits for file content
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransferOptions {
    /// Bytes moved per store call when reading or writing content
    pub chunk_size: usize,

    /// Maximum file size in MB accepted by a write
    pub max_file_size_mb: u64,
}

/// Ancestor handling for directory creation
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParentPolicy {
    /// Create only the requested marker; ancestors may be missing
    #[default]
    Lazy,
    /// Create a marker for every missing ancestor as well
    CreateAncestors,
    /// Refuse unless the parent already exists
    RequireExisting,
}

impl Default for KvfsConfig {
    fn default() -> Self {
        Self {
            root_path: "/".to_string(),
            scan: ScanOptions::default(),
            transfer: TransferOptions::default(),
            parent_policy: ParentPolicy::Lazy,
            atomic_rename: true,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            dir_page_size: 1,
            file_page_size: 100,
            delete_page_size: 10,
        }
    }
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            max_file_size_mb: 100,
        }
    }
}

impl KvfsConfig {
    /// Load configuration from ./config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from `path` (extension optional) with environment
    /// overrides such as `KVFS_SCAN__FILE_PAGE_SIZE=50`
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("KVFS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: KvfsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.root_path.starts_with('/') {
            return Err(config::ConfigError::Message(
                "root_path must be absolute".into(),
            ));
        }

        if self.scan.dir_page_size == 0
            || self.scan.file_page_size == 0
            || self.scan.delete_page_size == 0
        {
            return Err(config::ConfigError::Message(
                "scan page sizes must be greater than 0".into(),
            ));
        }

        if self.transfer.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chunk_size must be greater than 0".into(),
            ));
        }

        if self.transfer.max_file_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl TransferOptions {
    /// Get maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
