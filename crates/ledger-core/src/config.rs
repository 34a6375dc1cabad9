//! Client configuration.
//!
//! Settings that shape every session: the oldest app version accepted during
//! discovery, the chunk size used when signing, and the module name attached
//! to log events. Values can be loaded from a TOML file; missing keys fall
//! back to their defaults.
//!
//! ```toml
//! chunk_size = 250
//! log_module = "ledger/oasis"
//!
//! [minimum_version]
//! major = 0
//! minor = 0
//! patch = 3
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::Version;

/// Default signing chunk size, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// Default log module name.
pub const DEFAULT_LOG_MODULE: &str = "ledger/oasis";

/// Oldest Oasis app version accepted by default.
pub const DEFAULT_MINIMUM_VERSION: Version = Version::new(0, 0, 3);

/// Configuration shared by every session opened by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Oldest app version accepted when searching for a device.
    pub minimum_version: Version,

    /// Maximum number of bytes sent in one signing chunk.
    pub chunk_size: usize,

    /// Module name attached to exchange log events.
    pub log_module: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            minimum_version: DEFAULT_MINIMUM_VERSION,
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_module: DEFAULT_LOG_MODULE.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the document cannot be parsed or a
    /// value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file cannot be read or parsed,
    /// or a value is out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading ledger configuration");

        let content = fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the chunk size does not fit the
    /// single-byte length field or the log module name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > usize::from(u8::MAX) {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be between 1 and 255, got {}",
                self.chunk_size
            )));
        }
        if self.log_module.is_empty() {
            return Err(Error::InvalidConfig(
                "log_module must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
