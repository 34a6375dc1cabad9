//! App identity: mode and version of the Oasis app running on a device.
//!
//! The Oasis app reports its mode together with a `major.minor.patch` version
//! in response to the version query. The mode decides which command class is
//! used for every exchange on a session.
//!
//! # Example
//!
//! ```
//! use oasis_ledger_core::version::{AppMode, Version, check_minimum};
//! use oasis_ledger_core::AppVersion;
//!
//! let reported = AppVersion::new(AppMode::Consumer, 1, 2, 0);
//! assert!(check_minimum(&reported, Version::new(0, 0, 3)).is_ok());
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{DerivationPath, PURPOSE_CONSENSUS};

/// Command class used by the Validator app.
pub const CLA_VALIDATOR: u8 = 0xF5;

/// Command class used by every other app mode.
pub const CLA_CONSUMER: u8 = 0x05;

/// Mode the Oasis app is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AppMode {
    /// Consensus signing (`CLA 0xF5`).
    Validator,

    /// Regular account signing (`CLA 0x05`).
    Consumer,

    /// Mode not reported yet, or not recognized.
    #[default]
    Unknown,
}

impl AppMode {
    /// Decodes the mode byte of a version response.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Validator,
            2 => Self::Consumer,
            _ => Self::Unknown,
        }
    }

    /// Returns the mode implied by a derivation path.
    ///
    /// A first index equal to the reserved consensus purpose selects
    /// [`AppMode::Validator`]. Any other first index, including a hardened
    /// `43'`, selects [`AppMode::Consumer`].
    #[must_use]
    pub const fn for_path(path: &DerivationPath) -> Self {
        if path.indices()[0] == PURPOSE_CONSENSUS {
            Self::Validator
        } else {
            Self::Consumer
        }
    }

    /// Returns the mode compatible with a signer role.
    #[must_use]
    pub const fn for_role(role: SignerRole) -> Self {
        match role {
            SignerRole::Consensus => Self::Validator,
            _ => Self::Consumer,
        }
    }

    /// Returns the command class byte for this mode.
    ///
    /// [`AppMode::Unknown`] is treated like [`AppMode::Consumer`].
    #[must_use]
    pub const fn cla(self) -> u8 {
        match self {
            Self::Validator => CLA_VALIDATOR,
            Self::Consumer | Self::Unknown => CLA_CONSUMER,
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validator => "validator",
            Self::Consumer => "consumer",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Role a signer key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerRole {
    /// Entity (account) key.
    Entity,

    /// Node identity key.
    Node,

    /// P2P transport key.
    P2p,

    /// Consensus signing key.
    Consensus,
}

/// A `major.minor.patch` version, ordered lexicographically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Version {
    /// Major version.
    pub major: u8,

    /// Minor version.
    pub minor: u8,

    /// Patch version.
    pub patch: u8,
}

impl Version {
    /// Creates a new version.
    #[must_use]
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Identity reported by the Oasis app in response to the version query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AppVersion {
    /// Mode the app runs in.
    pub mode: AppMode,

    /// Major version.
    pub major: u8,

    /// Minor version.
    pub minor: u8,

    /// Patch version.
    pub patch: u8,
}

impl AppVersion {
    /// Length of the version response that is actually parsed.
    pub const RESPONSE_LEN: usize = 4;

    /// Creates a new app version.
    #[must_use]
    pub const fn new(mode: AppMode, major: u8, minor: u8, patch: u8) -> Self {
        Self {
            mode,
            major,
            minor,
            patch,
        }
    }

    /// Returns an identity carrying only a mode, with a zero version.
    ///
    /// Used for sessions whose mode is known before the device is queried.
    #[must_use]
    pub const fn with_mode(mode: AppMode) -> Self {
        Self::new(mode, 0, 0, 0)
    }

    /// Parses a version response: `[mode][major][minor][patch]`.
    ///
    /// Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if fewer than four bytes are given.
    pub fn from_response(data: &[u8]) -> Result<Self> {
        match data {
            [mode, major, minor, patch, ..] => {
                Ok(Self::new(AppMode::from_byte(*mode), *major, *minor, *patch))
            }
            _ => Err(Error::MalformedResponse(format!(
                "version response is {} bytes, expected at least {}",
                data.len(),
                Self::RESPONSE_LEN
            ))),
        }
    }

    /// Returns the version triple without the mode.
    #[must_use]
    pub const fn version(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.version(), f)
    }
}

/// Checks a reported version against a minimum baseline.
///
/// # Errors
///
/// Returns [`Error::UnsupportedVersion`] if `version` is lexicographically
/// lower than `minimum`.
pub fn check_minimum(version: &AppVersion, minimum: Version) -> Result<()> {
    if version.version() < minimum {
        return Err(Error::UnsupportedVersion {
            found: *version,
            minimum,
        });
    }
    Ok(())
}
