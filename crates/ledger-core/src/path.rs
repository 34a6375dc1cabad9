//! BIP44 derivation paths and their device encoding.
//!
//! The Oasis app derives keys from a five level path
//! `purpose / coin type / account / change / index`. On the wire each index
//! is sent as four little-endian bytes, with the hardened bit forced on a
//! caller-chosen number of leading indices.
//!
//! # Example
//!
//! ```
//! use oasis_ledger_core::DerivationPath;
//!
//! let path: DerivationPath = "m/44'/474'/0'/0'/0'".parse().unwrap();
//! let bytes = path.encode(5).unwrap();
//! assert_eq!(&bytes[0..4], &[44, 0, 0, 0x80]);
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of indices in a derivation path.
pub const PATH_LEN: usize = 5;

/// Length of an encoded derivation path.
pub const PATH_BYTES_LEN: usize = PATH_LEN * 4;

/// Hardened derivation flag.
pub const HARDENED: u32 = 0x8000_0000;

/// Standard BIP44 purpose.
pub const PURPOSE_BIP44: u32 = 44;

/// Purpose reserved for consensus keys; selects the Validator app mode.
pub const PURPOSE_CONSENSUS: u32 = 43;

/// Registered coin type for Oasis.
pub const COIN_TYPE_OASIS: u32 = 474;

/// Encodes a derivation path for the device.
///
/// The hardened bit is forced on the first `harden_count` indices regardless
/// of how they were supplied; the remaining indices are encoded as given.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if `path` does not have exactly five
/// indices or `harden_count` is greater than five.
pub fn encode_path(path: &[u32], harden_count: usize) -> Result<[u8; PATH_BYTES_LEN]> {
    if path.len() != PATH_LEN {
        return Err(Error::InvalidPath(format!(
            "expected {PATH_LEN} indices, got {}",
            path.len()
        )));
    }
    if harden_count > PATH_LEN {
        return Err(Error::InvalidPath(format!(
            "cannot harden {harden_count} of {PATH_LEN} indices"
        )));
    }

    let mut bytes = [0u8; PATH_BYTES_LEN];
    for (i, (index, out)) in path.iter().zip(bytes.chunks_exact_mut(4)).enumerate() {
        let value = if i < harden_count {
            index | HARDENED
        } else {
            *index
        };
        out.copy_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

/// A five level BIP44 derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivationPath([u32; PATH_LEN]);

impl DerivationPath {
    /// Creates a path from a slice of indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] unless exactly five indices are given.
    pub fn new(indices: &[u32]) -> Result<Self> {
        let indices: [u32; PATH_LEN] = indices.try_into().map_err(|_| {
            Error::InvalidPath(format!(
                "expected {PATH_LEN} indices, got {}",
                indices.len()
            ))
        })?;
        Ok(Self(indices))
    }

    /// Returns the standard Oasis account path `44/474/0/0/account`.
    ///
    /// Every index is hardened when the path is sent to the device.
    #[must_use]
    pub const fn oasis(account: u32) -> Self {
        Self([PURPOSE_BIP44, COIN_TYPE_OASIS, 0, 0, account])
    }

    /// Returns the consensus key path `43/474/0/0/index`.
    #[must_use]
    pub const fn consensus(index: u32) -> Self {
        Self([PURPOSE_CONSENSUS, COIN_TYPE_OASIS, 0, 0, index])
    }

    /// Returns the raw indices.
    #[must_use]
    pub const fn indices(&self) -> &[u32; PATH_LEN] {
        &self.0
    }

    /// Encodes the path, hardening the first `harden_count` indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `harden_count` is greater than five.
    pub fn encode(&self, harden_count: usize) -> Result<[u8; PATH_BYTES_LEN]> {
        encode_path(&self.0, harden_count)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in self.0 {
            if index & HARDENED == 0 {
                write!(f, "/{index}")?;
            } else {
                write!(f, "/{}'", index & !HARDENED)?;
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    /// Parses `m/44'/474'/0'/0'/0'`. The leading `m/` is optional and `h` is
    /// accepted in place of `'`.
    fn from_str(s: &str) -> Result<Self> {
        let body = s.strip_prefix("m/").unwrap_or(s);
        let indices = body
            .split('/')
            .map(|part| {
                let (digits, hardened) = match part.strip_suffix(['\'', 'h']) {
                    Some(digits) => (digits, true),
                    None => (part, false),
                };
                let index: u32 = digits
                    .parse()
                    .map_err(|_| Error::InvalidPath(format!("invalid index {part:?} in {s:?}")))?;
                if index & HARDENED != 0 {
                    return Err(Error::InvalidPath(format!("index {index} out of range")));
                }
                Ok(if hardened { index | HARDENED } else { index })
            })
            .collect::<Result<Vec<u32>>>()?;
        Self::new(&indices)
    }
}
