//! Error types for the Oasis Ledger client.
//!
//! This module provides a single error type [`enum@Error`] that covers every
//! failure mode when talking to the Oasis app on a Ledger device.
//!
//! # Error Categories
//!
//! - **Transport errors**: the adapter failed, or the device answered with a
//!   status word this crate does not recognize
//! - **Protocol errors**: the device answered successfully but the payload is
//!   too short or otherwise malformed
//! - **Device rejections**: the device refused a request and explained why
//! - **Input errors**: invalid derivation paths, oversized payloads, bad config
//! - **Discovery errors**: no connected device satisfied the selection policy
//!
//! # Example
//!
//! ```
//! use oasis_ledger_core::Error;
//!
//! fn example() -> Result<(), Error> {
//!     let err = Error::AppNotFound;
//!     assert!(matches!(err, Error::AppNotFound));
//!     Ok(())
//! }
//! ```

use core::result::Result as CoreResult;

use thiserror::Error;

use crate::ledger::apdu::DeviceStatus;
use crate::version::{AppVersion, Version};

/// The main error type for the Oasis Ledger client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The transport adapter failed to deliver the request or read the answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The device answered with a status word that is not a known rejection.
    #[error("unexpected status word: {0:#06x}")]
    UnexpectedStatus(u16),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The response from the device was too short or malformed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The Oasis app on the device is older than the configured minimum.
    #[error("app version {found} is older than the minimum {minimum}")]
    UnsupportedVersion {
        /// Version reported by the device.
        found: AppVersion,
        /// Configured minimum.
        minimum: Version,
    },

    /// The device refused the request.
    ///
    /// `reason` is the explanation text the device sent along with the status.
    #[error("device rejected request ({status}): {reason}")]
    DeviceRejected {
        /// Decoded status word.
        status: DeviceStatus,
        /// Device-supplied explanation.
        reason: String,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// The derivation path is malformed.
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// A payload exceeds the capacity of its length field.
    #[error("payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge {
        /// Actual payload length.
        len: usize,
        /// Largest length the field can carry.
        max: usize,
    },

    /// A configuration value is out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Discovery Errors
    // =========================================================================
    /// No connected device runs a supported Oasis app.
    #[error("no Oasis app found")]
    AppNotFound,

    /// No connected device exposes the requested address.
    #[error("no Oasis app with address {0} found")]
    AddressNotFound(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

/// A specialized [`Result`] type for Oasis Ledger operations.
pub type Result<T> = CoreResult<T, Error>;
