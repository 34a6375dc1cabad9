//! Session with the Oasis app on one Ledger device.
//!
//! [`OasisApp`] owns an open transport handle and the identity last reported
//! by the device. It frames every request, picks the command class from the
//! cached app mode, and drives single and multi-chunk exchanges.
//!
//! # Example
//!
//! ```ignore
//! use oasis_ledger_core::{DerivationPath, OasisApp};
//!
//! let mut app = OasisApp::new(transport);
//! let version = app.get_version()?;
//! app.check_version(&version)?;
//!
//! let path = DerivationPath::oasis(0);
//! let address = app.get_address(&path)?;
//! let signature = app.sign(&path, b"oasis-core/consensus: tx for chain ...", &tx)?;
//! app.close()?;
//! ```

use std::fmt;
use std::sync::Arc;

use super::Transport;
use super::apdu::{Command, ins};
use super::observer::{ExchangeObserver, Operation, TracingObserver};
use crate::chunk::prepare_chunks;
use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::path::{DerivationPath, PATH_LEN};
use crate::version::{AppMode, AppVersion, check_minimum};

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Shortest valid address response: public key plus a minimal address.
pub const MIN_ADDRESS_RESPONSE_LEN: usize = 39;

/// Public key and bech32 address reported for a derivation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressInfo {
    /// Ed25519 public key.
    pub public_key: [u8; PUBLIC_KEY_LEN],

    /// Bech32 address text, passed through as sent by the device.
    ///
    /// The text is not validated beyond being UTF-8.
    pub address: String,
}

impl AddressInfo {
    /// Parses an address response: `[public key: 32][address text]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the response is shorter than
    /// [`MIN_ADDRESS_RESPONSE_LEN`] or the address is not valid UTF-8.
    pub fn from_response(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_ADDRESS_RESPONSE_LEN {
            return Err(Error::MalformedResponse(format!(
                "address response is {} bytes, expected at least {MIN_ADDRESS_RESPONSE_LEN}",
                data.len()
            )));
        }

        let (public_key, address) = data.split_at(PUBLIC_KEY_LEN);
        let public_key: [u8; PUBLIC_KEY_LEN] = public_key
            .try_into()
            .map_err(|_| Error::MalformedResponse("invalid public key length".to_string()))?;

        let address = String::from_utf8(address.to_vec())
            .map_err(|e| Error::MalformedResponse(format!("address is not valid UTF-8: {e}")))?;

        Ok(Self {
            public_key,
            address,
        })
    }
}

/// A session with the Oasis app.
///
/// Exchanges are strictly sequential: every method that talks to the device
/// takes `&mut self` and blocks until the device answers.
pub struct OasisApp {
    /// The underlying transport handle.
    transport: Box<dyn Transport>,

    /// Identity last reported by the device, or seeded with a known mode.
    version: AppVersion,

    /// Session configuration.
    config: LedgerConfig,

    /// Receives every exchange.
    observer: Arc<dyn ExchangeObserver>,
}

impl fmt::Debug for OasisApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OasisApp")
            .field("version", &self.version)
            .field("config", &self.config)
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}

impl OasisApp {
    /// Creates a session with the default configuration, logging through
    /// [`TracingObserver`].
    ///
    /// The app mode is unknown until [`get_version`](Self::get_version) is
    /// called, so requests use the consumer command class.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let config = LedgerConfig::default();
        let observer = Arc::new(TracingObserver::new(config.log_module.clone()));
        Self::with_config(transport, config, observer)
    }

    /// Creates a session with an explicit configuration and observer.
    #[must_use]
    pub fn with_config(
        transport: Box<dyn Transport>,
        config: LedgerConfig,
        observer: Arc<dyn ExchangeObserver>,
    ) -> Self {
        Self {
            transport,
            version: AppVersion::default(),
            config,
            observer,
        }
    }

    /// Seeds the cached identity with a known app mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AppMode) -> Self {
        self.version = AppVersion::with_mode(mode);
        self
    }

    /// Returns the cached app identity.
    #[must_use]
    pub const fn version(&self) -> AppVersion {
        self.version
    }

    /// Returns the cached app mode.
    #[must_use]
    pub const fn mode(&self) -> AppMode {
        self.version.mode
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the command class for the cached mode.
    const fn cla(&self) -> u8 {
        self.version.mode.cla()
    }

    /// Sends one command and returns the answer data.
    fn exchange(&mut self, operation: Operation, command: &Command) -> Result<Vec<u8>> {
        command.validate()?;
        let request = command.to_bytes();

        match self.transport.exchange(command) {
            Ok(answer) => {
                self.observer.exchanged(operation, &request, &answer);
                answer.into_result()
            }
            Err(err) => {
                self.observer.failed(operation, &request, &err);
                Err(err)
            }
        }
    }

    /// Queries the app mode and version, caching the result.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedResponse`] if the answer is shorter than four bytes
    /// - transport and status errors from the exchange
    pub fn get_version(&mut self) -> Result<AppVersion> {
        let command = Command::new(self.cla(), ins::GET_VERSION, 0, 0, Vec::new());
        let response = self.exchange(Operation::GetVersion, &command)?;

        self.version = AppVersion::from_response(&response)?;
        Ok(self.version)
    }

    /// Checks a reported version against the configured minimum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] if `version` is too old.
    pub fn check_version(&self, version: &AppVersion) -> Result<()> {
        check_minimum(version, self.config.minimum_version)
    }

    /// Retrieves the Ed25519 public key for a path.
    ///
    /// Does not require confirmation on the device.
    ///
    /// # Errors
    ///
    /// See [`get_address`](Self::get_address).
    pub fn get_public_key(&mut self, path: &DerivationPath) -> Result<[u8; PUBLIC_KEY_LEN]> {
        self.retrieve_address(path, false).map(|info| info.public_key)
    }

    /// Retrieves the public key and address for a path.
    ///
    /// Does not require confirmation on the device.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedResponse`] if the answer is shorter than 39 bytes
    /// - transport and status errors from the exchange
    pub fn get_address(&mut self, path: &DerivationPath) -> Result<AddressInfo> {
        self.retrieve_address(path, false)
    }

    /// Retrieves the public key and address for a path, displaying the
    /// address on the device.
    ///
    /// Requires confirmation on the device.
    ///
    /// # Errors
    ///
    /// See [`get_address`](Self::get_address); a declined confirmation is
    /// reported as [`Error::DeviceRejected`].
    pub fn show_address(&mut self, path: &DerivationPath) -> Result<AddressInfo> {
        self.retrieve_address(path, true)
    }

    fn retrieve_address(
        &mut self,
        path: &DerivationPath,
        require_confirmation: bool,
    ) -> Result<AddressInfo> {
        let path_bytes = path.encode(PATH_LEN)?;
        let p1 = u8::from(require_confirmation);

        let command = Command::new(
            self.cla(),
            ins::GET_ADDR_ED25519,
            p1,
            0,
            path_bytes.to_vec(),
        );
        let response = self.exchange(Operation::GetAddress, &command)?;

        AddressInfo::from_response(&response)
    }

    /// Signs a transaction with the key for `path`.
    ///
    /// The request is sent as a sequence of chunks; only the answer to the
    /// final chunk, the signature, is returned. Requires confirmation on the
    /// device.
    ///
    /// # Errors
    ///
    /// - [`Error::PayloadTooLarge`] if `context` is longer than 255 bytes
    /// - [`Error::DeviceRejected`] if the device refuses to sign, with the
    ///   device's explanation
    /// - transport and status errors from any exchange; the operation stops
    ///   at the first failing chunk
    pub fn sign(
        &mut self,
        path: &DerivationPath,
        context: &[u8],
        transaction: &[u8],
    ) -> Result<Vec<u8>> {
        let path_bytes = path.encode(PATH_LEN)?;
        let chunks = prepare_chunks(&path_bytes, context, transaction, self.config.chunk_size)?;

        let mut response = Vec::new();
        for chunk in &chunks {
            let command = Command::new(
                self.cla(),
                ins::SIGN_ED25519,
                chunk.kind().p1(),
                0,
                chunk.data().to_vec(),
            );
            response = self.exchange(Operation::Sign, &command)?;
        }

        Ok(response)
    }

    /// Closes the session, releasing the transport handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to close.
    pub fn close(mut self) -> Result<()> {
        self.transport.close()
    }
}
