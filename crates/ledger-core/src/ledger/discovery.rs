//! Device discovery and selection.
//!
//! [`Discovery`] walks the devices reported by a [`DeviceProvider`] in
//! enumeration order and applies one of three policies:
//!
//! - [`list_candidates`](Discovery::list_candidates): probe every device and
//!   report the ones that answer, closing all handles
//! - [`connect`](Discovery::connect): return the first device exposing a given
//!   address for a path
//! - [`find_any`](Discovery::find_any): return the first device running a
//!   supported app version
//!
//! Failures on one device never abort the walk; the device is closed and the
//! next one is tried. The handle of the selected device moves to the caller
//! inside the returned [`OasisApp`].

use std::sync::Arc;

use super::DeviceProvider;
use super::app::OasisApp;
use super::observer::{ExchangeObserver, TracingObserver};
use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::path::DerivationPath;
use crate::version::{AppMode, AppVersion};

/// A device that answered the version and address probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Enumeration index of the device.
    pub index: usize,

    /// Identity reported by the app.
    pub version: AppVersion,

    /// Public key for the probed path.
    pub public_key: [u8; 32],

    /// Address for the probed path.
    pub address: String,
}

/// Finds Oasis apps among connected devices.
#[derive(Debug)]
pub struct Discovery<P> {
    provider: P,
    config: LedgerConfig,
    observer: Arc<dyn ExchangeObserver>,
}

impl<P: DeviceProvider> Discovery<P> {
    /// Creates a discovery over `provider` with the default configuration.
    #[must_use]
    pub fn new(provider: P) -> Self {
        let config = LedgerConfig::default();
        let observer = Arc::new(TracingObserver::new(config.log_module.clone()));
        Self::with_config(provider, config, observer)
    }

    /// Creates a discovery whose sessions use `config` and `observer`.
    #[must_use]
    pub fn with_config(
        provider: P,
        config: LedgerConfig,
        observer: Arc<dyn ExchangeObserver>,
    ) -> Self {
        Self {
            provider,
            config,
            observer,
        }
    }

    /// Opens the device at `index` as a session, or logs why it could not.
    fn open(&self, index: usize) -> Option<OasisApp> {
        match self.provider.open(index) {
            Ok(transport) => Some(OasisApp::with_config(
                transport,
                self.config.clone(),
                Arc::clone(&self.observer),
            )),
            Err(err) => {
                tracing::debug!(index, %err, "skipping device: open failed");
                None
            }
        }
    }

    /// Closes a session that was not selected.
    fn discard(app: OasisApp, index: usize, reason: &Error) {
        tracing::debug!(index, %reason, "skipping device");
        if let Err(err) = app.close() {
            tracing::warn!(index, %err, "failed to close device");
        }
    }

    /// Probes every device for its version and the address of `path`.
    ///
    /// Devices that cannot be opened or fail either probe are skipped. Every
    /// opened handle is closed before returning.
    #[must_use]
    pub fn list_candidates(&self, path: &DerivationPath) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for index in 0..self.provider.device_count() {
            let Some(mut app) = self.open(index) else {
                continue;
            };

            let probe = app
                .get_version()
                .and_then(|version| Ok((version, app.get_address(path)?)));

            match probe {
                Ok((version, info)) => {
                    candidates.push(Candidate {
                        index,
                        version,
                        public_key: info.public_key,
                        address: info.address,
                    });
                    if let Err(err) = app.close() {
                        tracing::warn!(index, %err, "failed to close device");
                    }
                }
                Err(err) => Self::discard(app, index, &err),
            }
        }

        candidates
    }

    /// Connects to the first device exposing `seeking_address` for `path`.
    ///
    /// The app mode is derived from the path's purpose before any device is
    /// touched, and no version check is performed. An empty
    /// `seeking_address` selects the first device that answers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if no device matches.
    pub fn connect(&self, seeking_address: &str, path: &DerivationPath) -> Result<OasisApp> {
        let mode = AppMode::for_path(path);

        for index in 0..self.provider.device_count() {
            let Some(app) = self.open(index) else {
                continue;
            };
            let mut app = app.with_mode(mode);

            match app.get_address(path) {
                Ok(info) if seeking_address.is_empty() || info.address == seeking_address => {
                    tracing::debug!(index, address = %info.address, %mode, "connected to device");
                    return Ok(app);
                }
                Ok(info) => {
                    let reason = Error::AddressNotFound(seeking_address.to_string());
                    tracing::debug!(index, address = %info.address, "address does not match");
                    Self::discard(app, index, &reason);
                }
                Err(err) => Self::discard(app, index, &err),
            }
        }

        Err(Error::AddressNotFound(seeking_address.to_string()))
    }

    /// Connects to the first device running a supported app version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AppNotFound`] if no device passes the version query
    /// and the minimum version check.
    pub fn find_any(&self) -> Result<OasisApp> {
        for index in 0..self.provider.device_count() {
            let Some(mut app) = self.open(index) else {
                continue;
            };

            let checked = app
                .get_version()
                .and_then(|version| app.check_version(&version).map(|()| version));

            match checked {
                Ok(version) => {
                    tracing::debug!(index, %version, mode = %version.mode, "found Oasis app");
                    return Ok(app);
                }
                Err(err) => Self::discard(app, index, &err),
            }
        }

        Err(Error::AppNotFound)
    }
}
