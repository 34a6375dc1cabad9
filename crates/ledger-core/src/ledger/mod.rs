//! Ledger device communication for the Oasis app.
//!
//! This module provides the command protocol spoken with the Oasis app:
//!
//! - Framing of commands and decoding of answers and status words
//! - Sessions that select the command class from the app mode and drive
//!   single and multi-chunk exchanges
//! - Discovery of devices and selection by version or address
//!
//! # Architecture
//!
//! - [`apdu`]: command/answer types and device status words
//! - [`app`]: the [`OasisApp`] session
//! - [`discovery`]: device enumeration and selection policies
//! - [`observer`]: the logging capability injected into sessions
//!
//! # Transport Abstraction
//!
//! The [`Transport`] and [`DeviceProvider`] traits abstract over how devices
//! are reached (USB HID, a simulator, a test double). The `hid` feature
//! enables an implementation over the native Ledger HID transport.
//!
//! # Example
//!
//! ```ignore
//! use oasis_ledger_core::ledger::{Discovery, HidProvider};
//! use oasis_ledger_core::DerivationPath;
//!
//! let discovery = Discovery::new(HidProvider::new()?);
//! let mut app = discovery.find_any()?;
//! let address = app.get_address(&DerivationPath::oasis(0))?;
//! ```

pub mod apdu;
pub mod app;
pub mod discovery;
pub mod observer;

#[cfg(feature = "hid")]
pub mod hid_transport;

pub use apdu::{ApduAnswer, Command, DeviceStatus};
pub use app::{AddressInfo, OasisApp};
pub use discovery::{Candidate, Discovery};
pub use observer::{ExchangeObserver, Operation, TracingObserver};

#[cfg(feature = "hid")]
pub use hid_transport::{HidProvider, HidTransport};

use crate::error::Result;

/// An open handle to one device.
///
/// Each call performs one blocking request/answer exchange. Timeouts and
/// cancellation, if any, belong to the implementation.
pub trait Transport {
    /// Sends a command and receives the device's answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange could not be completed. A non-success
    /// status word is not an error at this level; it is returned in the
    /// [`ApduAnswer`].
    fn exchange(&mut self, command: &Command) -> Result<ApduAnswer>;

    /// Releases the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device could not be closed.
    fn close(&mut self) -> Result<()>;
}

/// Enumerates devices and opens handles to them.
pub trait DeviceProvider {
    /// Returns the number of devices currently available.
    fn device_count(&self) -> usize;

    /// Opens the device at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is gone or cannot be opened.
    fn open(&self, index: usize) -> Result<Box<dyn Transport>>;
}
