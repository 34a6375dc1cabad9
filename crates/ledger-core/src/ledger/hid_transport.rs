//! USB HID transport for native Ledger communication.
//!
//! This module provides [`DeviceProvider`] and [`Transport`] implementations
//! over the native Ledger HID transport, which works on macOS, Linux, and
//! Windows.
//!
//! # Example
//!
//! ```ignore
//! use oasis_ledger_core::ledger::{Discovery, HidProvider};
//!
//! let provider = HidProvider::new()?;
//! println!("{} Ledger device(s) connected", provider.device_count());
//!
//! let mut app = Discovery::new(provider).find_any()?;
//! let version = app.get_version()?;
//! ```

use std::fmt;

use ledger_transport::APDUCommand;
use ledger_transport_hid::TransportNativeHID;
use ledger_transport_hid::hidapi::{DeviceInfo, HidApi};

use super::apdu::{ApduAnswer, Command};
use super::{DeviceProvider, Transport};
use crate::error::{Error, Result};

/// Enumerates Ledger devices connected over USB HID.
pub struct HidProvider {
    /// The HID API context.
    api: HidApi,

    /// Ledger devices found at construction.
    devices: Vec<DeviceInfo>,
}

impl fmt::Debug for HidProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidProvider")
            .field("devices", &self.devices.len())
            .finish_non_exhaustive()
    }
}

impl HidProvider {
    /// Initializes HID access and lists connected Ledger devices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HID API cannot be initialized.
    pub fn new() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| Error::Transport(format!("failed to initialize HID: {e}")))?;
        let devices = TransportNativeHID::list_ledgers(&api).cloned().collect();

        Ok(Self { api, devices })
    }
}

impl DeviceProvider for HidProvider {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn open(&self, index: usize) -> Result<Box<dyn Transport>> {
        let info = self
            .devices
            .get(index)
            .ok_or_else(|| Error::Transport(format!("no Ledger device at index {index}")))?;

        let device = TransportNativeHID::open_device(&self.api, info)
            .map_err(|e| Error::Transport(format!("failed to open Ledger device: {e}")))?;

        Ok(Box::new(HidTransport {
            device: Some(device),
        }))
    }
}

/// An open USB HID handle to a Ledger device.
pub struct HidTransport {
    /// The HID device, `None` once closed.
    device: Option<TransportNativeHID>,
}

impl fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidTransport")
            .field("open", &self.device.is_some())
            .finish()
    }
}

impl Transport for HidTransport {
    fn exchange(&mut self, command: &Command) -> Result<ApduAnswer> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| Error::Transport("device is closed".to_string()))?;

        let apdu = APDUCommand {
            cla: command.cla(),
            ins: command.ins(),
            p1: command.p1(),
            p2: command.p2(),
            data: command.data().to_vec(),
        };
        let answer = device
            .exchange(&apdu)
            .map_err(|e| Error::Transport(format!("exchange failed: {e}")))?;

        Ok(ApduAnswer::new(answer.data().to_vec(), answer.retcode()))
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the HID device closes it.
        self.device.take();
        Ok(())
    }
}
