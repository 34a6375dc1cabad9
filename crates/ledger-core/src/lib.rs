//! Oasis Ledger Client Core Library
//!
//! This crate drives the Oasis app on a Ledger hardware wallet: it reports
//! the app's identity, derives Ed25519 public keys and addresses from BIP44
//! paths, and signs transactions. Private keys never leave the device.
//!
//! # Overview
//!
//! The Oasis app runs in one of two modes. The Validator mode signs consensus
//! messages and is addressed with command class `0xF5`; every other mode is
//! addressed with class `0x05`. A session remembers the mode last reported by
//! the device and picks the class for every request from it.
//!
//! This library provides:
//!
//! - **Path Encoding**: BIP44 paths with forced hardening on the wire
//! - **Chunking**: splitting signing requests into device-sized pieces
//! - **Version Gating**: parsing app identity and enforcing a minimum version
//! - **Sessions**: framing and sequencing of every exchange with a device
//! - **Discovery**: selecting a device by address or by supported version
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Discovery    │   OasisApp session   │   Config / Observer  │
//! ├─────────────────────────────────────────────────────────────┤
//! │   Path Encoder   │   Chunker   │   Version   │    APDU      │
//! ├─────────────────────────────────────────────────────────────┤
//! │        Transport / DeviceProvider (USB HID, simulator)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Encoding a Path
//!
//! ```rust
//! use oasis_ledger_core::DerivationPath;
//!
//! let path: DerivationPath = "m/44'/474'/0'/0'/0'".parse().unwrap();
//! let bytes = path.encode(5).unwrap();
//! assert_eq!(bytes.len(), 20);
//! ```
//!
//! ## Deriving the App Mode
//!
//! ```rust
//! use oasis_ledger_core::{AppMode, DerivationPath};
//!
//! let path = DerivationPath::consensus(0);
//! assert_eq!(AppMode::for_path(&path), AppMode::Validator);
//! assert_eq!(AppMode::for_path(&path).cla(), 0xF5);
//! ```
//!
//! ## Signing
//!
//! ```ignore
//! use oasis_ledger_core::ledger::{Discovery, HidProvider};
//! use oasis_ledger_core::DerivationPath;
//!
//! let path = DerivationPath::oasis(0);
//! let discovery = Discovery::new(HidProvider::new()?);
//! let mut app = discovery.connect("", &path)?;
//! let signature = app.sign(&path, context, &transaction)?;
//! app.close()?;
//! ```
//!
//! # Feature Flags
//!
//! - `hid`: native USB HID transport for real Ledger devices
//!
//! # Logging
//!
//! Every session reports its exchanges to an injected
//! [`ledger::ExchangeObserver`]. The default observer emits `tracing` events;
//! install a subscriber to see them.

// Modules
pub mod chunk;
pub mod config;
pub mod error;
pub mod ledger;
pub mod path;
pub mod version;

// Re-exports for convenience
pub use chunk::{Chunk, ChunkKind, prepare_chunks};
pub use config::LedgerConfig;
pub use error::{Error, Result};
pub use ledger::{AddressInfo, Discovery, OasisApp};
pub use path::{DerivationPath, encode_path};
pub use version::{AppMode, AppVersion, SignerRole, Version, check_minimum};
