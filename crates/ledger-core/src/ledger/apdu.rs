//! APDU command and answer types for the Oasis app.
//!
//! # Command Structure
//!
//! ```text
//! | CLA | INS | P1 | P2 | Lc | Data |
//! |-----|-----|----|----|----|------|
//! | 1B  | 1B  | 1B | 1B | 1B | Var  |
//! ```
//!
//! - **CLA**: Command class, selected by the app mode
//! - **INS**: Instruction byte
//! - **P1, P2**: Parameter bytes
//! - **Lc**: Length of command data, always present
//! - **Data**: Command data, at most 255 bytes
//!
//! # Answer Structure
//!
//! ```text
//! | Data | SW1 | SW2 |
//! |------|-----|-----|
//! | Var  | 1B  | 1B  |
//! ```
//!
//! # Example
//!
//! ```
//! use oasis_ledger_core::ledger::{ApduAnswer, Command};
//!
//! let command = Command::new(0x05, 0x00, 0x00, 0x00, vec![]);
//! assert_eq!(command.to_bytes(), vec![0x05, 0x00, 0x00, 0x00, 0x00]);
//!
//! let answer = ApduAnswer::from_bytes(vec![0x02, 0x01, 0x00, 0x03, 0x90, 0x00]).unwrap();
//! assert!(answer.is_success());
//! assert_eq!(answer.data(), &[0x02, 0x01, 0x00, 0x03]);
//! ```

use core::fmt;

use crate::error::{Error, Result};

/// Oasis app instruction codes.
pub mod ins {
    /// Query app mode and version.
    pub const GET_VERSION: u8 = 0x00;

    /// Query the Ed25519 public key and bech32 address for a path.
    pub const GET_ADDR_ED25519: u8 = 0x01;

    /// Sign a transaction with the Ed25519 key for a path.
    pub const SIGN_ED25519: u8 = 0x02;
}

/// An APDU command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Class byte.
    cla: u8,

    /// Instruction byte.
    ins: u8,

    /// Parameter 1.
    p1: u8,

    /// Parameter 2.
    p2: u8,

    /// Command data.
    data: Vec<u8>,
}

impl Command {
    /// Maximum data length carried by one command.
    pub const MAX_DATA: usize = 255;

    /// Length of the command header, including `Lc`.
    pub const HEADER_LEN: usize = 5;

    /// Creates a new command.
    #[must_use]
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
        }
    }

    /// Returns the class byte.
    #[must_use]
    pub const fn cla(&self) -> u8 {
        self.cla
    }

    /// Returns the instruction byte.
    #[must_use]
    pub const fn ins(&self) -> u8 {
        self.ins
    }

    /// Returns parameter 1.
    #[must_use]
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Returns parameter 2.
    #[must_use]
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Returns the command data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Checks that the data fits the single-byte length field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the data is longer than 255 bytes.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() > Self::MAX_DATA {
            return Err(Error::PayloadTooLarge {
                len: self.data.len(),
                max: Self::MAX_DATA,
            });
        }
        Ok(())
    }

    /// Serializes the command to bytes.
    ///
    /// The length byte is always written, even for empty data. Data beyond
    /// [`Command::MAX_DATA`] is not representable; call
    /// [`validate`](Self::validate) first.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::HEADER_LEN + self.data.len());

        bytes.push(self.cla);
        bytes.push(self.ins);
        bytes.push(self.p1);
        bytes.push(self.p2);
        bytes.push(u8::try_from(self.data.len()).unwrap_or(u8::MAX));
        bytes.extend_from_slice(&self.data);

        bytes
    }
}

/// Status words the Oasis app is known to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DeviceStatus {
    /// No information given.
    ExecutionError = 0x6400,

    /// Wrong length.
    WrongLength = 0x6700,

    /// Empty buffer.
    EmptyBuffer = 0x6982,

    /// Output buffer too small.
    OutputBufferTooSmall = 0x6983,

    /// Referenced data reversibly blocked (invalidated).
    DataInvalid = 0x6984,

    /// Conditions of use not satisfied.
    ConditionsNotSatisfied = 0x6985,

    /// Command not allowed; the user declined the request.
    CommandNotAllowed = 0x6986,

    /// The parameters in the data field are incorrect.
    BadKeyHandle = 0x6A80,

    /// Invalid P1/P2.
    InvalidP1P2 = 0x6B00,

    /// Instruction not supported.
    InsNotSupported = 0x6D00,

    /// Class not supported; usually the wrong app is open.
    ClaNotSupported = 0x6E00,

    /// Unknown error.
    Unknown = 0x6F00,

    /// Signature verification failed.
    SignVerifyError = 0x6F01,
}

impl DeviceStatus {
    /// Decodes a status word, returning `None` for success and unknown codes.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        let status = match code {
            0x6400 => Self::ExecutionError,
            0x6700 => Self::WrongLength,
            0x6982 => Self::EmptyBuffer,
            0x6983 => Self::OutputBufferTooSmall,
            0x6984 => Self::DataInvalid,
            0x6985 => Self::ConditionsNotSatisfied,
            0x6986 => Self::CommandNotAllowed,
            0x6A80 => Self::BadKeyHandle,
            0x6B00 => Self::InvalidP1P2,
            0x6D00 => Self::InsNotSupported,
            0x6E00 => Self::ClaNotSupported,
            0x6F00 => Self::Unknown,
            0x6F01 => Self::SignVerifyError,
            _ => return None,
        };
        Some(status)
    }

    /// Returns the status word.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns `true` for statuses where the device refused the request and
    /// put an explanation in the answer data.
    #[must_use]
    pub const fn is_rejection(self) -> bool {
        matches!(
            self,
            Self::BadKeyHandle | Self::DataInvalid | Self::CommandNotAllowed
        )
    }

    /// Returns a short description of the status.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ExecutionError => "no information given",
            Self::WrongLength => "wrong length",
            Self::EmptyBuffer => "empty buffer",
            Self::OutputBufferTooSmall => "output buffer too small",
            Self::DataInvalid => "referenced data reversibly blocked (invalidated)",
            Self::ConditionsNotSatisfied => "conditions of use not satisfied",
            Self::CommandNotAllowed => "command not allowed",
            Self::BadKeyHandle => "the parameters in the data field are incorrect",
            Self::InvalidP1P2 => "invalid P1/P2",
            Self::InsNotSupported => "instruction not supported",
            Self::ClaNotSupported => "class not supported",
            Self::Unknown => "unknown error",
            Self::SignVerifyError => "signature verification failed",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x} {}", self.code(), self.description())
    }
}

/// An answer from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduAnswer {
    /// Answer data.
    data: Vec<u8>,

    /// Status word.
    status: u16,
}

impl ApduAnswer {
    /// Success status word (0x9000).
    pub const SW_SUCCESS: u16 = 0x9000;

    /// Creates an answer from its data and status word.
    #[must_use]
    pub const fn new(data: Vec<u8>, status: u16) -> Self {
        Self { data, status }
    }

    /// Parses raw answer bytes (data + SW1 + SW2).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if fewer than two bytes are given.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        let Some(split) = bytes.len().checked_sub(2) else {
            return Err(Error::MalformedResponse(format!(
                "answer is {} bytes, missing status word",
                bytes.len()
            )));
        };
        let status = u16::from_be_bytes([bytes[split], bytes[split + 1]]);
        bytes.truncate(split);

        Ok(Self::new(bytes, status))
    }

    /// Returns the answer data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the status word.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Checks if the answer indicates success (`SW = 0x9000`).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == Self::SW_SUCCESS
    }

    /// Returns the answer data if successful, or the matching error.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceRejected`] for known rejection statuses
    /// - [`Error::UnexpectedStatus`] for any other non-success status
    pub fn into_result(self) -> Result<Vec<u8>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(self.to_error())
        }
    }

    /// Converts the status word to an error.
    ///
    /// Rejection statuses carry the answer data as the device's explanation.
    #[must_use]
    pub fn to_error(&self) -> Error {
        match DeviceStatus::from_code(self.status) {
            Some(status) if status.is_rejection() => Error::DeviceRejected {
                status,
                reason: String::from_utf8_lossy(&self.data).into_owned(),
            },
            _ => Error::UnexpectedStatus(self.status),
        }
    }
}
