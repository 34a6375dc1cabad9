//! Exchange observers.
//!
//! Every session reports each request/answer pair to an [`ExchangeObserver`]
//! given to it at construction. [`TracingObserver`] is the default and emits
//! `tracing` events with the frames hex-encoded.

use std::fmt;

use super::apdu::ApduAnswer;
use crate::error::Error;

/// Operation an exchange belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Version query.
    GetVersion,

    /// Public key and address query.
    GetAddress,

    /// One chunk of a signing request.
    Sign,
}

impl Operation {
    /// Returns a short name for log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetVersion => "get_version",
            Self::GetAddress => "get_address",
            Self::Sign => "sign",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives every exchange a session performs.
pub trait ExchangeObserver: fmt::Debug + Send + Sync {
    /// Called after the device answered `request`.
    fn exchanged(&self, operation: Operation, request: &[u8], answer: &ApduAnswer);

    /// Called when the transport failed to exchange `request`.
    fn failed(&self, operation: Operation, request: &[u8], error: &Error);
}

/// Observer that logs exchanges through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    module: String,
}

impl TracingObserver {
    /// Creates an observer tagging its events with `module`.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    /// Returns the module name attached to events.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOG_MODULE)
    }
}

impl ExchangeObserver for TracingObserver {
    fn exchanged(&self, operation: Operation, request: &[u8], answer: &ApduAnswer) {
        tracing::debug!(
            module = %self.module,
            %operation,
            request = %hex::encode(request),
            response = %hex::encode(answer.data()),
            status = format_args!("{:#06x}", answer.status()),
            "exchange"
        );
    }

    fn failed(&self, operation: Operation, request: &[u8], error: &Error) {
        tracing::error!(
            module = %self.module,
            %operation,
            request = %hex::encode(request),
            %error,
            "exchange failed"
        );
    }
}
