//! # Transport Abstraction
//!
//! A minimal, async interface for delivering a call to the host and bringing
//! its result back.
//!
//! ## Philosophy
//!
//! - **Shape-Oriented**: The transport moves [`Call`]s and [`CallResult`]s. How they
//!   are encoded on the way (JSON, a binary format, nothing at all) is its own business.
//! - **Request-Response**: One call, one result. No sessions, no batching, no
//!   ordering between concurrent calls beyond what the carrier itself provides.

use std::fmt;

use crate::message::Call;
use crate::message::CallResult;

/// Errors that occur while moving a call or its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The host is unreachable or went away while the call was in flight.
    ConnectionLost(String),
    /// Encoding, decoding, or any other carrier failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A mechanism to send a call and receive its result.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Delivers `call` and waits for the host's result.
    ///
    /// # invariants
    /// - Must return `Ok(result)` whenever the host produced a result, including
    ///   `CallResult::Throw`; a thrown call is not a transport failure.
    /// - Must return `Err` only when the call or its result could not be moved.
    async fn call(&self, call: Call) -> Result<CallResult>;
}
