//! Delivery backends.
//!
//! The mailer hands each leg to a [`Transport`] as a fully-encoded wire
//! message plus a flat recipient set; transports never re-inspect
//! encryption state.

pub mod memory;
pub mod smtp;

use std::collections::BTreeSet;
use std::error::Error as StdError;

/// Error raised by a transport for a single delivery attempt or for the
/// connection lifecycle.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A delivery backend. Each `deliver` call is a single atomic attempt with
/// a success-or-error outcome; retry and timeout policy belong to the
/// implementation, never to the mailer.
pub trait Transport {
    /// Open the underlying connection, if any. Returns true when this call
    /// created it; callers must close only what they opened.
    fn open(&mut self) -> Result<bool, TransportError> {
        Ok(false)
    }

    /// Deliver one fully-encoded message to a flat recipient set.
    fn deliver(
        &mut self,
        sender: &str,
        recipients: &BTreeSet<String>,
        message: &str,
    ) -> Result<(), TransportError>;

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
