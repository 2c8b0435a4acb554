use crate::transport::TransportError;

/// Errors surfaced by the send pipeline.
///
/// Cryptographic and precondition failures are always raised; only
/// transport-delivery failures respect the fail-silently policy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message carries no sender address. Always raised, regardless of
    /// fail-silently.
    #[error("Sender address not supplied")]
    MissingSender,

    /// An encrypt call received an empty identity set.
    #[error("Encrypting recipient identities not supplied")]
    InvalidRecipients,

    /// An encrypt call received an empty message.
    #[error("Valid Message not supplied")]
    InvalidMessage,

    /// A certificate could not be parsed, or lacks a subject email address
    /// where one is required.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Detached signing failed. Fatal for the whole send; never degrades to
    /// unsigned delivery once signing was attempted.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Payload encryption failed. Fatal for the whole send.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// A transport leg failed in fail-loud mode before any leg succeeded.
    #[error("delivery failed: {0}")]
    Delivery(#[source] TransportError),

    /// The encrypted leg failed after earlier legs had already gone out.
    /// Carries the count of legs that succeeded before the error.
    #[error("only partial success ({legs_sent} legs sent before error): {cause}")]
    PartialDelivery {
        legs_sent: usize,
        #[source]
        cause: TransportError,
    },

    /// Configuration could not be read or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The identity store could not be read or written.
    #[error("identity store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
