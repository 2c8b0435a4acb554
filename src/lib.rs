//! # mailseal
//!
//! S/MIME signing and encryption for outbound mail.
//!
//! Recipients with a stored certificate get an encrypted copy, everyone
//! else gets plaintext, and the sender's key (when exactly one is known)
//! signs both. Delivery goes through a pluggable transport: real SMTP or
//! an in-memory capture for tests.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod error;
pub mod identity;
pub mod message;
pub mod transport;
