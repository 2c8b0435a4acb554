//! Stored cryptographic identities of mail participants.

pub mod store;

use std::fmt;

use crate::crypto::smime;
use crate::error::{Error, Result};
use crate::message::address::sanitize_address;

/// A known mail participant's cryptographic material: an address paired
/// with a PEM X.509 certificate, and a private key when mail *from* this
/// identity should be signed.
///
/// Several identities may share one address (mailing-list fan-out); the
/// mailer encrypts to every matching certificate. Signing instead requires
/// exactly one keyed identity at the sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    address: String,
    certificate: String,
    key: Option<String>,
}

impl Identity {
    /// Create an identity. A blank `address` is populated from the
    /// certificate's subject emailAddress attribute; a certificate without
    /// one fails.
    pub fn new(
        certificate: impl Into<String>,
        key: Option<String>,
        address: Option<String>,
    ) -> Result<Self> {
        let certificate = certificate.into();

        let address = match address.filter(|a| !a.trim().is_empty()) {
            Some(explicit) => sanitize_address(&explicit),
            None => smime::certificate_subject_email(&certificate)
                .map_err(|e| Error::Certificate(e.to_string()))?
                .map(|email| sanitize_address(&email))
                .ok_or_else(|| {
                    Error::Certificate(
                        "certificate subject carries no email address".to_string(),
                    )
                })?,
        };

        let key = key.filter(|k| !k.trim().is_empty());

        Ok(Self {
            address,
            certificate,
            key,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Whether this identity may sign outgoing mail.
    pub fn can_sign(&self) -> bool {
        self.key.is_some()
    }

    /// Colon-delimited uppercase hex SHA-1 digest of the certificate,
    /// left-padded to 40 hex characters before grouping. Display and audit
    /// only.
    pub fn fingerprint(&self) -> Result<String> {
        let digest = smime::certificate_fingerprint(&self.certificate)
            .map_err(|e| Error::Certificate(e.to_string()))?;
        Ok(format_fingerprint(&digest))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

fn format_fingerprint(digest: &[u8]) -> String {
    let padded = format!("{:0>40}", hex::encode_upper(digest));
    let groups: Vec<String> = padded
        .chars()
        .collect::<Vec<char>>()
        .chunks(2)
        .map(|pair| pair.iter().collect())
        .collect();
    groups.join(":")
}
