//! The send pipeline: recipient partitioning, signing, encryption, and
//! dual-leg delivery.
//!
//! A message is delivered in up to two legs. Recipients with a stored
//! encryption identity get a ciphertext leg; everyone else gets the
//! (possibly signed) plaintext leg. Legs are independent value
//! transformations of one signed working copy, so a failure in one never
//! corrupts the other.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::crypto::cipher::CipherSuite;
use crate::crypto::smime;
use crate::error::{Error, Result};
use crate::identity::store::IdentityLookup;
use crate::identity::Identity;
use crate::message::address::sanitize_address;
use crate::message::mime::MimeMessage;
use crate::message::payload::extract_payload;
use crate::message::Message;
use crate::transport::Transport;

/// How one message's recipients split across the two delivery legs.
///
/// The address sets are disjoint and together equal the full deduplicated
/// recipient set. `encrypting_identities` may be larger than
/// `encrypting_addresses` when several identities share an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientPartition {
    pub encrypting_identities: Vec<Identity>,
    pub encrypting_addresses: BTreeSet<String>,
    pub plaintext_addresses: BTreeSet<String>,
}

/// Behavior knobs for the send pipeline, the `[delivery]` section of
/// `mailseal.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Symmetric cipher for the encrypted leg.
    pub cipher: CipherSuite,
    /// Suppress transport-delivery errors instead of propagating them.
    /// Cryptographic and precondition errors are never suppressed.
    pub fail_silently: bool,
    /// Domain for generated Message-IDs; defaults to the sender's domain.
    pub message_id_domain: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            cipher: CipherSuite::default(),
            fail_silently: false,
            message_id_domain: None,
        }
    }
}

/// Signs, encrypts, and delivers outbound messages through a [`Transport`].
///
/// The transport sits behind a mutex guarding its connection lifecycle for
/// the duration of a batch; the cryptographic operations are pure per call.
pub struct Mailer<L, T> {
    lookup: L,
    transport: Mutex<T>,
    config: DeliveryConfig,
}

impl<L: IdentityLookup, T: Transport> Mailer<L, T> {
    pub fn new(lookup: L, transport: T, config: DeliveryConfig) -> Self {
        Self {
            lookup,
            transport: Mutex::new(transport),
            config,
        }
    }

    /// Send one message. Returns the number of delivery legs that went out
    /// (0, 1, or 2). Legs, not recipients.
    pub fn send(&self, message: &Message) -> Result<usize> {
        self.send_messages(std::slice::from_ref(message))
    }

    /// Send a batch strictly sequentially, one message fully completing
    /// before the next. The transport connection is opened at most once
    /// and closed only if this call opened it. Returns the summed leg
    /// count.
    pub fn send_messages(&self, messages: &[Message]) -> Result<usize> {
        if messages.is_empty() {
            return Ok(0);
        }

        let mut transport = self
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let opened = match transport.open() {
            Ok(opened) => opened,
            Err(err) => {
                if self.config.fail_silently {
                    warn!(error = %err, "cannot open transport connection");
                    return Ok(0);
                }
                return Err(Error::Delivery(err));
            }
        };

        let mut sent = 0;
        let mut outcome = Ok(());
        for message in messages {
            match self.send_one(&mut *transport, message) {
                Ok(legs) => sent += legs,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        if opened {
            if let Err(err) = transport.close() {
                warn!(error = %err, "error closing transport connection");
            }
        }

        outcome?;
        Ok(sent)
    }

    fn send_one(&self, transport: &mut T, message: &Message) -> Result<usize> {
        let sender_address = sanitize_address(&message.from_email);
        let sender_identity = self.get_sender_identity(&sender_address)?;

        let partition = match self.analyze_recipients(message) {
            Some(partition) => partition,
            None => return Ok(0),
        };

        let mut working = message.to_mime(&self.message_id_domain(&sender_address));

        if let Some(identity) = &sender_identity {
            working = self.sign(identity, &working)?;
        }

        let mut sent = 0;

        if !partition.plaintext_addresses.is_empty() {
            match transport.deliver(
                &sender_address,
                &partition.plaintext_addresses,
                &working.render(),
            ) {
                Ok(()) => sent += 1,
                Err(err) if self.config.fail_silently => {
                    warn!(sender = %sender_address, error = %err, "plaintext leg failed, suppressed");
                }
                Err(err) => return Err(Error::Delivery(err)),
            }
        }

        if !partition.encrypting_identities.is_empty() {
            let encrypted =
                self.encrypt(&sender_address, &partition.encrypting_identities, &working)?;

            match transport.deliver(
                &sender_address,
                &partition.encrypting_addresses,
                &encrypted.render(),
            ) {
                Ok(()) => sent += 1,
                Err(err) if self.config.fail_silently => {
                    warn!(sender = %sender_address, error = %err, "encrypted leg failed, suppressed");
                }
                Err(err) if sent > 0 => {
                    return Err(Error::PartialDelivery {
                        legs_sent: sent,
                        cause: err,
                    })
                }
                Err(err) => return Err(Error::Delivery(err)),
            }
        }

        Ok(sent)
    }

    /// Split the message's recipients into the encrypted and plaintext
    /// legs. Returns None when the message has no recipients at all:
    /// nothing to partition, not an error.
    ///
    /// Address identity decides routing: an address with any stored
    /// identity is always encrypted to, wherever it appeared in to/cc/bcc.
    pub fn analyze_recipients(&self, message: &Message) -> Option<RecipientPartition> {
        let recipients: BTreeSet<String> = message
            .recipients()
            .iter()
            .map(|address| sanitize_address(address))
            .filter(|address| !address.is_empty())
            .collect();
        if recipients.is_empty() {
            return None;
        }

        let mut encrypting_identities = Vec::new();
        let mut encrypting_addresses = BTreeSet::new();
        for address in &recipients {
            let found = self.lookup.find_by_address(address);
            if !found.is_empty() {
                encrypting_addresses.insert(address.clone());
                encrypting_identities.extend(found);
            }
        }

        let plaintext_addresses = recipients
            .difference(&encrypting_addresses)
            .cloned()
            .collect();

        Some(RecipientPartition {
            encrypting_identities,
            encrypting_addresses,
            plaintext_addresses,
        })
    }

    /// Resolve the identity that signs mail from `address`.
    ///
    /// Zero keyed matches means the message goes out unsigned. More than
    /// one is ambiguous: the send degrades to unsigned with a diagnostic
    /// rather than failing.
    pub fn get_sender_identity(&self, address: &str) -> Result<Option<Identity>> {
        if address.trim().is_empty() {
            return Err(Error::MissingSender);
        }

        let mut senders = self.lookup.find_signing_by_address(address);
        match senders.len() {
            0 => Ok(None),
            1 => Ok(senders.pop()),
            matches => {
                warn!(
                    sender = %address,
                    matches,
                    "sender matches multiple identities; cannot sign the message"
                );
                Ok(None)
            }
        }
    }

    /// Produce a signed copy of `message`: a detached signature over the
    /// extracted payload, spliced back as the new body and header set.
    pub fn sign(&self, identity: &Identity, message: &MimeMessage) -> Result<MimeMessage> {
        let key = identity
            .key()
            .ok_or_else(|| Error::Signing(format!("identity {} has no signing key", identity)))?;

        debug!(signer = %identity, "signing message");

        let payload = extract_payload(message);
        let smime_text = smime::sign_detached(identity.certificate(), key, payload.render().as_bytes())
            .map_err(|e| Error::Signing(e.to_string()))?;

        Ok(splice(message, &MimeMessage::parse(&smime_text)))
    }

    /// Produce an encrypted copy of `message` for the given identities'
    /// certificates. Independent per invocation: the input message is
    /// never altered, so the plaintext leg keeps the pre-encryption value.
    pub fn encrypt(
        &self,
        sender_address: &str,
        encrypting_identities: &[Identity],
        message: &MimeMessage,
    ) -> Result<MimeMessage> {
        if encrypting_identities.is_empty() {
            return Err(Error::InvalidRecipients);
        }
        if message.is_empty() {
            return Err(Error::InvalidMessage);
        }

        debug!(
            recipients = encrypting_identities.len(),
            cipher = %self.config.cipher,
            "encrypting message"
        );

        let certificates: Vec<&str> = encrypting_identities
            .iter()
            .map(|identity| identity.certificate())
            .collect();

        let payload = extract_payload(message);
        let smime_text = smime::encrypt(
            &certificates,
            payload.render().as_bytes(),
            self.config.cipher,
        )
        .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut encrypted = splice(message, &MimeMessage::parse(&smime_text));
        // a new payload invalidates the old identifier, even when signing
        // did not run
        encrypted.regenerate_message_id(&self.message_id_domain(sender_address));
        Ok(encrypted)
    }

    fn message_id_domain(&self, sender_address: &str) -> String {
        if let Some(domain) = &self.config.message_id_domain {
            return domain.clone();
        }
        sender_address
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_string())
            .unwrap_or_else(|| "localhost".to_string())
    }
}

/// Replace the outer message's body with the cryptographic structure's
/// body, and overwrite every header the structure carries. Headers the
/// structure does not mention (Subject, From, ...) stay untouched.
fn splice(outer: &MimeMessage, structure: &MimeMessage) -> MimeMessage {
    let mut result = outer.clone();
    result.set_body(structure.body());
    for (name, value) in structure.headers() {
        result.replace_header(name, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_replaces_body_and_structure_headers_only() {
        let mut outer = MimeMessage::new();
        outer.append_header("Subject", "keep me");
        outer.append_header("MIME-Version", "1.0");
        outer.append_header("Content-Type", "text/plain; charset=\"utf-8\"");
        outer.set_body("plaintext");

        let mut structure = MimeMessage::new();
        structure.append_header("MIME-Version", "1.0");
        structure.append_header(
            "Content-Type",
            "application/x-pkcs7-mime; smime-type=enveloped-data",
        );
        structure.append_header("Content-Transfer-Encoding", "base64");
        structure.set_body("AAAA");

        let spliced = splice(&outer, &structure);
        assert_eq!(spliced.body(), "AAAA");
        assert_eq!(spliced.header("Subject"), Some("keep me"));
        assert_eq!(
            spliced.header("Content-Type"),
            Some("application/x-pkcs7-mime; smime-type=enveloped-data")
        );
        assert_eq!(spliced.header("Content-Transfer-Encoding"), Some("base64"));
    }
}
