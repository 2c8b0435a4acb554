//! Shared fixtures: throwaway self-signed certificates and mailer setup.

#![allow(dead_code)]

use mailseal::delivery::{DeliveryConfig, Mailer};
use mailseal::identity::store::MemoryIdentityStore;
use mailseal::identity::Identity;
use mailseal::transport::memory::MemoryTransport;

pub const RECIPIENT1_CERTIFICATE: &str = include_str!("fixtures/recipient1.crt");
pub const RECIPIENT1_KEY: &str = include_str!("fixtures/recipient1.key");
pub const RECIPIENT2_CERTIFICATE: &str = include_str!("fixtures/recipient2.crt");
pub const RECIPIENT2_KEY: &str = include_str!("fixtures/recipient2.key");
pub const SENDER2_CERTIFICATE: &str = include_str!("fixtures/sender2.crt");
pub const SENDER2_KEY: &str = include_str!("fixtures/sender2.key");
pub const NO_EMAIL_CERTIFICATE: &str = include_str!("fixtures/noemail.crt");

pub const RECIPIENT1_FINGERPRINT: &str =
    "FE:B0:4E:F7:85:D0:C0:31:84:F6:AD:CD:3B:C4:9F:5D:AE:C8:EC:0A";

/// The store the conformance scenarios run against: recipient1 can sign
/// and decrypt, recipient2 can only decrypt, and list@example.com fans
/// out to both certificates.
pub fn base_store() -> MemoryIdentityStore {
    let mut store = MemoryIdentityStore::new();
    store.add(
        Identity::new(
            RECIPIENT1_CERTIFICATE,
            Some(RECIPIENT1_KEY.to_string()),
            None,
        )
        .unwrap(),
    );
    store.add(Identity::new(RECIPIENT2_CERTIFICATE, None, None).unwrap());
    store.add(
        Identity::new(RECIPIENT1_CERTIFICATE, None, Some("list@example.com".to_string())).unwrap(),
    );
    store.add(
        Identity::new(RECIPIENT2_CERTIFICATE, None, Some("list@example.com".to_string())).unwrap(),
    );
    store
}

pub fn mailer(
    store: MemoryIdentityStore,
    transport: MemoryTransport,
    fail_silently: bool,
) -> Mailer<MemoryIdentityStore, MemoryTransport> {
    let config = DeliveryConfig {
        fail_silently,
        ..Default::default()
    };
    Mailer::new(store, transport, config)
}
