//! In-memory capturing transport for tests and dry runs.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use super::{Transport, TransportError};

/// One delivery captured by [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct CapturedMail {
    pub sender: String,
    pub recipients: BTreeSet<String>,
    pub message: String,
}

type FailurePredicate = dyn Fn(&str, &BTreeSet<String>) -> bool + Send + Sync;

/// Collects messages in order instead of delivering them. The captured
/// sequence is owned per instance; clones share it, so a test can keep a
/// handle while the mailer owns the transport.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    captured: Arc<Mutex<Vec<CapturedMail>>>,
    fail_when: Option<Arc<FailurePredicate>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any delivery matching the predicate, for exercising the
    /// failure paths.
    pub fn fail_when(
        mut self,
        predicate: impl Fn(&str, &BTreeSet<String>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Snapshot of everything captured so far, in delivery order.
    pub fn captured(&self) -> Vec<CapturedMail> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CapturedMail>> {
        self.captured.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn deliver(
        &mut self,
        sender: &str,
        recipients: &BTreeSet<String>,
        message: &str,
    ) -> Result<(), TransportError> {
        if let Some(predicate) = &self.fail_when {
            if predicate(sender, recipients) {
                return Err(TransportError::new(format!(
                    "delivery rejected for {}",
                    sender
                )));
            }
        }

        self.lock().push(CapturedMail {
            sender: sender.to_string(),
            recipients: recipients.clone(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipients(addrs: &[&str]) -> BTreeSet<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn captures_in_delivery_order() {
        let transport = MemoryTransport::new();
        let mut handle = transport.clone();

        handle
            .deliver("a@example.com", &recipients(&["x@example.com"]), "first")
            .unwrap();
        handle
            .deliver("a@example.com", &recipients(&["y@example.com"]), "second")
            .unwrap();

        let captured = transport.captured();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].message, "first");
        assert_eq!(captured[1].message, "second");
    }

    #[test]
    fn failure_predicate_rejects_without_capturing() {
        let transport = MemoryTransport::new().fail_when(|sender, _| sender == "bad@example.com");
        let mut handle = transport.clone();

        let err = handle
            .deliver("bad@example.com", &recipients(&["x@example.com"]), "msg")
            .unwrap_err();
        assert!(err.to_string().contains("bad@example.com"));
        assert!(transport.captured().is_empty());

        handle
            .deliver("good@example.com", &recipients(&["x@example.com"]), "msg")
            .unwrap();
        assert_eq!(transport.captured().len(), 1);
    }

    #[test]
    fn clear_resets_the_sequence() {
        let transport = MemoryTransport::new();
        let mut handle = transport.clone();
        handle
            .deliver("a@example.com", &recipients(&["x@example.com"]), "msg")
            .unwrap();
        transport.clear();
        assert!(transport.captured().is_empty());
    }
}
