//! Identity lookup collaborators.
//!
//! The delivery core only consumes the [`IdentityLookup`] query contract;
//! where identities actually live is a deployment choice.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::Identity;
use crate::error::{Error, Result};
use crate::message::address::sanitize_address;

/// Query surface the delivery core consumes. Matches are exact on the
/// case-normalized address; iteration order is irrelevant.
pub trait IdentityLookup {
    /// Every identity stored at this address.
    fn find_by_address(&self, address: &str) -> Vec<Identity>;

    /// Identities at this address that hold a private signing key.
    fn find_signing_by_address(&self, address: &str) -> Vec<Identity>;
}

/// Vec-backed in-memory store, for tests and embedders that manage
/// identities themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    identities: Vec<Identity>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identity: Identity) {
        self.identities.push(identity);
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }
}

impl IdentityLookup for MemoryIdentityStore {
    fn find_by_address(&self, address: &str) -> Vec<Identity> {
        let address = sanitize_address(address);
        self.identities
            .iter()
            .filter(|identity| identity.address() == address)
            .cloned()
            .collect()
    }

    fn find_signing_by_address(&self, address: &str) -> Vec<Identity> {
        self.find_by_address(address)
            .into_iter()
            .filter(|identity| identity.can_sign())
            .collect()
    }
}

/// Directory-backed store: `<name>.crt` PEM certificates with optional
/// sibling `<name>.key` private keys and `<name>.addr` address overrides.
///
/// Loaded eagerly at open; read-only at send time. Administration goes
/// through [`add`](Self::add) and [`remove`](Self::remove).
#[derive(Debug)]
pub struct DirIdentityStore {
    base_dir: PathBuf,
    identities: Vec<Identity>,
}

impl DirIdentityStore {
    /// Open the store at a specific directory, creating it if needed.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| Error::Store(format!("failed to create {}: {}", base_dir.display(), e)))?;

        let mut store = Self {
            base_dir,
            identities: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Identities in address order.
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Persist an identity and reload. Returns the entry name used on
    /// disk.
    pub fn add(&mut self, identity: &Identity) -> Result<String> {
        let name = self.unused_entry_name(identity.address());

        self.write_entry(&name, "crt", identity.certificate())?;
        if let Some(key) = identity.key() {
            self.write_entry(&name, "key", key)?;
        }
        // the .addr file pins the address, so entries whose address
        // differs from the certificate subject survive a reload
        self.write_entry(&name, "addr", identity.address())?;

        self.reload()?;
        Ok(name)
    }

    /// Delete every entry stored at `address`. Returns how many were
    /// removed.
    pub fn remove(&mut self, address: &str) -> Result<usize> {
        let address = sanitize_address(address);
        let mut removed = 0;

        for entry in self.entry_names()? {
            let identity = self.load_entry(&entry)?;
            if identity.address() == address {
                for extension in ["crt", "key", "addr"] {
                    let path = self.entry_path(&entry, extension);
                    if path.exists() {
                        std::fs::remove_file(&path).map_err(|e| {
                            Error::Store(format!("failed to remove {}: {}", path.display(), e))
                        })?;
                    }
                }
                removed += 1;
            }
        }

        self.reload()?;
        Ok(removed)
    }

    fn reload(&mut self) -> Result<()> {
        let mut identities = Vec::new();
        for entry in self.entry_names()? {
            identities.push(self.load_entry(&entry)?);
        }
        identities.sort_by(|a, b| a.address().cmp(b.address()));
        debug!(
            count = identities.len(),
            dir = %self.base_dir.display(),
            "loaded identity store"
        );
        self.identities = identities;
        Ok(())
    }

    fn entry_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = std::fs::read_dir(&self.base_dir)
            .map_err(|e| Error::Store(format!("failed to read {}: {}", self.base_dir.display(), e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Store(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("crt") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_entry(&self, name: &str) -> Result<Identity> {
        let certificate = self.read_entry(name, "crt")?;
        let key = self.read_entry_opt(name, "key")?;
        let address = self.read_entry_opt(name, "addr")?;
        Identity::new(certificate, key, address.map(|a| a.trim().to_string()))
    }

    fn entry_path(&self, name: &str, extension: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", name, extension))
    }

    fn read_entry(&self, name: &str, extension: &str) -> Result<String> {
        let path = self.entry_path(name, extension);
        std::fs::read_to_string(&path)
            .map_err(|e| Error::Store(format!("failed to read {}: {}", path.display(), e)))
    }

    fn read_entry_opt(&self, name: &str, extension: &str) -> Result<Option<String>> {
        let path = self.entry_path(name, extension);
        if !path.exists() {
            return Ok(None);
        }
        self.read_entry(name, extension).map(Some)
    }

    fn write_entry(&self, name: &str, extension: &str, content: &str) -> Result<()> {
        let path = self.entry_path(name, extension);
        std::fs::write(&path, content)
            .map_err(|e| Error::Store(format!("failed to write {}: {}", path.display(), e)))?;
        #[cfg(unix)]
        if extension == "key" {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| Error::Store(format!("failed to chmod {}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    fn unused_entry_name(&self, address: &str) -> String {
        let base: String = address
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        let mut name = base.clone();
        let mut counter = 1;
        while self.entry_path(&name, "crt").exists() {
            counter += 1;
            name = format!("{}_{}", base, counter);
        }
        name
    }
}

impl IdentityLookup for DirIdentityStore {
    fn find_by_address(&self, address: &str) -> Vec<Identity> {
        let address = sanitize_address(address);
        self.identities
            .iter()
            .filter(|identity| identity.address() == address)
            .cloned()
            .collect()
    }

    fn find_signing_by_address(&self, address: &str) -> Vec<Identity> {
        self.find_by_address(address)
            .into_iter()
            .filter(|identity| identity.can_sign())
            .collect()
    }
}
