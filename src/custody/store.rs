//! # Secure Key Store
//!
//! Capability interface over the platform's tag-addressed secure key store
//! (iOS Keychain, Android Keystore, OS keyring). Key material stored here
//! never synchronizes off-device; entries carry an access-control policy
//! chosen at store time.
//!
//! The in-memory implementation backs development builds and tests. It
//! stores material behind the same interface a platform keychain adapter
//! implements, so [`crate::custody::KeyCustodian`] is oblivious to which
//! backend it is talking to.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use zeroize::Zeroizing;

/// Access-control policy attached to a stored key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Readable any time after the device has been unlocked
    WhenUnlocked,
    /// Readable only after a successful hardware authentication
    WhenUnlockedWithAuthentication,
}

impl AccessPolicy {
    /// Whether use of the key must be preceded by hardware authentication
    pub fn requires_authentication(self) -> bool {
        matches!(self, AccessPolicy::WhenUnlockedWithAuthentication)
    }
}

/// Opaque status code reported by a key-store backend
///
/// Forwarded verbatim inside [`crate::Error::EnrollmentFailed`] and
/// [`crate::Error::SigningFailed`]; never interpreted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus(pub i32);

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store status {}", self.0)
    }
}

/// A key entry as returned by the store
///
/// The material buffer zeroes itself on drop.
#[derive(Clone)]
pub struct StoredKey {
    /// Raw private-key bytes
    pub material: Zeroizing<Vec<u8>>,
    /// Access policy the entry was stored under
    pub access: AccessPolicy,
}

/// Tag-addressed secure storage for signing-key material
///
/// Implementations must keep material on-device. `store` overwrites any
/// prior entry under the same tag. `delete` is idempotent and reports
/// whether an entry existed.
pub trait SecureKeyStore: Send + Sync {
    /// Store key material under `tag` with the given access policy
    fn store(
        &self,
        tag: &str,
        material: &[u8],
        access: AccessPolicy,
    ) -> std::result::Result<(), StoreStatus>;

    /// Read the entry stored under `tag`, if any
    fn read(&self, tag: &str) -> std::result::Result<Option<StoredKey>, StoreStatus>;

    /// Delete the entry under `tag`; returns whether one existed
    fn delete(&self, tag: &str) -> bool;
}

/// In-memory secure key store
///
/// Development/testing backend. Production wires the platform keychain
/// adapter behind the same trait.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<String, StoredKey>>,
}

impl MemoryKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureKeyStore for MemoryKeyStore {
    fn store(
        &self,
        tag: &str,
        material: &[u8],
        access: AccessPolicy,
    ) -> std::result::Result<(), StoreStatus> {
        let entry = StoredKey {
            material: Zeroizing::new(material.to_vec()),
            access,
        };
        self.entries.write().insert(tag.to_string(), entry);
        Ok(())
    }

    fn read(&self, tag: &str) -> std::result::Result<Option<StoredKey>, StoreStatus> {
        Ok(self.entries.read().get(tag).cloned())
    }

    fn delete(&self, tag: &str) -> bool {
        self.entries.write().remove(tag).is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
