//! # Policy Store
//!
//! Key/value contract for persisted security-policy flags. The store itself
//! is owned by the application's settings layer (platform preferences, an
//! encrypted database table, etc.); this crate only defines the contract and
//! an in-memory implementation used for development and tests.
//!
//! Flags are addressed by namespaced string keys so that the settings layer
//! can co-locate them with unrelated preferences without collisions.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Namespaced keys for the persisted policy flags
pub mod keys {
    /// Refuse sends addressed to a raw key with no contact entry
    pub const CONTACT_REQUIRED_TO_SEND: &str = "veil.policy.contact_required_to_send";

    /// Require a signature on messages to verified contacts
    pub const REQUIRE_SIGNATURE_FOR_VERIFIED: &str = "veil.policy.require_signature_for_verified";

    /// Archive conversations when the identity key rotates
    pub const AUTO_ARCHIVE_ON_ROTATION: &str = "veil.policy.auto_archive_on_rotation";

    /// Gate signing-key use behind a hardware authentication factor
    pub const BIOMETRIC_GATED_SIGNING: &str = "veil.policy.biometric_gated_signing";
}

/// Read/write access to persisted boolean policy flags
///
/// Implementations must return the live persisted value on every call:
/// [`crate::policy::PolicyEngine`] deliberately re-reads flags per
/// evaluation so concurrent settings changes take effect on the next call
/// without restart.
pub trait PolicyStore: Send + Sync {
    /// Read a flag; `None` if it has never been written
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Persist a flag
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

/// In-memory policy store
///
/// Backs development builds and tests; production wires the platform
/// settings store behind the same trait.
#[derive(Default)]
pub struct MemoryPolicyStore {
    flags: RwLock<HashMap<String, bool>>,
}

impl MemoryPolicyStore {
    /// Create an empty store (all flags unset, defaults apply)
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.flags.read().get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.flags.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// A point-in-time snapshot of the four policy flags
///
/// Convenience for settings screens and diagnostics. The policy engine does
/// NOT evaluate against snapshots; it reads the store fresh on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Refuse sends to recipients without a contact entry
    pub contact_required_to_send: bool,
    /// Require signatures on messages to verified contacts
    pub require_signature_for_verified: bool,
    /// Archive conversations on identity-key rotation
    pub auto_archive_on_rotation: bool,
    /// Gate signing behind a hardware authentication factor
    pub biometric_gated_signing: bool,
}

impl Policy {
    /// Read all four flags from a store, applying defaults for unset flags
    ///
    /// `require_signature_for_verified` defaults to `true` (the secure
    /// option); the other flags default to `false`.
    pub fn load(store: &dyn PolicyStore) -> Result<Self> {
        Ok(Self {
            contact_required_to_send: store
                .get_bool(keys::CONTACT_REQUIRED_TO_SEND)?
                .unwrap_or(false),
            require_signature_for_verified: store
                .get_bool(keys::REQUIRE_SIGNATURE_FOR_VERIFIED)?
                .unwrap_or(true),
            auto_archive_on_rotation: store
                .get_bool(keys::AUTO_ARCHIVE_ON_ROTATION)?
                .unwrap_or(false),
            biometric_gated_signing: store
                .get_bool(keys::BIOMETRIC_GATED_SIGNING)?
                .unwrap_or(false),
        })
    }

    /// Persist all four flags to a store
    pub fn save(&self, store: &dyn PolicyStore) -> Result<()> {
        store.set_bool(keys::CONTACT_REQUIRED_TO_SEND, self.contact_required_to_send)?;
        store.set_bool(
            keys::REQUIRE_SIGNATURE_FOR_VERIFIED,
            self.require_signature_for_verified,
        )?;
        store.set_bool(keys::AUTO_ARCHIVE_ON_ROTATION, self.auto_archive_on_rotation)?;
        store.set_bool(keys::BIOMETRIC_GATED_SIGNING, self.biometric_gated_signing)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let store = MemoryPolicyStore::new();

        assert_eq!(store.get_bool(keys::BIOMETRIC_GATED_SIGNING).unwrap(), None);

        store.set_bool(keys::BIOMETRIC_GATED_SIGNING, true).unwrap();
        assert_eq!(
            store.get_bool(keys::BIOMETRIC_GATED_SIGNING).unwrap(),
            Some(true)
        );

        store.set_bool(keys::BIOMETRIC_GATED_SIGNING, false).unwrap();
        assert_eq!(
            store.get_bool(keys::BIOMETRIC_GATED_SIGNING).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_snapshot_defaults() {
        let store = MemoryPolicyStore::new();
        let policy = Policy::load(&store).unwrap();

        // Signature requirement defaults to the secure option
        assert!(policy.require_signature_for_verified);
        assert!(!policy.contact_required_to_send);
        assert!(!policy.auto_archive_on_rotation);
        assert!(!policy.biometric_gated_signing);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = MemoryPolicyStore::new();
        let policy = Policy {
            contact_required_to_send: true,
            require_signature_for_verified: false,
            auto_archive_on_rotation: true,
            biometric_gated_signing: true,
        };

        policy.save(&store).unwrap();
        assert_eq!(Policy::load(&store).unwrap(), policy);
    }
}
