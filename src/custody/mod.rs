//! # Signing-Key Custody
//!
//! Lifecycle and use of signing-key material held in the platform's secure
//! key store, optionally gated behind a hardware authentication factor.
//! Callers never see raw private-key bytes: material enters through
//! [`KeyCustodian::enroll`] (and is zeroed from the caller's buffer), is
//! used inside [`KeyCustodian::sign`], and leaves only as signatures.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KEY CUSTODY                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                      ┌──────────────────┐                              │
//! │                      │   KeyCustodian   │                              │
//! │                      │                  │                              │
//! │                      │  enroll / sign   │                              │
//! │                      │  remove          │                              │
//! │                      └────┬────────┬────┘                              │
//! │                           │        │                                    │
//! │             ┌─────────────┘        └─────────────┐                     │
//! │             ▼                                    ▼                     │
//! │  ┌────────────────────┐              ┌────────────────────┐           │
//! │  │  SecureKeyStore    │              │ AuthenticationGate │           │
//! │  │                    │              │                    │           │
//! │  │  Tag-addressed     │              │  Hardware factor   │           │
//! │  │  key material      │              │  (fingerprint,     │           │
//! │  │  + access policy   │              │   face, ...)       │           │
//! │  └────────────────────┘              └────────────────────┘           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sign State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            gated key                    ungated key                    │
//! │                                                                         │
//! │   Idle ──► AuthRequested ──┬──► Authorized ──► Signed                  │
//! │    │                       │                                            │
//! │    │                       ├──► Cancelled  ──► Failed                  │
//! │    │                       ├──► AuthFailed ──► Failed                  │
//! │    │                       └──► LockedOut  ──► Failed                  │
//! │    │                                                                    │
//! │    └──────────────────────────────────────────► Signed                 │
//! │                                                                         │
//! │   Terminal states: Signed, Failed                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! `sign` is the only suspending operation: it blocks on the platform
//! authentication prompt and must run off any UI/event-dispatch thread.
//! `enroll` and `remove` are synchronous. The custodian keeps no internal
//! per-tag lock: callers must serialize `enroll`/`remove`/`sign` against
//! the *same* key id; distinct ids may run concurrently.

mod auth;
mod signature;
mod store;

pub use auth::{AuthOutcome, AuthenticationGate, CancelToken, ScriptedAuthGate};
pub use signature::{verify, Signature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
pub use store::{AccessPolicy, MemoryKeyStore, SecureKeyStore, StoreStatus, StoredKey};

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

/// Size of raw signing-key material in bytes (Ed25519 seed)
pub const KEY_MATERIAL_SIZE: usize = 32;

/// Handle to an enrolled signing key
///
/// Carries no key material: only the store tag and the per-key gating
/// choice made at enrollment time. The per-key gate is independent of the
/// global `biometric_gated_signing` policy flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyHandle {
    /// Tag addressing the key in the secure store
    pub tag: String,
    /// Whether use of this key requires hardware authentication
    pub biometric_gated: bool,
}

/// States of a single `sign` call
///
/// Logged at debug level as the call progresses; see the module docs for
/// the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignState {
    /// Key looked up, nothing attempted yet
    Idle,
    /// Waiting on the hardware authentication prompt
    AuthRequested,
    /// Authentication granted, signing may proceed
    Authorized,
    /// Signature produced (terminal)
    Signed,
    /// Signing aborted (terminal)
    Failed,
}

/// Generate fresh random signing-key material
///
/// Convenience for enrollment flows; the buffer zeroes itself on drop.
pub fn generate_key_material() -> Zeroizing<[u8; KEY_MATERIAL_SIZE]> {
    let mut material = Zeroizing::new([0u8; KEY_MATERIAL_SIZE]);
    OsRng.fill_bytes(&mut material[..]);
    material
}

/// Manages signing-key material without exposing raw bytes to callers
///
/// Both collaborators are injected as capabilities so tests (and platforms
/// without hardware factors) can substitute in-memory implementations.
pub struct KeyCustodian {
    store: Arc<dyn SecureKeyStore>,
    gate: Arc<dyn AuthenticationGate>,
}

impl KeyCustodian {
    /// Create a custodian over a secure key store and an authentication gate
    pub fn new(store: Arc<dyn SecureKeyStore>, gate: Arc<dyn AuthenticationGate>) -> Self {
        Self { store, gate }
    }

    /// Whether a usable hardware authentication factor is enrolled
    ///
    /// Capability query only; no side effects, never prompts.
    pub fn is_available(&self) -> bool {
        self.gate.is_available()
    }

    /// Enroll signing-key material under `id`
    ///
    /// Overwrites any prior key under the same id. When `gated` is true the
    /// key is stored as accessible only after hardware authentication;
    /// otherwise it is accessible any time after device unlock.
    ///
    /// The caller's `material` buffer is zeroed before this function
    /// returns, on every path, success or failure.
    ///
    /// ## Errors
    ///
    /// - [`Error::NotAvailable`] if `gated` is requested with no usable factor
    /// - [`Error::EnrollmentFailed`] if the material is not exactly 32 bytes
    ///   or the store rejects the write (opaque status payload)
    pub fn enroll(&self, material: &mut [u8], id: &str, gated: bool) -> Result<SigningKeyHandle> {
        if gated && !self.gate.is_available() {
            material.zeroize();
            return Err(Error::NotAvailable);
        }

        if material.len() != KEY_MATERIAL_SIZE {
            let len = material.len();
            material.zeroize();
            return Err(Error::EnrollmentFailed(format!(
                "key material must be {} bytes, got {}",
                KEY_MATERIAL_SIZE, len
            )));
        }

        let access = if gated {
            AccessPolicy::WhenUnlockedWithAuthentication
        } else {
            AccessPolicy::WhenUnlocked
        };

        let stored = self.store.store(id, material, access);
        material.zeroize();
        stored.map_err(|status| Error::EnrollmentFailed(status.to_string()))?;

        tracing::info!(key = id, gated, "signing key enrolled");

        Ok(SigningKeyHandle {
            tag: id.to_string(),
            biometric_gated: gated,
        })
    }

    /// Sign `message` with the key stored under `id`
    ///
    /// If the key was enrolled with hardware gating, this call suspends on
    /// the platform authentication prompt; `cancel` resolves the wait
    /// cooperatively as [`Error::UserCancelled`] with no store mutation.
    /// The transient key copy is zeroed immediately after use.
    ///
    /// ## Errors
    ///
    /// [`Error::KeyNotFound`], [`Error::InvalidKeyData`],
    /// [`Error::NotAvailable`], [`Error::UserCancelled`],
    /// [`Error::AuthenticationFailed`], [`Error::AuthNotEnrolled`],
    /// [`Error::AuthLockedOut`], [`Error::SigningFailed`].
    pub async fn sign(&self, message: &[u8], id: &str, cancel: &CancelToken) -> Result<Signature> {
        tracing::debug!(key = id, state = ?SignState::Idle, "sign requested");

        let entry = self
            .store
            .read(id)
            .map_err(|status| Error::SigningFailed(status.to_string()))?
            .ok_or_else(|| Error::KeyNotFound(id.to_string()))?;

        // Reject corrupted entries before bothering the user with a prompt
        if entry.material.len() != KEY_MATERIAL_SIZE {
            return Err(Self::invalid_entry(id, entry.material.len()));
        }

        if entry.access.requires_authentication() {
            if !self.gate.is_available() {
                tracing::warn!(key = id, "hardware authentication factor unusable");
                return Self::failed(id, Error::NotAvailable);
            }

            tracing::debug!(
                key = id,
                state = ?SignState::AuthRequested,
                "awaiting hardware authentication"
            );

            match self.gate.authenticate(id, cancel).await {
                AuthOutcome::Authorized => {
                    tracing::debug!(key = id, state = ?SignState::Authorized, "authentication granted");
                }
                AuthOutcome::Cancelled => return Self::failed(id, Error::UserCancelled),
                AuthOutcome::Failed => return Self::failed(id, Error::AuthenticationFailed),
                AuthOutcome::NotEnrolled => return Self::failed(id, Error::AuthNotEnrolled),
                AuthOutcome::LockedOut => return Self::failed(id, Error::AuthLockedOut),
            }
        }

        // Key bytes are materialized only now, after any gate has resolved
        let signing_key = Self::signing_key_from_entry(&entry, id)?;
        let signature = Signature::from_bytes(signing_key.sign(message).to_bytes());
        drop(signing_key); // zeroizes its key material
        tracing::debug!(key = id, state = ?SignState::Signed, "message signed");

        Ok(signature)
    }

    /// Public (verifying) key for the key stored under `id`
    ///
    /// The public half is not sensitive and its derivation is not an
    /// authenticated use of the key; the transient private copy is zeroed
    /// immediately.
    pub fn public_key(&self, id: &str) -> Result<[u8; PUBLIC_KEY_SIZE]> {
        let entry = self
            .store
            .read(id)
            .map_err(|status| Error::SigningFailed(status.to_string()))?
            .ok_or_else(|| Error::KeyNotFound(id.to_string()))?;

        let signing_key = Self::signing_key_from_entry(&entry, id)?;
        Ok(signing_key.verifying_key().to_bytes())
    }

    /// Remove the key stored under `id`
    ///
    /// Idempotent: succeeds whether or not an entry existed.
    pub fn remove(&self, id: &str) -> Result<()> {
        if self.store.delete(id) {
            tracing::info!(key = id, "signing key removed");
        }
        Ok(())
    }

    /// Reconstruct the signing key from a store entry
    ///
    /// The transient seed copy zeroes on drop; so does the returned
    /// `SigningKey`.
    fn signing_key_from_entry(entry: &StoredKey, id: &str) -> Result<SigningKey> {
        if entry.material.len() != KEY_MATERIAL_SIZE {
            return Err(Self::invalid_entry(id, entry.material.len()));
        }

        let mut seed = Zeroizing::new([0u8; KEY_MATERIAL_SIZE]);
        seed.copy_from_slice(&entry.material);
        Ok(SigningKey::from_bytes(&seed))
    }

    fn invalid_entry(id: &str, len: usize) -> Error {
        Error::InvalidKeyData(format!(
            "entry for '{}' has {} bytes, expected {}",
            id, len, KEY_MATERIAL_SIZE
        ))
    }

    fn failed(id: &str, error: Error) -> Result<Signature> {
        tracing::debug!(key = id, state = ?SignState::Failed, %error, "signing aborted");
        Err(error)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "veil.sign.primary";

    fn custodian(gate: ScriptedAuthGate) -> (KeyCustodian, Arc<MemoryKeyStore>) {
        let store = Arc::new(MemoryKeyStore::new());
        (KeyCustodian::new(store.clone(), Arc::new(gate)), store)
    }

    fn enroll_key(custodian: &KeyCustodian, gated: bool) -> SigningKeyHandle {
        let mut material = *generate_key_material();
        custodian.enroll(&mut material, TAG, gated).unwrap()
    }

    #[test]
    fn test_enroll_zeroes_material_on_success() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        let mut material = [0x42u8; 32];
        let handle = custodian.enroll(&mut material, TAG, false).unwrap();

        assert_eq!(material, [0u8; 32]);
        assert_eq!(handle.tag, TAG);
        assert!(!handle.biometric_gated);
    }

    #[test]
    fn test_enroll_zeroes_material_on_failure() {
        let (custodian, _) = custodian(ScriptedAuthGate::unavailable());

        let mut material = [0x42u8; 32];
        let result = custodian.enroll(&mut material, TAG, true);

        assert_eq!(result.unwrap_err(), Error::NotAvailable);
        assert_eq!(material, [0u8; 32]);
    }

    #[test]
    fn test_enroll_gated_requires_available_factor() {
        let (custodian, store) = custodian(ScriptedAuthGate::unavailable());

        let mut material = [1u8; 32];
        assert_eq!(
            custodian.enroll(&mut material, TAG, true).unwrap_err(),
            Error::NotAvailable
        );
        assert!(store.read(TAG).unwrap().is_none());

        // Ungated enrollment works without a factor
        let mut material = [1u8; 32];
        assert!(custodian.enroll(&mut material, TAG, false).is_ok());
    }

    #[test]
    fn test_enroll_rejects_bad_material_length() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        let mut material = [1u8; 16];
        let err = custodian.enroll(&mut material, TAG, false).unwrap_err();

        assert!(matches!(err, Error::EnrollmentFailed(_)));
        assert_eq!(material, [0u8; 16]);
    }

    #[test]
    fn test_enroll_overwrites_prior_key() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        let mut first = [1u8; 32];
        custodian.enroll(&mut first, TAG, false).unwrap();
        let first_public = custodian.public_key(TAG).unwrap();

        let mut second = [2u8; 32];
        custodian.enroll(&mut second, TAG, false).unwrap();
        let second_public = custodian.public_key(TAG).unwrap();

        assert_ne!(first_public, second_public);
    }

    #[tokio::test]
    async fn test_ungated_sign_skips_authentication() {
        // Gate is unusable, but the key does not require it
        let (custodian, _) = custodian(ScriptedAuthGate::unavailable());
        enroll_key(&custodian, false);

        let cancel = CancelToken::new();
        let signature = custodian.sign(b"hello", TAG, &cancel).await.unwrap();

        let public_key = custodian.public_key(TAG).unwrap();
        assert!(verify(&public_key, b"hello", &signature).is_ok());
    }

    #[tokio::test]
    async fn test_gated_sign_with_authorization() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));
        enroll_key(&custodian, true);

        let cancel = CancelToken::new();
        let signature = custodian.sign(b"hello", TAG, &cancel).await.unwrap();

        let public_key = custodian.public_key(TAG).unwrap();
        assert!(verify(&public_key, b"hello", &signature).is_ok());
    }

    #[tokio::test]
    async fn test_gated_sign_auth_outcomes() {
        let cases = [
            (AuthOutcome::Cancelled, Error::UserCancelled),
            (AuthOutcome::Failed, Error::AuthenticationFailed),
            (AuthOutcome::NotEnrolled, Error::AuthNotEnrolled),
            (AuthOutcome::LockedOut, Error::AuthLockedOut),
        ];

        for (outcome, expected) in cases {
            let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(outcome));
            enroll_key(&custodian, true);

            let cancel = CancelToken::new();
            let err = custodian.sign(b"hello", TAG, &cancel).await.unwrap_err();
            assert_eq!(err, expected, "outcome {:?}", outcome);
        }
    }

    #[tokio::test]
    async fn test_gated_sign_factor_removed_after_enrollment() {
        let store = Arc::new(MemoryKeyStore::new());
        let enrolled = KeyCustodian::new(
            store.clone(),
            Arc::new(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized)),
        );
        let mut material = *generate_key_material();
        enrolled.enroll(&mut material, TAG, true).unwrap();

        // Same store, factor now unusable
        let degraded = KeyCustodian::new(store, Arc::new(ScriptedAuthGate::unavailable()));
        let cancel = CancelToken::new();
        assert_eq!(
            degraded.sign(b"hello", TAG, &cancel).await.unwrap_err(),
            Error::NotAvailable
        );
    }

    #[tokio::test]
    async fn test_cancelling_pending_prompt() {
        let (gate, _release) = ScriptedAuthGate::holding(AuthOutcome::Authorized);
        let (custodian, store) = custodian(gate);
        enroll_key(&custodian, true);

        let cancel = CancelToken::new();
        let canceller = cancel.clone();

        let (result, _) = tokio::join!(custodian.sign(b"hello", TAG, &cancel), async move {
            canceller.cancel();
        });

        assert_eq!(result.unwrap_err(), Error::UserCancelled);
        // No partial store mutation: the key is still there and usable
        assert!(store.read(TAG).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lifecycle_enroll_remove_sign() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));
        enroll_key(&custodian, false);

        custodian.remove(TAG).unwrap();
        // Idempotent
        custodian.remove(TAG).unwrap();

        let cancel = CancelToken::new();
        assert_eq!(
            custodian.sign(b"hello", TAG, &cancel).await.unwrap_err(),
            Error::KeyNotFound(TAG.to_string())
        );
    }

    #[tokio::test]
    async fn test_corrupted_entry_rejected() {
        let (custodian, store) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        // Bypass enroll to plant a truncated entry
        store
            .store(TAG, &[9u8; 16], AccessPolicy::WhenUnlocked)
            .unwrap();

        let cancel = CancelToken::new();
        let err = custodian.sign(b"hello", TAG, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::InvalidKeyData(_)));
    }

    #[test]
    fn test_public_key_missing_id() {
        let (custodian, _) = custodian(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));
        assert_eq!(
            custodian.public_key("veil.sign.nope").unwrap_err(),
            Error::KeyNotFound("veil.sign.nope".to_string())
        );
    }

    #[test]
    fn test_generate_key_material() {
        let material = generate_key_material();
        assert_eq!(material.len(), KEY_MATERIAL_SIZE);
        assert_ne!(*material, [0u8; KEY_MATERIAL_SIZE]);
    }

    // Store backend that fails every operation with an opaque status
    struct FaultyStore;

    impl SecureKeyStore for FaultyStore {
        fn store(
            &self,
            _tag: &str,
            _material: &[u8],
            _access: AccessPolicy,
        ) -> std::result::Result<(), StoreStatus> {
            Err(StoreStatus(-34018))
        }

        fn read(&self, _tag: &str) -> std::result::Result<Option<StoredKey>, StoreStatus> {
            Err(StoreStatus(-34018))
        }

        fn delete(&self, _tag: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_store_status_wrapped_opaquely() {
        let custodian = KeyCustodian::new(
            Arc::new(FaultyStore),
            Arc::new(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized)),
        );

        let mut material = [1u8; 32];
        let err = custodian.enroll(&mut material, TAG, false).unwrap_err();
        assert_eq!(err, Error::EnrollmentFailed("store status -34018".into()));
        assert_eq!(material, [0u8; 32]);

        let cancel = CancelToken::new();
        let err = custodian.sign(b"hello", TAG, &cancel).await.unwrap_err();
        assert_eq!(err, Error::SigningFailed("store status -34018".into()));
    }
}
