//! # Signing Orchestration
//!
//! Per-send-attempt coordination between [`PolicyEngine`] and
//! [`KeyCustodian`]. The compose flow asks for an authenticity decision:
//! whether this message needs a signature, an attempt to produce one, and
//! the reconciliation of policy-level and key-level authentication
//! requirements.
//!
//! ```text
//! decide_and_sign
//!   │
//!   ├── global biometric policy set and factor unusable? → BiometricRequired
//!   │
//!   ├── no key id:
//!   │     signature mandated for recipient → SignatureRequired
//!   │     otherwise                        → None (send unsigned)
//!   │
//!   └── key id:
//!         custodian.sign
//!           UserCancelled → BiometricRequired (always, see below)
//!           other errors  → forwarded unchanged
//!           signature     → Some(signature)
//! ```
//!
//! ## Cancellation Reconciliation
//!
//! A `UserCancelled` from the custodian is always surfaced as
//! [`Error::BiometricRequired`], even when the global
//! `biometric_gated_signing` policy is off: the target key may itself have
//! been enrolled with a biometric gate, and a dismissed prompt means the
//! signature cannot be produced. Every other custody failure is forwarded
//! unchanged.
//!
//! The orchestrator owns no state; send-eligibility checks
//! ([`PolicyEngine::validate_send_policy`]) and padding stay with the
//! compose flow.

use std::sync::Arc;

use crate::contact::Contact;
use crate::custody::{CancelToken, KeyCustodian, Signature};
use crate::error::{Error, Result};
use crate::policy::PolicyEngine;

/// Coordinates policy evaluation and key custody for one send attempt
pub struct SigningOrchestrator {
    policy: Arc<PolicyEngine>,
    custodian: Arc<KeyCustodian>,
}

impl SigningOrchestrator {
    /// Create an orchestrator over a policy engine and a key custodian
    pub fn new(policy: Arc<PolicyEngine>, custodian: Arc<KeyCustodian>) -> Self {
        Self { policy, custodian }
    }

    /// Produce the authenticity decision for a message send attempt
    ///
    /// Returns `Ok(Some(signature))` when a signature was produced,
    /// `Ok(None)` when no key id was supplied and policy permits sending
    /// unsigned to this recipient.
    ///
    /// ## Errors
    ///
    /// - [`Error::BiometricRequired`] if the global policy gates signing and
    ///   no usable factor exists, or if the user cancelled the key's own
    ///   authentication prompt
    /// - [`Error::SignatureRequired`] if policy mandates a signature and no
    ///   key id was supplied
    /// - any other [`KeyCustodian::sign`] failure, forwarded unchanged
    pub async fn decide_and_sign(
        &self,
        message: &[u8],
        key_id: Option<&str>,
        recipient: Option<&Contact>,
        cancel: &CancelToken,
    ) -> Result<Option<Signature>> {
        if self.policy.requires_biometric_for_signing()? && !self.custodian.is_available() {
            tracing::debug!("signing blocked: biometric policy set, no usable factor");
            return Err(Error::BiometricRequired);
        }

        let signature_mandatory = match self.policy.validate_signature_policy(recipient, false) {
            Ok(()) => false,
            Err(Error::SignatureRequired) => true,
            Err(other) => return Err(other),
        };

        let id = match key_id {
            Some(id) => id,
            None if signature_mandatory => {
                tracing::debug!("unsigned send blocked: signature mandated for recipient");
                return Err(Error::SignatureRequired);
            }
            None => return Ok(None),
        };

        match self.custodian.sign(message, id, cancel).await {
            Ok(signature) => Ok(Some(signature)),
            // The key's own gate was refused; surface as a policy violation
            Err(Error::UserCancelled) => Err(Error::BiometricRequired),
            Err(other) => Err(other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::TrustLevel;
    use crate::custody::{
        generate_key_material, verify, AuthOutcome, MemoryKeyStore, ScriptedAuthGate,
    };
    use crate::policy::{keys, MemoryPolicyStore, PolicyStore};

    const TAG: &str = "veil.sign.primary";

    struct Fixture {
        orchestrator: SigningOrchestrator,
        policy_store: Arc<MemoryPolicyStore>,
        custodian: Arc<KeyCustodian>,
    }

    fn fixture(gate: ScriptedAuthGate) -> Fixture {
        let policy_store = Arc::new(MemoryPolicyStore::new());
        let policy = Arc::new(PolicyEngine::new(policy_store.clone()));
        let custodian = Arc::new(KeyCustodian::new(
            Arc::new(MemoryKeyStore::new()),
            Arc::new(gate),
        ));
        Fixture {
            orchestrator: SigningOrchestrator::new(policy, custodian.clone()),
            policy_store,
            custodian,
        }
    }

    fn enroll(custodian: &KeyCustodian, gated: bool) {
        let mut material = *generate_key_material();
        custodian.enroll(&mut material, TAG, gated).unwrap();
    }

    fn verified_contact() -> Contact {
        Contact::new("did:key:z6MkVerified", TrustLevel::Verified, false)
    }

    fn new_contact() -> Contact {
        Contact::new("did:key:z6MkNew", TrustLevel::New, false)
    }

    #[tokio::test]
    async fn test_signs_and_signature_verifies() {
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));
        enroll(&f.custodian, false);

        let contact = verified_contact();
        let cancel = CancelToken::new();
        let signature = f
            .orchestrator
            .decide_and_sign(b"hello", Some(TAG), Some(&contact), &cancel)
            .await
            .unwrap()
            .unwrap();

        let public_key = f.custodian.public_key(TAG).unwrap();
        assert!(verify(&public_key, b"hello", &signature).is_ok());
    }

    #[tokio::test]
    async fn test_global_policy_requires_available_factor() {
        let f = fixture(ScriptedAuthGate::unavailable());
        f.policy_store
            .set_bool(keys::BIOMETRIC_GATED_SIGNING, true)
            .unwrap();

        // Fails before any key lookup: no key is enrolled at all, yet the
        // error is the policy violation, not KeyNotFound
        let cancel = CancelToken::new();
        let err = f
            .orchestrator
            .decide_and_sign(b"hello", Some(TAG), None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, Error::BiometricRequired);
    }

    #[tokio::test]
    async fn test_cancellation_surfaces_as_policy_violation() {
        // Global policy OFF; the key itself is biometric-gated
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Cancelled));
        f.policy_store
            .set_bool(keys::BIOMETRIC_GATED_SIGNING, false)
            .unwrap();
        enroll(&f.custodian, true);

        let cancel = CancelToken::new();
        let err = f
            .orchestrator
            .decide_and_sign(b"hello", Some(TAG), None, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, Error::BiometricRequired);
    }

    #[tokio::test]
    async fn test_other_custody_errors_forwarded_unchanged() {
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Failed));
        enroll(&f.custodian, true);

        let cancel = CancelToken::new();
        let err = f
            .orchestrator
            .decide_and_sign(b"hello", Some(TAG), None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);

        let missing = f
            .orchestrator
            .decide_and_sign(b"hello", Some("veil.sign.other"), None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(missing, Error::KeyNotFound("veil.sign.other".to_string()));
    }

    #[tokio::test]
    async fn test_unsigned_send_allowed_for_new_contact() {
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        let contact = new_contact();
        let cancel = CancelToken::new();
        let result = f
            .orchestrator
            .decide_and_sign(b"hello", None, Some(&contact), &cancel)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unsigned_send_blocked_for_verified_contact() {
        // require_signature_for_verified defaults to true
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));

        let contact = verified_contact();
        let cancel = CancelToken::new();
        let err = f
            .orchestrator
            .decide_and_sign(b"hello", None, Some(&contact), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, Error::SignatureRequired);
    }

    #[tokio::test]
    async fn test_gated_key_signs_without_global_policy() {
        let f = fixture(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized));
        enroll(&f.custodian, true);

        let cancel = CancelToken::new();
        let signature = f
            .orchestrator
            .decide_and_sign(b"hello", Some(TAG), None, &cancel)
            .await
            .unwrap();

        assert!(signature.is_some());
    }
}
