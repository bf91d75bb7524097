//! # Security Policy
//!
//! Evaluation of persisted security-policy flags against a send or signing
//! context. The engine is a read-only evaluator: it owns no state, mutates
//! nothing, and re-reads the live flags from the injected [`PolicyStore`]
//! on every call so that concurrent settings changes take effect on the
//! next evaluation without restart.
//!
//! ## Decision Rules
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SEND POLICY                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  contact_required_to_send = true AND recipient is a raw key            │
//! │      → RawKeyBlocked                                                   │
//! │                                                                         │
//! │  recipient present AND recipient.is_blocked                            │
//! │      → ContactRequired                                                 │
//! │        (applies unconditionally, independent of any flag)              │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                       SIGNATURE POLICY                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  require_signature_for_verified = true                                 │
//! │    AND recipient present                                               │
//! │    AND recipient.trust_level = verified                                │
//! │    AND message carries no signature                                    │
//! │      → SignatureRequired                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod store;

pub use store::{keys, MemoryPolicyStore, Policy, PolicyStore};

use std::sync::Arc;

use crate::contact::Contact;
use crate::error::{Error, Result};

/// Read-only evaluator of security-policy flags
///
/// Pure and synchronous; safe to call concurrently from multiple threads.
/// All state lives in the injected store.
pub struct PolicyEngine {
    store: Arc<dyn PolicyStore>,
}

impl PolicyEngine {
    /// Create an engine over a policy store
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Validate that the current policy allows sending to `recipient`
    ///
    /// `recipient` is `None` when the user is composing to a raw public key
    /// with no contact entry.
    ///
    /// ## Errors
    ///
    /// - [`Error::RawKeyBlocked`] if `contact_required_to_send` is set and
    ///   there is no contact entry for the recipient
    /// - [`Error::ContactRequired`] if the recipient is blocked; this check
    ///   applies regardless of `contact_required_to_send`
    pub fn validate_send_policy(&self, recipient: Option<&Contact>) -> Result<()> {
        let contact_required = self
            .store
            .get_bool(keys::CONTACT_REQUIRED_TO_SEND)?
            .unwrap_or(false);

        match recipient {
            None => {
                if contact_required {
                    tracing::debug!("send denied: raw-key recipient with contact_required_to_send");
                    return Err(Error::RawKeyBlocked);
                }
            }
            Some(contact) => {
                if contact.is_blocked {
                    tracing::debug!(contact = %contact.id, "send denied: recipient is blocked");
                    return Err(Error::ContactRequired);
                }
            }
        }

        Ok(())
    }

    /// Validate the signature requirement for `recipient`
    ///
    /// Fails with [`Error::SignatureRequired`] exactly when the
    /// `require_signature_for_verified` flag is set, a recipient is present,
    /// that recipient is verified, and `has_signature` is false.
    pub fn validate_signature_policy(
        &self,
        recipient: Option<&Contact>,
        has_signature: bool,
    ) -> Result<()> {
        let signature_required = self
            .store
            .get_bool(keys::REQUIRE_SIGNATURE_FOR_VERIFIED)?
            .unwrap_or(true);

        if let Some(contact) = recipient {
            if signature_required && contact.is_verified() && !has_signature {
                tracing::debug!(contact = %contact.id, "unsigned message to verified contact denied");
                return Err(Error::SignatureRequired);
            }
        }

        Ok(())
    }

    /// Whether conversations should be archived when the identity key rotates
    ///
    /// Pass-through for the external rotation workflow.
    pub fn should_archive_on_rotation(&self) -> Result<bool> {
        Ok(self
            .store
            .get_bool(keys::AUTO_ARCHIVE_ON_ROTATION)?
            .unwrap_or(false))
    }

    /// Whether the global policy gates signing behind a hardware factor
    pub fn requires_biometric_for_signing(&self) -> Result<bool> {
        Ok(self
            .store
            .get_bool(keys::BIOMETRIC_GATED_SIGNING)?
            .unwrap_or(false))
    }
}

// ============================================================================
// TESTS
// ============================================================================
