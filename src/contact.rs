//! # Contact Boundary Types
//!
//! Read-only view of a contact as consumed by the policy layer. Contact
//! management (requests, verification ceremonies, block lists) lives in the
//! application's contact service; this crate only ever reads the two fields
//! that security policy depends on.

use serde::{Deserialize, Serialize};

/// How far a contact's identity has been verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Added but never verified out-of-band
    New,
    /// Key fingerprint verified (QR scan or safety-number comparison)
    Verified,
}

impl TrustLevel {
    /// String form for logs and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::New => "new",
            TrustLevel::Verified => "verified",
        }
    }
}

/// A contact as seen by the security-policy layer
///
/// Immutable snapshot: the compose flow resolves the recipient and hands
/// this in; policy checks never mutate contact state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable identifier of the contact (DID or public-key fingerprint)
    pub id: String,
    /// Verification state of the contact's identity key
    pub trust_level: TrustLevel,
    /// Whether the local user has blocked this contact
    pub is_blocked: bool,
}

impl Contact {
    /// Create a contact snapshot
    pub fn new(id: impl Into<String>, trust_level: TrustLevel, is_blocked: bool) -> Self {
        Self {
            id: id.into(),
            trust_level,
            is_blocked,
        }
    }

    /// Whether this contact's identity key has been verified
    pub fn is_verified(&self) -> bool {
        self.trust_level == TrustLevel::Verified
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_level_strings() {
        assert_eq!(TrustLevel::New.as_str(), "new");
        assert_eq!(TrustLevel::Verified.as_str(), "verified");
    }

    #[test]
    fn test_is_verified() {
        let contact = Contact::new("did:key:z6MkTest", TrustLevel::Verified, false);
        assert!(contact.is_verified());

        let contact = Contact::new("did:key:z6MkOther", TrustLevel::New, false);
        assert!(!contact.is_verified());
    }

    #[test]
    fn test_serialization() {
        let contact = Contact::new("did:key:z6MkTest", TrustLevel::New, true);
        let json = serde_json::to_string(&contact).unwrap();
        let restored: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, contact);
        assert!(json.contains("\"new\""));
    }
}
