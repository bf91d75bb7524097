//! # Error Handling
//!
//! This module provides the error types for Veil Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Padding Errors                                                    │
//! │  │   ├── MessageTooLarge       - Message exceeds the largest bucket    │
//! │  │   └── InvalidPadding        - Malformed or tampered envelope        │
//! │  │                                                                      │
//! │  ├── Policy Errors                                                     │
//! │  │   ├── RawKeyBlocked         - Raw-key sends disabled by policy      │
//! │  │   ├── ContactRequired       - Recipient is blocked                  │
//! │  │   ├── SignatureRequired     - Verified recipient needs a signature  │
//! │  │   └── BiometricRequired     - Biometric gate not satisfied          │
//! │  │                                                                      │
//! │  ├── Custody Errors                                                    │
//! │  │   ├── NotAvailable          - No usable hardware auth factor        │
//! │  │   ├── EnrollmentFailed      - Key could not be enrolled             │
//! │  │   ├── KeyNotFound           - No key under the given tag            │
//! │  │   ├── InvalidKeyData        - Corrupted store entry                 │
//! │  │   ├── UserCancelled         - Auth prompt dismissed by the user     │
//! │  │   ├── AuthenticationFailed  - Factor presented but rejected        │
//! │  │   ├── AuthNotEnrolled       - No factor configured on the device    │
//! │  │   ├── AuthLockedOut         - Factor disabled after failures        │
//! │  │   ├── SigningFailed         - Underlying store/crypto failure       │
//! │  │   ├── InvalidKey            - Invalid key format/length             │
//! │  │   └── VerificationFailed    - Signature verification failed         │
//! │  │                                                                      │
//! │  └── Settings Errors                                                   │
//! │      ├── SettingsReadError     - Failed to read from the policy store  │
//! │      └── SettingsWriteError    - Failed to write to the policy store   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//!
//! Every failure is a typed result surfaced to the caller. This crate
//! performs no retries and no silent recovery: retry/backoff and user
//! messaging belong to the calling workflow. The single internal
//! translation is the orchestrator's cancellation-to-policy-violation
//! mapping (see [`crate::orchestrator`]). Store-layer status codes travel
//! as opaque payloads inside [`Error::SigningFailed`] and
//! [`Error::EnrollmentFailed`]; they are never reinterpreted here.

use thiserror::Error;

/// Result type alias for Veil Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Veil Core
///
/// All errors are categorized by module/domain to make error handling
/// clearer and to provide meaningful error messages to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Padding Errors (100-199)
    // ========================================================================

    /// Message does not fit the largest padding bucket
    #[error("Message of {0} bytes exceeds the largest padding bucket.")]
    MessageTooLarge(usize),

    /// Envelope is malformed or its padding has been tampered with
    #[error("Invalid message padding.")]
    InvalidPadding,

    // ========================================================================
    // Policy Errors (200-299)
    // ========================================================================

    /// Sending to a raw key is blocked by the current security policy
    #[error("Sending to a raw key is blocked. Add the recipient as a contact first.")]
    RawKeyBlocked,

    /// The recipient is blocked
    #[error("This contact cannot receive messages.")]
    ContactRequired,

    /// Policy requires a signature for this recipient
    #[error("A signature is required when messaging verified contacts.")]
    SignatureRequired,

    /// Policy requires a biometric factor that is not satisfied
    #[error("Biometric authentication is required to sign this message.")]
    BiometricRequired,

    // ========================================================================
    // Custody Errors (300-399)
    // ========================================================================

    /// No usable hardware authentication factor on this device
    #[error("No hardware authentication factor is available.")]
    NotAvailable,

    /// Key enrollment failed
    #[error("Key enrollment failed: {0}")]
    EnrollmentFailed(String),

    /// No key material is stored under the given tag
    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    /// Stored key material is corrupted
    #[error("Stored key data is invalid: {0}")]
    InvalidKeyData(String),

    /// The user dismissed the authentication prompt
    #[error("Authentication was cancelled by the user.")]
    UserCancelled,

    /// The authentication factor was presented but rejected
    #[error("Authentication failed.")]
    AuthenticationFailed,

    /// No authentication factor is enrolled on the device
    #[error("No authentication factor is enrolled on this device.")]
    AuthNotEnrolled,

    /// The authentication factor is temporarily locked out
    #[error("Authentication is locked out after repeated failures.")]
    AuthLockedOut,

    /// Signing failed in the underlying store or crypto layer
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    VerificationFailed,

    // ========================================================================
    // Settings Errors (400-499)
    // ========================================================================

    /// Failed to read from the policy store
    #[error("Failed to read settings: {0}")]
    SettingsReadError(String),

    /// Failed to write to the policy store
    #[error("Failed to write settings: {0}")]
    SettingsWriteError(String),
}

impl Error {
    /// Get the stable error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Padding
    /// - 200-299: Policy
    /// - 300-399: Key custody
    /// - 400-499: Settings
    pub fn code(&self) -> i32 {
        match self {
            // Padding (100-199)
            Error::MessageTooLarge(_) => 100,
            Error::InvalidPadding => 101,

            // Policy (200-299)
            Error::RawKeyBlocked => 200,
            Error::ContactRequired => 201,
            Error::SignatureRequired => 202,
            Error::BiometricRequired => 203,

            // Custody (300-399)
            Error::NotAvailable => 300,
            Error::EnrollmentFailed(_) => 301,
            Error::KeyNotFound(_) => 302,
            Error::InvalidKeyData(_) => 303,
            Error::UserCancelled => 304,
            Error::AuthenticationFailed => 305,
            Error::AuthNotEnrolled => 306,
            Error::AuthLockedOut => 307,
            Error::SigningFailed(_) => 308,
            Error::InvalidKey(_) => 309,
            Error::VerificationFailed => 310,

            // Settings (400-499)
            Error::SettingsReadError(_) => 400,
            Error::SettingsWriteError(_) => 401,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying
    /// or by user action (re-presenting a factor, waiting out a lockout).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UserCancelled
                | Error::AuthenticationFailed
                | Error::AuthLockedOut
                | Error::NotAvailable
                | Error::SettingsReadError(_)
                | Error::SettingsWriteError(_)
        )
    }

    /// Check if this error is a security-policy violation
    ///
    /// Policy violations block an otherwise valid operation; the calling
    /// workflow should explain the relevant setting to the user rather
    /// than retry.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Error::RawKeyBlocked
                | Error::ContactRequired
                | Error::SignatureRequired
                | Error::BiometricRequired
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::MessageTooLarge(2048).code(), 100);
        assert_eq!(Error::RawKeyBlocked.code(), 200);
        assert_eq!(Error::NotAvailable.code(), 300);
        assert_eq!(Error::SigningFailed("-34018".into()).code(), 308);
        assert_eq!(Error::SettingsReadError("test".into()).code(), 400);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::UserCancelled.is_recoverable());
        assert!(Error::AuthLockedOut.is_recoverable());
        assert!(!Error::InvalidPadding.is_recoverable());
        assert!(!Error::KeyNotFound("a".into()).is_recoverable());
    }

    #[test]
    fn test_policy_violations() {
        assert!(Error::BiometricRequired.is_policy_violation());
        assert!(Error::RawKeyBlocked.is_policy_violation());
        assert!(!Error::UserCancelled.is_policy_violation());
    }
}
