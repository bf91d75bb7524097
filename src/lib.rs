//! # Veil Core
//!
//! The security core of the Veil messenger: length-hiding message padding,
//! security-policy validation for send attempts, and the lifecycle of
//! hardware-authentication-gated signing keys.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VEIL CORE MODULES                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                      ┌─────────────────────┐                           │
//! │                      │ SigningOrchestrator │                           │
//! │                      │                     │                           │
//! │                      │ - Authenticity      │                           │
//! │                      │   decision per send │                           │
//! │                      └──────┬───────┬──────┘                           │
//! │                             │       │                                   │
//! │              ┌──────────────┘       └──────────────┐                   │
//! │              ▼                                     ▼                   │
//! │  ┌─────────────────────┐               ┌─────────────────────┐        │
//! │  │    PolicyEngine     │               │    KeyCustodian     │        │
//! │  │                     │               │                     │        │
//! │  │ - Send policy       │               │ - Enroll / remove   │        │
//! │  │ - Signature policy  │               │ - Gated signing     │        │
//! │  │ - Live flag reads   │               │ - Zeroed material   │        │
//! │  └──────────┬──────────┘               └────────┬────────────┘        │
//! │             │                                   │                      │
//! │             ▼                                   ▼                      │
//! │  ┌─────────────────────┐               ┌─────────────────────┐        │
//! │  │     PolicyStore     │               │  SecureKeyStore +   │        │
//! │  │  (settings layer)   │               │  AuthenticationGate │        │
//! │  └─────────────────────┘               │  (platform)         │        │
//! │                                        └─────────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  envelope (PaddingCodec)                                        │   │
//! │  │  ─────────────────────────                                       │   │
//! │  │  Pure, stateless bucketed padding; invoked by the compose flow  │   │
//! │  │  on the plaintext before encryption. No coupling to the rest.   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire crate
//! - [`envelope`] - Bucketed length-hiding padding (pad/unpad)
//! - [`contact`] - Read-only contact view consumed by policy checks
//! - [`policy`] - Security-policy evaluation over a live settings store
//! - [`custody`] - Signing-key enrollment, gated signing, removal
//! - [`orchestrator`] - Per-send composition of policy and custody
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Length Hiding (envelope)                                              │
//! │  ────────────────────────                                               │
//! │  Plaintext is padded to fixed buckets (256/512/1024) before            │
//! │  encryption; ciphertext length reveals only the bucket. Unpadding      │
//! │  validates in constant time relative to corruption position.           │
//! │                                                                         │
//! │  Policy Gating (policy)                                                │
//! │  ──────────────────────                                                 │
//! │  Raw-key sends, blocked contacts, and unsigned messages to verified    │
//! │  contacts are rejected before anything leaves the device. Flags are    │
//! │  read live on every check.                                             │
//! │                                                                         │
//! │  Key Custody (custody)                                                 │
//! │  ─────────────────────                                                  │
//! │  Private key bytes live in the platform secure store, optionally       │
//! │  usable only after hardware authentication. Transient copies are       │
//! │  zeroed immediately after use; callers only ever hold signatures.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use veil_core::custody::{
//!     generate_key_material, AuthOutcome, CancelToken, KeyCustodian, MemoryKeyStore,
//!     ScriptedAuthGate,
//! };
//! use veil_core::envelope;
//! use veil_core::orchestrator::SigningOrchestrator;
//! use veil_core::policy::{MemoryPolicyStore, PolicyEngine};
//!
//! tokio_test::block_on(async {
//!     let policy = Arc::new(PolicyEngine::new(Arc::new(MemoryPolicyStore::new())));
//!     let custodian = Arc::new(KeyCustodian::new(
//!         Arc::new(MemoryKeyStore::new()),
//!         Arc::new(ScriptedAuthGate::with_outcome(AuthOutcome::Authorized)),
//!     ));
//!
//!     let mut material = *generate_key_material();
//!     custodian.enroll(&mut material, "veil.sign.primary", false).unwrap();
//!
//!     // Authenticity decision for this send attempt
//!     let orchestrator = SigningOrchestrator::new(policy, custodian);
//!     let cancel = CancelToken::new();
//!     let signature = orchestrator
//!         .decide_and_sign(b"hello", Some("veil.sign.primary"), None, &cancel)
//!         .await
//!         .unwrap();
//!     assert!(signature.is_some());
//!
//!     // Length-hiding padding of the plaintext before encryption
//!     let padded = envelope::pad(b"hello").unwrap();
//!     assert_eq!(padded.as_bytes().len(), 256);
//! });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod contact;
pub mod custody;
pub mod envelope;
pub mod error;
pub mod orchestrator;
pub mod policy;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use contact::{Contact, TrustLevel};
pub use custody::{CancelToken, KeyCustodian, Signature, SigningKeyHandle};
pub use envelope::{pad, unpad, Envelope, PaddingBucket};
pub use error::{Error, Result};
pub use orchestrator::SigningOrchestrator;
pub use policy::{Policy, PolicyEngine};
