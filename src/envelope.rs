//! # Message Envelope Padding
//!
//! Bucketed, length-hiding padding for message plaintext. Every outgoing
//! message is padded to one of a small set of fixed bucket sizes before
//! encryption, so that ciphertext length reveals only the bucket, never the
//! true message size.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENVELOPE WIRE FORMAT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┬──────────────────────────┬───────────────────────┐   │
//! │  │ length       │ message                  │ zero padding          │   │
//! │  │ (2 bytes BE) │ (length bytes)           │ (bucket - length - 2) │   │
//! │  └──────────────┴──────────────────────────┴───────────────────────┘   │
//! │                                                                         │
//! │  Total size always equals the bucket size exactly.                     │
//! │  Buckets: 256, 512, or 1024 bytes.                                     │
//! │                                                                         │
//! │  Examples:                                                             │
//! │  •   10-byte message → 256-byte envelope  (244 bytes of padding)       │
//! │  •  300-byte message → 512-byte envelope  (210 bytes of padding)       │
//! │  • 1020-byte message → 1024-byte envelope (  2 bytes of padding)       │
//! │  • 1023-byte message → MessageTooLarge                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! - **Length hiding**: An observer of the (encrypted) envelope learns only
//!   which bucket the message fell into.
//! - **Timing-safe unpadding**: Padding validation scans every trailing byte
//!   and accumulates with OR instead of short-circuiting on the first
//!   non-zero byte, so validation time does not depend on where a corrupted
//!   byte sits.
//!
//! Padding runs over plaintext and is pure: no I/O, no shared state, safe
//! to call concurrently from any thread.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Size of the big-endian length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// The fixed, ascending set of padding bucket sizes in bytes
pub const BUCKET_SIZES: [usize; 3] = [256, 512, 1024];

/// Largest message that fits the largest bucket
pub const MAX_MESSAGE_SIZE: usize = BUCKET_SIZES[2] - LENGTH_PREFIX_SIZE;

/// A fixed padding target size
///
/// The bucket set is fixed and public; dynamic bucket sizes are not
/// supported. Callers normally let [`pad`] pick the smallest fitting
/// bucket and only pin one explicitly via [`pad_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaddingBucket {
    /// 256-byte envelope
    Small,
    /// 512-byte envelope
    Medium,
    /// 1024-byte envelope
    Large,
}

impl PaddingBucket {
    /// The envelope size this bucket pads to, in bytes
    pub fn size(self) -> usize {
        match self {
            PaddingBucket::Small => BUCKET_SIZES[0],
            PaddingBucket::Medium => BUCKET_SIZES[1],
            PaddingBucket::Large => BUCKET_SIZES[2],
        }
    }

    /// The largest message this bucket can hold
    pub fn capacity(self) -> usize {
        self.size() - LENGTH_PREFIX_SIZE
    }

    /// Smallest bucket that can hold a message of `len` bytes
    ///
    /// Returns `None` if the message does not fit even the largest bucket.
    pub fn for_message_len(len: usize) -> Option<Self> {
        [PaddingBucket::Small, PaddingBucket::Medium, PaddingBucket::Large]
            .into_iter()
            .find(|bucket| len <= bucket.capacity())
    }
}

/// A length-prefixed, zero-padded representation of a message
///
/// Produced by [`pad`] / [`pad_into`]; the total byte length always equals
/// the bucket size exactly. Immutable once produced: the encryption layer
/// consumes it via [`Envelope::as_bytes`] or [`Envelope::into_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    bytes: Vec<u8>,
    bucket: PaddingBucket,
}

impl Envelope {
    /// The bucket this envelope was padded to
    pub fn bucket(&self) -> PaddingBucket {
        self.bucket
    }

    /// The padded bytes (length always equals `bucket().size()`)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the envelope, returning the padded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Envelope {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Pad a message into the smallest bucket that holds it
///
/// ## Errors
///
/// Returns [`Error::MessageTooLarge`] if `message.len() + 2` exceeds the
/// largest bucket (1024 bytes).
///
/// ## Example
///
/// ```
/// use veil_core::envelope::{pad, PaddingBucket};
///
/// let envelope = pad(b"hello").unwrap();
/// assert_eq!(envelope.bucket(), PaddingBucket::Small);
/// assert_eq!(envelope.as_bytes().len(), 256);
/// ```
pub fn pad(message: &[u8]) -> Result<Envelope> {
    let bucket = PaddingBucket::for_message_len(message.len())
        .ok_or(Error::MessageTooLarge(message.len()))?;
    pad_into(message, bucket)
}

/// Pad a message into an explicitly pinned bucket
///
/// ## Errors
///
/// Returns [`Error::MessageTooLarge`] if the message does not fit the
/// pinned bucket.
pub fn pad_into(message: &[u8], bucket: PaddingBucket) -> Result<Envelope> {
    if message.len() > bucket.capacity() {
        return Err(Error::MessageTooLarge(message.len()));
    }

    // Capacity check above guarantees the length fits in a u16.
    let prefix = (message.len() as u16).to_be_bytes();

    let mut bytes = vec![0u8; bucket.size()];
    bytes[..LENGTH_PREFIX_SIZE].copy_from_slice(&prefix);
    bytes[LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + message.len()].copy_from_slice(message);

    Ok(Envelope { bytes, bucket })
}

/// Recover the original message from a padded envelope
///
/// Decodes the 2-byte big-endian length prefix, extracts the message, and
/// validates that every trailing padding byte is exactly zero.
///
/// ## Timing Safety
///
/// The padding scan accumulates all trailing bytes with OR and compares the
/// accumulator to zero in constant time. It never exits early on the first
/// non-zero byte, so the time taken is independent of where a corrupted
/// byte occurs.
///
/// ## Errors
///
/// Returns [`Error::InvalidPadding`] if:
/// - the envelope is shorter than the length prefix
/// - the declared length does not fit inside the envelope
/// - any padding byte is non-zero
pub fn unpad(envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < LENGTH_PREFIX_SIZE {
        return Err(Error::InvalidPadding);
    }

    let declared = u16::from_be_bytes([envelope[0], envelope[1]]) as usize;
    if declared + LENGTH_PREFIX_SIZE > envelope.len() {
        return Err(Error::InvalidPadding);
    }

    let (message, padding) = envelope[LENGTH_PREFIX_SIZE..].split_at(declared);

    // Accumulate-with-OR over the whole tail; must not short-circuit.
    let accumulated = padding.iter().fold(0u8, |acc, &byte| acc | byte);
    if accumulated.ct_eq(&0u8).unwrap_u8() != 1 {
        return Err(Error::InvalidPadding);
    }

    Ok(message.to_vec())
}

// ============================================================================
// TESTS
// ============================================================================
