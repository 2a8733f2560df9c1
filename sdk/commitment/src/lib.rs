//! Cloak Commitment SDK
//!
//! Additively homomorphic Pedersen commitments over Ristretto255.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                  C = r·G + v·H                                 │
//! │                                                                │
//! │   G  Ristretto base point                                      │
//! │   H  auxiliary generator, fixed once per ledger                │
//! │   r  blinding factor (Scalar)                                  │
//! │   v  amount lifted into the scalar field (mod n)               │
//! │                                                                │
//! │   C(r1,v1) + C(r2,v2) == C(r1 + r2, v1 + v2)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Balances are only ever stored as commitments, so ledgers update them
//! with [`add`] and [`sub`] without learning the underlying values.

pub mod encoding;
pub mod pedersen;

pub use curve25519_dalek::ristretto::RistrettoPoint as Point;
pub use curve25519_dalek::scalar::Scalar;

pub use encoding::{ENCODED_LEN, FixedEncoding};
pub use pedersen::{
    add, add_privately, amount_scalar, commit, commit_amount, generate_h, generate_h_with,
    h_from_label, random_blinding, sub, sub_privately, validate, wide_amount_scalar,
};

use thiserror::Error;

/// Errors raised while decoding commitment material
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    #[error("invalid encoding length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("bytes are not a valid ristretto point")]
    InvalidPoint,

    #[error("bytes are not a canonical scalar")]
    NonCanonicalScalar,
}
