//! Fixed-length binary encodings
//!
//! Every point and scalar persisted by the ledger is stored as exactly
//! [`ENCODED_LEN`] bytes and must decode back to an equal value.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;

use crate::CommitmentError;

/// Encoded size of both points and scalars
pub const ENCODED_LEN: usize = 32;

/// Round-trippable 32-byte encoding
pub trait FixedEncoding: Sized {
    fn to_fixed_bytes(&self) -> [u8; ENCODED_LEN];

    /// Decode, rejecting wrong lengths and non-canonical encodings
    fn from_fixed_bytes(bytes: &[u8]) -> Result<Self, CommitmentError>;
}

fn fixed_array(bytes: &[u8]) -> Result<[u8; ENCODED_LEN], CommitmentError> {
    bytes
        .try_into()
        .map_err(|_| CommitmentError::InvalidLength {
            expected: ENCODED_LEN,
            got: bytes.len(),
        })
}

impl FixedEncoding for RistrettoPoint {
    fn to_fixed_bytes(&self) -> [u8; ENCODED_LEN] {
        self.compress().to_bytes()
    }

    fn from_fixed_bytes(bytes: &[u8]) -> Result<Self, CommitmentError> {
        CompressedRistretto(fixed_array(bytes)?)
            .decompress()
            .ok_or(CommitmentError::InvalidPoint)
    }
}

impl FixedEncoding for Scalar {
    fn to_fixed_bytes(&self) -> [u8; ENCODED_LEN] {
        self.to_bytes()
    }

    fn from_fixed_bytes(bytes: &[u8]) -> Result<Self, CommitmentError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(fixed_array(bytes)?))
            .ok_or(CommitmentError::NonCanonicalScalar)
    }
}
