//! Pedersen commitment algebra
//!
//! Stateless primitives: commit, homomorphic add/sub, validation against a
//! known opening, and generation of the auxiliary generator `H`.
//!
//! `validate` only works for a verifier that already knows both the
//! plaintext value and the blinding factor. It is not a zero-knowledge
//! proof and reveals the amount to whoever checks it.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::Sha512;

/// Lift a signed amount into the scalar field (`value mod n`)
pub fn amount_scalar(value: i64) -> Scalar {
    let magnitude = Scalar::from(value.unsigned_abs());
    if value < 0 { -magnitude } else { magnitude }
}

/// Lift a wide intermediate (sums/differences of amounts) into the field
pub fn wide_amount_scalar(value: i128) -> Scalar {
    let magnitude = Scalar::from(value.unsigned_abs());
    if value < 0 { -magnitude } else { magnitude }
}

/// C = blinding·G + value·H
pub fn commit(h: &RistrettoPoint, blinding: &Scalar, value: &Scalar) -> RistrettoPoint {
    RistrettoPoint::mul_base(blinding) + value * h
}

/// Commit to a plaintext integer amount
pub fn commit_amount(h: &RistrettoPoint, blinding: &Scalar, value: i64) -> RistrettoPoint {
    commit(h, blinding, &amount_scalar(value))
}

/// Homomorphic addition of two commitments
pub fn add(a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
    a + b
}

/// Homomorphic subtraction of two commitments
pub fn sub(a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
    a - b
}

/// Recompute the commitment from its opening and compare.
pub fn validate(
    value: i64,
    commitment: &RistrettoPoint,
    h: &RistrettoPoint,
    blinding: &Scalar,
) -> bool {
    commit_amount(h, blinding, value) == *commitment
}

/// Commitment to `v1 + v2` under `r1 + r2`, for a party holding both openings.
///
/// Equal to `add(commit(r1, v1), commit(r2, v2))`.
pub fn add_privately(
    h: &RistrettoPoint,
    r1: &Scalar,
    r2: &Scalar,
    v1: i64,
    v2: i64,
) -> RistrettoPoint {
    let value = wide_amount_scalar(i128::from(v1) + i128::from(v2));
    commit(h, &(r1 + r2), &value)
}

/// Commitment to `v1 - v2` under `r1 - r2`.
///
/// Equal to `sub(commit(r1, v1), commit(r2, v2))`.
pub fn sub_privately(
    h: &RistrettoPoint,
    r1: &Scalar,
    r2: &Scalar,
    v1: i64,
    v2: i64,
) -> RistrettoPoint {
    let value = wide_amount_scalar(i128::from(v1) - i128::from(v2));
    commit(h, &(r1 - r2), &value)
}

/// Fresh random blinding factor
pub fn random_blinding<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    Scalar::random(rng)
}

/// Sample `H = s·G` for a random secret `s` (OS randomness).
///
/// Must run exactly once per ledger: every commitment ever issued is bound
/// to the `H` in force when it was created.
pub fn generate_h() -> RistrettoPoint {
    generate_h_with(&mut OsRng)
}

/// Same as [`generate_h`] with a caller-supplied RNG
pub fn generate_h_with<R: RngCore + CryptoRng>(rng: &mut R) -> RistrettoPoint {
    RistrettoPoint::mul_base(&Scalar::random(rng))
}

/// Nothing-up-my-sleeve generator derived by hashing a domain label.
///
/// Nobody knows `log_G(H)` for this generator, unlike [`generate_h`] where
/// whoever sampled `s` does.
pub fn h_from_label(label: &[u8]) -> RistrettoPoint {
    RistrettoPoint::hash_from_bytes::<Sha512>(label)
}
