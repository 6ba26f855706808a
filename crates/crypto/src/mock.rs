//! Deterministic toy pairing backend for state-machine tests.
//!
//! Group elements are integers mod 2^64 with generator 1, so
//! `e(a·G1, b·G2) = a·b` and the bilinearity the timelock cipher relies on
//! holds exactly. Encodings reuse the BLS12-381 lengths (value in the first
//! 8 bytes, little-endian, zero tail), which keeps the fixed-size point
//! types usable and makes "wrong length" and "corrupt encoding" failures
//! easy to construct. Provides no security whatsoever.

use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use tlock_types::{G1Point, G2Point};

use crate::error::CryptoError;
use crate::pairing::{
    PairingSuite, G1_COMPRESSED_LEN, G1_UNCOMPRESSED_LEN, G2_COMPRESSED_LEN, G2_UNCOMPRESSED_LEN,
};

/// Toy backend honoring the pairing laws over u64 arithmetic.
pub enum MockSuite {}

fn decode(bytes: &[u8], compressed_len: usize, uncompressed_len: usize) -> Option<u64> {
    let len = bytes.len();
    if len != compressed_len && len != uncompressed_len {
        return None;
    }
    if bytes[8..].iter().any(|b| *b != 0) {
        return None;
    }
    let mut le = [0u8; 8];
    le.copy_from_slice(&bytes[..8]);
    Some(u64::from_le_bytes(le))
}

fn encode(value: u64, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[..8].copy_from_slice(&value.to_le_bytes());
    bytes
}

impl PairingSuite for MockSuite {
    type G1 = u64;
    type G2 = u64;
    type Gt = u64;
    type Scalar = u64;

    fn deserialize_g1(bytes: &[u8]) -> Result<u64, CryptoError> {
        decode(bytes, G1_COMPRESSED_LEN, G1_UNCOMPRESSED_LEN).ok_or(CryptoError::InvalidG1Point)
    }

    fn deserialize_g2(bytes: &[u8]) -> Result<u64, CryptoError> {
        decode(bytes, G2_COMPRESSED_LEN, G2_UNCOMPRESSED_LEN).ok_or(CryptoError::InvalidG2Point)
    }

    fn serialize_g1(point: &u64) -> G1Point {
        let mut out = [0u8; G1_COMPRESSED_LEN];
        out.copy_from_slice(&encode(*point, G1_COMPRESSED_LEN));
        G1Point(out)
    }

    fn serialize_g2(point: &u64) -> G2Point {
        let mut out = [0u8; G2_COMPRESSED_LEN];
        out.copy_from_slice(&encode(*point, G2_COMPRESSED_LEN));
        G2Point(out)
    }

    fn g1_generator() -> u64 {
        1
    }

    fn mul_g1(point: &u64, scalar: &u64) -> u64 {
        point.wrapping_mul(*scalar)
    }

    fn mul_g2(point: &u64, scalar: &u64) -> u64 {
        point.wrapping_mul(*scalar)
    }

    fn pairing(g1: &u64, g2: &u64) -> u64 {
        g1.wrapping_mul(*g2)
    }

    fn hash_to_g2(dst: &[u8], msg: &[u8]) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(dst);
        hasher.update(msg);
        let digest = hasher.finalize();
        let mut le = [0u8; 8];
        le.copy_from_slice(&digest[..8]);
        // Odd values are units mod 2^64, so distinct rounds stay distinct
        // under scalar multiplication.
        u64::from_le_bytes(le) | 1
    }

    fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> u64 {
        rng.next_u64() | 1
    }

    fn gt_bytes(k: &u64) -> Vec<u8> {
        k.to_le_bytes().to_vec()
    }
}

/// Mock uncompressed G1 encoding, for tests exercising the tolerant parse
/// order.
pub fn uncompressed_g1(point: u64) -> Vec<u8> {
    encode(point, G1_UNCOMPRESSED_LEN)
}

/// Mock uncompressed G2 encoding.
pub fn uncompressed_g2(point: u64) -> Vec<u8> {
    encode(point, G2_UNCOMPRESSED_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_bilinearity() {
        let s = 7u64;
        let r = 11u64;
        let q = MockSuite::hash_to_g2(b"dst", b"round");

        let mpk = MockSuite::mul_g1(&MockSuite::g1_generator(), &s);
        let lhs = MockSuite::pairing(&MockSuite::mul_g1(&mpk, &r), &q);

        let u = MockSuite::mul_g1(&MockSuite::g1_generator(), &r);
        let sig = MockSuite::mul_g2(&q, &s);
        let rhs = MockSuite::pairing(&u, &sig);

        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_mock_encoding_roundtrip() {
        let point = 0xdead_beefu64;
        let compressed = MockSuite::serialize_g1(&point);
        assert_eq!(MockSuite::deserialize_g1(&compressed.0).unwrap(), point);
        assert_eq!(
            MockSuite::deserialize_g1(&uncompressed_g1(point)).unwrap(),
            point
        );
    }

    #[test]
    fn test_mock_rejects_bad_encodings() {
        assert!(MockSuite::deserialize_g1(&[0u8; 7]).is_err());

        let mut corrupt = uncompressed_g1(5);
        corrupt[20] = 0xff;
        assert!(MockSuite::deserialize_g1(&corrupt).is_err());
    }
}
