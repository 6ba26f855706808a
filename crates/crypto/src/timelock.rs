//! Timelock encryption: hashed IBE over a pairing suite.
//!
//! The "identity" is a round tag whose decryption trapdoor is the round
//! authority's signature on that tag. Until the signature is published the
//! ciphertext cannot be opened; once it is, anyone can decrypt.
//!
//! # Encryption
//!
//! To encrypt a message `m` for round identity `id` under master public key
//! `P_pub = s·G1`:
//! 1. Sample ephemeral scalar `r`
//! 2. Compute `U = r·G1`
//! 3. Compute `Q_id = H(id) ∈ G2`
//! 4. Compute `K = e(r·P_pub, Q_id)` (equals `e(P_pub, Q_id)^r`)
//! 5. Mask: `payload = m XOR Keccak256(serialize(K))`
//!
//! # Decryption
//!
//! Given the round signature `S = s·Q_id`:
//! 1. Compute `K' = e(U, S)`; by bilinearity `K' == K`
//! 2. Unmask: `m = payload XOR Keccak256(serialize(K'))`
//!
//! Decryption is pure: a wrong signature simply yields garbage bytes, which
//! callers must validate. The XOR is truncated to the shorter of message and
//! mask; bytes past the shorter operand are dropped, not carried through.
//! With a 32-byte mask this caps plaintexts at 32 bytes, which comfortably
//! fits the 8-byte bid amounts the settlement engine transports.

use rand::{CryptoRng, RngCore};
use sha3::{Digest, Keccak256};

use tlock_types::{G1Point, G2Point, TimelockCiphertext};

use crate::error::CryptoError;
use crate::pairing::PairingSuite;

/// Domain separation tag for hashing round identities into G2
/// (RFC 9380 suite id).
pub const ROUND_IDENTITY_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Parameters identifying a timelock scheme instance.
pub struct TimelockParams<P: PairingSuite> {
    /// Master public key `P_pub = s·G1` of the round authority.
    pub mpk: P::G1,
}

impl<P: PairingSuite> TimelockParams<P> {
    /// Parse a master public key from externally supplied bytes, accepting
    /// either point format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            mpk: P::deserialize_g1(bytes)?,
        })
    }
}

/// Encrypt a message to a round identity.
pub fn encrypt<P: PairingSuite, R: RngCore + CryptoRng>(
    params: &TimelockParams<P>,
    identity: &[u8],
    message: &[u8],
    rng: &mut R,
) -> TimelockCiphertext {
    let r = P::random_scalar(rng);
    let u = P::mul_g1(&P::g1_generator(), &r);

    let q_id = P::hash_to_g2(ROUND_IDENTITY_DST, identity);
    let k = P::pairing(&P::mul_g1(&params.mpk, &r), &q_id);

    TimelockCiphertext {
        ephemeral: P::serialize_g1(&u),
        payload: apply_mask::<P>(&k, message),
    }
}

/// Decrypt a ciphertext with a round signature.
///
/// `u_bytes` is re-parsed through the tolerant multi-format policy; a parse
/// failure is a non-retryable [`CryptoError::InvalidCiphertext`]. Given a
/// well-formed ephemeral point the function cannot fail.
pub fn decrypt<P: PairingSuite>(
    u_bytes: &[u8],
    payload: &[u8],
    round_signature: &P::G2,
) -> Result<Vec<u8>, CryptoError> {
    let u = P::deserialize_g1(u_bytes).map_err(|_| CryptoError::InvalidCiphertext)?;
    let k = P::pairing(&u, round_signature);
    Ok(apply_mask::<P>(&k, payload))
}

/// Produce the round signature `S = s·H(id)` acting as the decryption
/// trapdoor for `identity`. This is the round authority's side of the
/// scheme; the settlement core only ever consumes the result.
pub fn sign_round_identity<P: PairingSuite>(master_secret: &P::Scalar, identity: &[u8]) -> G2Point {
    let q_id = P::hash_to_g2(ROUND_IDENTITY_DST, identity);
    P::serialize_g2(&P::mul_g2(&q_id, master_secret))
}

/// Master public key `P_pub = s·G1` for a master secret.
pub fn master_public_key<P: PairingSuite>(master_secret: &P::Scalar) -> G1Point {
    P::serialize_g1(&P::mul_g1(&P::g1_generator(), master_secret))
}

/// XOR the message against the Keccak-256 mask of the shared Gt element,
/// truncated to the shorter operand.
fn apply_mask<P: PairingSuite>(k: &P::Gt, message: &[u8]) -> Vec<u8> {
    let mask: [u8; 32] = Keccak256::digest(P::gt_bytes(k)).into();
    message
        .iter()
        .zip(mask.iter())
        .map(|(m, k)| m ^ k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSuite;
    use crate::pairing::Bls12381;
    use rand::rngs::OsRng;
    use tlock_types::round_tag;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut rng = OsRng;
        let master_secret = Bls12381::random_scalar(&mut rng);
        let params = TimelockParams::<Bls12381> {
            mpk: Bls12381::deserialize_g1(&master_public_key::<Bls12381>(&master_secret).0)
                .unwrap(),
        };

        let identity = round_tag(42);
        let message = 120u64.to_le_bytes();

        let ciphertext = encrypt(&params, &identity, &message, &mut rng);

        let sig_bytes = sign_round_identity::<Bls12381>(&master_secret, &identity);
        let sig = Bls12381::deserialize_g2(&sig_bytes.0).unwrap();

        let decrypted =
            decrypt::<Bls12381>(&ciphertext.ephemeral.0, &ciphertext.payload, &sig).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_wrong_round_signature_yields_garbage() {
        let mut rng = OsRng;
        let master_secret = Bls12381::random_scalar(&mut rng);
        let params = TimelockParams::<Bls12381> {
            mpk: Bls12381::deserialize_g1(&master_public_key::<Bls12381>(&master_secret).0)
                .unwrap(),
        };

        let message = b"sealed bid";
        let ciphertext = encrypt(&params, &round_tag(7), message, &mut rng);

        let wrong_sig_bytes = sign_round_identity::<Bls12381>(&master_secret, &round_tag(8));
        let wrong_sig = Bls12381::deserialize_g2(&wrong_sig_bytes.0).unwrap();

        // Decryption stays total; the output just fails to match.
        let decrypted =
            decrypt::<Bls12381>(&ciphertext.ephemeral.0, &ciphertext.payload, &wrong_sig).unwrap();
        assert_eq!(decrypted.len(), message.len());
        assert_ne!(decrypted, message);
    }

    #[test]
    fn test_mask_truncates_to_shorter_operand() {
        let mut rng = OsRng;
        let master_secret = MockSuite::random_scalar(&mut rng);
        let params = TimelockParams::<MockSuite> {
            mpk: MockSuite::mul_g1(&MockSuite::g1_generator(), &master_secret),
        };

        // 40-byte message against a 32-byte mask: the tail is dropped.
        let message = [0xabu8; 40];
        let ciphertext = encrypt(&params, &round_tag(1), &message, &mut rng);
        assert_eq!(ciphertext.payload.len(), 32);

        let sig = MockSuite::deserialize_g2(
            &sign_round_identity::<MockSuite>(&master_secret, &round_tag(1)).0,
        )
        .unwrap();
        let decrypted =
            decrypt::<MockSuite>(&ciphertext.ephemeral.0, &ciphertext.payload, &sig).unwrap();
        assert_eq!(decrypted, message[..32]);
    }

    #[test]
    fn test_decrypt_rejects_malformed_ephemeral() {
        let sig = MockSuite::hash_to_g2(ROUND_IDENTITY_DST, b"round");
        let result = decrypt::<MockSuite>(&[0xff; 5], &[0u8; 8], &sig);
        assert_eq!(result, Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn test_ephemeral_accepts_uncompressed_form() {
        let mut rng = OsRng;
        let master_secret = MockSuite::random_scalar(&mut rng);
        let params = TimelockParams::<MockSuite> {
            mpk: MockSuite::mul_g1(&MockSuite::g1_generator(), &master_secret),
        };

        let message = 9u64.to_le_bytes();
        let ciphertext = encrypt(&params, &round_tag(3), &message, &mut rng);

        let u = MockSuite::deserialize_g1(&ciphertext.ephemeral.0).unwrap();
        let sig = MockSuite::mul_g2(
            &MockSuite::hash_to_g2(ROUND_IDENTITY_DST, &round_tag(3)),
            &master_secret,
        );

        let decrypted = decrypt::<MockSuite>(
            &crate::mock::uncompressed_g1(u),
            &ciphertext.payload,
            &sig,
        )
        .unwrap();
        assert_eq!(decrypted, message);
    }
}
