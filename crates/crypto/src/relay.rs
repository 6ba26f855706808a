//! Relay authentication: ECDSA recovery against domain-separated digests.
//!
//! A principal identified by a 20-byte external identity signs an intended
//! action off-ledger; a relayer submits the action together with the
//! signature. Verification recovers the secp256k1 public key from the
//! 65-byte recoverable signature and checks that its derived identity
//! matches the claimed one. No session key or on-ledger account is required
//! of the principal.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256, Sha3_256};

use tlock_types::{Address, RelayIdentity};

use crate::error::CryptoError;

/// Fixed 28-byte ASCII prefix hashed over the inner action digest before
/// signing, binding signatures to this signing convention.
pub const SIGNED_MESSAGE_PREFIX: &[u8; 28] = b"\x19Ethereum Signed Message:\n32";

/// Recoverable signature length: r (32) || s (32) || v (1).
pub const SIGNATURE_LEN: usize = 65;

/// Domain tag for deriving local authority addresses from external
/// identities.
const AUTHORITY_DOMAIN: &[u8] = b"tlock-relay-authority-v1";

/// Keccak-256 convenience wrapper.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Final signing digest over a 32-byte inner action hash.
pub fn signing_digest(inner: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(inner);
    hasher.finalize().into()
}

/// Recover the identity that produced `signature` over `digest`.
///
/// The recovery id `v` is the last signature byte; the legacy {27, 28}
/// values are normalized to {0, 1}.
pub fn recover_identity(digest: &[u8; 32], signature: &[u8]) -> Result<RelayIdentity, CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature);
    }

    let v = match signature[SIGNATURE_LEN - 1] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return Err(CryptoError::InvalidSignature),
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidSignature)?;

    let sig = Signature::from_slice(&signature[..SIGNATURE_LEN - 1])
        .map_err(|_| CryptoError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;

    Ok(identity_of(&key))
}

/// Identity of a public key: the last 20 bytes of Keccak-256 over the
/// 64-byte uncompressed key body (the SEC1 encoding without its leading
/// 0x04 tag).
pub fn identity_of(key: &VerifyingKey) -> RelayIdentity {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut id = [0u8; 20];
    id.copy_from_slice(&hash[12..]);
    RelayIdentity(id)
}

/// Verify that `signature` over `digest` was produced by `claimed`.
///
/// Fails [`CryptoError::InvalidSignature`] on malformed or unrecoverable
/// signatures and [`CryptoError::InvalidAddress`] when recovery succeeds
/// but yields a different identity. Nothing secret is compared, so the
/// equality check need not be constant time.
pub fn verify(
    digest: &[u8; 32],
    signature: &[u8],
    claimed: &RelayIdentity,
) -> Result<(), CryptoError> {
    let recovered = recover_identity(digest, signature)?;
    if recovered != *claimed {
        return Err(CryptoError::InvalidAddress);
    }
    Ok(())
}

/// Deterministic local authority address for an external identity.
///
/// SHA3-256 over a domain-tagged preimage, so the ledger-side principal is
/// derivable by anyone from the identity alone and never touches key
/// material.
pub fn derive_authority(identity: &RelayIdentity) -> Address {
    let mut hasher = Sha3_256::new();
    hasher.update(AUTHORITY_DOMAIN);
    hasher.update(identity.0);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    fn signed(digest: &[u8; 32]) -> (RelayIdentity, Vec<u8>) {
        let signing_key = SigningKey::random(&mut OsRng);
        let identity = identity_of(signing_key.verifying_key());

        let (sig, recovery_id) = signing_key.sign_prehash_recoverable(digest).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        (identity, bytes)
    }

    #[test]
    fn test_recover_and_verify() {
        let digest = signing_digest(&keccak256(b"action"));
        let (identity, signature) = signed(&digest);

        assert_eq!(recover_identity(&digest, &signature).unwrap(), identity);
        assert!(verify(&digest, &signature, &identity).is_ok());
    }

    #[test]
    fn test_legacy_v_normalization() {
        let digest = signing_digest(&keccak256(b"action"));
        let (identity, mut signature) = signed(&digest);

        signature[64] += 27;
        assert!(verify(&digest, &signature, &identity).is_ok());
    }

    #[test]
    fn test_invalid_recovery_byte() {
        let digest = signing_digest(&keccak256(b"action"));
        let (identity, mut signature) = signed(&digest);

        signature[64] = 9;
        assert_eq!(
            verify(&digest, &signature, &identity),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_length_signature() {
        let digest = signing_digest(&keccak256(b"action"));
        assert_eq!(
            recover_identity(&digest, &[0u8; 64]),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_binds_identity() {
        let digest = signing_digest(&keccak256(b"action"));
        let (_, signature) = signed(&digest);
        let (other_identity, _) = signed(&digest);

        assert_eq!(
            verify(&digest, &signature, &other_identity),
            Err(CryptoError::InvalidAddress)
        );
    }

    #[test]
    fn test_signature_does_not_transfer_across_digests() {
        let digest_a = signing_digest(&keccak256(b"action a"));
        let digest_b = signing_digest(&keccak256(b"action b"));
        let (identity, signature) = signed(&digest_a);

        // Recovery over a different digest yields some key, but not ours.
        assert!(verify(&digest_b, &signature, &identity).is_err());
    }

    #[test]
    fn test_derive_authority_is_stable() {
        let id = RelayIdentity([5u8; 20]);
        assert_eq!(derive_authority(&id), derive_authority(&id));
        assert_ne!(derive_authority(&id), derive_authority(&RelayIdentity([6u8; 20])));
    }
}
