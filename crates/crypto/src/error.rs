//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid G1 point encoding")]
    InvalidG1Point,

    #[error("Invalid G2 point encoding")]
    InvalidG2Point,

    #[error("Invalid scalar encoding")]
    InvalidScalar,

    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Recovered signer does not match claimed identity")]
    InvalidAddress,
}
