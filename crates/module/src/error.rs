//! Settlement module error types.

use thiserror::Error;

use crate::custody::CustodyError;

/// Errors that can occur in the settlement module.
///
/// Every precondition is checked before any mutation; the first failing
/// check aborts the whole operation with zero side effects. The module
/// performs no internal retries: `InvalidDecryptionKey` and `InvalidNonce`
/// are the relayer's to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("No auction started for this seller")]
    AuctionNotStarted,

    #[error("Seller already has an auction awaiting reveal")]
    AuctionInProgress,

    #[error("Bidding period ended")]
    AuctionEnded,

    #[error("Bidding period not ended")]
    AuctionNotEnded,

    #[error("Locked amount below minimum price: need {min}, got {got}")]
    BidTooLow { min: u64, got: u64 },

    #[error("Invalid auction timing")]
    InvalidTiming,

    /// Retryable: the round authority has not published the signature yet.
    #[error("Round decryption key not available")]
    InvalidDecryptionKey,

    /// Internal idempotency signal inside the reveal loop; never escapes a
    /// public operation.
    #[error("Bid already revealed")]
    BidAlreadyRevealed,

    #[error("Invalid point encoding")]
    InvalidProof,

    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Recovered signer does not match claimed identity")]
    InvalidAddress,

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error(transparent)]
    Custody(#[from] CustodyError),
}
