//! Core type definitions for timelock-sealed auction settlement.
//!
//! This crate provides the shared data structures used across the settlement
//! system: curve point encodings, principal addresses, auction and bid
//! records, and the relay identity bookkeeping types.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

// =========================
// CRYPTOGRAPHIC PRIMITIVES
// =========================

/// Compressed G1 point on BLS12-381 (48 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G1Point(#[serde_as(as = "[_; 48]")] pub [u8; 48]);

impl Default for G1Point {
    fn default() -> Self {
        Self([0u8; 48])
    }
}

/// Compressed G2 point on BLS12-381 (96 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G2Point(#[serde_as(as = "[_; 96]")] pub [u8; 96]);

impl Default for G2Point {
    fn default() -> Self {
        Self([0u8; 96])
    }
}

// =========================
// PRINCIPALS
// =========================

/// Local principal address on the settlement ledger (32 bytes)
pub type Address = [u8; 32];

/// External relay identity: the last 20 bytes of the Keccak-256 hash of an
/// uncompressed secp256k1 public key.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct RelayIdentity(pub [u8; 20]);

/// Per-identity registry entry.
///
/// `nonce` is the next value the identity must sign; it advances by exactly
/// one per successfully dispatched relayed action.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Deterministically derived local authority address for this identity.
    pub authority: Address,
    /// Next expected nonce. Starts at 0 on first contact.
    pub nonce: u64,
}

// =========================
// TIMELOCK ENCRYPTION
// =========================

/// Hashed-IBE ciphertext sealing a bid until the round signature is published.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TimelockCiphertext {
    /// Ephemeral public key: U = r·G1, stored in canonical compressed form.
    pub ephemeral: G1Point,

    /// Masked payload. The first 8 bytes carry the little-endian bid amount;
    /// anything past the mask length was dropped at encryption time.
    pub payload: Vec<u8>,
}

/// Identity tag for a timelock round.
///
/// The round authority signs exactly these bytes, so encryptor and settlement
/// engine must agree on the encoding.
pub fn round_tag(round_id: u64) -> [u8; 8] {
    round_id.to_le_bytes()
}

/// Decode a decrypted bid payload into an amount.
///
/// The first 8 bytes are a little-endian u64; extra bytes are ignored.
/// Payloads shorter than 8 bytes decode as 0, so corrupted ciphertexts
/// degrade to worthless bids instead of aborting reveal.
pub fn decode_bid_amount(payload: &[u8]) -> u64 {
    if payload.len() < 8 {
        return 0;
    }
    let mut le = [0u8; 8];
    le.copy_from_slice(&payload[..8]);
    u64::from_le_bytes(le)
}

// =========================
// AUCTION TYPES
// =========================

/// Handle to funds held by the asset custody collaborator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EscrowHandle(pub u64);

/// A submitted sealed bid, retained for audit after reveal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedBid {
    pub bidder: Address,
    pub ciphertext: TimelockCiphertext,
    /// Amount locked with custody at submission; must cover the decrypted
    /// bid for the bid to qualify.
    pub locked_payment: u64,
    /// Custody handle owning `locked_payment` until reveal.
    pub escrow: EscrowHandle,
    /// Set once by reveal; a revealed bid is never decrypted again.
    pub revealed: bool,
}

/// Derived lifecycle phase of an auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Accepting bids until `end_time`.
    Bidding,
    /// Bidding closed, reveal not yet performed.
    Ended,
    /// Winner declared; record is immutable.
    Revealed,
}

/// One auction per seller per active sale.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub seller: Address,

    /// Custody handle owning the asset being sold for the auction lifetime.
    pub escrowed_asset: EscrowHandle,
    pub asset_amount: u64,

    /// Minimum decrypted bid amount accepted.
    pub min_price: u64,

    /// Bidding closes and reveal opens at this instant.
    pub end_time: u64,

    /// G1 master public key identifying the timelock scheme instance,
    /// canonical compressed form.
    pub master_public_key: G1Point,

    /// Append-only; insertion order is submission order and breaks ties.
    pub bids: Vec<EncryptedBid>,

    pub highest_bidder: Address,
    pub highest_bid: u64,
    pub winner_declared: bool,
}

impl Auction {
    /// Lifecycle phase at `now`.
    pub fn phase(&self, now: u64) -> AuctionPhase {
        if self.winner_declared {
            AuctionPhase::Revealed
        } else if now >= self.end_time {
            AuctionPhase::Ended
        } else {
            AuctionPhase::Bidding
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tag_is_little_endian() {
        assert_eq!(round_tag(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(round_tag(0x0102030405060708), [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_decode_bid_amount() {
        assert_eq!(decode_bid_amount(&[]), 0);
        assert_eq!(decode_bid_amount(&[1, 2, 3]), 0);
        assert_eq!(decode_bid_amount(&120u64.to_le_bytes()), 120);

        // Trailing bytes beyond the first 8 are ignored.
        let mut long = 300u64.to_le_bytes().to_vec();
        long.extend_from_slice(&[0xff; 16]);
        assert_eq!(decode_bid_amount(&long), 300);
    }

    #[test]
    fn test_auction_phase() {
        let auction = Auction {
            seller: [1u8; 32],
            escrowed_asset: EscrowHandle(0),
            asset_amount: 100,
            min_price: 10,
            end_time: 1000,
            master_public_key: G1Point::default(),
            bids: Vec::new(),
            highest_bidder: [1u8; 32],
            highest_bid: 0,
            winner_declared: false,
        };

        assert_eq!(auction.phase(999), AuctionPhase::Bidding);
        assert_eq!(auction.phase(1000), AuctionPhase::Ended);

        let revealed = Auction {
            winner_declared: true,
            ..auction
        };
        assert_eq!(revealed.phase(500), AuctionPhase::Revealed);
    }

    #[test]
    fn test_bid_borsh_roundtrip() {
        let bid = EncryptedBid {
            bidder: [7u8; 32],
            ciphertext: TimelockCiphertext {
                ephemeral: G1Point([3u8; 48]),
                payload: vec![0xaa; 8],
            },
            locked_payment: 150,
            escrow: EscrowHandle(4),
            revealed: false,
        };
        let encoded = borsh::to_vec(&bid).unwrap();
        let decoded: EncryptedBid = borsh::from_slice(&encoded).unwrap();
        assert_eq!(bid, decoded);
    }
}
