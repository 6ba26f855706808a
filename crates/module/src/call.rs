//! Relayed action messages and their signing digests.
//!
//! The digest a principal signs is built in two steps, both Keccak-256:
//!
//! ```text
//! inner  = Keccak256(action_prefix_byte || nonce_le8 || action params...)
//! digest = Keccak256("\x19Ethereum Signed Message:\n32" || inner)
//! ```
//!
//! Each action kind carries its own one-byte prefix, so a signature
//! authorizing a faucet grant can never be replayed as a bid, and the nonce
//! inside the inner hash pins the signature to one dispatch slot.

use borsh::{BorshDeserialize, BorshSerialize};

use tlock_crypto::relay;
use tlock_types::{Address, RelayIdentity};

/// Action prefix for faucet-style token grants.
pub const FAUCET_PREFIX: u8 = 0x01;
/// Action prefix for auction creation.
pub const CREATE_AUCTION_PREFIX: u8 = 0x02;
/// Action prefix for sealed bid submission.
pub const SUBMIT_BID_PREFIX: u8 = 0x03;

/// State-changing operations accepted over the relay.
///
/// Reveal is deliberately absent: it is permissionless and carries no
/// principal authority, so relayers call it directly.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum RelayCall {
    /// Token grant to the caller's authority address.
    Faucet { amount: u64 },

    /// Open an auction selling `asset_amount` with the given timelock
    /// master public key (either point format).
    CreateAuction {
        asset_amount: u64,
        min_price: u64,
        duration: u64,
        master_public_key: Vec<u8>,
    },

    /// Submit a sealed bid against `seller`'s auction. `ephemeral` is the
    /// IBE ephemeral point in either format; `payload` the masked bid.
    SubmitBid {
        seller: Address,
        amount_locked: u64,
        ephemeral: Vec<u8>,
        payload: Vec<u8>,
    },
}

impl RelayCall {
    /// Inner action hash. Parameter layout, in order, all integers
    /// little-endian: faucet `amount`; create-auction `asset_amount ||
    /// min_price || duration || mpk_bytes`; submit-bid `seller ||
    /// amount_locked || ephemeral || payload`.
    pub fn inner_digest(&self, nonce: u64) -> [u8; 32] {
        let mut preimage = Vec::new();
        match self {
            RelayCall::Faucet { amount } => {
                preimage.push(FAUCET_PREFIX);
                preimage.extend_from_slice(&nonce.to_le_bytes());
                preimage.extend_from_slice(&amount.to_le_bytes());
            }
            RelayCall::CreateAuction {
                asset_amount,
                min_price,
                duration,
                master_public_key,
            } => {
                preimage.push(CREATE_AUCTION_PREFIX);
                preimage.extend_from_slice(&nonce.to_le_bytes());
                preimage.extend_from_slice(&asset_amount.to_le_bytes());
                preimage.extend_from_slice(&min_price.to_le_bytes());
                preimage.extend_from_slice(&duration.to_le_bytes());
                preimage.extend_from_slice(master_public_key);
            }
            RelayCall::SubmitBid {
                seller,
                amount_locked,
                ephemeral,
                payload,
            } => {
                preimage.push(SUBMIT_BID_PREFIX);
                preimage.extend_from_slice(&nonce.to_le_bytes());
                preimage.extend_from_slice(seller);
                preimage.extend_from_slice(&amount_locked.to_le_bytes());
                preimage.extend_from_slice(ephemeral);
                preimage.extend_from_slice(payload);
            }
        }
        relay::keccak256(&preimage)
    }
}

/// A signed action as submitted by a relayer.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RelayedAction {
    /// The principal the relayer claims to act for.
    pub identity: RelayIdentity,
    /// Replay-protection nonce; must match the registry exactly.
    pub nonce: u64,
    pub call: RelayCall,
    /// 65-byte recoverable signature over [`RelayedAction::signing_digest`].
    pub signature: Vec<u8>,
}

impl RelayedAction {
    /// The digest the principal must have signed.
    pub fn signing_digest(&self) -> [u8; 32] {
        relay::signing_digest(&self.call.inner_digest(self.nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kinds_are_domain_separated() {
        // A faucet grant and a create-auction with byte-identical parameter
        // tails must never share a digest.
        let faucet = RelayCall::Faucet { amount: 100 };
        let create = RelayCall::CreateAuction {
            asset_amount: 100,
            min_price: 0,
            duration: 0,
            master_public_key: Vec::new(),
        };

        assert_ne!(faucet.inner_digest(0), create.inner_digest(0));
    }

    #[test]
    fn test_nonce_changes_digest() {
        let call = RelayCall::Faucet { amount: 5 };
        assert_ne!(call.inner_digest(0), call.inner_digest(1));
    }

    #[test]
    fn test_params_change_digest() {
        let a = RelayCall::SubmitBid {
            seller: [1u8; 32],
            amount_locked: 10,
            ephemeral: vec![1, 2, 3],
            payload: vec![4, 5],
        };
        let b = RelayCall::SubmitBid {
            seller: [1u8; 32],
            amount_locked: 11,
            ephemeral: vec![1, 2, 3],
            payload: vec![4, 5],
        };
        assert_ne!(a.inner_digest(0), b.inner_digest(0));
    }

    #[test]
    fn test_signing_digest_applies_text_prefix() {
        let action = RelayedAction {
            identity: RelayIdentity([0u8; 20]),
            nonce: 0,
            call: RelayCall::Faucet { amount: 1 },
            signature: Vec::new(),
        };

        let inner = action.call.inner_digest(0);
        let mut prefixed = relay::SIGNED_MESSAGE_PREFIX.to_vec();
        prefixed.extend_from_slice(&inner);
        assert_eq!(action.signing_digest(), relay::keccak256(&prefixed));
    }
}
