//! Query handlers for the settlement module.
//!
//! Read-only state access. Relayers use `GetNonce` to recover from
//! `InvalidNonce` rejections, and `GetAuthority` to learn the ledger-side
//! address a given external identity acts as.

use serde::{Deserialize, Serialize};

use tlock_crypto::relay;
use tlock_types::{Address, Auction, AuctionPhase, EncryptedBid, RelayIdentity};

use crate::state::SettlementState;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SettlementQuery {
    /// Get a seller's auction.
    GetAuction { seller: Address },

    /// Get all bids on a seller's auction.
    GetBids { seller: Address },

    /// Get the declared winner of a seller's auction.
    GetWinner { seller: Address },

    /// Get the next nonce expected from an external identity.
    GetNonce { identity: RelayIdentity },

    /// Get the local authority address an external identity acts as.
    GetAuthority { identity: RelayIdentity },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SettlementQueryResponse {
    /// Auction details.
    Auction(Option<Auction>),

    /// Bids on an auction.
    Bids(Vec<EncryptedBid>),

    /// Declared winner, `None` until reveal completes.
    Winner(Option<DeclaredWinner>),

    /// Next expected nonce.
    Nonce(u64),

    /// Derived authority address.
    Authority(Address),
}

/// Final winner state of a revealed auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredWinner {
    pub winner: Address,
    pub amount: u64,
}

/// Handle a query.
pub fn handle_query(state: &SettlementState, query: SettlementQuery) -> SettlementQueryResponse {
    match query {
        SettlementQuery::GetAuction { seller } => {
            SettlementQueryResponse::Auction(state.auctions.get(&seller).cloned())
        }

        SettlementQuery::GetBids { seller } => {
            let bids = state
                .auctions
                .get(&seller)
                .map(|auction| auction.bids.clone())
                .unwrap_or_default();
            SettlementQueryResponse::Bids(bids)
        }

        SettlementQuery::GetWinner { seller } => {
            let winner = state
                .auctions
                .get(&seller)
                .filter(|auction| auction.winner_declared)
                .map(|auction| DeclaredWinner {
                    winner: auction.highest_bidder,
                    amount: auction.highest_bid,
                });
            SettlementQueryResponse::Winner(winner)
        }

        SettlementQuery::GetNonce { identity } => {
            SettlementQueryResponse::Nonce(state.identities.expected_nonce(&identity))
        }

        // Derivation is pure, so this works for identities never seen.
        SettlementQuery::GetAuthority { identity } => {
            SettlementQueryResponse::Authority(relay::derive_authority(&identity))
        }
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub seller: Address,
    pub min_price: u64,
    pub end_time: u64,
    pub num_bids: usize,
    pub phase: AuctionPhase,
}

impl AuctionSummary {
    fn from_auction(auction: &Auction, now: u64) -> Self {
        Self {
            seller: auction.seller,
            min_price: auction.min_price,
            end_time: auction.end_time,
            num_bids: auction.bids.len(),
            phase: auction.phase(now),
        }
    }
}

/// Auctions currently accepting bids.
pub fn active_auctions(state: &SettlementState, now: u64) -> Vec<AuctionSummary> {
    state
        .auctions
        .iter()
        .filter(|auction| auction.phase(now) == AuctionPhase::Bidding)
        .map(|auction| AuctionSummary::from_auction(auction, now))
        .collect()
}

/// Sellers whose auctions have ended but are not yet revealed.
pub fn pending_reveal(state: &SettlementState, now: u64) -> Vec<Address> {
    state
        .auctions
        .iter()
        .filter(|auction| auction.phase(now) == AuctionPhase::Ended)
        .map(|auction| auction.seller)
        .collect()
}
