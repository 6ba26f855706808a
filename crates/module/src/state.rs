//! Durable settlement state: the auction store and the identity registry.
//!
//! Both stores are explicit keyed maps owned exclusively by their wrapper
//! types; nothing outside this module hands out aliased mutable access.
//! In a production deployment these would be the substrate's durable
//! key-value maps; this is the in-memory representation with the same
//! semantics.

use std::collections::HashMap;

use tlock_crypto::relay;
use tlock_types::{Address, Auction, IdentityRecord, RelayIdentity};

use crate::error::SettlementError;
use crate::genesis::{DefaultAuctionParams, GenesisValidationError, SettlementGenesisConfig};

/// Scoped capability to act as a principal on the settlement ledger.
///
/// Only the identity registry mints these, after nonce authorization; the
/// token carries the derived authority address and nothing else — no key
/// material is ever held on this side of the relay.
pub struct AuthorityToken {
    address: Address,
}

impl AuthorityToken {
    pub(crate) fn new(address: Address) -> Self {
        Self { address }
    }

    /// The principal address this token acts as.
    pub fn address(&self) -> Address {
        self.address
    }
}

/// Keyed store of auctions, one per seller.
#[derive(Debug, Default)]
pub struct AuctionStore {
    auctions: HashMap<Address, Auction>,
}

impl AuctionStore {
    /// Get a seller's auction.
    pub fn get(&self, seller: &Address) -> Option<&Auction> {
        self.auctions.get(seller)
    }

    pub(crate) fn get_mut(&mut self, seller: &Address) -> Option<&mut Auction> {
        self.auctions.get_mut(seller)
    }

    pub(crate) fn insert(&mut self, auction: Auction) {
        self.auctions.insert(auction.seller, auction);
    }

    /// Iterate over all auctions.
    pub fn iter(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }
}

/// Registry of external identities and their replay-protection nonces.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    records: HashMap<RelayIdentity, IdentityRecord>,
}

impl IdentityRegistry {
    /// Look up the record for an identity, if it has been seen.
    pub fn record(&self, identity: &RelayIdentity) -> Option<&IdentityRecord> {
        self.records.get(identity)
    }

    /// Next nonce the identity must sign. 0 for identities never seen.
    pub fn expected_nonce(&self, identity: &RelayIdentity) -> u64 {
        self.records.get(identity).map(|r| r.nonce).unwrap_or(0)
    }

    pub(crate) fn register(&mut self, identity: RelayIdentity) -> &mut IdentityRecord {
        self.records.entry(identity).or_insert_with(|| IdentityRecord {
            authority: relay::derive_authority(&identity),
            nonce: 0,
        })
    }

    /// Authorize a relayed operation and advance the identity's nonce.
    ///
    /// The record is lazily created on first contact. `claimed_nonce` must
    /// equal the stored nonce exactly — no gaps, no reordering. The nonce
    /// is incremented only after `op` succeeds, so a failed downstream
    /// operation leaves the registry untouched and the action can be
    /// resubmitted with the same nonce.
    pub fn authorize_and_advance<T>(
        &mut self,
        identity: RelayIdentity,
        claimed_nonce: u64,
        op: impl FnOnce(AuthorityToken) -> Result<T, SettlementError>,
    ) -> Result<T, SettlementError> {
        let record = self.register(identity);
        if claimed_nonce != record.nonce {
            return Err(SettlementError::InvalidNonce {
                expected: record.nonce,
                got: claimed_nonce,
            });
        }

        let result = op(AuthorityToken::new(record.authority))?;

        record.nonce += 1;
        Ok(result)
    }
}

/// Complete settlement module state.
#[derive(Debug, Default)]
pub struct SettlementState {
    pub auctions: AuctionStore,
    pub identities: IdentityRegistry,
    pub params: DefaultAuctionParams,
}

impl SettlementState {
    /// Fresh state with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a validated genesis configuration.
    pub fn from_genesis(config: &SettlementGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;

        let mut state = Self {
            params: config.default_params.clone(),
            ..Self::default()
        };
        for identity in &config.initial_identities {
            state.identities.register(*identity);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(byte: u8) -> RelayIdentity {
        RelayIdentity([byte; 20])
    }

    #[test]
    fn test_expected_nonce_starts_at_zero() {
        let registry = IdentityRegistry::default();
        assert_eq!(registry.expected_nonce(&identity(1)), 0);
    }

    #[test]
    fn test_authorize_advances_on_success() {
        let mut registry = IdentityRegistry::default();
        let id = identity(1);

        let authority = registry
            .authorize_and_advance(id, 0, |token| Ok(token.address()))
            .unwrap();

        assert_eq!(authority, relay::derive_authority(&id));
        assert_eq!(registry.expected_nonce(&id), 1);
    }

    #[test]
    fn test_authorize_rejects_stale_and_future_nonces() {
        let mut registry = IdentityRegistry::default();
        let id = identity(1);

        registry.authorize_and_advance(id, 0, |_| Ok(())).unwrap();

        // Replay.
        assert_eq!(
            registry.authorize_and_advance(id, 0, |_| Ok(())),
            Err(SettlementError::InvalidNonce {
                expected: 1,
                got: 0
            })
        );
        // Gap.
        assert_eq!(
            registry.authorize_and_advance(id, 3, |_| Ok(())),
            Err(SettlementError::InvalidNonce {
                expected: 1,
                got: 3
            })
        );
        assert_eq!(registry.expected_nonce(&id), 1);
    }

    #[test]
    fn test_failed_op_leaves_nonce_unincremented() {
        let mut registry = IdentityRegistry::default();
        let id = identity(1);

        let result: Result<(), _> =
            registry.authorize_and_advance(id, 0, |_| Err(SettlementError::AuctionNotStarted));
        assert_eq!(result, Err(SettlementError::AuctionNotStarted));

        // The same nonce is still valid.
        assert_eq!(registry.expected_nonce(&id), 0);
        registry.authorize_and_advance(id, 0, |_| Ok(())).unwrap();
        assert_eq!(registry.expected_nonce(&id), 1);
    }

    #[test]
    fn test_from_genesis_seeds_identities() {
        let config = SettlementGenesisConfig {
            initial_identities: vec![identity(1), identity(2)],
            ..Default::default()
        };
        let state = SettlementState::from_genesis(&config).unwrap();

        assert!(state.identities.record(&identity(1)).is_some());
        assert!(state.identities.record(&identity(2)).is_some());
        assert!(state.identities.record(&identity(3)).is_none());
    }
}
