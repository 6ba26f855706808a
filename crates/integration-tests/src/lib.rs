//! End-to-end integration tests for the timelock auction settlement system.
//!
//! These tests exercise the full lifecycle over the production BLS12-381
//! backend and real secp256k1 relay signatures:
//! 1. Relayed faucet grants
//! 2. Auction creation
//! 3. Sealed bid encryption and relayed submission
//! 4. Round signature publication
//! 5. Reveal, winner declaration and custody settlement

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use tlock_crypto::pairing::Bls12381;
use tlock_crypto::timelock::{self, TimelockParams};
use tlock_crypto::{relay, PairingSuite};
use tlock_module::handlers::{self, CallContext};
use tlock_module::queries::{handle_query, SettlementQuery, SettlementQueryResponse};
use tlock_module::{
    dispatch_relayed, InMemoryCustody, LocalRoundAuthority, RelayCall, RelayedAction,
    SettlementError, SettlementGenesisConfig, SettlementState,
};
use tlock_types::{round_tag, Address, RelayIdentity};

const ROUND: u64 = 42;
const AUCTION_DURATION: u64 = 3_600;

/// A relaying principal: an external secp256k1 key plus the derived
/// ledger-side addresses.
struct Principal {
    key: SigningKey,
    identity: RelayIdentity,
    authority: Address,
}

impl Principal {
    fn random() -> Self {
        let key = SigningKey::random(&mut OsRng);
        let identity = relay::identity_of(key.verifying_key());
        let authority = relay::derive_authority(&identity);
        Self {
            key,
            identity,
            authority,
        }
    }

    fn sign(&self, nonce: u64, call: RelayCall) -> RelayedAction {
        let mut action = RelayedAction {
            identity: self.identity,
            nonce,
            call,
            signature: Vec::new(),
        };
        let digest = action.signing_digest();
        let (sig, recovery_id) = self.key.sign_prehash_recoverable(&digest).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        action.signature = bytes;
        action
    }
}

struct Harness {
    state: SettlementState,
    custody: InMemoryCustody,
    oracle: LocalRoundAuthority,
    master_secret: <Bls12381 as PairingSuite>::Scalar,
    mpk_bytes: Vec<u8>,
}

impl Harness {
    fn new() -> Self {
        let master_secret = Bls12381::random_scalar(&mut OsRng);
        let mpk_bytes = timelock::master_public_key::<Bls12381>(&master_secret).0.to_vec();

        Self {
            state: SettlementState::from_genesis(&SettlementGenesisConfig::default()).unwrap(),
            custody: InMemoryCustody::new(),
            oracle: LocalRoundAuthority::new(),
            master_secret,
            mpk_bytes,
        }
    }

    fn dispatch(&mut self, now: u64, action: &RelayedAction) -> Result<(), SettlementError> {
        dispatch_relayed::<Bls12381, _>(&mut self.state, &mut self.custody, now, action)
    }

    /// Client-side sealing of a bid amount for the harness auction round.
    fn seal(&self, amount: u64) -> (Vec<u8>, Vec<u8>) {
        let params = TimelockParams::<Bls12381>::from_bytes(&self.mpk_bytes).unwrap();
        let ciphertext = timelock::encrypt(
            &params,
            &round_tag(ROUND),
            &amount.to_le_bytes(),
            &mut OsRng,
        );
        (ciphertext.ephemeral.0.to_vec(), ciphertext.payload)
    }

    fn publish_round(&mut self) {
        let signature =
            timelock::sign_round_identity::<Bls12381>(&self.master_secret, &round_tag(ROUND));
        self.oracle.publish(ROUND, signature.0.to_vec());
    }

    fn reveal(&mut self, now: u64, seller: Address) -> Result<(), SettlementError> {
        handlers::handle_reveal::<Bls12381, _, _>(
            &mut self.state.auctions,
            &mut self.custody,
            &self.oracle,
            &CallContext {
                sender: [0u8; 32],
                timestamp: now,
            },
            seller,
            ROUND,
        )
    }

    /// Faucet-fund a principal and open a (min 100, 3600s) auction selling
    /// 500 units, all via relayed actions at t=0.
    fn open_auction(&mut self, seller: &Principal) {
        self.dispatch(0, &seller.sign(0, RelayCall::Faucet { amount: 500 }))
            .unwrap();
        self.dispatch(
            0,
            &seller.sign(
                1,
                RelayCall::CreateAuction {
                    asset_amount: 500,
                    min_price: 100,
                    duration: AUCTION_DURATION,
                    master_public_key: self.mpk_bytes.clone(),
                },
            ),
        )
        .unwrap();
    }

    /// Faucet-fund a bidder and submit a sealed bid of `amount` under a
    /// `locked` payment lock.
    fn place_bid(&mut self, bidder: &Principal, seller: Address, locked: u64, amount: u64) {
        self.dispatch(10, &bidder.sign(0, RelayCall::Faucet { amount: locked }))
            .unwrap();
        let (ephemeral, payload) = self.seal(amount);
        self.dispatch(
            10,
            &bidder.sign(
                1,
                RelayCall::SubmitBid {
                    seller,
                    amount_locked: locked,
                    ephemeral,
                    payload,
                },
            ),
        )
        .unwrap();
    }

    fn winner(&self, seller: Address) -> Option<(Address, u64)> {
        match handle_query(&self.state, SettlementQuery::GetWinner { seller }) {
            SettlementQueryResponse::Winner(winner) => {
                winner.map(|declared| (declared.winner, declared.amount))
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}

#[test]
fn test_full_relayed_auction_lifecycle() {
    let mut harness = Harness::new();
    let seller = Principal::random();
    let x = Principal::random();
    let y = Principal::random();

    harness.open_auction(&seller);
    harness.place_bid(&x, seller.authority, 150, 120);
    harness.place_bid(&y, seller.authority, 300, 300);

    // Reveal before the bidding window closes is rejected outright.
    assert_eq!(
        harness.reveal(AUCTION_DURATION - 1, seller.authority),
        Err(SettlementError::AuctionNotEnded)
    );

    // After close but before publication: retryable, zero side effects.
    assert_eq!(
        harness.reveal(AUCTION_DURATION, seller.authority),
        Err(SettlementError::InvalidDecryptionKey)
    );
    assert_eq!(harness.winner(seller.authority), None);

    // The identical call succeeds once the round signature is out.
    harness.publish_round();
    harness.reveal(AUCTION_DURATION, seller.authority).unwrap();

    assert_eq!(
        harness.winner(seller.authority),
        Some((y.authority, 300))
    );

    // Custody settled: Y paid 300 to the seller and holds the asset value,
    // X was refunded in full.
    assert_eq!(harness.custody.balance(&seller.authority), 300);
    assert_eq!(harness.custody.balance(&x.authority), 150);
    assert_eq!(harness.custody.balance(&y.authority), 500);
    // Conservation across the whole run.
    assert_eq!(harness.custody.total(), 500 + 150 + 300);
}

#[test]
fn test_single_bid_wins_at_sealed_amount() {
    let mut harness = Harness::new();
    let seller = Principal::random();
    let x = Principal::random();

    harness.open_auction(&seller);
    harness.place_bid(&x, seller.authority, 150, 120);

    harness.publish_round();
    harness.reveal(AUCTION_DURATION, seller.authority).unwrap();

    assert_eq!(
        harness.winner(seller.authority),
        Some((x.authority, 120))
    );
}

#[test]
fn test_underfunded_bid_never_wins() {
    let mut harness = Harness::new();
    let seller = Principal::random();
    let y = Principal::random();
    let z = Principal::random();

    harness.open_auction(&seller);
    // Z seals 500 but locks only 400; Y seals and locks 300.
    harness.place_bid(&z, seller.authority, 400, 500);
    harness.place_bid(&y, seller.authority, 300, 300);

    harness.publish_round();
    harness.reveal(AUCTION_DURATION, seller.authority).unwrap();

    assert_eq!(
        harness.winner(seller.authority),
        Some((y.authority, 300))
    );
    // Z's lock came back untouched.
    assert_eq!(harness.custody.balance(&z.authority), 400);
}

#[test]
fn test_reveal_is_idempotent_for_retrying_relayers() {
    let mut harness = Harness::new();
    let seller = Principal::random();
    let x = Principal::random();

    harness.open_auction(&seller);
    harness.place_bid(&x, seller.authority, 150, 120);
    harness.publish_round();

    harness.reveal(AUCTION_DURATION, seller.authority).unwrap();
    let first = harness.winner(seller.authority);
    let total = harness.custody.total();

    // A relayer retry is a success no-op.
    harness.reveal(AUCTION_DURATION + 100, seller.authority).unwrap();
    assert_eq!(harness.winner(seller.authority), first);
    assert_eq!(harness.custody.total(), total);
    assert_eq!(harness.custody.balance(&seller.authority), 150);
}

#[test]
fn test_nonce_replay_is_rejected_regardless_of_payload() {
    let mut harness = Harness::new();
    let principal = Principal::random();

    harness
        .dispatch(0, &principal.sign(0, RelayCall::Faucet { amount: 100 }))
        .unwrap();

    // A fresh, correctly signed action reusing the consumed nonce is
    // rejected whatever it asks for.
    let replayed = principal.sign(
        0,
        RelayCall::CreateAuction {
            asset_amount: 1,
            min_price: 1,
            duration: AUCTION_DURATION,
            master_public_key: harness.mpk_bytes.clone(),
        },
    );
    assert_eq!(
        harness.dispatch(0, &replayed),
        Err(SettlementError::InvalidNonce {
            expected: 1,
            got: 0
        })
    );

    // Re-querying the nonce and resubmitting recovers.
    let nonce = match handle_query(
        &harness.state,
        SettlementQuery::GetNonce {
            identity: principal.identity,
        },
    ) {
        SettlementQueryResponse::Nonce(nonce) => nonce,
        other => panic!("unexpected response: {other:?}"),
    };
    harness
        .dispatch(0, &principal.sign(nonce, RelayCall::Faucet { amount: 50 }))
        .unwrap();
    assert_eq!(harness.custody.balance(&principal.authority), 150);
}

#[test]
fn test_signature_cannot_be_replayed_across_action_kinds() {
    let mut harness = Harness::new();
    let principal = Principal::random();

    let faucet = principal.sign(0, RelayCall::Faucet { amount: 100 });

    // Graft the faucet signature onto a different action kind with an
    // identical parameter tail; the domain-separated digest no longer
    // matches what was signed.
    let forged = RelayedAction {
        identity: principal.identity,
        nonce: 0,
        call: RelayCall::CreateAuction {
            asset_amount: 100,
            min_price: 0,
            duration: 0,
            master_public_key: Vec::new(),
        },
        signature: faucet.signature.clone(),
    };

    let result = harness.dispatch(0, &forged);
    assert!(matches!(
        result,
        Err(SettlementError::InvalidAddress) | Err(SettlementError::InvalidSignature)
    ));
    assert_eq!(harness.custody.balance(&principal.authority), 0);
}

#[test]
fn test_sealed_amounts_stay_hidden_until_round_publication() {
    let mut harness = Harness::new();
    let seller = Principal::random();
    let x = Principal::random();

    harness.open_auction(&seller);
    harness.place_bid(&x, seller.authority, 150, 120);

    // The stored ciphertext never contains the amount in the clear.
    let auction = harness.state.auctions.get(&seller.authority).unwrap();
    let payload = &auction.bids[0].ciphertext.payload;
    assert_eq!(payload.len(), 8);
    assert_ne!(payload.as_slice(), 120u64.to_le_bytes().as_slice());
}
