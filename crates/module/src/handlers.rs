//! Settlement engine: business logic for auction operations and relay
//! dispatch.
//!
//! Every public operation is a unit of work: all preconditions are checked
//! before the first mutation, so a failing call leaves state exactly as it
//! found it. Reveal additionally stages its decryption pass before applying
//! anything, because its failure modes (missing round key, corrupt stored
//! encoding) surface only mid-loop.

use tracing::{debug, info};

use tlock_crypto::pairing::PairingSuite;
use tlock_crypto::{relay, timelock, CryptoError};
use tlock_types::{decode_bid_amount, Address, Auction, EncryptedBid, TimelockCiphertext};

use crate::call::{RelayCall, RelayedAction};
use crate::custody::AssetCustody;
use crate::error::SettlementError;
use crate::genesis::DefaultAuctionParams;
use crate::oracle::RoundAuthority;
use crate::state::{AuctionStore, SettlementState};

/// Context provided by the execution substrate for each call.
pub struct CallContext {
    /// Principal the operation acts as.
    pub sender: Address,
    /// Current timestamp (seconds).
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, SettlementError>;

/// Handle a faucet grant to the caller.
pub fn handle_faucet<C: AssetCustody>(
    custody: &mut C,
    ctx: &CallContext,
    amount: u64,
) -> HandlerResult<()> {
    custody.mint(ctx.sender, amount)?;
    debug!(recipient = ?ctx.sender, amount, "faucet grant");
    Ok(())
}

/// Handle auction creation.
///
/// Escrows the asset, validates the timelock master public key (tolerant
/// multi-format parse) and stores a fresh auction with
/// `end_time = now + duration`. Winner state starts at `(seller, 0)`.
pub fn handle_create_auction<P: PairingSuite, C: AssetCustody>(
    store: &mut AuctionStore,
    params: &DefaultAuctionParams,
    custody: &mut C,
    ctx: &CallContext,
    asset_amount: u64,
    min_price: u64,
    duration: u64,
    master_public_key: &[u8],
) -> HandlerResult<()> {
    if duration < params.min_duration {
        return Err(SettlementError::InvalidTiming);
    }
    if let Some(max) = params.max_duration {
        if duration > max {
            return Err(SettlementError::InvalidTiming);
        }
    }
    let end_time = ctx
        .timestamp
        .checked_add(duration)
        .ok_or(SettlementError::InvalidTiming)?;

    // One auction per seller per active sale; a revealed auction is
    // replaced, an open one blocks.
    if let Some(existing) = store.get(&ctx.sender) {
        if !existing.winner_declared {
            return Err(SettlementError::AuctionInProgress);
        }
    }

    let mpk = P::deserialize_g1(master_public_key).map_err(|_| SettlementError::InvalidProof)?;

    let escrowed_asset = custody.escrow(ctx.sender, asset_amount)?;

    store.insert(Auction {
        seller: ctx.sender,
        escrowed_asset,
        asset_amount,
        min_price,
        end_time,
        master_public_key: P::serialize_g1(&mpk),
        bids: Vec::new(),
        highest_bidder: ctx.sender,
        highest_bid: 0,
        winner_declared: false,
    });

    info!(seller = ?ctx.sender, min_price, end_time, "auction created");
    Ok(())
}

/// Handle sealed bid submission.
///
/// The bid ciphertext is opaque until reveal; only the locked payment and
/// the ephemeral point encoding are validated here. All checks precede the
/// escrow, so a rejected bid locks nothing.
pub fn handle_submit_bid<P: PairingSuite, C: AssetCustody>(
    store: &mut AuctionStore,
    custody: &mut C,
    ctx: &CallContext,
    seller: Address,
    amount_locked: u64,
    ephemeral: &[u8],
    payload: &[u8],
) -> HandlerResult<()> {
    let auction = store.get(&seller).ok_or(SettlementError::AuctionNotStarted)?;

    if ctx.timestamp >= auction.end_time {
        return Err(SettlementError::AuctionEnded);
    }
    if amount_locked < auction.min_price {
        return Err(SettlementError::BidTooLow {
            min: auction.min_price,
            got: amount_locked,
        });
    }

    let u = P::deserialize_g1(ephemeral).map_err(|_| SettlementError::InvalidProof)?;

    let escrow = custody.escrow(ctx.sender, amount_locked)?;

    let auction = store
        .get_mut(&seller)
        .ok_or(SettlementError::AuctionNotStarted)?;
    auction.bids.push(EncryptedBid {
        bidder: ctx.sender,
        ciphertext: TimelockCiphertext {
            ephemeral: P::serialize_g1(&u),
            payload: payload.to_vec(),
        },
        locked_payment: amount_locked,
        escrow,
        revealed: false,
    });

    debug!(?seller, bidder = ?ctx.sender, amount_locked, "sealed bid accepted");
    Ok(())
}

/// Handle reveal: open every sealed bid with the published round signature
/// and declare the winner.
///
/// Permissionless and idempotent — a reveal against an already-revealed
/// auction is a success no-op, so retrying relayers never see an error for
/// work already done. The selection rule is strict `>` with
/// `locked_payment >= decoded`, so ties keep the earliest-submitted leader
/// and underfunded bids never win.
pub fn handle_reveal<P: PairingSuite, C: AssetCustody, O: RoundAuthority>(
    store: &mut AuctionStore,
    custody: &mut C,
    round_authority: &O,
    ctx: &CallContext,
    seller: Address,
    round_id: u64,
) -> HandlerResult<()> {
    let auction = store.get(&seller).ok_or(SettlementError::AuctionNotStarted)?;

    if auction.winner_declared {
        debug!(?seller, "reveal retried after winner declared; no-op");
        return Ok(());
    }
    if ctx.timestamp < auction.end_time {
        return Err(SettlementError::AuctionNotEnded);
    }

    let signature_bytes = round_authority
        .round_signature(round_id)
        .ok_or(SettlementError::InvalidDecryptionKey)?;
    let round_signature = P::deserialize_g2(&signature_bytes)
        .map_err(|_| SettlementError::InvalidDecryptionKey)?;

    // Stage: decrypt every unopened bid before touching anything, so one
    // corrupt stored encoding aborts the whole call with zero mutations.
    let mut decoded: Vec<(usize, u64)> = Vec::new();
    for (index, bid) in auction.bids.iter().enumerate() {
        match decrypt_bid::<P>(bid, &round_signature) {
            Ok(amount) => decoded.push((index, amount)),
            Err(SettlementError::BidAlreadyRevealed) => continue,
            Err(err) => return Err(err),
        }
    }

    // Select: strict greater-than, payment must cover the decrypted amount.
    let mut highest_bid = auction.highest_bid;
    let mut highest_bidder = auction.highest_bidder;
    let mut winning_index: Option<usize> = None;
    for (index, amount) in &decoded {
        let bid = &auction.bids[*index];
        if *amount > highest_bid && bid.locked_payment >= *amount {
            highest_bid = *amount;
            highest_bidder = bid.bidder;
            winning_index = Some(*index);
        }
    }

    // Settle custody: the winning payment goes to the seller, every other
    // payment returns to its bidder, and the asset goes to the winner (or
    // back to the seller when no bid qualified).
    for (index, bid) in auction.bids.iter().enumerate() {
        let recipient = if winning_index == Some(index) {
            auction.seller
        } else {
            bid.bidder
        };
        custody.release(bid.escrow, recipient)?;
    }
    let asset_recipient = if winning_index.is_some() {
        highest_bidder
    } else {
        auction.seller
    };
    custody.release(auction.escrowed_asset, asset_recipient)?;

    // Apply.
    let auction = store
        .get_mut(&seller)
        .ok_or(SettlementError::AuctionNotStarted)?;
    for bid in &mut auction.bids {
        bid.revealed = true;
    }
    auction.highest_bid = highest_bid;
    auction.highest_bidder = highest_bidder;
    auction.winner_declared = true;

    info!(?seller, winner = ?highest_bidder, amount = highest_bid, "winner declared");
    Ok(())
}

/// Decrypt a single sealed bid and decode its amount.
///
/// Bids already opened return the internal [`SettlementError::BidAlreadyRevealed`]
/// signal; the reveal loop skips them so each ciphertext is decrypted at
/// most once.
fn decrypt_bid<P: PairingSuite>(
    bid: &EncryptedBid,
    round_signature: &P::G2,
) -> HandlerResult<u64> {
    if bid.revealed {
        return Err(SettlementError::BidAlreadyRevealed);
    }
    let plaintext = timelock::decrypt::<P>(
        &bid.ciphertext.ephemeral.0,
        &bid.ciphertext.payload,
        round_signature,
    )
    .map_err(|_| SettlementError::InvalidCiphertext)?;
    Ok(decode_bid_amount(&plaintext))
}

/// Verify, authorize and execute a relayed action as one unit of work.
///
/// The signature is checked against the action's domain-separated digest,
/// the identity's nonce is matched exactly, and the nonce advances only if
/// the dispatched handler succeeds — a failed handler leaves the registry
/// ready to accept the resubmitted action.
pub fn dispatch_relayed<P: PairingSuite, C: AssetCustody>(
    state: &mut SettlementState,
    custody: &mut C,
    now: u64,
    action: &RelayedAction,
) -> HandlerResult<()> {
    let digest = action.signing_digest();
    relay::verify(&digest, &action.signature, &action.identity).map_err(|err| match err {
        CryptoError::InvalidAddress => SettlementError::InvalidAddress,
        _ => SettlementError::InvalidSignature,
    })?;

    let SettlementState {
        auctions,
        identities,
        params,
    } = state;

    identities.authorize_and_advance(action.identity, action.nonce, |authority| {
        let ctx = CallContext {
            sender: authority.address(),
            timestamp: now,
        };
        match &action.call {
            RelayCall::Faucet { amount } => handle_faucet(custody, &ctx, *amount),
            RelayCall::CreateAuction {
                asset_amount,
                min_price,
                duration,
                master_public_key,
            } => handle_create_auction::<P, C>(
                auctions,
                params,
                custody,
                &ctx,
                *asset_amount,
                *min_price,
                *duration,
                master_public_key,
            ),
            RelayCall::SubmitBid {
                seller,
                amount_locked,
                ephemeral,
                payload,
            } => handle_submit_bid::<P, C>(
                auctions,
                custody,
                &ctx,
                *seller,
                *amount_locked,
                ephemeral,
                payload,
            ),
        }
    })
}
