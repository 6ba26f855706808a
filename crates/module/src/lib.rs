//! Sealed-bid auction settlement module with authenticated relay dispatch.
//!
//! Auctions sell an escrowed asset against bids that stay encrypted until a
//! round authority publishes the timelock signature for the auction's
//! reveal round. A third-party relayer submits actions on behalf of
//! externally keyed principals: each action carries a recoverable secp256k1
//! signature over a domain-separated digest and an exact-match nonce, and
//! executes under a locally derived authority address.
//!
//! # Architecture
//!
//! - `call`: relayed action messages and signing digests
//! - `handlers`: business logic and relay dispatch
//! - `queries`: read-only state access
//! - `state`: auction store and identity registry
//! - `genesis`: initial configuration
//! - `custody` / `oracle`: external collaborator boundaries
//! - `error`: error types
//!
//! The execution substrate is assumed to apply each operation atomically
//! and serialized; handlers uphold the matching discipline by checking
//! every precondition before the first mutation.
//!
//! # Example
//!
//! ```ignore
//! use tlock_module::{dispatch_relayed, handlers, state::SettlementState};
//!
//! let mut state = SettlementState::new();
//!
//! // Relayed path: verify signature, check nonce, execute.
//! dispatch_relayed::<Bls12381, _>(&mut state, &mut custody, now, &action)?;
//!
//! // Permissionless reveal once the round signature is out.
//! handlers::handle_reveal::<Bls12381, _, _>(
//!     &mut state.auctions, &mut custody, &oracle, &ctx, seller, round,
//! )?;
//! ```

pub mod call;
pub mod custody;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod oracle;
pub mod queries;
pub mod state;

pub use call::{RelayCall, RelayedAction};
pub use custody::{AssetCustody, CustodyError, InMemoryCustody};
pub use error::SettlementError;
pub use genesis::{DefaultAuctionParams, SettlementGenesisConfig};
pub use handlers::{dispatch_relayed, CallContext, HandlerResult};
pub use oracle::{LocalRoundAuthority, RoundAuthority};
pub use queries::{handle_query, SettlementQuery, SettlementQueryResponse};
pub use state::{AuctionStore, AuthorityToken, IdentityRegistry, SettlementState};
