//! Cryptographic primitives for timelock-sealed auction settlement.
//!
//! Three independent concerns live here:
//!
//! 1. **Pairing wrapper** ([`pairing`]): point (de)serialization with the
//!    tolerant multi-format policy, scalar multiplication, pairing
//!    evaluation and hash-to-curve, behind a backend trait with a BLS12-381
//!    implementation and a deterministic mock.
//! 2. **Timelock cipher** ([`timelock`]): hashed IBE keyed to a round
//!    identity; the round authority's signature on the identity is the
//!    decryption trapdoor.
//! 3. **Relay authentication** ([`relay`]): secp256k1 signature recovery
//!    against domain-separated Keccak-256 digests, identifying externally
//!    keyed principals by a 20-byte address.
//!
//! Everything in this crate is stateless; durable state lives in the
//! settlement module.

pub mod error;
pub mod mock;
pub mod pairing;
pub mod relay;
pub mod timelock;

pub use error::CryptoError;
pub use pairing::{Bls12381, PairingSuite};
pub use timelock::{decrypt, encrypt, TimelockParams};
