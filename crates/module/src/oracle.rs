//! Round-authority oracle boundary.
//!
//! An external service publishes, once per round, a signature over the
//! round identity. That signature is the decryption trapdoor for every
//! ciphertext sealed to the round. The settlement engine only ever reads;
//! an unpublished round is a retryable condition, not an error.

use std::collections::HashMap;

/// Read-only view of published round signatures.
pub trait RoundAuthority {
    /// Serialized G2 signature over [`tlock_types::round_tag`] of
    /// `round_id`, or `None` if the round has not been published yet.
    fn round_signature(&self, round_id: u64) -> Option<Vec<u8>>;
}

/// Local table of published round signatures, used by tests and the local
/// harness in place of the external authority.
#[derive(Debug, Default)]
pub struct LocalRoundAuthority {
    published: HashMap<u64, Vec<u8>>,
}

impl LocalRoundAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a round signature as published.
    pub fn publish(&mut self, round_id: u64, signature: Vec<u8>) {
        self.published.insert(round_id, signature);
    }
}

impl RoundAuthority for LocalRoundAuthority {
    fn round_signature(&self, round_id: u64) -> Option<Vec<u8>> {
        self.published.get(&round_id).cloned()
    }
}
