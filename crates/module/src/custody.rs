//! Asset custody boundary.
//!
//! The settlement engine never holds funds itself; it instructs an external
//! custody collaborator to lock amounts under opaque handles and to release
//! them to recipients. The only contract is amount conservation.

use std::collections::HashMap;

use thiserror::Error;
use tlock_types::{Address, EscrowHandle};

/// Errors reported by a custody collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("Insufficient funds: need {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Unknown escrow handle")]
    UnknownHandle,
}

/// External custody of fungible assets.
pub trait AssetCustody {
    /// Lock `amount` out of `principal`'s balance, returning the owning
    /// handle.
    fn escrow(&mut self, principal: Address, amount: u64) -> Result<EscrowHandle, CustodyError>;

    /// Release everything held under `handle` to `recipient`. The handle is
    /// consumed.
    fn release(&mut self, handle: EscrowHandle, recipient: Address) -> Result<(), CustodyError>;

    /// Faucet-style issuance to `recipient`.
    fn mint(&mut self, recipient: Address, amount: u64) -> Result<(), CustodyError>;
}

/// In-memory custody used by tests and the local harness.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    balances: HashMap<Address, u64>,
    held: HashMap<EscrowHandle, u64>,
    next_handle: u64,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free balance of an address.
    pub fn balance(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Amount locked under a handle, if it is still live.
    pub fn held(&self, handle: EscrowHandle) -> Option<u64> {
        self.held.get(&handle).copied()
    }

    /// Total issued minus nothing: free balances plus live escrows.
    pub fn total(&self) -> u64 {
        self.balances.values().sum::<u64>() + self.held.values().sum::<u64>()
    }
}

impl AssetCustody for InMemoryCustody {
    fn escrow(&mut self, principal: Address, amount: u64) -> Result<EscrowHandle, CustodyError> {
        let balance = self.balances.entry(principal).or_insert(0);
        if *balance < amount {
            return Err(CustodyError::InsufficientFunds {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;

        let handle = EscrowHandle(self.next_handle);
        self.next_handle += 1;
        self.held.insert(handle, amount);
        Ok(handle)
    }

    fn release(&mut self, handle: EscrowHandle, recipient: Address) -> Result<(), CustodyError> {
        let amount = self.held.remove(&handle).ok_or(CustodyError::UnknownHandle)?;
        *self.balances.entry(recipient).or_insert(0) += amount;
        Ok(())
    }

    fn mint(&mut self, recipient: Address, amount: u64) -> Result<(), CustodyError> {
        *self.balances.entry(recipient).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_and_release() {
        let mut custody = InMemoryCustody::new();
        let alice = [1u8; 32];
        let bob = [2u8; 32];

        custody.mint(alice, 100).unwrap();
        let handle = custody.escrow(alice, 60).unwrap();

        assert_eq!(custody.balance(&alice), 40);
        assert_eq!(custody.held(handle), Some(60));

        custody.release(handle, bob).unwrap();
        assert_eq!(custody.balance(&bob), 60);
        assert_eq!(custody.held(handle), None);

        // Conservation.
        assert_eq!(custody.total(), 100);
    }

    #[test]
    fn test_escrow_insufficient_funds() {
        let mut custody = InMemoryCustody::new();
        let alice = [1u8; 32];
        custody.mint(alice, 10).unwrap();

        let result = custody.escrow(alice, 11);
        assert_eq!(
            result,
            Err(CustodyError::InsufficientFunds {
                required: 11,
                available: 10
            })
        );
        assert_eq!(custody.balance(&alice), 10);
    }

    #[test]
    fn test_release_unknown_handle() {
        let mut custody = InMemoryCustody::new();
        assert_eq!(
            custody.release(EscrowHandle(7), [0u8; 32]),
            Err(CustodyError::UnknownHandle)
        );
    }

    #[test]
    fn test_release_is_single_shot() {
        let mut custody = InMemoryCustody::new();
        let alice = [1u8; 32];
        custody.mint(alice, 50).unwrap();

        let handle = custody.escrow(alice, 50).unwrap();
        custody.release(handle, alice).unwrap();
        assert_eq!(
            custody.release(handle, alice),
            Err(CustodyError::UnknownHandle)
        );
    }
}
