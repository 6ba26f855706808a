//! Genesis configuration for the settlement module.

use serde::{Deserialize, Serialize};
use tlock_types::RelayIdentity;

/// Initial configuration applied when the settlement state is created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementGenesisConfig {
    /// Auction parameter floor/ceiling enforced at creation.
    pub default_params: DefaultAuctionParams,

    /// External identities registered up front (nonce 0). Purely an
    /// optimization for known relayer fleets; identities not listed here
    /// are registered lazily on first contact.
    pub initial_identities: Vec<RelayIdentity>,
}

/// Default parameters for new auctions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultAuctionParams {
    /// Minimum bidding window length (seconds).
    pub min_duration: u64,
    /// Optional cap on the bidding window length.
    pub max_duration: Option<u64>,
}

impl Default for DefaultAuctionParams {
    fn default() -> Self {
        Self {
            min_duration: 1,
            max_duration: None,
        }
    }
}

impl Default for SettlementGenesisConfig {
    fn default() -> Self {
        Self {
            default_params: DefaultAuctionParams::default(),
            initial_identities: Vec::new(),
        }
    }
}

impl SettlementGenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.default_params.min_duration == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum duration cannot be zero".into(),
            ));
        }
        if let Some(max) = self.default_params.max_duration {
            if max < self.default_params.min_duration {
                return Err(GenesisValidationError::InvalidDefaultParams(
                    "Maximum duration below minimum".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid default parameters: {0}")]
    InvalidDefaultParams(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SettlementGenesisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_min_duration_rejected() {
        let mut config = SettlementGenesisConfig::default();
        config.default_params.min_duration = 0;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidDefaultParams(_))
        ));
    }

    #[test]
    fn test_max_below_min_rejected() {
        let mut config = SettlementGenesisConfig::default();
        config.default_params.min_duration = 100;
        config.default_params.max_duration = Some(50);
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidDefaultParams(_))
        ));
    }
}
