//! Creation-time configuration for an auction.

use serde::{Deserialize, Serialize};
use shielded_types::{Address, ItemMetadata};

/// Configuration fixed when the auction is created.
///
/// The item metadata and bidding deadline derived from `bidding_duration`
/// are immutable for the life of the auction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Identity of the auction itself; sealed bids are bound to it
    pub auction_id: Address,

    /// Item under auction
    pub item: ItemMetadata,

    /// Bidding window length in seconds, added to the creation timestamp
    pub bidding_duration: u64,
}

impl AuctionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item.name.is_empty() {
            return Err(ConfigError::EmptyItemName);
        }
        if self.bidding_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("item name cannot be empty")]
    EmptyItemName,

    #[error("bidding duration cannot be zero")]
    ZeroDuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuctionConfig {
        AuctionConfig {
            auction_id: Address::from_bytes([9u8; 20]),
            item: ItemMetadata {
                name: "Test Item".to_string(),
                description: "A test auction item".to_string(),
                image_url: "ipfs://item".to_string(),
            },
            bidding_duration: 3600,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_empty_item_name() {
        let mut config = config();
        config.item.name.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyItemName));
    }

    #[test]
    fn test_zero_duration() {
        let mut config = config();
        config.bidding_duration = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration));
    }
}
