//! Chain configuration and hardfork predicates.
//!
//! Each protocol upgrade is a block-number threshold; the predicates are
//! threaded explicitly into codec and verification functions so both eras
//! stay testable side by side.

/// Chain configuration consumed by the consensus core.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Target seconds between blocks
    pub period: u64,
    /// Blocks per epoch; checkpoint headers carry the full committee
    pub epoch: u64,
    /// Backoff delay unit in seconds
    pub wiggle: u64,
    /// Activation block for strict minimum-timestamp enforcement
    pub timestamp_check_block: Option<u64>,
    /// Activation block for finality voting and BLS checkpoint keys
    pub finality_vote_block: Option<u64>,
    /// Activation block for the extended backoff range and the relaxed
    /// delay of a recently-sealed in-turn validator
    pub extended_backoff_block: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            period: 3,
            epoch: 300,
            wiggle: 1,
            timestamp_check_block: None,
            finality_vote_block: None,
            extended_backoff_block: None,
        }
    }
}

impl ChainConfig {
    fn active(threshold: Option<u64>, number: u64) -> bool {
        threshold.is_some_and(|block| number >= block)
    }

    /// Whether the minimum-timestamp check applies at `number`.
    pub fn is_timestamp_check(&self, number: u64) -> bool {
        Self::active(self.timestamp_check_block, number)
    }

    /// Whether finality voting is active at `number`.
    pub fn is_finality_vote(&self, number: u64) -> bool {
        Self::active(self.finality_vote_block, number)
    }

    /// Whether the extended backoff range applies at `number`.
    pub fn is_extended_backoff(&self, number: u64) -> bool {
        Self::active(self.extended_backoff_block, number)
    }

    /// Whether `number` is an epoch checkpoint.
    pub fn is_checkpoint(&self, number: u64) -> bool {
        number % self.epoch == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardfork_gating() {
        let config = ChainConfig {
            finality_vote_block: Some(100),
            ..ChainConfig::default()
        };
        assert!(!config.is_finality_vote(99));
        assert!(config.is_finality_vote(100));
        assert!(config.is_finality_vote(101));
        assert!(!config.is_timestamp_check(u64::MAX));
    }

    #[test]
    fn test_checkpoint_interval() {
        let config = ChainConfig::default();
        assert!(config.is_checkpoint(0));
        assert!(config.is_checkpoint(300));
        assert!(!config.is_checkpoint(301));
    }
}
