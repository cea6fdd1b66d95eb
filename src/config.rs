//! Run configuration.
//!
//! The configuration surface the engine accepts: which matcher to run,
//! the pick strategy for the greedy path, an integer safety margin, and
//! the round number that doubles as the deterministic RNG seed.
//!
//! Invalid configuration is rejected before any work starts — the engine
//! never begins a partial run on a bad config.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::matching::PickStrategy;

/// Which matching algorithm a run uses.
///
/// The two matchers are alternative strategies over the same data model;
/// only one runs per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Round-based randomized greedy allocator.
    Greedy,
    /// Capacitated deferred-acceptance matcher.
    DeferredAcceptance,
}

impl FromStr for Algorithm {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Self::Greedy),
            "deferred-acceptance" => Ok(Self::DeferredAcceptance),
            other => Err(MatchError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Configuration for one matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Matcher to run.
    pub algorithm: Algorithm,
    /// Pick strategy (greedy path only).
    pub strategy: PickStrategy,
    /// Extra picks beyond the capacity floor (greedy path only).
    /// Must be non-negative.
    pub safety_margin: i32,
    /// Round number; also seeds the RNG, so identical snapshot + round
    /// reproduce the identical partition.
    pub round: u64,
}

impl MatchConfig {
    /// Creates a configuration with defaults (priority-first strategy,
    /// zero margin, round 0).
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            strategy: PickStrategy::default(),
            safety_margin: 0,
            round: 0,
        }
    }

    /// Sets the pick strategy.
    pub fn with_strategy(mut self, strategy: PickStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the safety margin.
    pub fn with_safety_margin(mut self, margin: i32) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Sets the round number / seed.
    pub fn with_round(mut self, round: u64) -> Self {
        self.round = round;
        self
    }

    /// Rejects invalid configuration before a run starts.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.safety_margin < 0 {
            return Err(MatchError::NegativeSafetyMargin(self.safety_margin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::new(Algorithm::Greedy);
        assert_eq!(config.strategy, PickStrategy::PriorityFirst);
        assert_eq!(config.safety_margin, 0);
        assert_eq!(config.round, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_margin_rejected() {
        let config = MatchConfig::new(Algorithm::Greedy).with_safety_margin(-2);
        assert!(matches!(
            config.validate(),
            Err(MatchError::NegativeSafetyMargin(-2))
        ));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("greedy".parse::<Algorithm>().unwrap(), Algorithm::Greedy);
        assert_eq!(
            "deferred-acceptance".parse::<Algorithm>().unwrap(),
            Algorithm::DeferredAcceptance
        );
        assert!(matches!(
            "hungarian".parse::<Algorithm>(),
            Err(MatchError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_config_deserializes() {
        let config: MatchConfig = serde_json::from_str(
            r#"{
                "algorithm": "deferred-acceptance",
                "strategy": "least-impact",
                "safety_margin": 1,
                "round": 3
            }"#,
        )
        .unwrap();
        assert_eq!(config.algorithm, Algorithm::DeferredAcceptance);
        assert_eq!(config.strategy, PickStrategy::LeastImpact);
        assert_eq!(config.round, 3);
    }
}
