/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Strategy-tag lookup, replacing dynamic subclass registration with a
//! `match` over a boxed trait object.

use crate::config::StrategyConfig;
use crate::error::CoreError;
use crate::strategy::{Coordinated, Hybrid, Lru, MostFrequentlyUsed, StrictestDeadlineFirst, Strategy};

/// Build the strategy named by `tag` (case-insensitive), configured by `config`.
pub fn build_strategy(tag: &str, config: &StrategyConfig) -> Result<Box<dyn Strategy>, CoreError> {
    match tag.to_ascii_uppercase().as_str() {
        "COORDINATED" => Ok(Box::new(Coordinated::new(config))),
        "LRU" => Ok(Box::new(Lru::new(config))),
        "HYBRID" => Ok(Box::new(Hybrid::new(config))),
        "MFU" => Ok(Box::new(MostFrequentlyUsed::new(config))),
        "SDF" => Ok(Box::new(StrictestDeadlineFirst::new(config))),
        other => Err(CoreError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_every_strategy_tag_case_insensitively() {
        let config = StrategyConfig::default();
        for tag in ["COORDINATED", "lru", "Hybrid", "mfu", "SDF"] {
            assert!(build_strategy(tag, &config).is_ok(), "tag {tag} should resolve");
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let config = StrategyConfig::default();
        let err = build_strategy("ROUND_ROBIN", &config).unwrap_err();
        assert!(matches!(err, CoreError::UnknownStrategy(_)));
    }
}
