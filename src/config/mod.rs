//! Strategy configuration loading.
//!
//! The five strategy constructors recognise a small set of tunables
//! (`replacement_interval`, `debug`, `p`, `n_replacements`, `seed`).
//! [`StrategyConfig`] is the typed surface for them, deserialisable either
//! directly or from a YAML fragment:
//! ```yaml
//! replacement_interval: 10.0
//! debug: false
//! p: 0.5
//! n_replacements: 1
//! seed: 42
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

fn default_replacement_interval() -> f64 {
    10.0
}

fn default_p() -> f64 {
    0.5
}

fn default_n_replacements() -> u32 {
    1
}

/// Tunables recognised by the five strategy constructors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_replacement_interval")]
    pub replacement_interval: f64,
    #[serde(default)]
    pub debug: bool,
    /// LRU's eviction probability. Unused by the other four strategies.
    #[serde(default = "default_p")]
    pub p: f64,
    /// Bound on VM swaps per replacement pass. Unused by COORDINATED and LRU.
    #[serde(default = "default_n_replacements")]
    pub n_replacements: u32,
    /// Seed for the PRNG LRU uses for its probabilistic eviction decision.
    #[serde(default)]
    pub seed: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            replacement_interval: default_replacement_interval(),
            debug: false,
            p: default_p(),
            n_replacements: default_n_replacements(),
            seed: 0,
        }
    }
}

impl StrategyConfig {
    /// Parse a `StrategyConfig` from a YAML fragment.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("failed to parse strategy configuration YAML")
    }

    /// Load a `StrategyConfig` from a YAML file on disk.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot open strategy configuration file: {}", path.display()))?;
        let cfg = Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse strategy configuration file: {}", path.display()))?;
        info!(
            replacement_interval = cfg.replacement_interval,
            p = cfg.p,
            n_replacements = cfg.n_replacements,
            "loaded strategy configuration"
        );
        debug!(?cfg, "full strategy configuration");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_match_constructor_defaults() {
        let cfg = StrategyConfig::default();
        assert_eq!(cfg.replacement_interval, 10.0);
        assert!(!cfg.debug);
        assert_eq!(cfg.p, 0.5);
        assert_eq!(cfg.n_replacements, 1);
        assert_eq!(cfg.seed, 0);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let cfg = StrategyConfig::from_yaml_str("replacement_interval: 5.0\n").unwrap();
        assert_eq!(cfg.replacement_interval, 5.0);
        assert_eq!(cfg.p, 0.5);
    }

    #[test]
    fn full_yaml_overrides_everything() {
        let yaml = "replacement_interval: 20.0\ndebug: true\np: 0.9\nn_replacements: 3\nseed: 7\n";
        let cfg = StrategyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.replacement_interval, 20.0);
        assert!(cfg.debug);
        assert_eq!(cfg.p, 0.9);
        assert_eq!(cfg.n_replacements, 3);
        assert_eq!(cfg.seed, 7);
    }

    #[test]
    fn from_yaml_file_loads_from_disk() {
        let f = yaml_tempfile("replacement_interval: 15.0\n");
        let cfg = StrategyConfig::from_yaml_file(f.path()).unwrap();
        assert_eq!(cfg.replacement_interval, 15.0);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = StrategyConfig::from_yaml_file(Path::new("/nonexistent/strategy.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let result = StrategyConfig::from_yaml_str("not: valid: yaml: :::");
        assert!(result.is_err());
    }
}
