//! Engine Configuration
//!
//! `EngineConfig` controls the two policy knobs of a [`Graph`](crate::graph::Graph):
//! what happens when a scheduling pass meets a producer cycle, and whether
//! the dirty-count invariant is verified after every update.
//!
//! Configuration can come from code, from JSON, or from the environment:
//!
//! - `STATEGRAPH_CYCLES`: `error` or `ignore`
//! - `STATEGRAPH_CHECK_INVARIANTS`: `1`, `0`, `true` or `false`

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CYCLES_VAR: &str = "STATEGRAPH_CYCLES";
const CHECK_VAR: &str = "STATEGRAPH_CHECK_INVARIANTS";

/// How the scheduler treats a dirty subgraph that contains a producer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleHandling {
    /// Fail the update with [`Error::Cycle`] before running any callback.
    #[default]
    Error,

    /// Run the part of the subgraph that can be ordered and skip the
    /// stalled nodes, logging a warning.
    Ignore,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy for producer cycles found while scheduling.
    pub cycle_handling: CycleHandling,

    /// Verify the dirty-count invariant after every update.
    pub check_invariants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_handling: CycleHandling::default(),
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::Config)
    }

    /// Build a configuration from the defaults overridden by environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(CYCLES_VAR) {
            let parsed = value.trim().to_lowercase();
            config.cycle_handling = match parsed.as_str() {
                "error" => CycleHandling::Error,
                "ignore" => CycleHandling::Ignore,
                _ => {
                    return Err(Error::Env {
                        var: CYCLES_VAR,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(CHECK_VAR) {
            let parsed = value.trim().to_lowercase();
            config.check_invariants = match parsed.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(Error::Env {
                        var: CHECK_VAR,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_missing_fields() {
        let config = EngineConfig::from_json(r#"{ "cycle_handling": "ignore" }"#).unwrap();
        assert_eq!(config.cycle_handling, CycleHandling::Ignore);
        assert_eq!(config.check_invariants, cfg!(debug_assertions));
    }

    #[test]
    fn bad_json_is_config_error() {
        let err = EngineConfig::from_json(r#"{ "cycle_handling": "explode" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = EngineConfig::from_lookup(|var| match var {
            CYCLES_VAR => Some("Ignore".into()),
            CHECK_VAR => Some("0".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.cycle_handling, CycleHandling::Ignore);
        assert!(!config.check_invariants);
    }

    #[test]
    fn env_rejects_unknown_values() {
        let err = EngineConfig::from_lookup(|var| {
            (var == CHECK_VAR).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Env { var: CHECK_VAR, .. }));
    }
}
