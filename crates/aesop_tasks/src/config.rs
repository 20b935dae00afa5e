//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::TaskOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Fan-out bound used when a batch does not name its own
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_default: usize,

    /// Most records kept in the registry; past the cap, terminal records
    /// are evicted oldest-first
    #[serde(default = "default_retention_cap")]
    pub retention_cap: usize,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_retention_cap() -> usize {
    256
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_default: default_max_concurrent(),
            retention_cap: default_retention_cap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.max_concurrent_default, 4);
        assert_eq!(config.retention_cap, 256);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"retention_cap": 16}"#).unwrap();
        assert_eq!(config.retention_cap, 16);
        assert_eq!(config.max_concurrent_default, 4);
    }
}
