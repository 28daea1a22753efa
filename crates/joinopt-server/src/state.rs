//! # Application State
//!
//! This module defines the shared state that is available to all HTTP request
//! handlers. The state is created once at server startup and shared via `Arc`
//! across all concurrent requests.
//!
//! ## Components
//!
//! - **Cost Model**: prices scans and joins. Stateless, so one instance is shared.
//! - **Optimizer Config**: listen address and the relation-count limit that bounds
//!   the exponential search.
//!
//! Memo tables are deliberately absent: every request builds its own search.

use joinopt_core::cost::{CostModel, TextbookCostModel};
use joinopt_core::search::SearchConfig;
use std::sync::Arc;
use tracing::warn;

/// Server-level optimizer configuration.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Socket address the HTTP listener binds to.
    pub listen_addr: String,
    /// Largest number of relations a single request may contain.
    pub max_relations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            max_relations: SearchConfig::default().max_relations,
        }
    }
}

impl OptimizerConfig {
    /// Read `JOINOPT_LISTEN_ADDR` and `JOINOPT_MAX_RELATIONS`, keeping the
    /// default for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = get("JOINOPT_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(raw) = get("JOINOPT_MAX_RELATIONS") {
            match raw.parse() {
                Ok(limit) => config.max_relations = limit,
                Err(_) => warn!(
                    "Ignoring JOINOPT_MAX_RELATIONS={:?}; using {}",
                    raw, config.max_relations
                ),
            }
        }
        config
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_relations: self.max_relations,
        }
    }
}

/// Shared application state, accessible by all request handlers via Axum's State
/// extractor.
pub struct AppState {
    /// The cost model used to score join alternatives.
    pub cost_model: Arc<dyn CostModel>,
    pub config: OptimizerConfig,
}

impl AppState {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            cost_model: Arc::new(TextbookCostModel),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::from_vars(|_| None);
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.max_relations, 16);
        assert_eq!(config.search_config().max_relations, 16);
    }

    #[test]
    fn test_overrides() {
        let env = vars(&[
            ("JOINOPT_LISTEN_ADDR", "127.0.0.1:8080"),
            ("JOINOPT_MAX_RELATIONS", "10"),
        ]);
        let config = OptimizerConfig::from_vars(|k| env.get(k).cloned());
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.max_relations, 10);
    }

    #[test]
    fn test_unparsable_limit_keeps_default() {
        let env = vars(&[("JOINOPT_MAX_RELATIONS", "lots")]);
        let config = OptimizerConfig::from_vars(|k| env.get(k).cloned());
        assert_eq!(config.max_relations, 16);
    }
}
