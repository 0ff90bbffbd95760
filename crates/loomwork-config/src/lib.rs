//! loomwork engine configuration
//!
//! This crate holds the recognized, ambient engine settings: tick cadence,
//! retry/backoff knobs, batch sizes, lease duration. These are distinct from
//! workflow/node definitions (see `loomwork-model`) — they tune how the
//! engine runs, not what it runs.
//!
//! `EngineConfig` can be loaded from a JSON file the same way the CLI loads
//! workflow definitions (`serde_json::from_str` over file contents), with
//! individual fields overridable by CLI flags.

use serde::{Deserialize, Serialize};

/// Engine-wide tunables. Defaults match the recognized configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Cadence of the tick scheduler, in milliseconds.
  pub tick_interval_ms: u64,
  /// Max executions claimed per tick.
  pub claim_batch_size: u32,
  /// Backoff delay applied to a recoverable (thrown) processor error.
  pub retry_delay_s: u64,
  /// Attempts (batch entries, not nodes) before an execution is marked failed.
  pub max_attempts: u32,
  /// Hard cap on nodes processed in a single executor batch (cycle breaker).
  pub nodes_per_batch_limit: u32,
  /// How long a `processing` lease is held before it is eligible for re-claim.
  pub lease_ttl_s: u64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      tick_interval_ms: 15_000,
      claim_batch_size: 100,
      retry_delay_s: 60,
      max_attempts: 3,
      nodes_per_batch_limit: 100,
      lease_ttl_s: 300,
    }
  }
}

impl EngineConfig {
  /// Parse engine config from a JSON document. Missing fields fall back to
  /// defaults (see `#[serde(default)]` above).
  pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(raw)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_recognized_options() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.tick_interval_ms, 15_000);
    assert_eq!(cfg.claim_batch_size, 100);
    assert_eq!(cfg.retry_delay_s, 60);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.nodes_per_batch_limit, 100);
    assert_eq!(cfg.lease_ttl_s, 300);
  }

  #[test]
  fn partial_json_fills_in_defaults() {
    let cfg = EngineConfig::from_json(r#"{"max_attempts": 5}"#).unwrap();
    assert_eq!(cfg.max_attempts, 5);
    assert_eq!(cfg.tick_interval_ms, 15_000);
  }
}
