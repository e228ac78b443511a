//! Service configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Durations are given in milliseconds.

use std::path::Path;
use std::time::Duration;

use keyring_sync::PropagationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{KeyringError, Result};

/// When a client ballot triggers a ledger commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Commit once approvals reach the threshold of the committed list.
    /// The round closes on commit.
    #[default]
    Threshold,
    /// Commit after every accepted client ballot. The round stays open, so
    /// each later ballot appends another block.
    EveryBallot,
}

/// Identity service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub commit_policy: CommitPolicy,
    /// Upper bound on one ledger call.
    pub ledger_timeout_ms: u64,
    /// Upper bound on one peer send.
    pub send_timeout_ms: u64,
    /// Peer sends in flight per propagation round.
    pub max_in_flight: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            commit_policy: CommitPolicy::Threshold,
            ledger_timeout_ms: 10_000,
            send_timeout_ms: 5_000,
            max_in_flight: 16,
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| KeyringError::Config(e.to_string()))
    }

    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_json_str(&contents)?;
                tracing::info!(path = %path.display(), "loaded service config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(KeyringError::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    /// Settings for peer fan-out.
    pub fn propagation(&self) -> PropagationConfig {
        PropagationConfig {
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            max_in_flight: self.max_in_flight,
        }
    }
}
