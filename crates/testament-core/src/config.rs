//! Client configuration
//!
//! Configuration is plain serde data with defaults for every field. It can be
//! loaded from TOML, overridden from `TESTAMENT_*` environment variables and
//! must pass [`ClientConfig::validate`] before use.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::reliability::RetryPolicy;
use crate::{Result, TestamentError};

/// Depth the deployed verifier is built for
pub const DEFAULT_TREE_DEPTH: u32 = 4;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "TESTAMENT_";

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target program settings
    pub program: ProgramConfig,
    /// Commitment tree settings
    pub tree: TreeConfig,
    /// Fee settings
    pub fees: FeeConfig,
    /// Payload assembly settings
    pub assembler: AssemblerConfig,
    /// Status polling settings
    pub polling: PollingConfig,
    /// Retry policy for wallet calls
    pub signer_retry: RetryPolicy,
}

/// Target program settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Program identifier payloads are addressed to
    pub program_id: String,
    /// Required prefix of account addresses
    pub address_prefix: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: "digital_will.aleo".to_string(),
            address_prefix: "aleo1".to_string(),
        }
    }
}

/// Commitment tree settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Tree depth; must match the verifier
    pub depth: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
        }
    }
}

/// Fee settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Fee of a multiplier-1 operation, in base units
    pub base_fee: u64,
    /// Pay fees from a reserved private record instead of a public balance
    pub private_fee: bool,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            base_fee: 10_000,
            private_fee: false,
        }
    }
}

/// Payload assembly settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Dust floor for value transfers, in base units
    pub min_transfer_amount: u64,
    /// Random decoy inputs appended by privacy-enhanced operations
    pub decoy_count: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            min_transfer_amount: 1_000,
            decoy_count: 3,
        }
    }
}

/// Status polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay after the first status query, in milliseconds
    pub initial_interval_ms: u64,
    /// Upper bound on the delay, in milliseconds
    pub max_interval_ms: u64,
    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: f64,
    /// Status queries before giving up with a timeout
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 2_000,
            max_interval_ms: 30_000,
            backoff_factor: 1.5,
            max_attempts: 30,
        }
    }
}

impl ClientConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| TestamentError::invalid_config(format!("Invalid TOML: {e}")))
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TestamentError::invalid_config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `TESTAMENT_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs.
    ///
    /// Names use the prefix plus `SECTION_FIELD` in upper case, e.g.
    /// `TESTAMENT_FEES_BASE_FEE`. Unrelated variables are ignored.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.set_from_string(&name.to_ascii_lowercase(), value.as_ref())?;
        }
        Ok(())
    }

    /// Set a single value by its `section_field` key
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "program_program_id" => self.program.program_id = value.to_string(),
            "program_address_prefix" => self.program.address_prefix = value.to_string(),
            "tree_depth" => self.tree.depth = parse_value(key, value)?,
            "fees_base_fee" => self.fees.base_fee = parse_value(key, value)?,
            "fees_private_fee" => self.fees.private_fee = parse_value(key, value)?,
            "assembler_min_transfer_amount" => {
                self.assembler.min_transfer_amount = parse_value(key, value)?;
            }
            "assembler_decoy_count" => self.assembler.decoy_count = parse_value(key, value)?,
            "polling_initial_interval_ms" => {
                self.polling.initial_interval_ms = parse_value(key, value)?;
            }
            "polling_max_interval_ms" => self.polling.max_interval_ms = parse_value(key, value)?,
            "polling_backoff_factor" => self.polling.backoff_factor = parse_value(key, value)?,
            "polling_max_attempts" => self.polling.max_attempts = parse_value(key, value)?,
            "signer_retry_max_retries" => {
                self.signer_retry.max_retries = parse_value(key, value)?;
            }
            _ => {
                return Err(TestamentError::invalid_config(format!(
                    "Unknown configuration key: {key}"
                )))
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.program.program_id.is_empty() {
            return Err(TestamentError::invalid_config("program_id must not be empty"));
        }
        if self.tree.depth != DEFAULT_TREE_DEPTH {
            return Err(TestamentError::invalid_config(format!(
                "tree depth {} does not match the verifier depth {DEFAULT_TREE_DEPTH}",
                self.tree.depth
            )));
        }
        if self.assembler.min_transfer_amount == 0 {
            return Err(TestamentError::invalid_config(
                "min_transfer_amount must be positive",
            ));
        }
        let polling = &self.polling;
        if polling.max_attempts == 0 {
            return Err(TestamentError::invalid_config("max_attempts must be positive"));
        }
        if polling.initial_interval_ms == 0 || polling.max_interval_ms < polling.initial_interval_ms
        {
            return Err(TestamentError::invalid_config(
                "polling intervals must satisfy 0 < initial <= max",
            ));
        }
        if !polling.backoff_factor.is_finite() || polling.backoff_factor < 1.0 {
            return Err(TestamentError::invalid_config("backoff_factor must be >= 1.0"));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TestamentError::invalid_config(format!("Invalid value {value:?} for {key}")))
}
