//! Shared fixtures

use testament_core::{ClientConfig, FieldElement, ValueRecord};

/// Will owner
pub const OWNER: &str = "aleo1owner000000000000000000000000000000000000000000000000000";
/// First beneficiary
pub const ALICE: &str = "aleo1alice0000000000000000000000000000000000000000000000000";
/// Second beneficiary
pub const BOB: &str = "aleo1bob000000000000000000000000000000000000000000000000000";

/// Unspent record with a zero owner commitment
pub fn record(amount: u64, nonce: &str) -> ValueRecord {
    ValueRecord::new(amount, nonce, FieldElement::zero())
}

/// Spent record
pub fn spent_record(amount: u64, nonce: &str) -> ValueRecord {
    ValueRecord {
        spent: true,
        ..record(amount, nonce)
    }
}

/// Default configuration with fast polling: 10ms doubling to 80ms, 10 attempts
pub fn fast_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.polling.initial_interval_ms = 10;
    config.polling.max_interval_ms = 80;
    config.polling.backoff_factor = 2.0;
    config.polling.max_attempts = 10;
    config.signer_retry.initial_delay_ms = 5;
    config
}
