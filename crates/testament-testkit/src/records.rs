//! In-memory record source

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use testament_core::effects::RecordSourceEffects;
use testament_core::{Result, TestamentError, ValueRecord};

#[derive(Debug, Default)]
struct SourceState {
    records: Vec<ValueRecord>,
    mappings: HashMap<(String, String, String), String>,
    fetch_calls: u32,
    mapping_reads: u32,
    unavailable: bool,
}

/// Record source over a fixed pool and mapping table. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    state: Arc<Mutex<SourceState>>,
}

impl MemoryRecordSource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Source over `records`
    pub fn with_records(records: impl IntoIterator<Item = ValueRecord>) -> Self {
        let source = Self::new();
        source.state.lock().records.extend(records);
        source
    }

    /// Store one mapping entry
    pub fn set_mapping(&self, program: &str, mapping: &str, key: &str, value: impl Into<String>) {
        self.state.lock().mappings.insert(
            (program.to_string(), mapping.to_string(), key.to_string()),
            value.into(),
        );
    }

    /// Replace the record pool
    pub fn set_records(&self, records: Vec<ValueRecord>) {
        self.state.lock().records = records;
    }

    /// Make every call fail with a network error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// `fetch_records` calls so far
    pub fn fetch_calls(&self) -> u32 {
        self.state.lock().fetch_calls
    }

    /// `read_mapping` calls so far
    pub fn mapping_reads(&self) -> u32 {
        self.state.lock().mapping_reads
    }
}

#[async_trait]
impl RecordSourceEffects for MemoryRecordSource {
    async fn fetch_records(&self) -> Result<Vec<ValueRecord>> {
        let mut state = self.state.lock();
        state.fetch_calls += 1;
        if state.unavailable {
            return Err(TestamentError::network("record source unavailable"));
        }
        Ok(state.records.clone())
    }

    async fn read_mapping(
        &self,
        program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let mut state = self.state.lock();
        state.mapping_reads += 1;
        if state.unavailable {
            return Err(TestamentError::network("record source unavailable"));
        }
        Ok(state
            .mappings
            .get(&(program.to_string(), mapping.to_string(), key.to_string()))
            .cloned())
    }
}
