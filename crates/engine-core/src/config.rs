use model::{core::identifiers::DEFAULT_SCHEMA_NAME, schema::table::TableSchemaDetailLevel};
use serde::Deserialize;
use std::time::Duration;

/// Settings shared by every call made through one [`BulkMerger`](crate::merge::merger::BulkMerger).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BulkMergeConfig {
    /// Schema used when a table name carries none.
    pub default_schema: String,

    /// Per-command timeout in milliseconds. `None` waits indefinitely.
    pub command_timeout_ms: Option<u64>,

    /// How much metadata to load for target tables.
    pub schema_detail: TableSchemaDetailLevel,

    /// Drop the temp tables when a step fails after they were created.
    pub cleanup_on_failure: bool,
}

impl Default for BulkMergeConfig {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA_NAME.to_string(),
            command_timeout_ms: None,
            schema_detail: TableSchemaDetailLevel::Basic,
            cleanup_on_failure: true,
        }
    }
}

impl BulkMergeConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_default_schema(mut self, schema: &str) -> Self {
        self.default_schema = schema.to_string();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_schema_detail(mut self, detail: TableSchemaDetailLevel) -> Self {
        self.schema_detail = detail;
        self
    }

    pub fn with_cleanup_on_failure(mut self, enabled: bool) -> Self {
        self.cleanup_on_failure = enabled;
        self
    }
}
