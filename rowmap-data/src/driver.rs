use rowmap_core::Value;
use std::future::Future;

/// Per-row result marker a driver reports for a failed row in a bulk call.
pub const FAILED_ROW: i64 = -2;

/// Tabular result of one driver round trip: parallel column name/type
/// arrays plus the row data.
///
/// `row_count` is the driver-reported count and is advisory only — the
/// actual length of `rows` governs everywhere in this crate.
#[derive(Debug, Clone, Default)]
pub struct TabularResponse {
    pub columns: Vec<String>,
    pub column_types: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: i64,
}

impl TabularResponse {
    /// Response with no result set, only an affected-row count.
    pub fn affected(row_count: i64) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }
}

/// The sole I/O boundary of the data layer.
///
/// A driver accepts a SQL string and ordered parameters and returns a
/// tabular response; connection management, the network protocol, and
/// cluster discovery are entirely its concern. The core imposes no locking
/// around driver calls — serializing or pipelining concurrent access is the
/// driver's responsibility. Cancellation and timeouts also belong to the
/// driver; nothing in this crate retries.
pub trait Driver: Send + Sync + 'static {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<TabularResponse, DriverError>> + Send;

    /// Execute one statement bound against many parameter rows in a single
    /// round trip. Returns one affected-row count per input row, in input
    /// order; [`FAILED_ROW`] marks a row the cluster rejected.
    fn execute_bulk(
        &self,
        sql: &str,
        rows: &[Vec<Value>],
    ) -> impl Future<Output = Result<Vec<i64>, DriverError>> + Send;

    fn close(&self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// Opaque failure from the driver collaborator, passed through unchanged.
#[derive(Debug)]
pub struct DriverError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "driver error: {}", self.message)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
