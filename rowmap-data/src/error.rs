use crate::driver::DriverError;
use rowmap_core::MappingError;
use rowmap_events::ListenerError;

/// Statement construction failures, surfaced before any driver contact.
#[derive(Debug)]
pub enum StatementError {
    /// The operation requires an identifier but the entity has none, or the
    /// bound identifier value is null.
    MissingId { entity: String },
}

impl std::fmt::Display for StatementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementError::MissingId { entity } => {
                write!(f, "no identifier value available for entity '{entity}'")
            }
        }
    }
}

impl std::error::Error for StatementError {}

/// Everything an operation on the facade can fail with. All variants
/// surface synchronously to the caller; there is no background error
/// channel.
#[derive(Debug)]
pub enum OperationError {
    Mapping(MappingError),
    Statement(StatementError),
    /// Driver failure, tagged with the logical operation that was in flight.
    Driver {
        operation: &'static str,
        source: DriverError,
    },
    /// An update matched zero rows while a version was bound — the stored
    /// row has moved on since this instance was loaded.
    VersionConflict { table: String, id: String },
    /// A single-result reduction found more than one row.
    Cardinality { actual: usize },
    /// A lifecycle listener failed; the operation was aborted.
    Listener(ListenerError),
}

impl OperationError {
    pub(crate) fn driver(operation: &'static str, source: DriverError) -> Self {
        OperationError::Driver { operation, source }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationError::Mapping(err) => write!(f, "mapping failed: {err}"),
            OperationError::Statement(err) => write!(f, "statement build failed: {err}"),
            OperationError::Driver { operation, source } => {
                write!(f, "driver failure during {operation}: {source}")
            }
            OperationError::VersionConflict { table, id } => {
                write!(f, "version conflict updating '{table}' id {id}")
            }
            OperationError::Cardinality { actual } => {
                write!(f, "expected at most one result, found {actual}")
            }
            OperationError::Listener(err) => write!(f, "lifecycle listener failed: {err}"),
        }
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OperationError::Mapping(err) => Some(err),
            OperationError::Statement(err) => Some(err),
            OperationError::Driver { source, .. } => Some(source),
            OperationError::Listener(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<MappingError> for OperationError {
    fn from(err: MappingError) -> Self {
        OperationError::Mapping(err)
    }
}

impl From<StatementError> for OperationError {
    fn from(err: StatementError) -> Self {
        OperationError::Statement(err)
    }
}

impl From<ListenerError> for OperationError {
    fn from(err: ListenerError) -> Self {
        OperationError::Listener(err)
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, OperationError>;
