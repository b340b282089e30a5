//! # rowmap-data — statement building, execution, and the repository pattern
//!
//! Everything between a converted [`Document`](rowmap_core::Document) and
//! the database driver lives here.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StatementBuilder`] | Metadata-driven SQL generation (insert/update/delete/select, bulk, DDL) |
//! | [`ResponseHandler`] | Tabular driver response → documents / mapped objects |
//! | [`DbTemplate`] | Operations facade emitting lifecycle events around every step |
//! | [`Repository`] / [`TemplateRepository`] | CRUD repository abstraction over the template |
//! | [`SingleResultExecutor`] / [`CollectionExecutor`] | Query-method execution with cardinality reduction |
//! | [`ActionableResult`] | Order-correlated per-item outcomes of a bulk call |
//! | [`Driver`] | The sole I/O boundary — SQL in, tabular response out |
//! | [`ClusterConfig`] | Address list and schema handed to driver implementations |
//!
//! The driver itself — network protocol, pooling, cluster discovery — is an
//! external collaborator; this crate only defines its contract.

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod repository;
pub mod response;
pub mod result;
pub mod statement;
pub mod template;

pub use config::{ClusterConfig, DEFAULT_HOST};
pub use driver::{Driver, DriverError, TabularResponse, FAILED_ROW};
pub use error::{DataResult, OperationError, StatementError};
pub use executor::{reduce_single, CollectionExecutor, SingleResultExecutor};
pub use repository::{Repository, TemplateRepository};
pub use response::ResponseHandler;
pub use result::{ActionableResult, Outcome};
pub use statement::{BulkStatement, Statement, StatementBuilder};
pub use template::DbTemplate;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        ActionableResult, ClusterConfig, DbTemplate, Driver, DriverError, OperationError,
        Repository, ResponseHandler, Statement, StatementBuilder, TabularResponse,
        TemplateRepository,
    };
    pub use rowmap_core::prelude::*;
}
