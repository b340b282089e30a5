//! # rowmap-core — document model, entity metadata, and conversion
//!
//! The substrate of the rowmap data layer. Everything a row passes through
//! on its way between a domain object and the database driver lives here:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] / [`Value`] | Ordered key/value container standing in for a row or nested object |
//! | [`PersistentEntity`] / [`PersistentProperty`] | Derived, cached metadata for one domain type |
//! | [`MappingContext`] | Immutable registry of entity metadata, built once at startup |
//! | [`Persistent`] | Trait a mappable domain type implements |
//! | [`DocumentConverter`] | Recursive object ⇄ document mapper |
//! | [`Conversions`] | Registry of custom scalar conversion pairs |
//! | [`MappingError`] | Everything that can go wrong in metadata or conversion |
//!
//! Statement building, response handling, and the operations facade are in
//! `rowmap-data`; lifecycle events are in `rowmap-events`.

pub mod context;
pub mod convert;
pub mod document;
pub mod entity;
pub mod error;

pub use context::{MappingContext, MappingContextBuilder, Persistent};
pub use convert::{Conversions, DocumentConverter};
pub use document::{Document, Value};
pub use entity::{EntityBuilder, PersistentEntity, PersistentProperty, PropertyType};
pub use error::MappingError;

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{
        Conversions, Document, DocumentConverter, MappingContext, MappingError,
        PersistentEntity, Persistent, PropertyType, Value,
    };
}
