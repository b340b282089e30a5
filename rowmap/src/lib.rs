//! Rowmap — object mapping for distributed SQL stores.
//!
//! This facade crate re-exports the rowmap sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use rowmap::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                           |
//! |----------|---------|---------------------------------|
//! | `events` | **yes** | `rowmap-events`                 |
//! | `data`   | no      | `rowmap-data` (implies `events`)|
//!
//! The metadata and conversion layer in `rowmap-core` is always present.

pub use rowmap_core;

// Re-export the core mapping layer at the top level for convenience.
pub use rowmap_core::*;

#[cfg(feature = "events")]
pub use rowmap_events;

#[cfg(feature = "data")]
pub use rowmap_data;

/// Unified prelude — import everything with `use rowmap::prelude::*`.
///
/// Includes the core prelude plus types from all enabled feature crates.
pub mod prelude {
    pub use rowmap_core::prelude::*;

    #[cfg(feature = "events")]
    pub use rowmap_events::prelude::*;

    #[cfg(feature = "data")]
    pub use rowmap_data::prelude::*;
}
