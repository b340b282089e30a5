//! # rowmap-events — mapping lifecycle events
//!
//! Typed listener registry for the fixed lifecycle stages a mapping
//! operation passes through: BeforeConvert, AfterConvert, BeforeSave,
//! AfterSave, BeforeDelete, AfterDelete, and AfterLoad.
//!
//! Dispatch is synchronous, in-process, and registration-ordered. Listeners
//! register for one `(stage, domain type)` pair; events carrying a different
//! domain type are silently skipped. A listener error aborts the remaining
//! listeners and the operation that emitted the event — there is no
//! isolation and no deferred error channel.

pub mod event;
pub mod registry;

pub use event::{EventKind, LifecycleEvent};
pub use registry::{ListenerError, ListenerRegistry, ListenerRegistryBuilder};

pub mod prelude {
    //! Re-exports of the most commonly used event types.
    pub use crate::{EventKind, LifecycleEvent, ListenerRegistry};
}
