use crate::event::{EventKind, LifecycleEvent};
use rowmap_core::{Document, Value};
use std::any::{Any, TypeId};
use tracing::trace;

/// Error returned by a listener. Listener failures are not isolated: the
/// first failure aborts the remaining listeners and the enclosing
/// operation, and propagates synchronously to the caller.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Box<dyn Fn(&LifecycleEvent<'_>) -> Result<(), ListenerError> + Send + Sync>;

struct Registration {
    kind: EventKind,
    type_id: TypeId,
    listener: Listener,
}

/// Immutable table of lifecycle listeners, keyed by `(kind, domain type)`.
///
/// Built once through [`ListenerRegistry::builder`] before any operation
/// runs; dispatch after that is a lock-free linear scan in registration
/// order. A listener only sees events whose carried domain type matches its
/// registration — everything else is silently skipped.
#[derive(Default)]
pub struct ListenerRegistry {
    registrations: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn builder() -> ListenerRegistryBuilder {
        ListenerRegistryBuilder {
            registrations: Vec::new(),
        }
    }

    /// A registry with no listeners; every publish is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Dispatch an event to every matching listener, in registration order.
    pub fn publish(&self, event: &LifecycleEvent<'_>) -> Result<(), ListenerError> {
        for registration in &self.registrations {
            if registration.kind == event.kind() && registration.type_id == event.type_id() {
                trace!(
                    kind = event.kind().as_str(),
                    domain_type = event.type_name(),
                    "dispatching lifecycle event"
                );
                (registration.listener)(event)?;
            }
        }
        Ok(())
    }
}

/// Single-writer builder for [`ListenerRegistry`]; the registry is read-only
/// once built.
pub struct ListenerRegistryBuilder {
    registrations: Vec<Registration>,
}

impl ListenerRegistryBuilder {
    /// Register a raw listener for one `(kind, domain type)` pair.
    pub fn on<E: Any>(
        mut self,
        kind: EventKind,
        listener: impl Fn(&LifecycleEvent<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.registrations.push(Registration {
            kind,
            type_id: TypeId::of::<E>(),
            listener: Box::new(listener),
        });
        self
    }

    pub fn on_before_convert<E: Any>(
        self,
        listener: impl Fn(&E) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on::<E>(EventKind::BeforeConvert, move |event| {
            match event.source_as::<E>() {
                Some(source) => listener(source),
                None => Ok(()),
            }
        })
    }

    pub fn on_after_convert<E: Any>(
        self,
        listener: impl Fn(&E, &Document) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on_with_document::<E>(EventKind::AfterConvert, listener)
    }

    pub fn on_before_save<E: Any>(
        self,
        listener: impl Fn(&E, &Document) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on_with_document::<E>(EventKind::BeforeSave, listener)
    }

    pub fn on_after_save<E: Any>(
        self,
        listener: impl Fn(&E, &Document) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on_with_document::<E>(EventKind::AfterSave, listener)
    }

    pub fn on_before_delete<E: Any>(
        self,
        listener: impl Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on_with_id::<E>(EventKind::BeforeDelete, listener)
    }

    pub fn on_after_delete<E: Any>(
        self,
        listener: impl Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on_with_id::<E>(EventKind::AfterDelete, listener)
    }

    /// Listener for documents loaded for type `E`, before conversion.
    pub fn on_after_load<E: Any>(
        self,
        listener: impl Fn(&Document) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on::<E>(EventKind::AfterLoad, move |event| {
            match event.document_ref() {
                Some(document) => listener(document),
                None => Ok(()),
            }
        })
    }

    fn on_with_document<E: Any>(
        self,
        kind: EventKind,
        listener: impl Fn(&E, &Document) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on::<E>(kind, move |event| {
            match (event.source_as::<E>(), event.document_ref()) {
                (Some(source), Some(document)) => listener(source, document),
                _ => Ok(()),
            }
        })
    }

    fn on_with_id<E: Any>(
        self,
        kind: EventKind,
        listener: impl Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> Self {
        self.on::<E>(kind, move |event| match event.id_ref() {
            Some(id) => listener(id),
            None => Ok(()),
        })
    }

    pub fn build(self) -> ListenerRegistry {
        ListenerRegistry {
            registrations: self.registrations,
        }
    }
}
