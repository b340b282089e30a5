use rowmap_core::{Document, Value};
use std::any::{Any, TypeId};

/// Discriminant for the fixed set of mapping lifecycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeConvert,
    AfterConvert,
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
    AfterLoad,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BeforeConvert => "before-convert",
            EventKind::AfterConvert => "after-convert",
            EventKind::BeforeSave => "before-save",
            EventKind::AfterSave => "after-save",
            EventKind::BeforeDelete => "before-delete",
            EventKind::AfterDelete => "after-delete",
            EventKind::AfterLoad => "after-load",
        }
    }
}

/// One lifecycle notification, borrowed from the operation that emits it.
///
/// Every event carries the domain type it concerns; save-side events carry
/// the source object and (past the convert step) the converted document,
/// delete events carry the identifier, and `AfterLoad` carries the raw
/// document before conversion.
pub struct LifecycleEvent<'a> {
    kind: EventKind,
    type_id: TypeId,
    type_name: &'static str,
    source: Option<&'a dyn Any>,
    document: Option<&'a Document>,
    id: Option<&'a Value>,
}

impl<'a> LifecycleEvent<'a> {
    pub fn before_convert<T: Any>(source: &'a T) -> Self {
        Self::for_type::<T>(EventKind::BeforeConvert).source(source)
    }

    pub fn after_convert<T: Any>(source: &'a T, document: &'a Document) -> Self {
        Self::for_type::<T>(EventKind::AfterConvert)
            .source(source)
            .document(document)
    }

    pub fn before_save<T: Any>(source: &'a T, document: &'a Document) -> Self {
        Self::for_type::<T>(EventKind::BeforeSave)
            .source(source)
            .document(document)
    }

    pub fn after_save<T: Any>(source: &'a T, document: &'a Document) -> Self {
        Self::for_type::<T>(EventKind::AfterSave)
            .source(source)
            .document(document)
    }

    pub fn before_delete<T: Any>(id: &'a Value) -> Self {
        Self::for_type::<T>(EventKind::BeforeDelete).id(id)
    }

    pub fn after_delete<T: Any>(id: &'a Value) -> Self {
        Self::for_type::<T>(EventKind::AfterDelete).id(id)
    }

    /// Load-side event: there is no source instance yet, only the document
    /// and the declared target type.
    pub fn after_load<T: Any>(document: &'a Document) -> Self {
        Self::for_type::<T>(EventKind::AfterLoad).document(document)
    }

    fn for_type<T: Any>(kind: EventKind) -> Self {
        Self {
            kind,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            source: None,
            document: None,
            id: None,
        }
    }

    fn source<T: Any>(mut self, source: &'a T) -> Self {
        self.source = Some(source);
        self
    }

    fn document(mut self, document: &'a Document) -> Self {
        self.document = Some(document);
        self
    }

    fn id(mut self, id: &'a Value) -> Self {
        self.id = Some(id);
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The carried source object, downcast to the listener's domain type.
    pub fn source_as<T: Any>(&self) -> Option<&T> {
        self.source.and_then(|s| s.downcast_ref::<T>())
    }

    pub fn document_ref(&self) -> Option<&Document> {
        self.document
    }

    pub fn id_ref(&self) -> Option<&Value> {
        self.id
    }
}
