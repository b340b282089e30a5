use crate::entity::PersistentEntity;
use crate::error::MappingError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;

/// A domain type that can be mapped to and from a [`Document`](crate::Document).
///
/// Intended to be implemented manually; the description is the explicit
/// replacement for annotation scanning — callers enumerate their mapped
/// types when building the [`MappingContext`].
///
/// # Example
///
/// ```ignore
/// impl Persistent for User {
///     fn entity() -> Result<PersistentEntity, MappingError> {
///         PersistentEntity::describe("user")
///             .table("users")
///             .id("id", PropertyType::Text)
///             .property("name", PropertyType::Text)
///             .build()
///     }
/// }
/// ```
pub trait Persistent: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity() -> Result<PersistentEntity, MappingError>;
}

/// Immutable registry of entity metadata, keyed by type identity and by
/// entity name.
///
/// Built once at startup by [`MappingContextBuilder`]; reads after that are
/// lock-free and safe from any number of threads. There is no mutation path
/// once `build()` has returned.
#[derive(Debug)]
pub struct MappingContext {
    by_name: HashMap<&'static str, PersistentEntity>,
    by_type: HashMap<TypeId, &'static str>,
}

impl MappingContext {
    pub fn builder() -> MappingContextBuilder {
        MappingContextBuilder {
            registered: Vec::new(),
        }
    }

    /// Metadata for a registered type.
    pub fn entity_of<T: Persistent>(&self) -> Result<&PersistentEntity, MappingError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|name| self.by_name.get(name))
            .ok_or_else(|| MappingError::UnknownEntity {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Metadata by entity name, used to resolve nested `Object` links.
    pub fn entity_named(&self, name: &str) -> Option<&PersistentEntity> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &PersistentEntity> {
        self.by_name.values()
    }
}

/// Collects explicitly registered [`Persistent`] types and validates the
/// whole graph in one pass.
pub struct MappingContextBuilder {
    registered: Vec<(TypeId, Result<PersistentEntity, MappingError>)>,
}

impl MappingContextBuilder {
    pub fn register<T: Persistent>(mut self) -> Self {
        self.registered.push((TypeId::of::<T>(), T::entity()));
        self
    }

    /// Validate all registrations and freeze the context.
    ///
    /// Fails on duplicate entity names and on `Object`/`Array`/`Map`
    /// property links that point at an unregistered entity.
    pub fn build(self) -> Result<MappingContext, MappingError> {
        let mut by_name = HashMap::new();
        let mut by_type = HashMap::new();
        for (type_id, entity) in self.registered {
            let entity = entity?;
            let name = entity.name();
            if by_name.contains_key(name) {
                return Err(MappingError::InvalidMetadata {
                    entity: name.to_string(),
                    reason: "entity name registered twice".to_string(),
                });
            }
            by_type.insert(type_id, name);
            by_name.insert(name, entity);
        }
        for entity in by_name.values() {
            for property in entity.properties() {
                if let Some(target) = unresolved_link(property.ty(), &by_name) {
                    return Err(MappingError::InvalidMetadata {
                        entity: entity.name().to_string(),
                        reason: format!(
                            "property '{}' links to unregistered entity '{target}'",
                            property.name()
                        ),
                    });
                }
            }
        }
        Ok(MappingContext { by_name, by_type })
    }
}

fn unresolved_link(
    ty: &crate::entity::PropertyType,
    by_name: &HashMap<&'static str, PersistentEntity>,
) -> Option<&'static str> {
    use crate::entity::PropertyType;
    match ty {
        PropertyType::Object(name) => (!by_name.contains_key(name)).then_some(*name),
        PropertyType::Array(element) => unresolved_link(element, by_name),
        PropertyType::Map(value) => unresolved_link(value, by_name),
        _ => None,
    }
}
