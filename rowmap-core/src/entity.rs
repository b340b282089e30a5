use crate::error::MappingError;

/// Declared persistence type of a [`PersistentProperty`].
///
/// `Array` covers ordered collections, sets, and arrays alike — the store
/// representation is an ordered sequence in every case, and deduplication of
/// set elements is the caller's concern. `Map` is restricted to string keys,
/// matching the [`Document`](crate::Document) key type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    Bool,
    Long,
    Double,
    Text,
    Timestamp,
    /// Scalar with an application-registered conversion pair, keyed by tag.
    Custom(&'static str),
    /// Nested entity, referenced by its registered entity name.
    Object(&'static str),
    Array(Box<PropertyType>),
    Map(Box<PropertyType>),
}

impl PropertyType {
    pub fn array(element: PropertyType) -> Self {
        PropertyType::Array(Box::new(element))
    }

    pub fn map(value: PropertyType) -> Self {
        PropertyType::Map(Box::new(value))
    }

    /// Conversion-registry tag for scalar types; `None` for composites.
    pub fn scalar_tag(&self) -> Option<&'static str> {
        match self {
            PropertyType::Bool => Some("bool"),
            PropertyType::Long => Some("long"),
            PropertyType::Double => Some("double"),
            PropertyType::Text => Some("text"),
            PropertyType::Timestamp => Some("timestamp"),
            PropertyType::Custom(tag) => Some(tag),
            _ => None,
        }
    }

    /// Human-readable label used in error messages, e.g. `array<long>`.
    pub fn label(&self) -> String {
        match self {
            PropertyType::Bool => "bool".into(),
            PropertyType::Long => "long".into(),
            PropertyType::Double => "double".into(),
            PropertyType::Text => "text".into(),
            PropertyType::Timestamp => "timestamp".into(),
            PropertyType::Custom(tag) => format!("custom<{tag}>"),
            PropertyType::Object(name) => format!("object<{name}>"),
            PropertyType::Array(element) => format!("array<{}>", element.label()),
            PropertyType::Map(value) => format!("map<{}>", value.label()),
        }
    }
}

/// One mapped field of a [`PersistentEntity`].
#[derive(Debug, Clone)]
pub struct PersistentProperty {
    name: String,
    column: String,
    ty: PropertyType,
    id: bool,
    version: bool,
    transient: bool,
}

impl PersistentProperty {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column this property is persisted under. Defaults to the field name.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn ty(&self) -> &PropertyType {
        &self.ty
    }

    pub fn is_id(&self) -> bool {
        self.id
    }

    pub fn is_version(&self) -> bool {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Derived, immutable metadata describing one domain type: its table name
/// and its ordered property list.
///
/// Built once via [`PersistentEntity::describe`] and cached inside the
/// [`MappingContext`](crate::MappingContext) for the process lifetime.
///
/// # Example
///
/// ```ignore
/// let entity = PersistentEntity::describe("user")
///     .table("users")
///     .id("id", PropertyType::Text)
///     .property("name", PropertyType::Text)
///     .property("email", PropertyType::Object("email"))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PersistentEntity {
    name: &'static str,
    table: String,
    properties: Vec<PersistentProperty>,
    id_index: Option<usize>,
    version_index: Option<usize>,
}

impl PersistentEntity {
    /// Start describing an entity. The table name defaults to the entity
    /// name and can be overridden with [`EntityBuilder::table`].
    pub fn describe(name: &'static str) -> EntityBuilder {
        EntityBuilder {
            name,
            table: None,
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn properties(&self) -> &[PersistentProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PersistentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn id_property(&self) -> Option<&PersistentProperty> {
        self.id_index.map(|i| &self.properties[i])
    }

    pub fn version_property(&self) -> Option<&PersistentProperty> {
        self.version_index.map(|i| &self.properties[i])
    }

    /// Persisted columns in declared order (transient properties excluded).
    pub fn columns(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.properties.iter().filter(|p| !p.transient)
    }
}

/// Fluent builder for [`PersistentEntity`]. Declaration order becomes the
/// column order of generated statements.
pub struct EntityBuilder {
    name: &'static str,
    table: Option<String>,
    properties: Vec<PersistentProperty>,
}

impl EntityBuilder {
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare the identifier property at the current position.
    pub fn id(self, name: &str, ty: PropertyType) -> Self {
        self.push(name, None, ty, true, false, false)
    }

    /// Declare the optimistic-concurrency version property. Always `Long`.
    pub fn version(self, name: &str) -> Self {
        self.push(name, None, PropertyType::Long, false, true, false)
    }

    pub fn property(self, name: &str, ty: PropertyType) -> Self {
        self.push(name, None, ty, false, false, false)
    }

    /// Declare a property persisted under an explicit column name.
    pub fn property_as(self, name: &str, column: &str, ty: PropertyType) -> Self {
        self.push(name, Some(column), ty, false, false, false)
    }

    /// Declare a field that exists on the type but is never persisted.
    /// The field must be defaultable on deserialization.
    pub fn transient(self, name: &str) -> Self {
        self.push(name, None, PropertyType::Text, false, false, true)
    }

    fn push(
        mut self,
        name: &str,
        column: Option<&str>,
        ty: PropertyType,
        id: bool,
        version: bool,
        transient: bool,
    ) -> Self {
        self.properties.push(PersistentProperty {
            name: name.to_string(),
            column: column.unwrap_or(name).to_string(),
            ty,
            id,
            version,
            transient,
        });
        self
    }

    /// Validate and freeze the description. Fails when a property name is
    /// declared twice or more than one id/version property exists.
    pub fn build(self) -> Result<PersistentEntity, MappingError> {
        let mut id_index = None;
        let mut version_index = None;
        for (index, property) in self.properties.iter().enumerate() {
            if self.properties[..index].iter().any(|p| p.name == property.name) {
                return Err(self.invalid(format!("duplicate property '{}'", property.name)));
            }
            if property.id {
                if id_index.is_some() {
                    return Err(self.invalid("more than one id property".to_string()));
                }
                id_index = Some(index);
            }
            if property.version {
                if version_index.is_some() {
                    return Err(self.invalid("more than one version property".to_string()));
                }
                version_index = Some(index);
            }
        }
        Ok(PersistentEntity {
            name: self.name,
            table: self.table.unwrap_or_else(|| self.name.to_string()),
            properties: self.properties,
            id_index,
            version_index,
        })
    }

    fn invalid(&self, reason: String) -> MappingError {
        MappingError::InvalidMetadata {
            entity: self.name.to_string(),
            reason,
        }
    }
}
