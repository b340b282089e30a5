/// Errors raised while deriving entity metadata or converting between
/// objects and documents.
#[derive(Debug)]
pub enum MappingError {
    /// The type was never registered with the mapping context.
    UnknownEntity { type_name: String },
    /// The entity description itself is inconsistent (duplicate id,
    /// duplicate property, unresolved nested link, ...).
    InvalidMetadata { entity: String, reason: String },
    /// A value's runtime shape does not match the declared property type.
    ShapeMismatch {
        entity: String,
        property: String,
        expected: String,
        found: String,
    },
    /// A custom-typed property has no registered conversion pair.
    NoConversion { tag: String },
    /// A registered conversion rejected the value it was given.
    Conversion { tag: String, reason: String },
    /// Serialization or deserialization of the domain type failed.
    Serde {
        context: String,
        source: serde_json::Error,
    },
}

impl MappingError {
    pub(crate) fn serde(context: impl Into<String>, source: serde_json::Error) -> Self {
        MappingError::Serde {
            context: context.into(),
            source,
        }
    }
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::UnknownEntity { type_name } => {
                write!(f, "no entity registered for type {type_name}")
            }
            MappingError::InvalidMetadata { entity, reason } => {
                write!(f, "invalid metadata for entity '{entity}': {reason}")
            }
            MappingError::ShapeMismatch {
                entity,
                property,
                expected,
                found,
            } => write!(
                f,
                "property '{entity}.{property}' expected {expected}, found {found}"
            ),
            MappingError::NoConversion { tag } => {
                write!(f, "no conversion registered for '{tag}'")
            }
            MappingError::Conversion { tag, reason } => {
                write!(f, "conversion '{tag}' failed: {reason}")
            }
            MappingError::Serde { context, source } => {
                write!(f, "serde failure for {context}: {source}")
            }
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::Serde { source, .. } => Some(source),
            _ => None,
        }
    }
}
