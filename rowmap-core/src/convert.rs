use crate::context::{MappingContext, Persistent};
use crate::document::{Document, Value};
use crate::entity::{PersistentEntity, PersistentProperty, PropertyType};
use crate::error::MappingError;
use chrono::{DateTime, SecondsFormat};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

type ConvertFn = Arc<dyn Fn(Value) -> Result<Value, MappingError> + Send + Sync>;

struct ConversionPair {
    to_store: ConvertFn,
    from_store: ConvertFn,
}

/// Registry of bidirectional scalar conversions, keyed by type tag.
///
/// A pair registered under a default scalar tag (`"timestamp"`, `"text"`,
/// ...) replaces the default handling for that scalar entirely; a pair
/// registered under a [`PropertyType::Custom`] tag is the only way such a
/// property can be converted at all.
#[derive(Default)]
pub struct Conversions {
    pairs: HashMap<&'static str, ConversionPair>,
}

impl Conversions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        tag: &'static str,
        to_store: impl Fn(Value) -> Result<Value, MappingError> + Send + Sync + 'static,
        from_store: impl Fn(Value) -> Result<Value, MappingError> + Send + Sync + 'static,
    ) {
        self.pairs.insert(
            tag,
            ConversionPair {
                to_store: Arc::new(to_store),
                from_store: Arc::new(from_store),
            },
        );
    }

    /// Register the canonical timestamp pair: domain-side RFC 3339 strings
    /// (chrono's serde default) stored as epoch milliseconds.
    pub fn with_epoch_timestamps(mut self) -> Self {
        self.register(
            "timestamp",
            |value| match value {
                Value::String(text) => DateTime::parse_from_rfc3339(&text)
                    .map(|dt| Value::Long(dt.timestamp_millis()))
                    .map_err(|e| MappingError::Conversion {
                        tag: "timestamp".to_string(),
                        reason: e.to_string(),
                    }),
                Value::Long(millis) => Ok(Value::Long(millis)),
                other => Err(MappingError::Conversion {
                    tag: "timestamp".to_string(),
                    reason: format!("expected rfc3339 string, found {}", other.kind()),
                }),
            },
            |value| match value {
                Value::Long(millis) => DateTime::from_timestamp_millis(millis)
                    .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
                    .ok_or_else(|| MappingError::Conversion {
                        tag: "timestamp".to_string(),
                        reason: format!("epoch millis {millis} out of range"),
                    }),
                Value::String(text) => Ok(Value::String(text)),
                other => Err(MappingError::Conversion {
                    tag: "timestamp".to_string(),
                    reason: format!("expected epoch millis, found {}", other.kind()),
                }),
            },
        );
        self
    }

    fn to_store(&self, tag: &str) -> Option<&ConvertFn> {
        self.pairs.get(tag).map(|pair| &pair.to_store)
    }

    fn from_store(&self, tag: &str) -> Option<&ConvertFn> {
        self.pairs.get(tag).map(|pair| &pair.from_store)
    }
}

/// Bidirectional mapper between domain objects and [`Document`] trees.
///
/// Descends the declared properties of the target type's
/// [`PersistentEntity`] in order, recursing into nested entities, ordered
/// collections, sets, arrays, and string-keyed maps. Serde is the bridge to
/// the arbitrary domain type; all shape validation happens against the
/// entity metadata, not against serde's view of the type.
///
/// Round-trip law: with no custom conversions registered,
/// `to_object(to_document(o))` reproduces `o` field-wise.
pub struct DocumentConverter {
    context: Arc<MappingContext>,
    conversions: Conversions,
}

impl DocumentConverter {
    pub fn new(context: Arc<MappingContext>) -> Self {
        Self {
            context,
            conversions: Conversions::new(),
        }
    }

    pub fn with_conversions(context: Arc<MappingContext>, conversions: Conversions) -> Self {
        Self {
            context,
            conversions,
        }
    }

    pub fn context(&self) -> &MappingContext {
        &self.context
    }

    /// Convert a domain object into a [`Document`] keyed by column names,
    /// in entity property order.
    pub fn to_document<T: Persistent>(&self, source: &T) -> Result<Document, MappingError> {
        let entity = self.context.entity_of::<T>()?;
        trace!(entity = entity.name(), "converting object to document");
        let json = serde_json::to_value(source)
            .map_err(|e| MappingError::serde(entity.name(), e))?;
        match Value::from(json) {
            Value::Document(doc) => self.write_document(entity, doc),
            other => Err(MappingError::ShapeMismatch {
                entity: entity.name().to_string(),
                property: "<root>".to_string(),
                expected: "document".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// Convert a [`Document`] (keyed by column names) back into an instance
    /// of the target type.
    pub fn to_object<T: Persistent>(&self, document: &Document) -> Result<T, MappingError> {
        let entity = self.context.entity_of::<T>()?;
        trace!(entity = entity.name(), "converting document to object");
        let shaped = self.read_document(entity, document)?;
        let json = serde_json::Value::from(Value::Document(shaped));
        serde_json::from_value(json).map_err(|e| MappingError::serde(entity.name(), e))
    }

    fn write_document(
        &self,
        entity: &PersistentEntity,
        mut source: Document,
    ) -> Result<Document, MappingError> {
        let mut out = Document::with_capacity(entity.properties().len());
        for property in entity.properties() {
            if property.is_transient() {
                continue;
            }
            let value = source.remove(property.name()).unwrap_or(Value::Null);
            let stored = self.store_value(entity, property, property.ty(), value)?;
            out.insert(property.column(), stored);
        }
        Ok(out)
    }

    fn read_document(
        &self,
        entity: &PersistentEntity,
        source: &Document,
    ) -> Result<Document, MappingError> {
        let mut out = Document::with_capacity(entity.properties().len());
        for property in entity.properties() {
            if property.is_transient() {
                continue;
            }
            let value = source.get(property.column()).cloned().unwrap_or(Value::Null);
            let loaded = self.load_value(entity, property, property.ty(), value)?;
            out.insert(property.name(), loaded);
        }
        Ok(out)
    }

    fn store_value(
        &self,
        entity: &PersistentEntity,
        property: &PersistentProperty,
        ty: &PropertyType,
        value: Value,
    ) -> Result<Value, MappingError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Some(tag) = ty.scalar_tag() {
            if let Some(convert) = self.conversions.to_store(tag) {
                return convert(value);
            }
            if matches!(ty, PropertyType::Custom(_)) {
                return Err(MappingError::NoConversion {
                    tag: tag.to_string(),
                });
            }
        }
        match ty {
            PropertyType::Object(name) => {
                let nested = self.resolve(name)?;
                match value {
                    Value::Document(doc) => {
                        Ok(Value::Document(self.write_document(nested, doc)?))
                    }
                    other => Err(mismatch(entity, property, ty, &other)),
                }
            }
            PropertyType::Array(element) => match value {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.store_value(entity, property, element, item)?);
                    }
                    Ok(Value::Array(out))
                }
                other => Err(mismatch(entity, property, ty, &other)),
            },
            PropertyType::Map(value_ty) => match value {
                Value::Document(entries) => {
                    let mut out = Document::with_capacity(entries.len());
                    for (key, entry) in entries {
                        out.insert(key, self.store_value(entity, property, value_ty, entry)?);
                    }
                    Ok(Value::Document(out))
                }
                other => Err(mismatch(entity, property, ty, &other)),
            },
            scalar => check_scalar(entity, property, scalar, value),
        }
    }

    fn load_value(
        &self,
        entity: &PersistentEntity,
        property: &PersistentProperty,
        ty: &PropertyType,
        value: Value,
    ) -> Result<Value, MappingError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Some(tag) = ty.scalar_tag() {
            if let Some(convert) = self.conversions.from_store(tag) {
                return convert(value);
            }
            if matches!(ty, PropertyType::Custom(_)) {
                return Err(MappingError::NoConversion {
                    tag: tag.to_string(),
                });
            }
        }
        match ty {
            PropertyType::Object(name) => {
                let nested = self.resolve(name)?;
                match value {
                    Value::Document(doc) => {
                        Ok(Value::Document(self.read_document(nested, &doc)?))
                    }
                    other => Err(mismatch(entity, property, ty, &other)),
                }
            }
            PropertyType::Array(element) => match value {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.load_value(entity, property, element, item)?);
                    }
                    Ok(Value::Array(out))
                }
                other => Err(mismatch(entity, property, ty, &other)),
            },
            PropertyType::Map(value_ty) => match value {
                Value::Document(entries) => {
                    let mut out = Document::with_capacity(entries.len());
                    for (key, entry) in entries {
                        out.insert(key, self.load_value(entity, property, value_ty, entry)?);
                    }
                    Ok(Value::Document(out))
                }
                other => Err(mismatch(entity, property, ty, &other)),
            },
            scalar => check_scalar(entity, property, scalar, value),
        }
    }

    fn resolve(&self, name: &'static str) -> Result<&PersistentEntity, MappingError> {
        self.context
            .entity_named(name)
            .ok_or_else(|| MappingError::UnknownEntity {
                type_name: name.to_string(),
            })
    }
}

fn check_scalar(
    entity: &PersistentEntity,
    property: &PersistentProperty,
    ty: &PropertyType,
    value: Value,
) -> Result<Value, MappingError> {
    let ok = match (ty, &value) {
        (PropertyType::Bool, Value::Bool(_)) => true,
        (PropertyType::Long, Value::Long(_)) => true,
        (PropertyType::Double, Value::Double(_) | Value::Long(_)) => true,
        (PropertyType::Text, Value::String(_)) => true,
        // Without a registered conversion a timestamp passes through as the
        // domain representation: an ISO string or epoch millis.
        (PropertyType::Timestamp, Value::String(_) | Value::Long(_)) => true,
        _ => false,
    };
    if ok {
        Ok(value)
    } else {
        Err(mismatch(entity, property, ty, &value))
    }
}

fn mismatch(
    entity: &PersistentEntity,
    property: &PersistentProperty,
    ty: &PropertyType,
    value: &Value,
) -> MappingError {
    MappingError::ShapeMismatch {
        entity: entity.name().to_string(),
        property: property.name().to_string(),
        expected: ty.label(),
        found: value.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Email {
        address: String,
    }

    impl Persistent for Email {
        fn entity() -> Result<PersistentEntity, MappingError> {
            PersistentEntity::describe("email")
                .property("address", PropertyType::Text)
                .build()
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: String,
        age: i64,
        score: f64,
        active: bool,
        email: Email,
        aliases: Vec<String>,
        inboxes: Vec<Email>,
        attributes: BTreeMap<String, i64>,
        nickname: Option<String>,
    }

    impl Persistent for User {
        fn entity() -> Result<PersistentEntity, MappingError> {
            PersistentEntity::describe("user")
                .table("users")
                .id("id", PropertyType::Text)
                .property("name", PropertyType::Text)
                .property("age", PropertyType::Long)
                .property("score", PropertyType::Double)
                .property("active", PropertyType::Bool)
                .property("email", PropertyType::Object("email"))
                .property("aliases", PropertyType::array(PropertyType::Text))
                .property("inboxes", PropertyType::array(PropertyType::Object("email")))
                .property("attributes", PropertyType::map(PropertyType::Long))
                .property("nickname", PropertyType::Text)
                .build()
        }
    }

    fn converter() -> DocumentConverter {
        let context = MappingContext::builder()
            .register::<User>()
            .register::<Email>()
            .build()
            .unwrap();
        DocumentConverter::new(Arc::new(context))
    }

    fn sample_user() -> User {
        let mut attributes = BTreeMap::new();
        attributes.insert("logins".to_string(), 12);
        attributes.insert("strikes".to_string(), 0);
        User {
            id: "u-1".to_string(),
            name: "alice".to_string(),
            age: 30,
            score: 4.5,
            active: true,
            email: Email {
                address: "alice@example.com".to_string(),
            },
            aliases: vec!["al".to_string(), "alice".to_string()],
            inboxes: vec![
                Email {
                    address: "work@example.com".to_string(),
                },
                Email {
                    address: "home@example.com".to_string(),
                },
            ],
            attributes,
            nickname: None,
        }
    }

    #[test]
    fn test_round_trip_law() {
        let converter = converter();
        let user = sample_user();
        let doc = converter.to_document(&user).unwrap();
        let back: User = converter.to_object(&doc).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_document_column_order_matches_declaration() {
        let converter = converter();
        let doc = converter.to_document(&sample_user()).unwrap();
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(
            keys,
            vec![
                "id", "name", "age", "score", "active", "email", "aliases", "inboxes",
                "attributes", "nickname"
            ]
        );
    }

    #[test]
    fn test_nested_document_shape() {
        let converter = converter();
        let doc = converter.to_document(&sample_user()).unwrap();
        let email = doc.get("email").unwrap().as_document().unwrap();
        assert_eq!(email.get("address").unwrap().as_str(), Some("alice@example.com"));
        let inboxes = doc.get("inboxes").unwrap().as_array().unwrap();
        assert_eq!(inboxes.len(), 2);
        assert!(inboxes.iter().all(|v| v.as_document().is_some()));
    }

    #[test]
    fn test_null_for_absent_option() {
        let converter = converter();
        let doc = converter.to_document(&sample_user()).unwrap();
        assert!(doc.get("nickname").unwrap().is_null());
    }

    #[test]
    fn test_shape_mismatch_on_load() {
        let converter = converter();
        let mut doc = converter.to_document(&sample_user()).unwrap();
        doc.insert("age", "not-a-number");
        let err = converter.to_object::<User>(&doc).unwrap_err();
        match err {
            MappingError::ShapeMismatch {
                property, expected, found, ..
            } => {
                assert_eq!(property, "age");
                assert_eq!(expected, "long");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Event {
        id: String,
        at: String,
    }

    impl Persistent for Event {
        fn entity() -> Result<PersistentEntity, MappingError> {
            PersistentEntity::describe("event")
                .id("id", PropertyType::Text)
                .property("at", PropertyType::Timestamp)
                .build()
        }
    }

    #[test]
    fn test_registered_conversion_takes_precedence() {
        let context = MappingContext::builder().register::<Event>().build().unwrap();
        let converter = DocumentConverter::with_conversions(
            Arc::new(context),
            Conversions::new().with_epoch_timestamps(),
        );
        let event = Event {
            id: "e-1".to_string(),
            at: "2024-05-01T10:30:00.000Z".to_string(),
        };
        let doc = converter.to_document(&event).unwrap();
        // Stored as epoch millis, not as the pass-through string default.
        assert_eq!(doc.get("at").unwrap().as_long(), Some(1714559400000));
        let back: Event = converter.to_object(&doc).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_timestamp_default_passes_through() {
        let context = MappingContext::builder().register::<Event>().build().unwrap();
        let converter = DocumentConverter::new(Arc::new(context));
        let event = Event {
            id: "e-1".to_string(),
            at: "2024-05-01T10:30:00Z".to_string(),
        };
        let doc = converter.to_document(&event).unwrap();
        assert_eq!(doc.get("at").unwrap().as_str(), Some("2024-05-01T10:30:00Z"));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Opaque {
        id: String,
        blob: String,
    }

    impl Persistent for Opaque {
        fn entity() -> Result<PersistentEntity, MappingError> {
            PersistentEntity::describe("opaque")
                .id("id", PropertyType::Text)
                .property("blob", PropertyType::Custom("blob"))
                .build()
        }
    }

    #[test]
    fn test_custom_type_without_conversion_fails() {
        let context = MappingContext::builder().register::<Opaque>().build().unwrap();
        let converter = DocumentConverter::new(Arc::new(context));
        let err = converter
            .to_document(&Opaque {
                id: "o-1".to_string(),
                blob: "xyz".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, MappingError::NoConversion { tag } if tag == "blob"));
    }

    #[test]
    fn test_custom_type_with_conversion() {
        let mut conversions = Conversions::new();
        conversions.register(
            "blob",
            |v| match v {
                Value::String(s) => Ok(Value::String(format!("b64:{s}"))),
                other => Err(MappingError::Conversion {
                    tag: "blob".to_string(),
                    reason: format!("expected string, found {}", other.kind()),
                }),
            },
            |v| match v {
                Value::String(s) => Ok(Value::String(
                    s.strip_prefix("b64:").unwrap_or(&s).to_string(),
                )),
                other => Err(MappingError::Conversion {
                    tag: "blob".to_string(),
                    reason: format!("expected string, found {}", other.kind()),
                }),
            },
        );
        let context = MappingContext::builder().register::<Opaque>().build().unwrap();
        let converter = DocumentConverter::with_conversions(Arc::new(context), conversions);
        let doc = converter
            .to_document(&Opaque {
                id: "o-1".to_string(),
                blob: "xyz".to_string(),
            })
            .unwrap();
        assert_eq!(doc.get("blob").unwrap().as_str(), Some("b64:xyz"));
        let back: Opaque = converter.to_object(&doc).unwrap();
        assert_eq!(back.blob, "xyz");
    }
}
