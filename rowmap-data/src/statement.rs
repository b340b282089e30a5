use crate::error::StatementError;
use rowmap_core::{Document, PersistentEntity, PropertyType, Value};

/// One parameterized SQL statement: text plus ordered bind values.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Wrap caller-supplied SQL (e.g. derived from a repository query
    /// method elsewhere). The builder's only duty here is preserving the
    /// parameter binding order.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One statement bound against many parameter rows, sent in a single
/// driver round trip.
#[derive(Debug, Clone)]
pub struct BulkStatement {
    pub sql: String,
    pub rows: Vec<Vec<Value>>,
}

/// Pure transformation from entity metadata plus values to parameterized
/// SQL. Never executes anything.
///
/// Column order always follows the entity's declared property order
/// (transient properties excluded), which matches the key order of
/// documents produced by the converter.
///
/// # Example
///
/// ```ignore
/// let stmt = StatementBuilder::new(&entity).insert(&doc);
/// let stmt = StatementBuilder::new(&entity).schema(Some("app")).update(&doc)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    entity: &'a PersistentEntity,
    schema: Option<&'a str>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(entity: &'a PersistentEntity) -> Self {
        Self {
            entity,
            schema: None,
        }
    }

    /// Qualify the table name with a schema.
    pub fn schema(mut self, schema: Option<&'a str>) -> Self {
        self.schema = schema;
        self
    }

    fn table(&self) -> String {
        match self.schema {
            Some(schema) => format!("{schema}.{}", self.entity.table()),
            None => self.entity.table().to_string(),
        }
    }

    fn columns(&self) -> Vec<&str> {
        self.entity.columns().map(|p| p.column()).collect()
    }

    /// `INSERT INTO t (c1, c2, ...) VALUES (?, ?, ...)` with one parameter
    /// per column, in declared order. Absent document keys bind null.
    pub fn insert(&self, document: &Document) -> Statement {
        let columns = self.columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            columns.join(", "),
            placeholders
        );
        Statement {
            sql,
            params: self.bind_row(&columns, document),
        }
    }

    /// Bulk insert: the same statement text, one fully bound parameter row
    /// per document in the same column order.
    pub fn insert_bulk(&self, documents: &[Document]) -> BulkStatement {
        let columns = self.columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            columns.join(", "),
            placeholders
        );
        let rows = documents
            .iter()
            .map(|document| self.bind_row(&columns, document))
            .collect();
        BulkStatement { sql, rows }
    }

    /// `UPDATE t SET ... WHERE id = ?` — the SET clause covers all
    /// non-identifier, non-version columns in declared order; when the
    /// entity has a version property with a non-null value it is bound into
    /// the WHERE clause after the identifier for the optimistic-concurrency
    /// check.
    pub fn update(&self, document: &Document) -> Result<Statement, StatementError> {
        let id_property = self.id_property()?;
        let id_value = document
            .get(id_property.column())
            .cloned()
            .unwrap_or(Value::Null);
        if id_value.is_null() {
            return Err(self.missing_id());
        }

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for property in self.entity.columns() {
            if property.is_id() || property.is_version() {
                continue;
            }
            assignments.push(format!("{} = ?", property.column()));
            params.push(
                document
                    .get(property.column())
                    .cloned()
                    .unwrap_or(Value::Null),
            );
        }

        let mut sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table(),
            assignments.join(", "),
            id_property.column()
        );
        params.push(id_value);

        if let Some(version) = self.entity.version_property() {
            let version_value = document
                .get(version.column())
                .cloned()
                .unwrap_or(Value::Null);
            if !version_value.is_null() {
                sql.push_str(&format!(" AND {} = ?", version.column()));
                params.push(version_value);
            }
        }
        Ok(Statement { sql, params })
    }

    /// `DELETE FROM t WHERE id = ?`. Version is deliberately not checked
    /// on delete.
    pub fn delete(&self, id: &Value) -> Result<Statement, StatementError> {
        let id_property = self.id_property()?;
        Ok(Statement {
            sql: format!(
                "DELETE FROM {} WHERE {} = ?",
                self.table(),
                id_property.column()
            ),
            params: vec![id.clone()],
        })
    }

    pub fn delete_all(&self) -> Statement {
        Statement {
            sql: format!("DELETE FROM {}", self.table()),
            params: Vec::new(),
        }
    }

    pub fn select_all(&self) -> Statement {
        Statement {
            sql: format!("SELECT {} FROM {}", self.columns().join(", "), self.table()),
            params: Vec::new(),
        }
    }

    pub fn select_by_id(&self, id: &Value) -> Result<Statement, StatementError> {
        let id_property = self.id_property()?;
        Ok(Statement {
            sql: format!(
                "SELECT {} FROM {} WHERE {} = ?",
                self.columns().join(", "),
                self.table(),
                id_property.column()
            ),
            params: vec![id.clone()],
        })
    }

    pub fn count(&self) -> Statement {
        Statement {
            sql: format!("SELECT COUNT(*) FROM {}", self.table()),
            params: Vec::new(),
        }
    }

    /// One-shot DDL for the entity: column types derived from the declared
    /// property types, primary key on the identifier column.
    pub fn create_table(&self) -> Statement {
        let mut definitions = Vec::new();
        for property in self.entity.columns() {
            let mut definition = format!("{} {}", property.column(), sql_type(property.ty()));
            if property.is_id() {
                definition.push_str(" PRIMARY KEY");
            }
            definitions.push(definition);
        }
        Statement {
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                self.table(),
                definitions.join(", ")
            ),
            params: Vec::new(),
        }
    }

    fn bind_row(&self, columns: &[&str], document: &Document) -> Vec<Value> {
        columns
            .iter()
            .map(|column| document.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn id_property(&self) -> Result<&'a rowmap_core::PersistentProperty, StatementError> {
        self.entity.id_property().ok_or_else(|| self.missing_id())
    }

    fn missing_id(&self) -> StatementError {
        StatementError::MissingId {
            entity: self.entity.name().to_string(),
        }
    }
}

fn sql_type(ty: &PropertyType) -> String {
    match ty {
        PropertyType::Bool => "BOOLEAN".to_string(),
        PropertyType::Long => "BIGINT".to_string(),
        PropertyType::Double => "DOUBLE PRECISION".to_string(),
        PropertyType::Text => "TEXT".to_string(),
        PropertyType::Timestamp => "TIMESTAMP WITH TIME ZONE".to_string(),
        // Custom scalars are stored in their converted representation; TEXT
        // is the portable default.
        PropertyType::Custom(_) => "TEXT".to_string(),
        PropertyType::Object(_) | PropertyType::Map(_) => "OBJECT".to_string(),
        PropertyType::Array(element) => format!("ARRAY({})", sql_type(element)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::PropertyType;

    fn user_entity() -> PersistentEntity {
        PersistentEntity::describe("user")
            .table("users")
            .id("id", PropertyType::Text)
            .property("name", PropertyType::Text)
            .property("age", PropertyType::Long)
            .version("revision")
            .build()
            .unwrap()
    }

    fn user_doc() -> Document {
        let mut doc = Document::new();
        doc.insert("id", "u-1");
        doc.insert("name", "alice");
        doc.insert("age", 30i64);
        doc.insert("revision", 3i64);
        doc
    }

    #[test]
    fn test_insert_column_order() {
        let entity = user_entity();
        let stmt = StatementBuilder::new(&entity).insert(&user_doc());
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (id, name, age, revision) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::from("u-1"),
                Value::from("alice"),
                Value::from(30i64),
                Value::from(3i64)
            ]
        );
    }

    #[test]
    fn test_insert_missing_key_binds_null() {
        let entity = user_entity();
        let mut doc = user_doc();
        doc.remove("age");
        let stmt = StatementBuilder::new(&entity).insert(&doc);
        assert_eq!(stmt.params[2], Value::Null);
    }

    #[test]
    fn test_insert_bulk_shares_sql() {
        let entity = user_entity();
        let mut second = user_doc();
        second.insert("id", "u-2");
        let bulk = StatementBuilder::new(&entity).insert_bulk(&[user_doc(), second]);
        assert_eq!(
            bulk.sql,
            "INSERT INTO users (id, name, age, revision) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(bulk.rows.len(), 2);
        assert_eq!(bulk.rows[0][0], Value::from("u-1"));
        assert_eq!(bulk.rows[1][0], Value::from("u-2"));
    }

    #[test]
    fn test_update_binds_id_and_version_in_where() {
        let entity = user_entity();
        let stmt = StatementBuilder::new(&entity).update(&user_doc()).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE users SET name = ?, age = ? WHERE id = ? AND revision = ?"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::from("alice"),
                Value::from(30i64),
                Value::from("u-1"),
                Value::from(3i64)
            ]
        );
    }

    #[test]
    fn test_update_without_version_value() {
        let entity = user_entity();
        let mut doc = user_doc();
        doc.insert("revision", Value::Null);
        let stmt = StatementBuilder::new(&entity).update(&doc).unwrap();
        assert_eq!(stmt.sql, "UPDATE users SET name = ?, age = ? WHERE id = ?");
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_update_null_id_fails() {
        let entity = user_entity();
        let mut doc = user_doc();
        doc.insert("id", Value::Null);
        let err = StatementBuilder::new(&entity).update(&doc).unwrap_err();
        assert!(matches!(err, StatementError::MissingId { .. }));
    }

    #[test]
    fn test_update_without_id_property_fails() {
        let entity = PersistentEntity::describe("log")
            .property("line", PropertyType::Text)
            .build()
            .unwrap();
        let err = StatementBuilder::new(&entity)
            .update(&Document::new())
            .unwrap_err();
        assert!(matches!(err, StatementError::MissingId { entity } if entity == "log"));
    }

    #[test]
    fn test_delete_where_id_only() {
        let entity = user_entity();
        let stmt = StatementBuilder::new(&entity)
            .delete(&Value::from("u-1"))
            .unwrap();
        assert_eq!(stmt.sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::from("u-1")]);
    }

    #[test]
    fn test_select_by_id() {
        let entity = user_entity();
        let stmt = StatementBuilder::new(&entity)
            .select_by_id(&Value::from("u-1"))
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT id, name, age, revision FROM users WHERE id = ?"
        );
    }

    #[test]
    fn test_schema_qualifies_table() {
        let entity = user_entity();
        let stmt = StatementBuilder::new(&entity)
            .schema(Some("app"))
            .select_all();
        assert_eq!(stmt.sql, "SELECT id, name, age, revision FROM app.users");
    }

    #[test]
    fn test_create_table() {
        let entity = PersistentEntity::describe("user")
            .table("users")
            .id("id", PropertyType::Text)
            .property("age", PropertyType::Long)
            .property("email", PropertyType::Object("email"))
            .property("aliases", PropertyType::array(PropertyType::Text))
            .build()
            .unwrap();
        let stmt = StatementBuilder::new(&entity).create_table();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS users (id TEXT PRIMARY KEY, age BIGINT, \
             email OBJECT, aliases ARRAY(TEXT))"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_raw_statement_preserves_param_order() {
        let stmt = Statement::raw(
            "SELECT * FROM users WHERE name = ? AND age > ?",
            vec![Value::from("alice"), Value::from(21i64)],
        );
        assert_eq!(stmt.params[0], Value::from("alice"));
        assert_eq!(stmt.params[1], Value::from(21i64));
    }
}
