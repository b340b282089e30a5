use crate::config::ClusterConfig;
use crate::driver::{Driver, FAILED_ROW};
use crate::error::OperationError;
use crate::executor::reduce_single;
use crate::response::ResponseHandler;
use crate::result::ActionableResult;
use crate::statement::{Statement, StatementBuilder};
use rowmap_core::{Document, DocumentConverter, PersistentEntity, Persistent, Value};
use rowmap_events::{LifecycleEvent, ListenerRegistry};
use std::sync::Arc;
use tracing::debug;

/// The operations facade: orchestrates metadata lookup, conversion,
/// statement building, the driver round trip, and response handling, and
/// emits lifecycle events at each stage.
///
/// Composed explicitly from its collaborators — no container resolves them:
///
/// ```ignore
/// let template = DbTemplate::new(driver, converter)
///     .with_listeners(listeners)
///     .with_config(&config);
/// template.save(&user).await?;
/// ```
///
/// The template is request-scoped and stateless across calls apart from the
/// read-only metadata inside the converter; a single instance may be shared
/// and called concurrently, and each call is one synchronous round trip to
/// the driver.
pub struct DbTemplate<D: Driver> {
    driver: D,
    converter: DocumentConverter,
    listeners: Arc<ListenerRegistry>,
    schema: Option<String>,
}

impl<D: Driver> DbTemplate<D> {
    pub fn new(driver: D, converter: DocumentConverter) -> Self {
        Self {
            driver,
            converter,
            listeners: Arc::new(ListenerRegistry::empty()),
            schema: None,
        }
    }

    pub fn with_listeners(mut self, listeners: Arc<ListenerRegistry>) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_config(mut self, config: &ClusterConfig) -> Self {
        self.schema = config.schema.clone();
        self
    }

    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Release the underlying driver.
    pub async fn close(&self) -> Result<(), OperationError> {
        self.driver
            .close()
            .await
            .map_err(|e| OperationError::driver("close", e))
    }

    /// Insert one entity: BeforeConvert → convert → BeforeSave → driver →
    /// AfterSave.
    pub async fn save<T: Persistent>(&self, source: &T) -> Result<(), OperationError> {
        let entity = self.entity_of::<T>()?;
        self.listeners
            .publish(&LifecycleEvent::before_convert(source))?;
        let document = self.converter.to_document(source)?;
        self.listeners
            .publish(&LifecycleEvent::before_save(source, &document))?;
        let statement = self.builder(entity).insert(&document);
        debug!(table = entity.table(), sql = %statement.sql, "save");
        self.driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("save", e))?;
        self.listeners
            .publish(&LifecycleEvent::after_save(source, &document))?;
        Ok(())
    }

    /// Update one entity by its identifier, with the same event sequence as
    /// [`save`](Self::save). When the entity carries a version and the
    /// driver matches zero rows, the update surfaces as a
    /// [`OperationError::VersionConflict`] rather than a silent no-op.
    pub async fn update<T: Persistent>(&self, source: &T) -> Result<(), OperationError> {
        let entity = self.entity_of::<T>()?;
        self.listeners
            .publish(&LifecycleEvent::before_convert(source))?;
        let document = self.converter.to_document(source)?;
        self.listeners
            .publish(&LifecycleEvent::before_save(source, &document))?;
        let statement = self.builder(entity).update(&document)?;
        debug!(table = entity.table(), sql = %statement.sql, "update");
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("update", e))?;
        if response.row_count == 0 && self.version_bound(entity, &document) {
            return Err(OperationError::VersionConflict {
                table: entity.table().to_string(),
                id: self.id_display(entity, &document),
            });
        }
        self.listeners
            .publish(&LifecycleEvent::after_save(source, &document))?;
        Ok(())
    }

    /// Bulk insert in one driver round trip.
    ///
    /// All entities are converted before anything is sent: a conversion or
    /// listener failure on any item aborts the whole call with zero driver
    /// contact. Per-item outcomes come from the driver's per-row counts; an
    /// undifferentiated driver failure fails the batch as one error.
    pub async fn save_all<T: Persistent>(
        &self,
        sources: Vec<T>,
    ) -> Result<ActionableResult<T>, OperationError> {
        if sources.is_empty() {
            return Ok(ActionableResult::empty());
        }
        let entity = self.entity_of::<T>()?;
        let mut documents = Vec::with_capacity(sources.len());
        for source in &sources {
            self.listeners
                .publish(&LifecycleEvent::before_convert(source))?;
            let document = self.converter.to_document(source)?;
            self.listeners
                .publish(&LifecycleEvent::before_save(source, &document))?;
            documents.push(document);
        }
        let bulk = self.builder(entity).insert_bulk(&documents);
        debug!(
            table = entity.table(),
            rows = bulk.rows.len(),
            sql = %bulk.sql,
            "save-all"
        );
        let row_counts = self
            .driver
            .execute_bulk(&bulk.sql, &bulk.rows)
            .await
            .map_err(|e| OperationError::driver("save-all", e))?;
        for (index, source) in sources.iter().enumerate() {
            let succeeded = row_counts
                .get(index)
                .is_some_and(|&count| count != FAILED_ROW);
            if succeeded {
                self.listeners
                    .publish(&LifecycleEvent::after_save(source, &documents[index]))?;
            }
        }
        Ok(ActionableResult::from_row_counts(sources, &row_counts))
    }

    /// Load one entity by identifier. At most one row may match.
    pub async fn find_by_id<T: Persistent>(
        &self,
        id: &Value,
    ) -> Result<Option<T>, OperationError> {
        let entity = self.entity_of::<T>()?;
        let statement = self.builder(entity).select_by_id(id)?;
        reduce_single(self.run_query(entity, "find-by-id", statement).await?)
    }

    pub async fn find_all<T: Persistent>(&self) -> Result<Vec<T>, OperationError> {
        let entity = self.entity_of::<T>()?;
        let statement = self.builder(entity).select_all();
        self.run_query(entity, "find-all", statement).await
    }

    /// Execute caller-supplied SQL (a repository query method's statement)
    /// and map every row to the target type.
    pub async fn query<T: Persistent>(
        &self,
        statement: Statement,
    ) -> Result<Vec<T>, OperationError> {
        let entity = self.entity_of::<T>()?;
        self.run_query(entity, "query", statement).await
    }

    /// Execute caller-supplied SQL and return raw documents, one per row.
    pub async fn query_documents(
        &self,
        statement: Statement,
    ) -> Result<Vec<Document>, OperationError> {
        debug!(sql = %statement.sql, "query-documents");
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("query", e))?;
        Ok(ResponseHandler::documents(&response).collect())
    }

    pub async fn count<T: Persistent>(&self) -> Result<u64, OperationError> {
        let entity = self.entity_of::<T>()?;
        let statement = self.builder(entity).count();
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("count", e))?;
        let count = response
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_long)
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    /// Delete one entity by identifier: BeforeDelete → driver → AfterDelete.
    /// Returns whether a row was actually removed.
    pub async fn delete_by_id<T: Persistent>(&self, id: &Value) -> Result<bool, OperationError> {
        let entity = self.entity_of::<T>()?;
        self.listeners
            .publish(&LifecycleEvent::before_delete::<T>(id))?;
        let statement = self.builder(entity).delete(id)?;
        debug!(table = entity.table(), sql = %statement.sql, "delete");
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("delete", e))?;
        self.listeners
            .publish(&LifecycleEvent::after_delete::<T>(id))?;
        Ok(response.row_count > 0)
    }

    /// Delete every row of the entity's table. The delete events fire once
    /// with a null identifier.
    pub async fn delete_all<T: Persistent>(&self) -> Result<i64, OperationError> {
        let entity = self.entity_of::<T>()?;
        self.listeners
            .publish(&LifecycleEvent::before_delete::<T>(&Value::Null))?;
        let statement = self.builder(entity).delete_all();
        debug!(table = entity.table(), sql = %statement.sql, "delete-all");
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("delete-all", e))?;
        self.listeners
            .publish(&LifecycleEvent::after_delete::<T>(&Value::Null))?;
        Ok(response.row_count)
    }

    /// One-shot DDL for the entity's table.
    pub async fn create_table<T: Persistent>(&self) -> Result<(), OperationError> {
        let entity = self.entity_of::<T>()?;
        let statement = self.builder(entity).create_table();
        debug!(table = entity.table(), sql = %statement.sql, "create-table");
        self.driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver("create-table", e))?;
        Ok(())
    }

    /// Standalone conversion outside the save path. This is the only place
    /// the AfterConvert hook fires.
    pub fn convert_to_document<T: Persistent>(
        &self,
        source: &T,
    ) -> Result<Document, OperationError> {
        self.listeners
            .publish(&LifecycleEvent::before_convert(source))?;
        let document = self.converter.to_document(source)?;
        self.listeners
            .publish(&LifecycleEvent::after_convert(source, &document))?;
        Ok(document)
    }

    async fn run_query<T: Persistent>(
        &self,
        entity: &PersistentEntity,
        operation: &'static str,
        statement: Statement,
    ) -> Result<Vec<T>, OperationError> {
        debug!(table = entity.table(), sql = %statement.sql, operation);
        let response = self
            .driver
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| OperationError::driver(operation, e))?;
        let mut results = Vec::with_capacity(response.rows.len());
        for document in ResponseHandler::documents(&response) {
            self.listeners
                .publish(&LifecycleEvent::after_load::<T>(&document))?;
            results.push(self.converter.to_object::<T>(&document)?);
        }
        Ok(results)
    }

    fn entity_of<T: Persistent>(&self) -> Result<&PersistentEntity, OperationError> {
        Ok(self.converter.context().entity_of::<T>()?)
    }

    fn builder<'a>(&'a self, entity: &'a PersistentEntity) -> StatementBuilder<'a> {
        StatementBuilder::new(entity).schema(self.schema.as_deref())
    }

    fn version_bound(&self, entity: &PersistentEntity, document: &Document) -> bool {
        entity
            .version_property()
            .and_then(|version| document.get(version.column()))
            .is_some_and(|value| !value.is_null())
    }

    fn id_display(&self, entity: &PersistentEntity, document: &Document) -> String {
        entity
            .id_property()
            .and_then(|id| document.get(id.column()))
            .map(|value| value.to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }
}
