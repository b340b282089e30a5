use crate::driver::Driver;
use crate::error::OperationError;
use crate::result::ActionableResult;
use crate::template::DbTemplate;
use rowmap_core::{Persistent, Value};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Generic async repository trait for CRUD operations.
///
/// Uses RPITIT (return-position `impl Trait` in traits) — no `async-trait`
/// needed.
pub trait Repository<T, ID>: Send + Sync
where
    T: Send + Sync + 'static,
    ID: Send + Sync + 'static,
{
    fn find_by_id(&self, id: &ID)
        -> impl Future<Output = Result<Option<T>, OperationError>> + Send;
    fn find_all(&self) -> impl Future<Output = Result<Vec<T>, OperationError>> + Send;
    fn save(&self, entity: &T) -> impl Future<Output = Result<(), OperationError>> + Send;
    fn update(&self, entity: &T) -> impl Future<Output = Result<(), OperationError>> + Send;
    fn delete(&self, id: &ID) -> impl Future<Output = Result<bool, OperationError>> + Send;
    fn count(&self) -> impl Future<Output = Result<u64, OperationError>> + Send;
}

/// Repository implementation backed by a shared [`DbTemplate`].
///
/// # Example
///
/// ```ignore
/// let repo = TemplateRepository::<User, _>::new(template.clone());
/// let user = repo.find_by_id(&Value::from("u-1")).await?;
/// ```
pub struct TemplateRepository<T, D: Driver> {
    template: Arc<DbTemplate<D>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Persistent, D: Driver> TemplateRepository<T, D> {
    pub fn new(template: Arc<DbTemplate<D>>) -> Self {
        Self {
            template,
            _marker: PhantomData,
        }
    }

    pub fn template(&self) -> &DbTemplate<D> {
        &self.template
    }

    /// Bulk insert through the template, preserving per-item outcomes.
    pub async fn save_all(&self, entities: Vec<T>) -> Result<ActionableResult<T>, OperationError> {
        self.template.save_all(entities).await
    }
}

impl<T, D: Driver> Clone for TemplateRepository<T, D> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Persistent, D: Driver> Repository<T, Value> for TemplateRepository<T, D> {
    fn find_by_id(
        &self,
        id: &Value,
    ) -> impl Future<Output = Result<Option<T>, OperationError>> + Send {
        self.template.find_by_id::<T>(id)
    }

    fn find_all(&self) -> impl Future<Output = Result<Vec<T>, OperationError>> + Send {
        self.template.find_all::<T>()
    }

    fn save(&self, entity: &T) -> impl Future<Output = Result<(), OperationError>> + Send {
        self.template.save(entity)
    }

    fn update(&self, entity: &T) -> impl Future<Output = Result<(), OperationError>> + Send {
        self.template.update(entity)
    }

    fn delete(&self, id: &Value) -> impl Future<Output = Result<bool, OperationError>> + Send {
        self.template.delete_by_id::<T>(id)
    }

    fn count(&self) -> impl Future<Output = Result<u64, OperationError>> + Send {
        self.template.count::<T>()
    }
}
