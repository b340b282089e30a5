use crate::driver::Driver;
use crate::error::OperationError;
use crate::statement::Statement;
use crate::template::DbTemplate;
use rowmap_core::Persistent;

/// Reduce a result sequence to at most one element.
///
/// More than one row is a caller-usage error, reported with the actual
/// count; zero rows is an absent result, not a failure.
pub fn reduce_single<T>(mut results: Vec<T>) -> Result<Option<T>, OperationError> {
    match results.len() {
        0 => Ok(None),
        1 => Ok(results.pop()),
        actual => Err(OperationError::Cardinality { actual }),
    }
}

/// Executes a pre-built statement and reduces the result to a single
/// optional entity.
pub struct SingleResultExecutor<'a, D: Driver> {
    template: &'a DbTemplate<D>,
}

impl<'a, D: Driver> SingleResultExecutor<'a, D> {
    pub fn new(template: &'a DbTemplate<D>) -> Self {
        Self { template }
    }

    pub async fn execute<T: Persistent>(
        &self,
        statement: Statement,
    ) -> Result<Option<T>, OperationError> {
        reduce_single(self.template.query(statement).await?)
    }
}

/// Executes a pre-built statement and returns the full result sequence
/// unreduced, in row order.
pub struct CollectionExecutor<'a, D: Driver> {
    template: &'a DbTemplate<D>,
}

impl<'a, D: Driver> CollectionExecutor<'a, D> {
    pub fn new(template: &'a DbTemplate<D>) -> Self {
        Self { template }
    }

    pub async fn execute<T: Persistent>(
        &self,
        statement: Statement,
    ) -> Result<Vec<T>, OperationError> {
        self.template.query(statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_empty_is_none() {
        let result: Option<i64> = reduce_single(Vec::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_reduce_single_returns_element_unchanged() {
        assert_eq!(reduce_single(vec![41]).unwrap(), Some(41));
    }

    #[test]
    fn test_reduce_two_reports_actual_count() {
        let err = reduce_single(vec![1, 2]).unwrap_err();
        match &err {
            OperationError::Cardinality { actual } => assert_eq!(*actual, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains('2'));
    }
}
