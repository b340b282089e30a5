use crate::driver::FAILED_ROW;

/// Outcome of one item in a bulk operation.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Failed { item: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn item(&self) -> &T {
        match self {
            Outcome::Ok(item) => item,
            Outcome::Failed { item, .. } => item,
        }
    }
}

/// Per-item outcomes of a bulk operation, order-correlated with the input
/// so callers can match results back positionally.
///
/// Only produced when the driver itself reports per-row outcomes; an
/// undifferentiated batch failure surfaces as a single driver error
/// instead, and no `ActionableResult` exists for that call.
#[derive(Debug, Default)]
pub struct ActionableResult<T> {
    outcomes: Vec<Outcome<T>>,
}

impl<T> ActionableResult<T> {
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Correlate input items with driver-reported per-row counts, in input
    /// order. A missing count is treated as a failed row.
    pub fn from_row_counts(items: Vec<T>, row_counts: &[i64]) -> Self {
        let outcomes = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match row_counts.get(index) {
                Some(&count) if count != FAILED_ROW => Outcome::Ok(item),
                Some(_) => Outcome::Failed {
                    item,
                    reason: "row rejected by the cluster".to_string(),
                },
                None => Outcome::Failed {
                    item,
                    reason: "no outcome reported for row".to_string(),
                },
            })
            .collect();
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[Outcome<T>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn ok_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.ok_count()
    }

    pub fn is_all_ok(&self) -> bool {
        self.failed_count() == 0
    }

    /// Failed items with their positions in the original input.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &T, &str)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| match outcome {
                Outcome::Failed { item, reason } => Some((index, item, reason.as_str())),
                Outcome::Ok(_) => None,
            })
    }
}

impl<T> IntoIterator for ActionableResult<T> {
    type Item = Outcome<T>;
    type IntoIter = std::vec::IntoIter<Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
