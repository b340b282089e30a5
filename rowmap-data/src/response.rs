use crate::driver::TabularResponse;
use rowmap_core::{Document, DocumentConverter, MappingError, Persistent};

/// Turns a tabular driver response back into documents or mapped objects.
///
/// Rows are zipped with the column name list into flat documents; values
/// that are themselves nested documents (object-typed columns) or ordered
/// sequences (array-typed columns) pass through recursively intact, so the
/// converter sees the same tree shape it produced on the way in.
pub struct ResponseHandler;

impl ResponseHandler {
    /// Lazily materialize one [`Document`] per row, in row order.
    ///
    /// Single pass, finite; each document is built on demand so callers can
    /// consume row by row. When a row is shorter than the column list the
    /// missing columns are simply absent from the document.
    pub fn documents(response: &TabularResponse) -> impl Iterator<Item = Document> + '_ {
        response
            .rows
            .iter()
            .map(move |row| Self::document_from_row(&response.columns, row))
    }

    /// Eagerly map every row through the converter into the target type,
    /// preserving row order.
    pub fn entities<T: Persistent>(
        response: &TabularResponse,
        converter: &DocumentConverter,
    ) -> Result<Vec<T>, MappingError> {
        Self::documents(response)
            .map(|document| converter.to_object(&document))
            .collect()
    }

    fn document_from_row(columns: &[String], row: &[rowmap_core::Value]) -> Document {
        columns
            .iter()
            .zip(row.iter())
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect()
    }
}
