use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::types::RowValues;

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    // Column name -> index, shared with the other rows of the same result set
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `rows` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    ///
    /// Duplicate column names (e.g. from a join) resolve to the first occurrence.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Column name -> JSON value, in column order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.rows.len());
        for (name, value) in self.column_names.iter().zip(&self.rows) {
            map.entry(name.clone()).or_insert_with(|| value.to_json());
        }
        JsonValue::Object(map)
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CustomDbRow {
        CustomDbRow::new(
            Arc::new(vec!["id".into(), "name".into(), "price".into()]),
            vec![
                RowValues::Int(1),
                RowValues::Text("Laptop".into()),
                RowValues::Text("799.99".into()),
            ],
        )
    }

    #[test]
    fn looks_up_by_name_and_index() {
        let row = row();
        assert_eq!(row.get("name").and_then(RowValues::as_text), Some("Laptop"));
        assert_eq!(row.get_by_index(0), Some(&RowValues::Int(1)));
        assert!(row.get("stock").is_none());
    }

    #[test]
    fn duplicate_columns_resolve_to_first() {
        let row = CustomDbRow::new(
            Arc::new(vec!["name".into(), "name".into()]),
            vec![RowValues::Text("user".into()), RowValues::Text("product".into())],
        );
        assert_eq!(row.get("name").and_then(RowValues::as_text), Some("user"));
        assert_eq!(row.to_json(), serde_json::json!({ "name": "user" }));
    }
}
