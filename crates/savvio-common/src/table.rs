//! In-memory tabular data
//!
//! A [`Table`] is an ordered sequence of [`Record`]s plus the column list
//! derived from them. Columns are the union of record keys in the order they
//! are first seen; a record lacking a column reads as null for that cell.

use crate::error::{CommonError, Result};
use serde_json::{Map, Value};

/// One row: field name to scalar or nested JSON value, in source order
pub type Record = Map<String, Value>;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Build a table from records, deriving the column set
    pub fn from_records(rows: Vec<Record>) -> Self {
        let columns = union_columns(&rows);
        Self { columns, rows }
    }

    /// Build a table from a decoded JSON array of objects
    ///
    /// Fails with [`CommonError::InvalidShape`] when the value is not an array
    /// or when an element is not an object.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(CommonError::invalid_shape(format!(
                "expected a JSON array of records, found {}",
                json_kind(&value)
            )));
        };

        Ok(Self::from_records(records_from_values(items)?))
    }

    /// Build a table with an explicit column order (used by the CSV reader)
    pub(crate) fn with_columns(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup; missing fields and out-of-range rows read as null
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .unwrap_or(&NULL)
    }

    /// First `n` rows, for previews
    pub fn head(&self, n: usize) -> &[Record] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Union of record keys in first-seen order
pub fn union_columns(rows: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in rows {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Convert JSON values into records, rejecting anything that is not an object
pub fn records_from_values(items: Vec<Value>) -> Result<Vec<Record>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(CommonError::invalid_shape(format!(
                "element {} is {}, expected an object",
                index,
                json_kind(&other)
            ))),
        })
        .collect()
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_columns_are_first_seen_union() {
        let table = Table::from_records(vec![
            record(json!({"id": 1, "amount": 10.5})),
            record(json!({"id": 2, "currency": "USD"})),
            record(json!({"amount": 3, "id": 3})),
        ]);

        assert_eq!(table.columns(), &["id", "amount", "currency"]);
        assert_eq!(table.shape(), (3, 3));
    }

    #[test]
    fn test_missing_cell_reads_as_null() {
        let table = Table::from_records(vec![
            record(json!({"id": 1, "amount": 10})),
            record(json!({"id": 2})),
        ]);

        assert_eq!(table.value(1, "amount"), &Value::Null);
        assert_eq!(table.value(0, "amount"), &json!(10));
        assert_eq!(table.value(9, "id"), &Value::Null);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = Table::from_json(json!({"data": []})).unwrap_err();
        assert!(matches!(err, CommonError::InvalidShape(_)));
    }

    #[test]
    fn test_from_json_rejects_scalar_elements() {
        let err = Table::from_json(json!([{"id": 1}, 2])).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::from_json(json!([])).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.shape(), (0, 0));
        assert!(table.head(3).is_empty());
    }
}
