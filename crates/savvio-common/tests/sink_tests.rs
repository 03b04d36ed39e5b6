//! Record sink tests
//!
//! Exercise the on-disk layouts used for the raw datasets:
//! - JSON arrays survive a save/reload unchanged and in order
//! - CSV headers come from the union of record keys
//! - Parent directories are created on demand

use savvio_common::sink::{self, FileFormat};
use savvio_common::{CommonError, Record, Table};
use serde_json::{json, Value};
use tempfile::TempDir;

fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_object().expect("object").clone())
        .collect()
}

#[test]
fn test_json_save_then_reload_preserves_records_and_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw/product_data.json");

    let original = records(json!([
        {"product_id": "p-1", "name": "Kettle", "price": 24.99, "tags": ["kitchen"]},
        {"product_id": "p-2", "name": "Toaster", "price": 39, "specs": {"watts": 900}},
        {"product_id": "p-3", "name": null, "price": 12}
    ]));

    let written = sink::write_records(&original, &path, FileFormat::Json).unwrap();
    assert_eq!(written, path);

    let reloaded = sink::read_records(&path).unwrap();
    assert_eq!(reloaded, original);

    let keys: Vec<&String> = reloaded[0].keys().collect();
    assert_eq!(keys, ["product_id", "name", "price", "tags"]);
}

#[test]
fn test_json_is_pretty_printed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("review_data.json");

    sink::write_records(&records(json!([{"id": 1}])), &path, FileFormat::Json).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[\n"));
    assert!(text.contains("  {"));
}

#[test]
fn test_csv_header_is_union_of_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/dir/financial_data.csv");

    let rows = records(json!([
        {"user_id": 1, "income": 5200},
        {"user_id": 2, "rent": 1400},
        {"user_id": 3, "income": 4100, "bills": 230.5}
    ]));

    sink::write_records(&rows, &path, FileFormat::Csv).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("user_id,income,rent,bills"));
    assert_eq!(lines.next(), Some("1,5200,,"));
    assert_eq!(lines.next(), Some("2,,1400,"));
    assert_eq!(lines.next(), Some("3,4100,,230.5"));
}

#[test]
fn test_csv_reload_infers_types() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("financial_data.csv");
    std::fs::write(&path, "user_id,income,currency,verified\n1,5200.5,USD,true\n2,,EUR,false\n").unwrap();

    let table = sink::read_table(&path, FileFormat::Csv).unwrap();

    assert_eq!(table.shape(), (2, 4));
    assert_eq!(table.columns(), &["user_id", "income", "currency", "verified"]);
    assert_eq!(table.value(0, "income"), &json!(5200.5));
    assert_eq!(table.value(1, "income"), &Value::Null);
    assert_eq!(table.value(1, "currency"), &json!("EUR"));
    assert_eq!(table.value(0, "verified"), &json!(true));
}

#[test]
fn test_table_csv_round_trip_keeps_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.csv");

    let table = Table::from_records(records(json!([
        {"a": 1, "b": "x"},
        {"a": 2, "c": [1, 2]}
    ])));

    sink::write_table(&table, &path, FileFormat::Csv).unwrap();
    let reloaded = sink::read_table(&path, FileFormat::Csv).unwrap();

    assert_eq!(reloaded.shape(), table.shape());
    assert_eq!(reloaded.columns(), table.columns());
    assert_eq!(reloaded.value(1, "c"), &json!("[1,2]"));
}

#[test]
fn test_read_json_table_rejects_object_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"records": []}"#).unwrap();

    let err = sink::read_table(&path, FileFormat::Json).unwrap_err();
    assert!(matches!(err, CommonError::InvalidShape(_)));

    // The raw document is still readable
    assert_eq!(sink::read_json(&path).unwrap(), json!({"records": []}));
}

#[test]
fn test_empty_records_write_empty_outputs() {
    let dir = TempDir::new().unwrap();

    let json_path = dir.path().join("empty.json");
    sink::write_records(&[], &json_path, FileFormat::Json).unwrap();
    assert_eq!(sink::read_records(&json_path).unwrap(), Vec::<Record>::new());

    let csv_path = dir.path().join("empty.csv");
    sink::write_records(&[], &csv_path, FileFormat::Csv).unwrap();
    let table = sink::read_table(&csv_path, FileFormat::Csv).unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_csv_rejects_records_without_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw/financial_data.csv");

    let rows = vec![Record::new(), Record::new(), Record::new()];
    let err = sink::write_records(&rows, &path, FileFormat::Csv).unwrap_err();

    assert!(matches!(err, CommonError::InvalidShape(ref msg) if msg.contains("3 records")));
    assert!(!path.exists());

    // The JSON layout keeps them
    let json_path = dir.path().join("raw/review_data.json");
    sink::write_records(&rows, &json_path, FileFormat::Json).unwrap();
    assert_eq!(sink::read_records(&json_path).unwrap().len(), 3);
}

#[test]
fn test_csv_single_column_keeps_blank_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ids.csv");

    let rows = records(json!([{"id": 1}, {}, {"id": 3}]));
    sink::write_records(&rows, &path, FileFormat::Csv).unwrap();
    let table = sink::read_table(&path, FileFormat::Csv).unwrap();

    assert_eq!(table.shape(), (3, 1));
    assert_eq!(table.value(1, "id"), &Value::Null);
}
