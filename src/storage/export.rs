//! Tabular export of harvested records
//!
//! Records are untyped JSON documents. They are flattened into dotted paths
//! (`employer.logo_urls.90`) and written as CSV rows in template column order.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::templates::ColumnTemplate;
use super::{StorageError, StorageResult};
use crate::utils::sanitize_filename;

/// Flatten a record into `dotted.path -> text`.
///
/// Nulls and arrays are skipped, nested objects are walked, and scalars are
/// rendered as text (strings without quotes).
pub fn flatten_record(record: &Value) -> HashMap<String, String> {
    let mut flat = HashMap::new();
    if let Value::Object(map) = record {
        flatten_into(map, "", &mut flat);
    }
    flat
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, flat: &mut HashMap<String, String>) {
    for (key, value) in map {
        let path = format!("{prefix}{key}");
        match value {
            Value::Null | Value::Array(_) => {}
            Value::Object(inner) => flatten_into(inner, &format!("{path}."), flat),
            Value::String(s) => {
                flat.insert(path, s.clone());
            }
            Value::Bool(b) => {
                flat.insert(path, b.to_string());
            }
            Value::Number(n) => {
                flat.insert(path, n.to_string());
            }
        }
    }
}

/// Writes export files under one output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Exporter for a subdirectory of this one
    pub fn child(&self, name: &str) -> Self {
        Self::new(self.dir.join(name))
    }

    fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))
    }

    /// Write `records` as `<name>.csv` with the template's columns as header
    pub fn export_tabular(
        &self,
        template: &ColumnTemplate,
        records: &[Value],
        name: &str,
    ) -> StorageResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(format!("{}.csv", sanitize_filename(name)));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(template.paths())?;

        for record in records {
            let mut flat = flatten_record(record);
            let row: Vec<String> = template
                .paths()
                .map(|path| flat.remove(path).unwrap_or_default())
                .collect();
            writer.write_record(&row)?;
        }

        writer.flush().map_err(|e| StorageError::io(&path, e))?;

        tracing::debug!(
            path = %path.display(),
            template = template.name,
            rows = records.len(),
            "Exported records"
        );

        Ok(path)
    }

    /// Write `<template>.columns.csv`, one `column,description` row per
    /// template column
    pub fn write_column_notes(&self, template: &ColumnTemplate) -> StorageResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(format!("{}.columns.csv", template.name));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["column", "description"])?;
        for column in template.columns {
            writer.write_record([column.path, column.description])?;
        }
        writer.flush().map_err(|e| StorageError::io(&path, e))?;

        Ok(path)
    }

    /// Write a text file such as a scraped page
    pub fn write_text(&self, file_name: &str, contents: &str) -> StorageResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(sanitize_filename(file_name));
        fs::write(&path, contents).map_err(|e| StorageError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::templates::Column;
    use serde_json::json;
    use tempfile::TempDir;

    const TEST_COLUMNS: &[Column] = &[
        Column {
            path: "id",
            description: "Record id",
        },
        Column {
            path: "area.name",
            description: "Region, \"as named\"",
        },
        Column {
            path: "name",
            description: "Display name",
        },
    ];

    #[test]
    fn test_flatten_record() {
        let flat = flatten_record(&json!({
            "id": "42",
            "premium": false,
            "salary": {"from": 1000, "to": null, "currency": "RUR"},
            "employer": {"logo_urls": {"90": "https://img/90.png"}},
            "professional_roles": [{"id": "96"}],
            "department": null
        }));

        assert_eq!(flat["id"], "42");
        assert_eq!(flat["premium"], "false");
        assert_eq!(flat["salary.from"], "1000");
        assert_eq!(flat["salary.currency"], "RUR");
        assert_eq!(flat["employer.logo_urls.90"], "https://img/90.png");
        assert!(!flat.contains_key("salary.to"));
        assert!(!flat.contains_key("department"));
        assert!(!flat.keys().any(|k| k.starts_with("professional_roles")));
    }

    #[test]
    fn test_flatten_non_object() {
        assert!(flatten_record(&json!([1, 2])).is_empty());
        assert!(flatten_record(&Value::Null).is_empty());
    }

    #[test]
    fn test_export_tabular_uses_template_order() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path()).child("employers");
        let template = ColumnTemplate {
            name: "test",
            columns: TEST_COLUMNS,
        };

        let records = vec![
            json!({"id": "1", "name": "Acme", "area": {"name": "Moscow"}, "extra": "dropped"}),
            json!({"id": "2", "name": "Globex"}),
        ];
        let path = exporter
            .export_tabular(&template, &records, "10.0.0.1_8000_0_0")
            .unwrap();

        assert!(path.ends_with("employers/10.0.0.1_8000_0_0.csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["id,area.name,name", "1,Moscow,Acme", "2,,Globex"]);
    }

    #[test]
    fn test_column_notes_follow_template_order() {
        let dir = TempDir::new().unwrap();
        let template = ColumnTemplate {
            name: "test",
            columns: TEST_COLUMNS,
        };
        let path = Exporter::new(dir.path())
            .write_column_notes(&template)
            .unwrap();

        assert!(path.ends_with("test.columns.csv"));
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<(String, String)> = reader
            .deserialize()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ("id".to_string(), "Record id".to_string()));
        assert_eq!(rows[1].1, "Region, \"as named\"");
    }

    #[test]
    fn test_write_text_sanitizes_name() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let path = exporter.write_text("a:b.txt", "hello").unwrap();
        assert!(path.ends_with("a_b.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
