//! JSON workbook storage.
//!
//! A workbook file is a JSON document holding an ordered list of sheets,
//! each a named column/row grid:
//!
//! ```json
//! {
//!   "sheets": [
//!     {
//!       "name": "Accounts",
//!       "columns": ["Name", "ARR"],
//!       "rows": [["Acme", 120000], ["Globex", 95000]]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Workbook {
    /// Look up a sheet by name, or the first sheet when no name is given.
    pub fn sheet(&self, name: Option<&str>) -> Result<&Sheet> {
        match name {
            Some(name) => self
                .sheets
                .iter()
                .find(|s| s.name == name)
                .ok_or_else(|| Error::SheetNotFound(name.to_string())),
            None => self.sheets.first().ok_or(Error::NoSheets),
        }
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }
}

impl Sheet {
    /// All rows as `{column: value}` records.
    pub fn records(&self) -> Vec<Value> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    /// Rows `start..=end` (0-based, inclusive) as records, clamped to the
    /// sheet's bounds.
    pub fn records_in_range(&self, start: usize, end: usize) -> Vec<Value> {
        let upper = end.saturating_add(1).min(self.rows.len());
        if start >= upper {
            return Vec::new();
        }
        self.rows[start..upper]
            .iter()
            .map(|row| self.record(row))
            .collect()
    }

    fn record(&self, row: &[Value]) -> Value {
        let mut map = Map::new();
        for (i, column) in self.columns.iter().enumerate() {
            map.insert(
                column.clone(),
                row.get(i).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(map)
    }

    /// Overwrite one cell (0-based row and column indices).
    pub fn write_cell(&mut self, row: usize, col: usize, value: Value) -> Result<()> {
        if col >= self.columns.len() {
            return Err(Error::ColumnOutOfRange(col));
        }
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(Error::RowOutOfRange(row))?;
        if cells.len() < col + 1 {
            cells.resize(col + 1, Value::Null);
        }
        cells[col] = value;
        Ok(())
    }

    /// Append a `{column: value}` record as a new row. Missing columns get
    /// null; keys matching no column are rejected.
    pub fn append_record(&mut self, record: Map<String, Value>) -> Result<()> {
        for key in record.keys() {
            if !self.columns.iter().any(|c| c == key) {
                return Err(Error::UnknownColumn(key.clone()));
            }
        }
        let row = self
            .columns
            .iter()
            .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
        Ok(())
    }
}

/// Directory of workbook files.
pub struct WorkbookStore {
    dir: PathBuf,
}

impl WorkbookStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Names of the workbook files in the store, sorted.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, file_name: &str) -> Result<Workbook> {
        let path = self.resolve(file_name)?;
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(Error::Malformed)
    }

    pub fn save(&self, file_name: &str, workbook: &Workbook) -> Result<()> {
        let path = self.resolve_name(file_name)?;
        let data = serde_json::to_string_pretty(workbook).map_err(Error::Malformed)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Validate that the requested file is a plain name inside the store
    /// directory and exists. Rejects traversal.
    fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.resolve_name(file_name)?;
        if !path.exists() {
            return Err(Error::FileNotFound(file_name.to_string()));
        }
        Ok(path)
    }

    fn resolve_name(&self, file_name: &str) -> Result<PathBuf> {
        let candidate = Path::new(file_name);
        let is_plain = candidate.components().count() == 1
            && !file_name.contains("..")
            && !file_name.starts_with('/');
        if !is_plain {
            return Err(Error::InvalidFileName(file_name.to_string()));
        }
        Ok(self.dir.join(candidate))
    }
}

/// A small demo workbook, used when seeding an empty store.
pub fn demo_workbook() -> Workbook {
    Workbook {
        sheets: vec![Sheet {
            name: "Accounts".to_string(),
            columns: vec![
                "Name".to_string(),
                "Owner".to_string(),
                "ARR".to_string(),
            ],
            rows: vec![
                vec![json!("Acme Corp"), json!("dana"), json!(120000)],
                vec![json!("Globex"), json!("lee"), json!(95000)],
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workbook {
        demo_workbook()
    }

    #[test]
    fn first_sheet_is_default() {
        let wb = sample();
        assert_eq!(wb.sheet(None).unwrap().name, "Accounts");
        assert!(matches!(
            wb.sheet(Some("Missing")),
            Err(Error::SheetNotFound(_))
        ));
    }

    #[test]
    fn records_pair_columns_with_values() {
        let wb = sample();
        let records = wb.sheet(None).unwrap().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Name"], "Acme Corp");
        assert_eq!(records[1]["ARR"], 95000);
    }

    #[test]
    fn range_is_inclusive_and_clamped() {
        let wb = sample();
        let sheet = wb.sheet(None).unwrap();
        assert_eq!(sheet.records_in_range(0, 0).len(), 1);
        assert_eq!(sheet.records_in_range(0, 1).len(), 2);
        assert_eq!(sheet.records_in_range(1, 99).len(), 1);
        assert!(sheet.records_in_range(5, 9).is_empty());
    }

    #[test]
    fn write_cell_bounds() {
        let mut wb = sample();
        let sheet = wb.sheet_mut("Accounts").unwrap();
        sheet.write_cell(0, 2, json!(130000)).unwrap();
        assert_eq!(sheet.rows[0][2], 130000);
        assert!(matches!(
            sheet.write_cell(9, 0, json!("x")),
            Err(Error::RowOutOfRange(9))
        ));
        assert!(matches!(
            sheet.write_cell(0, 9, json!("x")),
            Err(Error::ColumnOutOfRange(9))
        ));
    }

    #[test]
    fn append_record_aligns_columns() {
        let mut wb = sample();
        let sheet = wb.sheet_mut("Accounts").unwrap();

        let mut record = Map::new();
        record.insert("Name".to_string(), json!("Initech"));
        record.insert("ARR".to_string(), json!(40000));
        sheet.append_record(record).unwrap();

        let last = sheet.rows.last().unwrap();
        assert_eq!(last[0], "Initech");
        assert_eq!(last[1], Value::Null);
        assert_eq!(last[2], 40000);

        let mut bad = Map::new();
        bad.insert("Nope".to_string(), json!(1));
        assert!(matches!(
            sheet.append_record(bad),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn store_rejects_traversal() {
        let store = WorkbookStore::new("/tmp/does-not-matter");
        assert!(matches!(
            store.load("../etc/passwd"),
            Err(Error::InvalidFileName(_))
        ));
        assert!(matches!(
            store.load("a/b.json"),
            Err(Error::InvalidFileName(_))
        ));
    }
}
