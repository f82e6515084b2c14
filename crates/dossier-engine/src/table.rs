//! Tabular results produced by provider parse routines
//!
//! A [`Table`] is an ordered set of named columns plus rows of JSON cells.
//! Absence of data is never encoded inside a table: steps hand out a
//! [`TableResult`], and only the report serializer turns `NotFound` into the
//! [`NO_DATA_SENTINEL`] string.

use serde::{ser::SerializeSeq, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Reserved marker emitted in reports in place of a missing table.
pub const NO_DATA_SENTINEL: &str = "NO_DATA_FOUND";

/// Open-ended per-method configuration (sort priorities, limits, thresholds)
pub type MethodOptions = Map<String, Value>;

/// Row-and-column result of one parse routine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from an array of JSON objects.
    ///
    /// Columns are ordered by first appearance across all records; missing
    /// cells are filled with `null`. Non-object records are ignored.
    pub fn from_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Table::new(columns);
        for record in records {
            if let Value::Object(map) = record {
                let row = table
                    .columns
                    .iter()
                    .map(|c| map.get(c).cloned().unwrap_or(Value::Null))
                    .collect();
                table.rows.push(row);
            }
        }
        table
    }

    /// Append a row, padding with `null` or truncating to the column count
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// String view of a scalar cell. Null, empty strings and nested values yield `None`.
    pub fn cell_text(&self, row: usize, column: &str) -> Option<String> {
        self.cell(row, column).and_then(value_text)
    }

    /// All values of one column in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Split rows by the distinct values of `column`, in order of first appearance.
    ///
    /// Rows whose key is null or missing land in a partition keyed `""`.
    /// Returns `None` when the column does not exist.
    pub fn partition_by(&self, column: &str) -> Option<Vec<(String, Table)>> {
        let col = self.column_index(column)?;
        let mut partitions: Vec<(String, Table)> = Vec::new();

        for row in &self.rows {
            let key = value_text(&row[col]).unwrap_or_default();
            match partitions.iter_mut().find(|(k, _)| *k == key) {
                Some((_, table)) => table.rows.push(row.clone()),
                None => {
                    let mut table = Table::new(self.columns.clone());
                    table.rows.push(row.clone());
                    partitions.push((key, table));
                }
            }
        }

        Some(partitions)
    }

    /// Add columns at the end, filling existing rows with `null`.
    ///
    /// Names already present are skipped.
    pub fn append_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if self.column_index(&column).is_none() {
                self.columns.push(column);
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, Value::Null);
        }
    }

    /// Rows as JSON objects, keys in column order
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut map = Map::new();
                for (column, value) in self.columns.iter().zip(row) {
                    map.insert(column.clone(), value.clone());
                }
                Value::Object(map)
            })
            .collect()
    }

    /// Apply the option keys every parse routine understands.
    ///
    /// - `sort`: list of priorities, each `"column"` or
    ///   `{"column": "...", "descending": bool}`; the first entry is the
    ///   primary key. The sort is stable.
    /// - `limit`: keep at most N rows after sorting.
    /// - `columns`: project to the listed columns, in the listed order.
    ///   Unknown names are skipped.
    ///
    /// Other keys are left for the specific parse routine.
    pub fn apply_options(mut self, options: &MethodOptions) -> Table {
        if let Some(Value::Array(priorities)) = options.get("sort") {
            let keys: Vec<(usize, bool)> = priorities
                .iter()
                .filter_map(sort_key)
                .filter_map(|(column, desc)| self.column_index(&column).map(|i| (i, desc)))
                .collect();

            if !keys.is_empty() {
                self.rows.sort_by(|a, b| {
                    for &(col, desc) in &keys {
                        let ord = compare_values(&a[col], &b[col]);
                        let ord = if desc { ord.reverse() } else { ord };
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    Ordering::Equal
                });
            }
        }

        if let Some(limit) = options.get("limit").and_then(Value::as_u64) {
            self.rows.truncate(limit as usize);
        }

        if let Some(Value::Array(wanted)) = options.get("columns") {
            let picks: Vec<(String, usize)> = wanted
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|c| self.column_index(c).map(|i| (c.to_string(), i)))
                .collect();
            if !picks.is_empty() {
                self.rows = self
                    .rows
                    .iter()
                    .map(|r| picks.iter().map(|(_, i)| r[*i].clone()).collect())
                    .collect();
                self.columns = picks.into_iter().map(|(c, _)| c).collect();
            }
        }

        self
    }
}

fn sort_key(priority: &Value) -> Option<(String, bool)> {
    match priority {
        Value::String(column) => Some((column.clone(), false)),
        Value::Object(map) => {
            let column = map.get("column")?.as_str()?.to_string();
            let desc = map.get("descending").and_then(Value::as_bool).unwrap_or(false);
            Some((column, desc))
        }
        _ => None,
    }
}

/// String form of a scalar JSON value; `None` for null, empty strings and containers.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Total order used for sorting cells: numbers, then strings, then everything else; nulls last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Outcome of one method: a table, or the reason there is none
#[derive(Debug, Clone, PartialEq)]
pub enum TableResult {
    Found(Table),
    NotFound(String),
}

impl TableResult {
    pub fn not_found(reason: impl Into<String>) -> Self {
        TableResult::NotFound(reason.into())
    }

    /// Wrap a table, treating an empty one as `NotFound`
    pub fn from_table(table: Table) -> Self {
        if table.is_empty() {
            TableResult::NotFound("no rows".to_string())
        } else {
            TableResult::Found(table)
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TableResult::Found(_))
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            TableResult::Found(table) => Some(table),
            TableResult::NotFound(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            TableResult::Found(table) => Some(table),
            TableResult::NotFound(_) => None,
        }
    }
}

impl Serialize for TableResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TableResult::Found(table) => {
                let records = table.to_records();
                let mut seq = serializer.serialize_seq(Some(records.len()))?;
                for record in &records {
                    seq.serialize_element(record)?;
                }
                seq.end()
            }
            TableResult::NotFound(_) => serializer.serialize_str(NO_DATA_SENTINEL),
        }
    }
}
