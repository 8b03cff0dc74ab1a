//! Row-major table with per-column type inference

use ng_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int,
    Float,
    Bool,
    Str,
    /// Every cell empty
    Null,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Int => "int",
            DType::Float => "float",
            DType::Bool => "bool",
            DType::Str => "str",
            DType::Null => "null",
        };
        write!(f, "{}", s)
    }
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }
}

/// Comparison operator of a row filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

/// `{column, op, value}` row predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match trimmed {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn cell_dtype(v: &Value) -> DType {
    match v {
        Value::Null => DType::Null,
        Value::Bool(_) => DType::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => DType::Int,
        Value::Number(_) => DType::Float,
        _ => DType::Str,
    }
}

fn merge_dtype(a: DType, b: DType) -> DType {
    match (a, b) {
        (DType::Null, x) | (x, DType::Null) => x,
        (x, y) if x == y => x,
        (DType::Int, DType::Float) | (DType::Float, DType::Int) => DType::Float,
        _ => DType::Str,
    }
}

/// Numeric view of a cell
pub(crate) fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Total order used for sorting and filter comparisons.
/// Numbers compare numerically, everything else by text; nulls sort last.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => display_value(a).cmp(&display_value(b)),
        },
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FilterOp {
    fn matches(self, cell: &Value, target: &Value) -> bool {
        if cell.is_null() || target.is_null() {
            let both = cell.is_null() && target.is_null();
            return match self {
                FilterOp::Eq => both,
                FilterOp::Ne => !both,
                _ => false,
            };
        }
        let ord = compare_values(cell, target);
        match self {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Ne => ord != Ordering::Equal,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Ge => ord != Ordering::Less,
            FilterOp::Le => ord != Ordering::Greater,
        }
    }
}

impl Table {
    /// Build a table; every row must have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(Error::validation(format!(
                "Row {} has {} cells, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse delimited text with a header row.
    ///
    /// Cells are inferred per column: a column holding any non-numeric text
    /// keeps all of its cells as strings.
    pub fn from_csv_bytes(raw: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(raw);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| Error::validation(format!("Failed to parse CSV: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(Error::validation("Failed to parse CSV: missing header row"));
        }

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| Error::validation(format!("Failed to parse CSV: {}", e)))?;
            raw_rows.push(record.iter().map(str::to_string).collect());
        }

        let mut rows: Vec<Vec<Value>> = raw_rows
            .iter()
            .map(|r| r.iter().map(|c| infer_cell(c)).collect())
            .collect();

        // Mixed columns fall back to text
        for col in 0..columns.len() {
            let dtype = rows
                .iter()
                .fold(DType::Null, |acc, r| merge_dtype(acc, cell_dtype(&r[col])));
            if dtype == DType::Str {
                for (row, raw_row) in rows.iter_mut().zip(&raw_rows) {
                    if !row[col].is_null() {
                        row[col] = Value::String(raw_row[col].clone());
                    }
                }
            }
        }

        debug!("Parsed CSV: {} rows x {} cols", rows.len(), columns.len());
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Unknown column '{}'. Available: {}",
                    name,
                    self.columns.join(", ")
                ))
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn dtype(&self, col: usize) -> DType {
        self.rows
            .iter()
            .fold(DType::Null, |acc, r| merge_dtype(acc, cell_dtype(&r[col])))
    }

    /// `{column: dtype}` for every column
    pub fn dtypes(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), Value::String(self.dtype(i).to_string())))
            .collect()
    }

    /// Cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    pub fn row_record(&self, row: &[Value]) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect();
        Value::Object(map)
    }

    /// Rows as `{column: value}` objects
    pub fn records(&self) -> Vec<Value> {
        self.rows.iter().map(|r| self.row_record(r)).collect()
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Rows picked by index, in the given order (duplicates allowed)
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    pub fn project(&self, columns: &[String]) -> Result<Table> {
        let idx: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<_>>()?;
        Ok(Table {
            columns: columns.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Keep rows matching every filter
    pub fn filter(&self, filters: &[Filter]) -> Result<Table> {
        let resolved: Vec<(usize, &Filter)> = filters
            .iter()
            .map(|f| -> Result<(usize, &Filter)> { Ok((self.column_index(&f.column)?, f)) })
            .collect::<Result<_>>()?;
        Ok(Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| resolved.iter().all(|(i, f)| f.op.matches(&r[*i], &f.value)))
                .cloned()
                .collect(),
        })
    }

    /// Stable sort: rows with equal keys keep their relative order in both
    /// directions. Nulls go last either way.
    pub fn sort_by(&self, column: &str, descending: bool) -> Result<Table> {
        let col = self.column_index(column)?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let (x, y) = (&a[col], &b[col]);
            match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ if descending => compare_values(y, x),
                _ => compare_values(x, y),
            }
        });
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Numeric cells of a column, nulls skipped
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>> {
        let col = self.column_index(column)?;
        if !self.dtype(col).is_numeric() && self.dtype(col) != DType::Null {
            return Err(Error::validation(format!(
                "Column '{}' is not numeric ({})",
                column,
                self.dtype(col)
            )));
        }
        Ok(self.rows.iter().filter_map(|r| as_f64(&r[col])).collect())
    }

    /// Append a computed column
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(Error::internal("Column length does not match row count"));
        }
        self.columns.push(name.into());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &[u8] = b"id,name,score,flag\n1,a,2.5,true\n2,b,,false\n3,c,10,true\n4,d,2.5,\n";

    #[test]
    fn test_type_inference() {
        let t = Table::from_csv_bytes(CSV).unwrap();
        assert_eq!(t.n_rows(), 4);
        assert_eq!(t.dtype(0), DType::Int);
        assert_eq!(t.dtype(1), DType::Str);
        assert_eq!(t.dtype(2), DType::Float);
        assert_eq!(t.dtype(3), DType::Bool);
        assert_eq!(t.cell(1, "score"), Some(&Value::Null));
    }

    #[test]
    fn test_mixed_column_becomes_text() {
        let t = Table::from_csv_bytes(b"k\n1\nx\n007\n").unwrap();
        assert_eq!(t.dtype(0), DType::Str);
        assert_eq!(t.cell(2, "k"), Some(&json!("007")));
    }

    #[test]
    fn test_ragged_csv_is_rejected() {
        let err = Table::from_csv_bytes(b"a,b\n1,2\n3\n").unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_filter_ops() {
        let t = Table::from_csv_bytes(CSV).unwrap();
        let gt = t
            .filter(&[Filter {
                column: "id".into(),
                op: FilterOp::Gt,
                value: json!(2),
            }])
            .unwrap();
        assert_eq!(gt.n_rows(), 2);
        let named = t
            .filter(&[Filter {
                column: "name".into(),
                op: FilterOp::Eq,
                value: json!("c"),
            }])
            .unwrap();
        assert_eq!(named.cell(0, "id"), Some(&json!(3)));
        assert!(t
            .filter(&[Filter {
                column: "nope".into(),
                op: FilterOp::Eq,
                value: json!(1),
            }])
            .is_err());
    }

    #[test]
    fn test_stable_sort_keeps_tie_order() {
        let t = Table::from_csv_bytes(CSV).unwrap();
        let desc = t.sort_by("score", true).unwrap();
        let ids: Vec<_> = desc.rows().iter().map(|r| r[0].clone()).collect();
        // 10, then the two 2.5 rows in original order, null last
        assert_eq!(ids, vec![json!(3), json!(1), json!(4), json!(2)]);
        let asc = t.sort_by("score", false).unwrap();
        let ids: Vec<_> = asc.rows().iter().map(|r| r[0].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(4), json!(3), json!(2)]);
    }

    #[test]
    fn test_project_and_records() {
        let t = Table::from_csv_bytes(CSV).unwrap();
        let p = t.project(&["name".to_string(), "id".to_string()]).unwrap();
        assert_eq!(p.columns(), &["name".to_string(), "id".to_string()]);
        assert_eq!(p.records()[0], json!({"name": "a", "id": 1}));
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let t = Table::from_csv_bytes(CSV).unwrap();
        assert_eq!(t.numeric_column("score").unwrap(), vec![2.5, 10.0, 2.5]);
        assert!(t.numeric_column("name").is_err());
    }
}
