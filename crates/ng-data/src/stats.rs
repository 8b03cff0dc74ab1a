//! Column statistics: describe and histogram

use ng_core::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::table::{as_f64, Table};

/// Per numeric column: count, null_count, mean, std (sample), min, max.
///
/// Returns a table with one row per numeric column.
pub fn describe(table: &Table) -> Result<Table> {
    let columns: Vec<String> = ["column", "count", "null_count", "mean", "std", "min", "max"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut rows = Vec::new();

    for (idx, name) in table.columns().iter().enumerate() {
        if !table.dtype(idx).is_numeric() {
            continue;
        }
        let cells: Vec<&Value> = table.rows().iter().map(|r| &r[idx]).collect();
        let values: Vec<f64> = cells.iter().filter_map(|v| as_f64(v)).collect();
        let null_count = cells.len() - values.len();
        let count = values.len();

        let (mean, std, min, max) = if count == 0 {
            (Value::Null, Value::Null, Value::Null, Value::Null)
        } else {
            let mean = values.iter().sum::<f64>() / count as f64;
            let std = if count > 1 {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count - 1) as f64;
                json!(var.sqrt())
            } else {
                Value::Null
            };
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (json!(mean), std, json!(min), json!(max))
        };

        rows.push(vec![
            json!(name),
            json!(count),
            json!(null_count),
            mean,
            std,
            min,
            max,
        ]);
    }

    if rows.is_empty() {
        return Err(Error::validation("No numeric columns to describe"));
    }
    Table::new(columns, rows)
}

/// Equal-width histogram over `[min, max]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub hist: Vec<u64>,
    /// `bins + 1` edges
    pub edges: Vec<f64>,
}

/// Bin `values` into `bins` equal-width buckets. The last bucket is closed on
/// the right so the maximum is counted. A constant column is spread over
/// `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(Error::validation("bins must be at least 1"));
    }
    let finite: Vec<f64> = values.iter().cloned().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(Error::validation("Column has no numeric values"));
    }
    let mut lo = finite.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    // Split before subtracting: `hi - lo` overflows for values near ±f64::MAX
    let n = bins as f64;
    let width = hi / n - lo / n;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| {
            let t = i as f64 / n;
            lo * (1.0 - t) + hi * t
        })
        .collect();

    let mut hist = vec![0u64; bins];
    for v in finite {
        let offset = v - lo;
        let position = if offset.is_finite() {
            offset / width
        } else {
            v / width - lo / width
        };
        let mut bucket = position as usize;
        if bucket >= bins {
            bucket = bins - 1;
        }
        hist[bucket] += 1;
    }
    Ok(Histogram { hist, edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_numeric_columns() {
        let t = Table::from_csv_bytes(b"id,name,v\n1,a,2\n2,b,4\n3,c,\n").unwrap();
        let d = describe(&t).unwrap();
        assert_eq!(d.n_rows(), 2);
        let v_row = d.records()[1].clone();
        assert_eq!(v_row["column"], "v");
        assert_eq!(v_row["count"], 2);
        assert_eq!(v_row["null_count"], 1);
        assert_eq!(v_row["mean"], 3.0);
        assert_eq!(v_row["min"], 2.0);
        assert_eq!(v_row["max"], 4.0);
    }

    #[test]
    fn test_describe_without_numeric_columns() {
        let t = Table::from_csv_bytes(b"name\na\nb\n").unwrap();
        assert!(describe(&t).is_err());
    }

    #[test]
    fn test_histogram_edges_and_counts() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.edges.len(), 5);
        assert_eq!(h.hist.iter().sum::<u64>(), 5);
        assert_eq!(h.hist[3], 2);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = histogram(&[7.0, 7.0], 2).unwrap();
        assert_eq!(h.edges, vec![6.5, 7.0, 7.5]);
        assert_eq!(h.hist, vec![0, 2]);
    }

    #[test]
    fn test_histogram_extreme_range_stays_finite() {
        let h = histogram(&[-f64::MAX, 0.0, f64::MAX], 4).unwrap();
        assert!(h.edges.iter().all(|e| e.is_finite()), "{:?}", h.edges);
        assert!(h.edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(h.edges[0], -f64::MAX);
        assert_eq!(h.edges[4], f64::MAX);
        assert_eq!(h.hist, vec![1, 0, 1, 1]);

        let json = serde_json::to_string(&h).unwrap();
        assert!(!json.contains("null"));
    }
}
