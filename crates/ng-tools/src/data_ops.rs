//! Data tools over the session's table store

use ng_core::Result;
use ng_data::{describe, histogram, sample_rows};
use serde_json::{json, Value};
use tracing::debug;

use crate::args::*;
use crate::catalog::ToolKind;
use crate::dispatcher::Dispatcher;
use crate::workspace::Workspace;

impl Dispatcher {
    pub(crate) fn data_list_files(&self, ws: &mut Workspace) -> Result<Value> {
        Ok(json!({"files": ws.tables.list_files()}))
    }

    pub(crate) fn data_list_summaries(&self, ws: &mut Workspace) -> Result<Value> {
        Ok(json!({"summaries": ws.tables.list_summaries()}))
    }

    pub(crate) fn data_info(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: InfoArgs = parse_args(ToolKind::DataInfo, args)?;
        let file = ws.tables.file(&args.file_id)?;
        let table = &file.table;
        Ok(json!({
            "file_id": file.file_id,
            "name": file.name,
            "n_rows": table.n_rows(),
            "n_cols": table.n_cols(),
            "columns": table.columns(),
            "dtypes": table.dtypes(),
            "head": table.head(args.sample_rows()).records(),
        }))
    }

    pub(crate) fn data_preview(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: PreviewArgs = parse_args(ToolKind::DataPreview, args)?;
        let file = ws.tables.file(&args.file_id)?;
        Ok(json!({
            "file_id": file.file_id,
            "rows": file.table.head(args.n()).records(),
        }))
    }

    pub(crate) fn data_describe(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: FileArgs = parse_args(ToolKind::DataDescribe, args)?;
        let stats = describe(&ws.tables.file(&args.file_id)?.table)?;
        let rows = stats.records();
        let meta = ws.tables.add_summary(
            &args.file_id,
            "describe",
            stats,
            Some("numeric column statistics".to_string()),
        )?;
        Ok(json!({"summary": meta, "rows": rows}))
    }

    pub(crate) fn data_select(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: SelectArgs = parse_args(ToolKind::DataSelect, args)?;
        let source = &ws.tables.file(&args.file_id)?.table;

        // Filter and sort on the full table so columns outside the projection
        // can still be used as predicates.
        let mut table = source.filter(&args.filters)?;
        if let Some(column) = &args.sort_by {
            table = table.sort_by(column, args.descending)?;
        }
        let table = table.head(args.limit());
        let table = match &args.columns {
            Some(columns) if !columns.is_empty() => table.project(columns)?,
            _ => table,
        };
        debug!("data_select produced {} rows", table.n_rows());

        let preview_rows = table.records();
        let n_rows = table.n_rows();
        let note = format!(
            "{} filter(s){}",
            args.filters.len(),
            args.sort_by
                .as_ref()
                .map(|c| format!(", sorted by {}", c))
                .unwrap_or_default()
        );
        let meta = ws
            .tables
            .add_summary(&args.file_id, "select", table, Some(note))?;
        Ok(json!({
            "summary": meta,
            "n_rows": n_rows,
            "preview_rows": preview_rows,
        }))
    }

    pub(crate) fn data_sample(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: SampleArgs = parse_args(ToolKind::DataSample, args)?;
        let (table, source_file_id, warning) = ws
            .tables
            .resolve(args.file_id.as_deref(), args.summary_id.as_deref())?;
        let seed = args.seed.map(|s| s as u64);
        let sample = sample_rows(table, args.n, seed, args.replace);
        let mut result = json!({
            "source_file_id": source_file_id,
            "summary_id": args.summary_id,
            "requested": args.n,
            "returned": sample.n_rows(),
            "replace": args.replace,
            "seed": args.seed,
            "rows": sample.records(),
        });
        if let Some(w) = warning {
            result["warning"] = json!(w);
        }
        Ok(result)
    }

    pub(crate) fn data_plot_histogram(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: HistogramArgs = parse_args(ToolKind::DataPlotHistogram, args)?;
        let (table, _, warning) = ws
            .tables
            .resolve(args.file_id.as_deref(), args.summary_id.as_deref())?;
        let values = table.numeric_column(&args.column)?;
        let hist = histogram(&values, args.bins())?;
        let mut result = json!({
            "column": args.column,
            "bins": args.bins(),
            "n": values.len(),
            "hist": hist.hist,
            "edges": hist.edges,
        });
        if let Some(w) = warning {
            result["warning"] = json!(w);
        }
        Ok(result)
    }
}
