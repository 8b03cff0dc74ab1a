//! Table-driven viewer tools: ROI ingest and the multi-view links table

use ng_core::{Error, Result};
use ng_data::Table;
use ng_state::{AnnotationItem, Vec3, ViewerState, Zoom};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::args::*;
use crate::catalog::ToolKind;
use crate::dispatcher::Dispatcher;
use crate::workspace::Workspace;

const ROI_COLUMNS: [&str; 7] = ["id", "x", "y", "z", "size_x", "size_y", "size_z"];

/// Annotation layer that marks each row's center when requested
const VIEWS_LAYER: &str = "Views";

fn cell_f64(table: &Table, row: &[Value], column: &str) -> Option<f64> {
    let idx = table.column_index(column).ok()?;
    row[idx].as_f64()
}

fn cell_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Dispatcher {
    /// Rank rows by `size_x * size_y * size_z`, keep the top N as a `rois`
    /// summary and add them as box annotations.
    pub(crate) fn data_ingest_csv_rois(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: IngestRoisArgs = parse_args(ToolKind::DataIngestCsvRois, args)?;
        let table = ws.tables.file(&args.file_id)?.table.clone();

        let missing: Vec<&str> = ROI_COLUMNS
            .iter()
            .copied()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "CSV missing columns: {}",
                missing.join(", ")
            )));
        }

        let volumes: Vec<Value> = table
            .rows()
            .iter()
            .map(|row| {
                let dims = ["size_x", "size_y", "size_z"]
                    .iter()
                    .map(|c| cell_f64(&table, row, c))
                    .collect::<Option<Vec<f64>>>();
                match dims {
                    Some(d) => json!(d[0] * d[1] * d[2]),
                    None => Value::Null,
                }
            })
            .collect();
        let ranked = table
            .with_column("vol", volumes)?
            .sort_by("vol", true)?
            .head(args.top_n());

        let mut records = Vec::with_capacity(ranked.n_rows());
        for row in ranked.rows() {
            let coords: Option<Vec<f64>> = ROI_COLUMNS[1..]
                .iter()
                .map(|c| cell_f64(&ranked, row, c))
                .collect();
            let Some(c) = coords else {
                continue;
            };
            let id = cell_label(&row[ranked.column_index("id")?]);
            let item = AnnotationItem::boxed(
                id,
                Vec3::new(c[0], c[1], c[2]),
                Vec3::new(c[3], c[4], c[5]),
            );
            records.push(item.to_record()?);
        }

        let added = records.len();
        let total = ws.viewer.add_annotations(&args.layer, records)?;
        let meta = ws.tables.add_summary(
            &args.file_id,
            "rois",
            ranked,
            Some(format!("top {} ROIs by volume", args.top_n())),
        )?;
        info!("Ingested {} ROIs into layer {}", added, args.layer);
        Ok(json!({
            "ok": true,
            "summary": meta,
            "layer": args.layer,
            "added": added,
            "total": total,
        }))
    }

    /// Build one hypothetical view per top-ranked row, collect their links,
    /// then commit the first successful view as the canonical state.
    pub(crate) fn data_ng_views_table(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: ViewsTableArgs = parse_args(ToolKind::DataNgViewsTable, args)?;
        let mut warnings: Vec<String> = Vec::new();

        let (source, source_file_id, both_warning) = ws
            .tables
            .resolve(args.file_id.as_deref(), args.summary_id.as_deref())?;
        warnings.extend(both_warning);

        if args.center_columns.len() != 3 {
            return Err(Error::validation(format!(
                "center_columns must name exactly 3 columns, got {}",
                args.center_columns.len()
            )));
        }
        for c in &args.center_columns {
            source.column_index(c)?;
        }

        let sorted = match &args.sort_by {
            Some(column) => source.sort_by(column, args.descending)?,
            None => source.clone(),
        };
        let top = sorted.head(args.top_n());

        let id_idx = match top.column_index(&args.id_column) {
            Ok(idx) => Some(idx),
            Err(_) => {
                warnings.push(format!(
                    "id column '{}' not found; using row rank as id",
                    args.id_column
                ));
                None
            }
        };
        let mut include: Vec<(String, usize)> = Vec::new();
        for c in args.include_columns.iter().flatten() {
            match top.column_index(c) {
                Ok(idx) => include.push((c.clone(), idx)),
                Err(_) => warnings.push(format!("include column '{}' not found; skipped", c)),
            }
        }
        if let Some(sort_col) = &args.sort_by {
            if args.include_columns.is_none() && *sort_col != args.id_column {
                if let Ok(idx) = top.column_index(sort_col) {
                    include.push((sort_col.clone(), idx));
                }
            }
        }
        let label_idx = args
            .link_label_column
            .as_ref()
            .and_then(|c| match top.column_index(c) {
                Ok(idx) => Some(idx),
                Err(_) => {
                    warnings.push(format!("link_label_column '{}' not found; using id", c));
                    None
                }
            });

        if let Some(lut) = &args.lut {
            if ws.viewer.layer(&lut.layer).is_none() {
                warnings.push(format!("LUT layer '{}' not found; LUT skipped", lut.layer));
            }
        }

        let mut out_columns = vec![args.id_column.clone()];
        out_columns.extend(include.iter().map(|(c, _)| c.clone()));
        out_columns.push("link".to_string());
        out_columns.push("masked_link".to_string());

        let mut out_rows: Vec<Vec<Value>> = Vec::new();
        let mut first_view: Option<(ViewerState, Value)> = None;

        for (rank, row) in top.rows().iter().enumerate() {
            let id = match id_idx {
                Some(idx) => row[idx].clone(),
                None => json!(rank + 1),
            };
            match self.hypothetical_view(&ws.viewer, &top, row, &args, &id) {
                Ok((state, link)) => {
                    let label = match label_idx {
                        Some(idx) => cell_label(&row[idx]),
                        None => cell_label(&id),
                    };
                    let masked = format!("[{}]({})", label, link);
                    let mut out = vec![id.clone()];
                    out.extend(include.iter().map(|(_, idx)| row[*idx].clone()));
                    out.push(json!(link));
                    out.push(json!(masked));
                    out_rows.push(out);
                    if first_view.is_none() {
                        first_view = Some((state, id));
                    }
                }
                Err(e) => {
                    warn!("views table row {} skipped: {}", rank + 1, e);
                    warnings.push(format!("row {} ({}): {}", rank + 1, cell_label(&id), e));
                }
            }
        }

        let Some((first_state, first_id)) = first_view else {
            let mut payload = Error::validation("No rows produced a view").to_tool_result();
            payload["warnings"] = json!(warnings);
            return Ok(payload);
        };

        let result_table = Table::new(out_columns, out_rows)?;
        let rows = result_table.records();
        let n_rows = result_table.n_rows();
        let note = match &args.sort_by {
            Some(c) => format!(
                "top {} by {} ({})",
                args.top_n(),
                c,
                if args.descending { "desc" } else { "asc" }
            ),
            None => format!("first {} rows", args.top_n()),
        };
        let meta = ws
            .tables
            .add_summary(&source_file_id, "ng_views", result_table, Some(note))?;

        ws.viewer.replace_with(first_state);
        info!("views table: {} links, committed view {}", n_rows, first_id);

        Ok(json!({
            "summary": meta,
            "n_rows": n_rows,
            "rows": rows,
            "committed_id": first_id,
            "warnings": warnings,
        }))
    }

    /// Clone the canonical state and move it to one row. Never touches the
    /// canonical state itself.
    fn hypothetical_view(
        &self,
        canonical: &ViewerState,
        table: &Table,
        row: &[Value],
        args: &ViewsTableArgs,
        id: &Value,
    ) -> Result<(ViewerState, String)> {
        let mut center = [0.0; 3];
        for (slot, column) in center.iter_mut().zip(&args.center_columns) {
            *slot = cell_f64(table, row, column).ok_or_else(|| {
                Error::validation(format!("non-numeric center value in column '{}'", column))
            })?;
        }

        let mut state = canonical.clone();
        let zoom = Zoom::Scale(state.cross_section_scale);
        state.set_view(center, zoom, None);

        if let Some(lut) = &args.lut {
            state.set_lut(&lut.layer, lut.min, lut.max);
        }
        if args.annotations {
            let item = AnnotationItem {
                id: Some(cell_label(id)),
                ..AnnotationItem::point(Vec3::from(center))
            };
            state.add_annotations(VIEWS_LAYER, vec![item.to_record()?])?;
        }

        let link = self.link(&state)?;
        Ok((state, link))
    }
}
