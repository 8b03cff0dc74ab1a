//! Typed tool arguments
//!
//! Each tool deserializes its raw JSON payload into one of these structs
//! before touching any state. Defaults mirror the catalogue schemas; numeric
//! bounds are enforced by clamping.

use ng_core::{Error, Result};
use ng_data::Filter;
use ng_state::AnnotationItem;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::ToolKind;

/// Deserialize `args` for `kind`. `null` counts as an empty object.
pub fn parse_args<T: DeserializeOwned>(kind: ToolKind, args: Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        Value::String(raw) => {
            return Err(Error::validation(format!(
                "Arguments for {} are not valid JSON: {}",
                kind,
                ng_core::text::truncate_chars(&raw, 200)
            )))
        }
        other => {
            return Err(Error::validation(format!(
                "Arguments for {} must be an object, got {}",
                kind, other
            )))
        }
    };
    serde_json::from_value(args)
        .map_err(|e| Error::validation(format!("Invalid arguments for {}: {}", kind, e)))
}

fn default_true() -> bool {
    true
}

fn default_image() -> String {
    "image".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SetViewArgs {
    pub center: ng_state::Vec3,
    #[serde(default)]
    pub zoom: Option<Value>,
    #[serde(default)]
    pub orientation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetLutArgs {
    pub layer: String,
    pub vmin: f64,
    pub vmax: f64,
}

#[derive(Debug, Deserialize)]
pub struct AddLayerArgs {
    pub name: String,
    #[serde(default = "default_image")]
    pub layer_type: String,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityArgs {
    pub name: String,
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationsAddArgs {
    pub layer: String,
    pub items: Vec<AnnotationItem>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryArgs {
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StateSaveArgs {
    #[serde(default)]
    pub mask: bool,
}

#[derive(Debug, Deserialize)]
pub struct StateLoadArgs {
    pub link: String,
}

#[derive(Debug, Deserialize)]
pub struct FileArgs {
    pub file_id: String,
}

fn default_sample_rows() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct InfoArgs {
    pub file_id: String,
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl InfoArgs {
    pub fn sample_rows(&self) -> usize {
        self.sample_rows.clamp(1, 20)
    }
}

fn default_preview_n() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct PreviewArgs {
    pub file_id: String,
    #[serde(default = "default_preview_n")]
    pub n: usize,
}

impl PreviewArgs {
    pub fn n(&self) -> usize {
        self.n.clamp(1, 100)
    }
}

fn default_select_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct SelectArgs {
    pub file_id: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
    #[serde(default = "default_select_limit")]
    pub limit: usize,
}

impl SelectArgs {
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, 500)
    }
}

fn default_sample_n() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct SampleArgs {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub summary_id: Option<String>,
    #[serde(default = "default_sample_n")]
    pub n: usize,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub replace: bool,
}

fn default_bins() -> usize {
    256
}

#[derive(Debug, Deserialize)]
pub struct HistogramArgs {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub summary_id: Option<String>,
    pub column: String,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

impl HistogramArgs {
    pub fn bins(&self) -> usize {
        self.bins.clamp(1, 1024)
    }
}

fn default_top_rois() -> usize {
    20
}

fn default_roi_layer() -> String {
    "ROIs".to_string()
}

#[derive(Debug, Deserialize)]
pub struct IngestRoisArgs {
    pub file_id: String,
    #[serde(default = "default_top_rois")]
    pub top_n: usize,
    #[serde(default = "default_roi_layer")]
    pub layer: String,
}

impl IngestRoisArgs {
    pub fn top_n(&self) -> usize {
        self.top_n.max(1)
    }
}

/// LUT applied to every hypothetical view of a views table
#[derive(Debug, Clone, Deserialize)]
pub struct LutSpec {
    pub layer: String,
    pub min: f64,
    pub max: f64,
}

fn default_views_top_n() -> usize {
    5
}

fn default_id_column() -> String {
    "cell_id".to_string()
}

fn default_center_columns() -> Vec<String> {
    vec!["x".to_string(), "y".to_string(), "z".to_string()]
}

#[derive(Debug, Deserialize)]
pub struct ViewsTableArgs {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub summary_id: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default = "default_true")]
    pub descending: bool,
    #[serde(default = "default_views_top_n")]
    pub top_n: usize,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_center_columns")]
    pub center_columns: Vec<String>,
    #[serde(default)]
    pub include_columns: Option<Vec<String>>,
    #[serde(default)]
    pub lut: Option<LutSpec>,
    #[serde(default)]
    pub annotations: bool,
    #[serde(default)]
    pub link_label_column: Option<String>,
}

impl ViewsTableArgs {
    pub fn top_n(&self) -> usize {
        self.top_n.clamp(1, 50)
    }
}
