//! Tool catalogue
//!
//! Every callable operation is a [`ToolKind`] variant. Names, descriptions,
//! parameter schemas and the mutating classification are total functions
//! over the enum, so the catalogue cannot drift from the dispatcher.

use ng_llm::ToolDefinition;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use ng_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SetView,
    SetLut,
    AddLayer,
    SetLayerVisibility,
    AnnotationsAdd,
    StateSummary,
    StateLink,
    StateSave,
    StateLoad,
    DataListFiles,
    DataListSummaries,
    DataInfo,
    DataPreview,
    DataDescribe,
    DataSelect,
    DataSample,
    DataPlotHistogram,
    DataIngestCsvRois,
    DataNgViewsTable,
}

impl ToolKind {
    pub const ALL: [ToolKind; 19] = [
        ToolKind::SetView,
        ToolKind::SetLut,
        ToolKind::AddLayer,
        ToolKind::SetLayerVisibility,
        ToolKind::AnnotationsAdd,
        ToolKind::StateSummary,
        ToolKind::StateLink,
        ToolKind::StateSave,
        ToolKind::StateLoad,
        ToolKind::DataListFiles,
        ToolKind::DataListSummaries,
        ToolKind::DataInfo,
        ToolKind::DataPreview,
        ToolKind::DataDescribe,
        ToolKind::DataSelect,
        ToolKind::DataSample,
        ToolKind::DataPlotHistogram,
        ToolKind::DataIngestCsvRois,
        ToolKind::DataNgViewsTable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SetView => "ng_set_view",
            ToolKind::SetLut => "ng_set_lut",
            ToolKind::AddLayer => "ng_add_layer",
            ToolKind::SetLayerVisibility => "ng_set_layer_visibility",
            ToolKind::AnnotationsAdd => "ng_annotations_add",
            ToolKind::StateSummary => "ng_state_summary",
            ToolKind::StateLink => "ng_state_link",
            ToolKind::StateSave => "state_save",
            ToolKind::StateLoad => "state_load",
            ToolKind::DataListFiles => "data_list_files",
            ToolKind::DataListSummaries => "data_list_summaries",
            ToolKind::DataInfo => "data_info",
            ToolKind::DataPreview => "data_preview",
            ToolKind::DataDescribe => "data_describe",
            ToolKind::DataSelect => "data_select",
            ToolKind::DataSample => "data_sample",
            ToolKind::DataPlotHistogram => "data_plot_histogram",
            ToolKind::DataIngestCsvRois => "data_ingest_csv_rois",
            ToolKind::DataNgViewsTable => "data_ng_views_table",
        }
    }

    pub fn from_name(name: &str) -> Option<ToolKind> {
        ToolKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Whether a successful call changes the viewer state (and so needs a
    /// refreshed link).
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            ToolKind::SetView
                | ToolKind::SetLut
                | ToolKind::AddLayer
                | ToolKind::SetLayerVisibility
                | ToolKind::AnnotationsAdd
                | ToolKind::StateLoad
                | ToolKind::DataIngestCsvRois
                | ToolKind::DataNgViewsTable
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::SetView => "Set camera center/zoom/orientation",
            ToolKind::SetLut => "Set the intensity LUT range of an image layer",
            ToolKind::AddLayer => {
                "Add a new layer (image, segmentation, or annotation). Idempotent if name exists."
            }
            ToolKind::SetLayerVisibility => "Show or hide a layer by name",
            ToolKind::AnnotationsAdd => {
                "Add point/box/ellipsoid annotations to an annotation layer (created if missing)"
            }
            ToolKind::StateSummary => {
                "Get structured summary of current viewer state. Use before modifications if unsure of layer names or ranges."
            }
            ToolKind::StateLink => {
                "Return current state link plus masked markdown hyperlink (use after modifications when user requests link)."
            }
            ToolKind::StateSave => "Save a snapshot of the current state and return its id and link",
            ToolKind::StateLoad => "Load state from a viewer URL or fragment",
            ToolKind::DataListFiles => "List uploaded CSV files with metadata (ids, columns).",
            ToolKind::DataListSummaries => "List previously created summary / derived tables.",
            ToolKind::DataInfo => {
                "Return dataframe metadata (rows, cols, columns, dtypes, head sample). Call before asking questions about the dataset."
            }
            ToolKind::DataPreview => "Preview first N rows of a file.",
            ToolKind::DataDescribe => "Compute numeric summary statistics for a file.",
            ToolKind::DataSelect => {
                "Select subset of columns and filtered rows; stores as summary table."
            }
            ToolKind::DataSample => {
                "Return a random sample of rows (without replacement by default)."
            }
            ToolKind::DataPlotHistogram => "Histogram of a numeric column",
            ToolKind::DataIngestCsvRois => {
                "Rank ROIs of a CSV (id,x,y,z,size_x,size_y,size_z) by volume and add them as box annotations"
            }
            ToolKind::DataNgViewsTable => {
                "Generate multiple view links from a table (e.g. top N by a metric) returning a table of id + metrics + links. Mutates state to first view."
            }
        }
    }

    /// JSON schema of the tool's arguments
    pub fn parameters(self) -> Value {
        let vec3 = json!({
            "type": "object",
            "properties": {"x": {"type": "number"}, "y": {"type": "number"}, "z": {"type": "number"}},
            "required": ["x", "y", "z"]
        });
        let source_ids = json!({
            "file_id": {"type": "string", "description": "Source file id (provide either file_id OR summary_id)"},
            "summary_id": {"type": "string", "description": "Derived table id (wins over file_id)"}
        });
        let empty = json!({"type": "object", "properties": {}});

        match self {
            ToolKind::SetView => json!({
                "type": "object",
                "properties": {
                    "center": vec3,
                    "zoom": {"oneOf": [{"type": "number"}, {"type": "string", "enum": ["fit"]}], "default": "fit"},
                    "orientation": {"type": "string", "enum": ["xy", "yz", "xz", "3d"]}
                },
                "required": ["center"]
            }),
            ToolKind::SetLut => json!({
                "type": "object",
                "properties": {
                    "layer": {"type": "string"},
                    "vmin": {"type": "number"},
                    "vmax": {"type": "number"}
                },
                "required": ["layer", "vmin", "vmax"]
            }),
            ToolKind::AddLayer => json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "layer_type": {"type": "string", "enum": ["image", "segmentation", "annotation"], "default": "image"},
                    "source": {"description": "Layer source spec (string or object, passed through)"},
                    "visible": {"type": "boolean", "default": true}
                },
                "required": ["name"]
            }),
            ToolKind::SetLayerVisibility => json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "visible": {"type": "boolean"}
                },
                "required": ["name", "visible"]
            }),
            ToolKind::AnnotationsAdd => json!({
                "type": "object",
                "properties": {
                    "layer": {"type": "string"},
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string"},
                                "type": {"type": "string", "enum": ["point", "box", "ellipsoid"]},
                                "center": vec3,
                                "size": vec3
                            },
                            "required": ["type", "center"]
                        }
                    }
                },
                "required": ["layer", "items"]
            }),
            ToolKind::StateSummary => json!({
                "type": "object",
                "properties": {
                    "detail": {"type": "string", "enum": ["minimal", "standard", "full"], "default": "standard"}
                }
            }),
            ToolKind::StateLink | ToolKind::DataListFiles | ToolKind::DataListSummaries => empty,
            ToolKind::StateSave => json!({
                "type": "object",
                "properties": {
                    "mask": {"type": "boolean", "default": false, "description": "Also return a masked markdown link"}
                }
            }),
            ToolKind::StateLoad => json!({
                "type": "object",
                "properties": {"link": {"type": "string"}},
                "required": ["link"]
            }),
            ToolKind::DataInfo => json!({
                "type": "object",
                "properties": {
                    "file_id": {"type": "string"},
                    "sample_rows": {"type": "integer", "default": 5, "minimum": 1, "maximum": 20}
                },
                "required": ["file_id"]
            }),
            ToolKind::DataPreview => json!({
                "type": "object",
                "properties": {
                    "file_id": {"type": "string"},
                    "n": {"type": "integer", "default": 10, "minimum": 1, "maximum": 100}
                },
                "required": ["file_id"]
            }),
            ToolKind::DataDescribe => json!({
                "type": "object",
                "properties": {"file_id": {"type": "string"}},
                "required": ["file_id"]
            }),
            ToolKind::DataSelect => json!({
                "type": "object",
                "properties": {
                    "file_id": {"type": "string"},
                    "columns": {"type": "array", "items": {"type": "string"}},
                    "filters": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "column": {"type": "string"},
                                "op": {"type": "string", "enum": ["==", "!=", ">", "<", ">=", "<="]},
                                "value": {}
                            },
                            "required": ["column", "op", "value"]
                        }
                    },
                    "sort_by": {"type": "string"},
                    "descending": {"type": "boolean", "default": false},
                    "limit": {"type": "integer", "default": 20, "minimum": 1, "maximum": 500}
                },
                "required": ["file_id"]
            }),
            ToolKind::DataSample => json!({
                "type": "object",
                "properties": {
                    "file_id": source_ids["file_id"],
                    "summary_id": source_ids["summary_id"],
                    "n": {"type": "integer", "default": 5, "minimum": 1, "maximum": 1000},
                    "seed": {"type": ["integer", "null"], "description": "Optional seed for reproducibility"},
                    "replace": {"type": "boolean", "default": false}
                }
            }),
            ToolKind::DataPlotHistogram => json!({
                "type": "object",
                "properties": {
                    "file_id": source_ids["file_id"],
                    "summary_id": source_ids["summary_id"],
                    "column": {"type": "string"},
                    "bins": {"type": "integer", "default": 256, "minimum": 1, "maximum": 1024}
                },
                "required": ["column"]
            }),
            ToolKind::DataIngestCsvRois => json!({
                "type": "object",
                "properties": {
                    "file_id": {"type": "string"},
                    "top_n": {"type": "integer", "default": 20, "minimum": 1},
                    "layer": {"type": "string", "default": "ROIs"}
                },
                "required": ["file_id"]
            }),
            ToolKind::DataNgViewsTable => json!({
                "type": "object",
                "properties": {
                    "file_id": source_ids["file_id"],
                    "summary_id": source_ids["summary_id"],
                    "sort_by": {"type": "string"},
                    "descending": {"type": "boolean", "default": true},
                    "top_n": {"type": "integer", "default": 5, "minimum": 1, "maximum": 50},
                    "id_column": {"type": "string", "default": "cell_id"},
                    "center_columns": {"type": "array", "items": {"type": "string"}, "default": ["x", "y", "z"]},
                    "include_columns": {"type": "array", "items": {"type": "string"}},
                    "lut": {
                        "type": "object",
                        "properties": {"layer": {"type": "string"}, "min": {"type": "number"}, "max": {"type": "number"}}
                    },
                    "annotations": {"type": "boolean", "default": false},
                    "link_label_column": {"type": "string"}
                }
            }),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ToolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::from_name(s).ok_or_else(|| Error::not_found(format!("Unknown tool: {}", s)))
    }
}

/// Catalogue entry as served by the HTTP surface
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub mutating: bool,
    pub parameters: Value,
}

/// Definitions handed to the reasoning collaborator
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.iter().map(|k| k.definition()).collect()
}

pub fn catalog() -> Vec<CatalogEntry> {
    ToolKind::ALL
        .iter()
        .map(|k| CatalogEntry {
            name: k.name(),
            description: k.description(),
            mutating: k.is_mutating(),
            parameters: k.parameters(),
        })
        .collect()
}

/// Whether the named tool mutates the viewer. Unknown names do not.
pub fn is_mutating(name: &str) -> bool {
    ToolKind::from_name(name).map(ToolKind::is_mutating).unwrap_or(false)
}
