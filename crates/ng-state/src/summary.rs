//! Deterministic state summaries

use ng_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;
use std::str::FromStr;

use crate::viewer::{LayerKind, ViewerState};

/// How much per-layer detail a summary carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryDetail {
    /// Name and type only
    Minimal,
    /// Adds visibility, LUT range and annotation counts
    #[default]
    Standard,
    /// Adds source and shader length
    Full,
}

impl FromStr for SummaryDetail {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(SummaryDetail::Minimal),
            "standard" => Ok(SummaryDetail::Standard),
            "full" => Ok(SummaryDetail::Full),
            other => Err(Error::validation(format!(
                "Unknown detail level '{}', expected minimal, standard or full",
                other
            ))),
        }
    }
}

/// Structured summary for the `ng_state_summary` tool
pub fn summarize(state: &ViewerState, detail: SummaryDetail) -> Value {
    let layers: Vec<Value> = state
        .layers
        .iter()
        .map(|layer| {
            let mut entry = json!({
                "name": layer.name,
                "type": layer.kind.to_string(),
            });
            if detail == SummaryDetail::Minimal {
                return entry;
            }
            entry["visible"] = json!(layer.visible.unwrap_or(true));
            if let Some(range) = layer.normalized_range() {
                entry["normalized_range"] = json!(range);
            }
            if layer.kind == LayerKind::Annotation {
                entry["annotation_count"] = json!(layer.annotation_count());
            }
            if detail == SummaryDetail::Full {
                if let Some(source) = &layer.source {
                    entry["source"] = source.clone();
                }
                let shader_len = layer
                    .extra
                    .get("shader")
                    .and_then(Value::as_str)
                    .map(|s| s.len())
                    .unwrap_or(0);
                entry["shader_len"] = json!(shader_len);
            }
            entry
        })
        .collect();

    json!({
        "detail": detail,
        "layout": state.layout.to_string(),
        "position": state.position,
        "cross_section_scale": state.cross_section_scale,
        "layer_count": layers.len(),
        "layers": layers,
    })
}

fn format_position(position: &[f64]) -> String {
    let parts: Vec<String> = position.iter().map(|v| format!("{}", v)).collect();
    format!("[{}]", parts.join(", "))
}

/// Short text block describing the viewer for the model preface
pub fn describe_for_prompt(state: &ViewerState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Viewer state:");
    let _ = writeln!(out, "- layout: {}", state.layout);
    let _ = writeln!(out, "- position: {}", format_position(&state.position));
    let _ = writeln!(out, "- crossSectionScale: {}", state.cross_section_scale);
    if state.layers.is_empty() {
        let _ = writeln!(out, "- layers: (none)");
    } else {
        let _ = writeln!(out, "- layers:");
        for layer in &state.layers {
            let _ = write!(out, "  - {} ({})", layer.name, layer.kind);
            if layer.visible == Some(false) {
                let _ = write!(out, " hidden");
            }
            let _ = writeln!(out);
        }
    }
    out
}
