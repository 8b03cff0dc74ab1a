//! Tool dispatcher
//!
//! Maps a tool name plus raw JSON arguments to one operation on a
//! [`Workspace`]. `execute` never fails: every error comes back as a
//! structured `{error, kind}` result.

use ng_core::{Error, Result};
use ng_state::{to_link, LinkMasker, ViewerState};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::catalog::ToolKind;
use crate::workspace::Workspace;

/// A shareable link and its masked markdown form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateLink {
    pub url: String,
    pub masked_markdown: String,
}

/// True when a tool result is an error payload
pub fn is_error_result(result: &Value) -> bool {
    result.get("error").is_some()
}

pub struct Dispatcher {
    viewer_base: String,
    masker: LinkMasker,
    http: reqwest::Client,
}

impl Dispatcher {
    pub fn new(viewer_base: impl Into<String>) -> Self {
        let viewer_base = viewer_base.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            masker: LinkMasker::for_base(viewer_base.clone()),
            viewer_base,
            http,
        }
    }

    pub fn viewer_base(&self) -> &str {
        &self.viewer_base
    }

    pub fn masker(&self) -> &LinkMasker {
        &self.masker
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn link(&self, state: &ViewerState) -> Result<String> {
        to_link(state, &self.viewer_base)
    }

    /// Link plus `[Updated Neuroglancer view](url)` markdown
    pub fn state_link(&self, state: &ViewerState) -> Result<StateLink> {
        let url = self.link(state)?;
        let masked_markdown = LinkMasker::markdown(&url, 1);
        Ok(StateLink {
            url,
            masked_markdown,
        })
    }

    /// Run a tool by name. Unknown names and all failures become structured
    /// error results.
    pub async fn execute(&self, ws: &mut Workspace, name: &str, args: Value) -> Value {
        let Some(kind) = ToolKind::from_name(name) else {
            warn!(tool = %name, "Unknown tool requested");
            return Error::not_found(format!("Unknown tool: {}", name)).to_tool_result();
        };
        debug!(tool = %name, "Dispatching tool");
        match self.run(kind, ws, args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %name, "Tool failed: {}", e);
                e.to_tool_result()
            }
        }
    }

    async fn run(&self, kind: ToolKind, ws: &mut Workspace, args: Value) -> Result<Value> {
        match kind {
            ToolKind::SetView => self.set_view(ws, args),
            ToolKind::SetLut => self.set_lut(ws, args),
            ToolKind::AddLayer => self.add_layer(ws, args),
            ToolKind::SetLayerVisibility => self.set_layer_visibility(ws, args),
            ToolKind::AnnotationsAdd => self.annotations_add(ws, args),
            ToolKind::StateSummary => self.state_summary(ws, args),
            ToolKind::StateLink => self.state_link_tool(ws),
            ToolKind::StateSave => self.state_save(ws, args),
            ToolKind::StateLoad => self.state_load(ws, args).await,
            ToolKind::DataListFiles => self.data_list_files(ws),
            ToolKind::DataListSummaries => self.data_list_summaries(ws),
            ToolKind::DataInfo => self.data_info(ws, args),
            ToolKind::DataPreview => self.data_preview(ws, args),
            ToolKind::DataDescribe => self.data_describe(ws, args),
            ToolKind::DataSelect => self.data_select(ws, args),
            ToolKind::DataSample => self.data_sample(ws, args),
            ToolKind::DataPlotHistogram => self.data_plot_histogram(ws, args),
            ToolKind::DataIngestCsvRois => self.data_ingest_csv_rois(ws, args),
            ToolKind::DataNgViewsTable => self.data_ng_views_table(ws, args),
        }
    }
}
