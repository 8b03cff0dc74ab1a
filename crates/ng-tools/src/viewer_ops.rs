//! Viewer tools: camera, layers, LUTs, annotations, links and snapshots

use ng_core::{Error, Result};
use ng_state::{
    from_link, pointer_target, summarize, LayerKind, LinkMasker, Orientation, SummaryDetail, Zoom,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::args::*;
use crate::catalog::ToolKind;
use crate::dispatcher::Dispatcher;
use crate::workspace::Workspace;

impl Dispatcher {
    pub(crate) fn set_view(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: SetViewArgs = parse_args(ToolKind::SetView, args)?;
        let orientation = args
            .orientation
            .as_deref()
            .map(str::parse::<Orientation>)
            .transpose()?;
        let zoom = Zoom::from_value(args.zoom.as_ref());
        let warning = ws
            .viewer
            .set_view(args.center.to_array(), zoom, orientation);

        let mut result = json!({
            "ok": true,
            "position": ws.viewer.position,
            "crossSectionScale": ws.viewer.cross_section_scale,
            "layout": ws.viewer.layout.to_string(),
        });
        if let Some(w) = warning {
            result["warning"] = json!(w);
        }
        Ok(result)
    }

    pub(crate) fn set_lut(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: SetLutArgs = parse_args(ToolKind::SetLut, args)?;
        let applied = ws.viewer.set_lut(&args.layer, args.vmin, args.vmax);
        let mut result = json!({
            "ok": true,
            "layer": args.layer,
            "applied": applied,
        });
        if !applied {
            result["note"] = json!(format!("Layer '{}' not found; LUT skipped", args.layer));
        }
        Ok(result)
    }

    pub(crate) fn add_layer(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: AddLayerArgs = parse_args(ToolKind::AddLayer, args)?;
        if args.name.trim().is_empty() {
            return Err(Error::validation("Layer name must not be empty"));
        }
        let kind: LayerKind = args.layer_type.parse()?;
        let (created, layer) = ws
            .viewer
            .add_layer(&args.name, kind, args.source, args.visible);
        Ok(json!({
            "ok": true,
            "created": created,
            "layer": {"name": layer.name, "type": layer.kind.to_string()},
        }))
    }

    pub(crate) fn set_layer_visibility(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: VisibilityArgs = parse_args(ToolKind::SetLayerVisibility, args)?;
        let applied = ws.viewer.set_layer_visibility(&args.name, args.visible);
        Ok(json!({
            "ok": true,
            "name": args.name,
            "visible": args.visible,
            "applied": applied,
        }))
    }

    pub(crate) fn annotations_add(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: AnnotationsAddArgs = parse_args(ToolKind::AnnotationsAdd, args)?;
        // Convert all items first so a bad item leaves the layer untouched
        let records = args
            .items
            .iter()
            .map(|item| item.to_record())
            .collect::<Result<Vec<_>>>()?;
        let added = records.len();
        let total = ws.viewer.add_annotations(&args.layer, records)?;
        Ok(json!({
            "ok": true,
            "layer": args.layer,
            "added": added,
            "total": total,
        }))
    }

    pub(crate) fn state_summary(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: SummaryArgs = parse_args(ToolKind::StateSummary, args)?;
        let detail = match args.detail.as_deref() {
            Some(d) => d.parse::<SummaryDetail>()?,
            None => SummaryDetail::default(),
        };
        Ok(summarize(&ws.viewer, detail))
    }

    pub(crate) fn state_link_tool(&self, ws: &mut Workspace) -> Result<Value> {
        Ok(serde_json::to_value(self.state_link(&ws.viewer)?)?)
    }

    pub(crate) fn state_save(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: StateSaveArgs = parse_args(ToolKind::StateSave, args)?;
        let sid = ws.snapshots.save(&ws.viewer);
        let url = self.link(&ws.viewer)?;
        info!("Saved snapshot {}", sid);
        let mut result = json!({"sid": sid, "url": url});
        if args.mask {
            result["masked_markdown"] = json!(LinkMasker::markdown(&url, 1));
        }
        Ok(result)
    }

    /// Replace the viewer state from a link. Pointer links are fetched first.
    /// On any failure the current state is left as it was.
    pub(crate) async fn state_load(&self, ws: &mut Workspace, args: Value) -> Result<Value> {
        let args: StateLoadArgs = parse_args(ToolKind::StateLoad, args)?;
        let (state, expanded_from) = match pointer_target(&args.link) {
            Some(target) => {
                debug!("Expanding state pointer {}", target);
                let body = self.fetch_pointer(&target).await?;
                (from_link(&body)?, Some(target))
            }
            None => (from_link(&args.link)?, None),
        };
        let layers = state.layers.len();
        let layout = state.layout.to_string();
        ws.viewer.replace_with(state);
        let mut result = json!({"ok": true, "layers": layers, "layout": layout});
        if let Some(target) = expanded_from {
            result["expanded_from"] = json!(target);
        }
        Ok(result)
    }

    async fn fetch_pointer(&self, url: &str) -> Result<String> {
        let response = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Failed to fetch state pointer {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "State pointer {} returned {}",
                url, status
            )));
        }
        response
            .text()
            .await
            .map_err(|e| Error::upstream(format!("Failed to read state pointer {}: {}", url, e)))
    }
}
