//! Viewer state document
//!
//! Typed view over the viewer's JSON state. Fields the agent manipulates are
//! modelled explicitly; everything else (dimensions, projection settings,
//! selection, per-layer extras) rides along in `extra` maps so a loaded state
//! is never stripped of keys it did not touch.

use ng_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::annotation::annotations_of;

/// Scale written when the caller asks to "fit" the view.
// Placeholder until per-dataset extents are known.
pub const FIT_SCALE: f64 = 1.0;

/// Camera orientation / single-panel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "xy")]
    Xy,
    #[serde(rename = "yz")]
    Yz,
    #[serde(rename = "xz")]
    Xz,
    #[serde(rename = "3d")]
    ThreeD,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Xy => write!(f, "xy"),
            Orientation::Yz => write!(f, "yz"),
            Orientation::Xz => write!(f, "xz"),
            Orientation::ThreeD => write!(f, "3d"),
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "xy" => Ok(Orientation::Xy),
            "yz" => Ok(Orientation::Yz),
            "xz" => Ok(Orientation::Xz),
            "3d" => Ok(Orientation::ThreeD),
            other => Err(Error::validation(format!(
                "Unknown orientation '{}', expected one of xy, yz, xz, 3d",
                other
            ))),
        }
    }
}

/// Layout is either one of the fixed orientations or an arbitrary value
/// (e.g. a multi-panel layout object loaded from an external link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Layout {
    Named(Orientation),
    Custom(Value),
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Named(Orientation::Xy)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Named(o) => write!(f, "{}", o),
            Layout::Custom(Value::String(s)) => write!(f, "{}", s),
            Layout::Custom(other) => write!(f, "{}", other),
        }
    }
}

/// Layer type tag. Unknown tags from loaded states are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    Image,
    Segmentation,
    Annotation,
    Other(String),
}

impl Default for LayerKind {
    fn default() -> Self {
        LayerKind::Image
    }
}

impl From<String> for LayerKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "image" => LayerKind::Image,
            "segmentation" => LayerKind::Segmentation,
            "annotation" => LayerKind::Annotation,
            _ => LayerKind::Other(s),
        }
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Image => write!(f, "image"),
            LayerKind::Segmentation => write!(f, "segmentation"),
            LayerKind::Annotation => write!(f, "annotation"),
            LayerKind::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for LayerKind {
    type Err = Error;

    /// Strict parse used for tool arguments; only the three creatable kinds.
    fn from_str(s: &str) -> Result<Self> {
        match LayerKind::from(s.trim().to_lowercase()) {
            LayerKind::Other(other) => Err(Error::validation(format!(
                "Unknown layer_type '{}', expected image, segmentation or annotation",
                other
            ))),
            kind => Ok(kind),
        }
    }
}

/// A single viewer layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Opaque pass-through: string, object, or absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, rename = "shaderControls", skip_serializing_if = "Map::is_empty")]
    pub shader_controls: Map<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: None,
            source: None,
            shader_controls: Map::new(),
            extra: BTreeMap::new(),
        }
    }

    /// `shaderControls.normalized.range`, if set to a numeric pair
    pub fn normalized_range(&self) -> Option<[f64; 2]> {
        let range = self
            .shader_controls
            .get("normalized")?
            .get("range")?
            .as_array()?;
        match range.as_slice() {
            [lo, hi] => Some([lo.as_f64()?, hi.as_f64()?]),
            _ => None,
        }
    }

    /// Number of annotation records stored under `source.annotations`
    pub fn annotation_count(&self) -> usize {
        self.source
            .as_ref()
            .and_then(annotations_of)
            .map(|a| a.len())
            .unwrap_or(0)
    }
}

/// Parsed `zoom` argument of a set-view request
#[derive(Debug, Clone, PartialEq)]
pub enum Zoom {
    Fit,
    Scale(f64),
    /// Unparseable or non-positive value; ignored when applied
    Invalid(String),
}

impl Zoom {
    /// Lenient parse: `"fit"`, a positive number, or a numeric string.
    /// Absent/null means fit.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Zoom::Fit,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() && v > 0.0 => Zoom::Scale(v),
                _ => Zoom::Invalid(n.to_string()),
            },
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("fit") => Zoom::Fit,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => Zoom::Scale(v),
                _ => Zoom::Invalid(s.clone()),
            },
            Some(other) => Zoom::Invalid(other.to_string()),
        }
    }
}

fn default_scale() -> f64 {
    FIT_SCALE
}

/// The viewer document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    /// 3 components, or 4 when a trailing extra axis (e.g. time) is present
    #[serde(default)]
    pub position: Vec<f64>,
    #[serde(default = "default_scale")]
    pub cross_section_scale: f64,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Pass-through top-level keys (dimensions, projectionScale, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerState {
    /// Fresh state: nanometre dimensions, origin, single xy panel, no layers.
    pub fn new() -> Self {
        let mut extra = BTreeMap::new();
        extra.insert(
            "dimensions".to_string(),
            json!({"x": [1e-9, "m"], "y": [1e-9, "m"], "z": [1e-9, "m"]}),
        );
        extra.insert("projectionScale".to_string(), json!(1024));
        Self {
            position: vec![0.0, 0.0, 0.0],
            cross_section_scale: FIT_SCALE,
            layout: Layout::default(),
            layers: Vec::new(),
            extra,
        }
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    /// Recenter (and optionally rescale / reorient) the camera.
    ///
    /// Returns a warning when the zoom value had to be ignored.
    pub fn set_view(
        &mut self,
        center: [f64; 3],
        zoom: Zoom,
        orientation: Option<Orientation>,
    ) -> Option<String> {
        let mut position = center.to_vec();
        if let Some(extra_axis) = self.position.get(3) {
            position.push(*extra_axis);
        }
        self.position = position;

        match zoom {
            // Recenter only: keep whatever layout is loaded
            Zoom::Fit => {
                self.cross_section_scale = FIT_SCALE;
                None
            }
            Zoom::Scale(scale) => {
                self.cross_section_scale = scale;
                if let Some(o) = orientation {
                    self.layout = Layout::Named(o);
                }
                None
            }
            Zoom::Invalid(raw) => {
                debug!("Ignoring invalid zoom value {}", raw);
                if let Some(o) = orientation {
                    self.layout = Layout::Named(o);
                }
                Some(format!("Ignored invalid zoom value {}", raw))
            }
        }
    }

    /// Set the LUT range of a layer. Returns false (no-op) if absent.
    pub fn set_lut(&mut self, layer_name: &str, vmin: f64, vmax: f64) -> bool {
        let Some(layer) = self.layer_mut(layer_name) else {
            debug!("set_lut: layer '{}' not found, skipping", layer_name);
            return false;
        };
        let normalized = layer
            .shader_controls
            .entry("normalized".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !normalized.is_object() {
            *normalized = Value::Object(Map::new());
        }
        if let Value::Object(map) = normalized {
            map.insert("range".to_string(), json!([vmin, vmax]));
        }
        true
    }

    /// Insert a layer unless one with the same name exists.
    ///
    /// Returns `(created, layer)` where `layer` is the new or existing one.
    pub fn add_layer(
        &mut self,
        name: &str,
        kind: LayerKind,
        source: Option<Value>,
        visible: bool,
    ) -> (bool, &Layer) {
        if let Some(idx) = self.layers.iter().position(|l| l.name == name) {
            return (false, &self.layers[idx]);
        }
        let mut layer = Layer::new(name, kind);
        layer.source = source.filter(|s| !s.is_null());
        layer.visible = Some(visible);
        self.layers.push(layer);
        let last = self.layers.len() - 1;
        (true, &self.layers[last])
    }

    /// Set a layer's `visible` flag. Returns false (no-op) if absent.
    pub fn set_layer_visibility(&mut self, name: &str, visible: bool) -> bool {
        match self.layer_mut(name) {
            Some(layer) => {
                layer.visible = Some(visible);
                true
            }
            None => false,
        }
    }

    /// Append annotation records to the named annotation layer, creating it
    /// if needed. Returns the layer's annotation count afterwards.
    ///
    /// Fails only if the name is already taken by a non-annotation layer.
    pub fn add_annotations(&mut self, layer_name: &str, items: Vec<Value>) -> Result<usize> {
        let idx = match self.layers.iter().position(|l| l.name == layer_name) {
            Some(idx) => {
                if self.layers[idx].kind != LayerKind::Annotation {
                    return Err(Error::validation(format!(
                        "Layer '{}' exists with type '{}', not annotation",
                        layer_name, self.layers[idx].kind
                    )));
                }
                idx
            }
            None => {
                let mut layer = Layer::new(layer_name, LayerKind::Annotation);
                layer.source = Some(json!({"annotations": []}));
                self.layers.push(layer);
                self.layers.len() - 1
            }
        };

        let layer = &mut self.layers[idx];
        let source = layer.source.take();
        let mut source_obj = match source {
            Some(Value::Object(map)) => map,
            // Keep a plain source URL alongside the inline annotations
            Some(Value::String(url)) => {
                let mut map = Map::new();
                map.insert("url".to_string(), Value::String(url));
                map
            }
            _ => Map::new(),
        };
        let annotations = source_obj
            .entry("annotations".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !annotations.is_array() {
            *annotations = Value::Array(Vec::new());
        }
        let count = match annotations {
            Value::Array(list) => {
                list.extend(items);
                list.len()
            }
            _ => 0,
        };
        layer.source = Some(Value::Object(source_obj));
        Ok(count)
    }

    /// Whole-state replacement (link load, committed hypothetical view).
    pub fn replace_with(&mut self, other: ViewerState) {
        *self = other;
    }
}
