//! Shareable link codec
//!
//! A link is `{base}/#!{percent-encoded compact JSON}`. Decoding accepts the
//! full URL, a bare `#!` fragment, a fragment without the `#`, or the JSON
//! itself (raw or percent-encoded).

use ng_core::{Error, Result};
use serde_json::Value;
use tracing::debug;

use crate::viewer::ViewerState;

const FRAGMENT_MARKER: &str = "#!";

/// Encode a state as a shareable link against `base_url`.
pub fn to_link(state: &ViewerState, base_url: &str) -> Result<String> {
    // Equal states must produce byte-identical links
    let value = sort_keys(serde_json::to_value(state)?);
    let compact = serde_json::to_string(&value)?;
    Ok(format!(
        "{}/{}{}",
        base_url.trim_end_matches('/'),
        FRAGMENT_MARKER,
        urlencoding::encode(&compact)
    ))
}

/// Rebuild every object with its keys in ascending order. `Map` keeps
/// insertion order when serde_json's `preserve_order` feature is on.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Extract and percent-decode the state payload from any accepted input form.
fn decode_payload(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::state_parse("Empty link"));
    }
    let payload = if let Some(idx) = trimmed.find(FRAGMENT_MARKER) {
        &trimmed[idx + FRAGMENT_MARKER.len()..]
    } else if let Some(rest) = trimmed.strip_prefix('!') {
        rest
    } else {
        trimmed
    };
    urlencoding::decode(payload)
        .map(|s| s.into_owned())
        .map_err(|e| Error::state_parse(format!("Invalid percent-encoding: {}", e)))
}

/// Decode a link into a state.
pub fn from_link(input: &str) -> Result<ViewerState> {
    let payload = decode_payload(input)?;
    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| Error::state_parse(format!("Link payload is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(Error::state_parse("Link payload must be a JSON object"));
    }
    let state: ViewerState = serde_json::from_value(value)
        .map_err(|e| Error::state_parse(format!("Link payload is not a viewer state: {}", e)))?;
    debug!("Decoded link with {} layer(s)", state.layers.len());
    Ok(state)
}

/// If the link's fragment is itself an http(s) URL (a pointer to hosted
/// JSON) rather than inline state, return that URL.
pub fn pointer_target(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let idx = trimmed.find(FRAGMENT_MARKER)?;
    let decoded = urlencoding::decode(&trimmed[idx + FRAGMENT_MARKER.len()..]).ok()?;
    let decoded = decoded.trim();
    if decoded.starts_with('{') {
        return None;
    }
    if decoded.starts_with("http://") || decoded.starts_with("https://") {
        Some(decoded.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{LayerKind, Layout, Orientation, Zoom};
    use serde_json::json;

    const BASE: &str = "https://neuroglancer-demo.appspot.com";

    fn sample_state() -> ViewerState {
        let mut s = ViewerState::new();
        s.add_layer("img", LayerKind::Image, Some(json!("precomputed://x")), true);
        s.set_lut("img", 0.25, 1e-7);
        s.set_view([1.5, -2.0, 3.125], Zoom::Scale(0.1), Some(Orientation::ThreeD));
        s.add_annotations("ROIs", vec![json!({"point": [1, 2, 3], "id": "a"})])
            .unwrap();
        s
    }

    #[test]
    fn test_link_has_base_and_marker() {
        let link = to_link(&ViewerState::new(), &format!("{}/", BASE)).unwrap();
        assert!(link.starts_with("https://neuroglancer-demo.appspot.com/#!%7B"));
    }

    #[test]
    fn test_link_keys_are_sorted() {
        let mut state = ViewerState::new();
        state.extra.insert(
            "zoomFactor".to_string(),
            json!({"b": 1, "a": [{"y": 0, "x": 0}]}),
        );
        let link = to_link(&state, BASE).unwrap();
        let payload = decode_payload(&link).unwrap();

        assert!(payload.starts_with("{\"crossSectionScale\":"), "{}", payload);
        let positions: Vec<usize> = [
            "\"crossSectionScale\":",
            "\"dimensions\":",
            "\"layers\":",
            "\"layout\":",
            "\"position\":",
            "\"projectionScale\":",
            "\"zoomFactor\":",
        ]
        .iter()
        .map(|key| payload.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", payload);
        assert!(payload.contains("\"zoomFactor\":{\"a\":[{\"x\":0,\"y\":0}],\"b\":1}"));
    }

    #[test]
    fn test_sort_keys_recurses() {
        let sorted = sort_keys(json!({"b": {"d": 1, "c": [{"f": 1, "e": 2}]}, "a": null}));
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            r#"{"a":null,"b":{"c":[{"e":2,"f":1}],"d":1}}"#
        );
    }

    #[test]
    fn test_link_round_trip_preserves_state() {
        let state = sample_state();
        let link = to_link(&state, BASE).unwrap();
        let decoded = from_link(&link).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.layout, Layout::Named(Orientation::ThreeD));
        assert_eq!(to_link(&decoded, BASE).unwrap(), link);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = json!({
            "position": [1, 2, 3, 9],
            "layout": {"type": "row", "children": []},
            "layers": [{"name": "seg", "type": "segmentation", "segments": ["12"]}],
            "selectedLayer": {"layer": "seg"}
        });
        let state = from_link(&raw.to_string()).unwrap();
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["selectedLayer"], raw["selectedLayer"]);
        assert_eq!(back["layers"][0]["segments"], json!(["12"]));
        assert_eq!(back["layout"], raw["layout"]);
        assert_eq!(state.position.len(), 4);
    }

    #[test]
    fn test_accepts_fragment_forms() {
        let state = sample_state();
        let link = to_link(&state, BASE).unwrap();
        let fragment = &link[link.find("#!").unwrap()..];
        assert_eq!(from_link(fragment).unwrap(), state);
        assert_eq!(from_link(&fragment[1..]).unwrap(), state);
    }

    #[test]
    fn test_rejects_non_json_and_non_object() {
        assert_eq!(from_link("#!not-json").unwrap_err().kind(), "state_parse");
        assert_eq!(from_link("#![1,2,3]").unwrap_err().kind(), "state_parse");
        assert_eq!(from_link("   ").unwrap_err().kind(), "state_parse");
    }

    #[test]
    fn test_pointer_target() {
        let link = format!("{}/#!{}", BASE, urlencoding::encode("https://host/state.json"));
        assert_eq!(
            pointer_target(&link).as_deref(),
            Some("https://host/state.json")
        );
        let inline = to_link(&ViewerState::new(), BASE).unwrap();
        assert!(pointer_target(&inline).is_none());
    }
}
