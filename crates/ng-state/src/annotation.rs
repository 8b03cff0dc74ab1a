//! Annotation items and their viewer record form

use ng_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// A point in viewer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Point,
    Box,
    Ellipsoid,
}

/// Annotation as requested by a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub center: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec3>,
}

impl AnnotationItem {
    pub fn point(center: Vec3) -> Self {
        Self {
            id: None,
            kind: AnnotationKind::Point,
            center,
            size: None,
        }
    }

    pub fn boxed(id: impl Into<String>, center: Vec3, size: Vec3) -> Self {
        Self {
            id: Some(id.into()),
            kind: AnnotationKind::Box,
            center,
            size: Some(size),
        }
    }

    /// Convert to the record stored in an annotation layer.
    ///
    /// Box records are anchored at `center` with extent `size`; ellipsoids
    /// use half of `size` as radii. Missing ids get a fresh uuid.
    pub fn to_record(&self) -> Result<Value> {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let c = self.center.to_array();
        match self.kind {
            AnnotationKind::Point => Ok(json!({"point": c, "id": id})),
            AnnotationKind::Box => {
                let size = self.require_size()?;
                Ok(json!({"type": "box", "point": c, "size": size.to_array(), "id": id}))
            }
            AnnotationKind::Ellipsoid => {
                let size = self.require_size()?;
                let radii = [size.x / 2.0, size.y / 2.0, size.z / 2.0];
                Ok(json!({"type": "ellipsoid", "center": c, "radii": radii, "id": id}))
            }
        }
    }

    fn require_size(&self) -> Result<Vec3> {
        self.size.ok_or_else(|| {
            Error::validation(format!(
                "Annotation of type {:?} requires a size",
                self.kind
            ))
        })
    }
}

/// Annotation records held by a layer source object
pub(crate) fn annotations_of(source: &Value) -> Option<&Vec<Value>> {
    source.get("annotations")?.as_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_record() {
        let item = AnnotationItem {
            id: Some("p1".into()),
            ..AnnotationItem::point(Vec3::new(1.0, 2.0, 3.0))
        };
        assert_eq!(
            item.to_record().unwrap(),
            json!({"point": [1.0, 2.0, 3.0], "id": "p1"})
        );
    }

    #[test]
    fn test_ellipsoid_radii_are_half_size() {
        let item = AnnotationItem {
            id: Some("e".into()),
            kind: AnnotationKind::Ellipsoid,
            center: Vec3::new(0.0, 0.0, 0.0),
            size: Some(Vec3::new(2.0, 4.0, 6.0)),
        };
        let rec = item.to_record().unwrap();
        assert_eq!(rec["radii"], json!([1.0, 2.0, 3.0]));
        assert_eq!(rec["type"], json!("ellipsoid"));
    }

    #[test]
    fn test_box_without_size_is_rejected() {
        let item = AnnotationItem {
            id: None,
            kind: AnnotationKind::Box,
            center: Vec3::new(0.0, 0.0, 0.0),
            size: None,
        };
        let err = item.to_record().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let rec = AnnotationItem::point(Vec3::new(0.0, 0.0, 0.0))
            .to_record()
            .unwrap();
        assert!(!rec["id"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_item_deserializes_from_tool_args() {
        let item: AnnotationItem = serde_json::from_value(json!({
            "type": "box",
            "center": {"x": 1, "y": 2, "z": 3},
            "size": {"x": 4, "y": 5, "z": 6}
        }))
        .unwrap();
        assert_eq!(item.kind, AnnotationKind::Box);
        assert_eq!(item.size.unwrap().z, 6.0);
    }
}
