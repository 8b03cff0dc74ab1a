//! ng-state: Viewer State Document
//!
//! Provides:
//! - `ViewerState`, the mutable camera/layer/annotation document
//! - Shareable-link encoding and decoding (`link`)
//! - Deterministic summaries for the model and the `ng_state_summary` tool
//! - Masking of raw viewer links in user-facing text

pub mod annotation;
pub mod link;
pub mod masking;
pub mod summary;
pub mod viewer;

pub use annotation::{AnnotationItem, AnnotationKind, Vec3};
pub use link::{from_link, pointer_target, to_link};
pub use masking::{mask_viewer_links, LinkMasker, MASK_LABEL};
pub use summary::{describe_for_prompt, summarize, SummaryDetail};
pub use viewer::{Layer, LayerKind, Layout, Orientation, ViewerState, Zoom, FIT_SCALE};
