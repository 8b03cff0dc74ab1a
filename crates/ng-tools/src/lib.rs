//! ng-tools: Tool Catalogue and Dispatcher
//!
//! - `catalog`: the closed set of tools, their schemas and mutating flags
//! - `args`: typed, bounded argument structs
//! - `dispatcher`: name + JSON args → one operation on a [`Workspace`]
//! - `viewer_ops`, `data_ops`, `views`: the operations themselves
//! - `workspace`: per-session viewer, tables and snapshots

pub mod args;
pub mod catalog;
mod data_ops;
pub mod dispatcher;
mod viewer_ops;
mod views;
pub mod workspace;

pub use catalog::{catalog, is_mutating, tool_definitions, CatalogEntry, ToolKind};
pub use dispatcher::{is_error_result, Dispatcher, StateLink};
pub use workspace::{Snapshot, SnapshotStore, Workspace};
