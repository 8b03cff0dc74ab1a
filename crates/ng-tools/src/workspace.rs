//! Per-session tool state: viewer, tables and saved snapshots

use chrono::{DateTime, Utc};
use ng_core::{Error, Result};
use ng_data::TableStore;
use ng_state::ViewerState;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: ViewerState,
    pub saved_at: DateTime<Utc>,
}

/// Saved viewer states keyed by uuid
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshots: HashMap<String, Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `state`; returns the new snapshot id.
    pub fn save(&mut self, state: &ViewerState) -> String {
        let sid = Uuid::new_v4().to_string();
        self.snapshots.insert(
            sid.clone(),
            Snapshot {
                state: state.clone(),
                saved_at: Utc::now(),
            },
        );
        sid
    }

    pub fn load(&self, sid: &str) -> Result<ViewerState> {
        self.snapshots
            .get(sid)
            .map(|s| s.state.clone())
            .ok_or_else(|| Error::not_found(format!("Unknown snapshot id: {}", sid)))
    }

    pub fn get(&self, sid: &str) -> Option<&Snapshot> {
        self.snapshots.get(sid)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Everything a tool call may read or write
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub viewer: ViewerState,
    pub tables: TableStore,
    pub snapshots: SnapshotStore,
}

impl Workspace {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self {
            viewer: ViewerState::new(),
            tables: TableStore::new(max_upload_bytes),
            snapshots: SnapshotStore::new(),
        }
    }
}
