//! System instructions and the per-round context preface

use ng_state::describe_for_prompt;
use ng_tools::Workspace;

use crate::memory::InteractionMemory;

pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant driving a Neuroglancer viewer and a small table store.

Decision rules:
- If the user only wants information, answer from the viewer state summary below without tools.
- To change the view (camera, LUTs, annotations, layers) call the matching ng_* tool.
- If unsure of layer names or ranges, call ng_state_summary first.
- To share the current view call ng_state_link. Call state_save only when the user asks to save or persist.
- Never paste raw Neuroglancer URLs; links are added to your reply automatically.

Data rules:
- Use data_info, data_preview, data_describe, data_select and data_sample for tables.
- Derived tables are stored as summaries; reference them later by summary_id.
- For one link per row of a table use data_ng_views_table.
- Random samples default to no seed and no replacement.

Keep answers concise.";

/// Static instructions followed by the viewer, data and memory summaries.
/// Rebuilt every round so the model sees post-mutation state.
pub fn build_preface(workspace: &Workspace, memory: &InteractionMemory) -> String {
    let mut out = String::from(SYSTEM_PROMPT);
    out.push_str("\n\n");
    out.push_str(&describe_for_prompt(&workspace.viewer));
    out.push('\n');
    out.push_str(&workspace.tables.describe_for_prompt());
    if !memory.is_empty() {
        out.push_str("\nRecent interactions: ");
        out.push_str(&memory.recall());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preface_sections() {
        let mut ws = Workspace::default();
        ws.tables.add_file("cells.csv", b"id,x\n1,2\n").unwrap();
        let mut memory = InteractionMemory::default();
        memory.remember("User: hello");

        let preface = build_preface(&ws, &memory);
        assert!(preface.starts_with(SYSTEM_PROMPT));
        assert!(preface.contains("Viewer state:"));
        assert!(preface.contains("cells.csv"));
        assert!(preface.contains("Recent interactions: User: hello"));
    }

    #[test]
    fn test_preface_without_memory() {
        let preface = build_preface(&Workspace::default(), &InteractionMemory::default());
        assert!(preface.contains("Data: no files uploaded."));
        assert!(!preface.contains("Recent interactions"));
    }
}
