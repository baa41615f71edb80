pub mod commit;
pub mod plan;

use serde::{Deserialize, Serialize};

pub use commit::{commit, CommitError, CommitOutcome};
pub use plan::{resolve, try_resolve, InvalidDrag, PlannedUpdate, ReorderPlan};

/// What was dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DragKind {
    Column,
    /// Anything that isn't a column drag is a task drag.
    #[serde(other)]
    Task,
}

/// A position inside a droppable container (the board for columns, a column for tasks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    #[serde(rename = "droppableId")]
    pub container_id: String,
    pub index: usize,
}

/// Drag completion as delivered by the drag-and-drop layer.
/// `destination` is `None` when the item was dropped outside any target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    #[serde(rename = "draggableId")]
    pub dragged_id: String,
    #[serde(rename = "type")]
    pub kind: DragKind,
    pub source: DragLocation,
    #[serde(default)]
    pub destination: Option<DragLocation>,
}

impl DragEvent {
    /// Decode a raw drag payload. A malformed one (missing ids, negative
    /// index, wrong shape) is logged and treated as an aborted drag.
    pub fn parse(payload: &serde_json::Value) -> Option<DragEvent> {
        match DragEvent::deserialize(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                log::warn!(target: "kanban.reorder", "Ignoring malformed drag event: {}", e);
                None
            }
        }
    }

    pub fn column(dragged_id: &str, from: usize, to: usize) -> Self {
        Self {
            dragged_id: dragged_id.to_string(),
            kind: DragKind::Column,
            source: DragLocation::new("board", from),
            destination: Some(DragLocation::new("board", to)),
        }
    }

    pub fn task(dragged_id: &str, from: DragLocation, to: Option<DragLocation>) -> Self {
        Self {
            dragged_id: dragged_id.to_string(),
            kind: DragKind::Task,
            source: from,
            destination: to,
        }
    }

    /// True when committing this event can't change anything.
    pub fn is_noop(&self) -> bool {
        match &self.destination {
            None => true,
            Some(dest) => dest == &self.source,
        }
    }
}

impl DragLocation {
    pub fn new(container_id: &str, index: usize) -> Self {
        Self {
            container_id: container_id.to_string(),
            index,
        }
    }
}
