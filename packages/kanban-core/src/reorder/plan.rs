/// Drag-and-drop reorder resolution.
///
/// Turns a drag event into the entity updates that persist the new order:
/// - column drag        -> one board update (`ordered`)
/// - task, same column  -> one column update (`taskIds`)
/// - task, cross column -> two column updates, source first
///
/// Every move is remove-at-source-index then insert-at-destination-index,
/// never a swap. A no-op or invalid drag yields an empty plan.
///
/// Column indices count positions in the board's full `ordered` list,
/// archived entries included, since that is the list being rewritten.

use serde::Serialize;

use super::{DragEvent, DragKind, DragLocation};
use crate::store::Collection;
use crate::types::{BoardId, ColumnId};
use crate::view::BoardView;

/// One persisted update. `previous` holds the sequence being replaced so a
/// partially applied plan can be rolled back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlannedUpdate {
    #[serde(rename_all = "camelCase")]
    BoardOrder {
        board_id: BoardId,
        ordered: Vec<String>,
        previous: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ColumnTasks {
        column_id: ColumnId,
        task_ids: Vec<String>,
        previous: Vec<String>,
    },
}

impl PlannedUpdate {
    pub fn collection(&self) -> Collection {
        match self {
            PlannedUpdate::BoardOrder { .. } => Collection::Boards,
            PlannedUpdate::ColumnTasks { .. } => Collection::Columns,
        }
    }

    /// Id of the board or column this update writes.
    pub fn target_id(&self) -> &str {
        match self {
            PlannedUpdate::BoardOrder { board_id, .. } => board_id,
            PlannedUpdate::ColumnTasks { column_id, .. } => column_id,
        }
    }

    /// The update that puts the previous sequence back.
    pub fn reverted(&self) -> PlannedUpdate {
        match self {
            PlannedUpdate::BoardOrder {
                board_id,
                ordered,
                previous,
            } => PlannedUpdate::BoardOrder {
                board_id: board_id.clone(),
                ordered: previous.clone(),
                previous: ordered.clone(),
            },
            PlannedUpdate::ColumnTasks {
                column_id,
                task_ids,
                previous,
            } => PlannedUpdate::ColumnTasks {
                column_id: column_id.clone(),
                task_ids: previous.clone(),
                previous: task_ids.clone(),
            },
        }
    }
}

impl std::fmt::Display for PlannedUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannedUpdate::BoardOrder { board_id, .. } => write!(f, "board {}", board_id),
            PlannedUpdate::ColumnTasks { column_id, .. } => write!(f, "column {}", column_id),
        }
    }
}

/// Ordered list of updates. Applied front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReorderPlan {
    pub updates: Vec<PlannedUpdate>,
}

impl ReorderPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedUpdate> {
        self.updates.iter()
    }

    /// Collections to refetch once the plan has been written, without duplicates.
    pub fn affected_collections(&self) -> Vec<Collection> {
        let mut collections = Vec::new();
        for update in &self.updates {
            let collection = update.collection();
            if !collections.contains(&collection) {
                collections.push(collection);
            }
        }
        collections
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDrag {
    #[error("Column {0} is not on the board")]
    UnknownColumn(String),

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Expected {expected} at the source position, found {found}")]
    DraggedIdMismatch { expected: String, found: String },
}

/// Resolve a drag into a plan. Invalid drags are logged and treated as aborted.
pub fn resolve(view: &BoardView, event: &DragEvent) -> ReorderPlan {
    match try_resolve(view, event) {
        Ok(plan) => plan,
        Err(e) => {
            log::warn!(
                target: "kanban.reorder",
                "Ignoring drag of {} on board {}: {}",
                event.dragged_id,
                view.board.id,
                e
            );
            ReorderPlan::empty()
        }
    }
}

/// Like [`resolve`], but reports why an event couldn't be planned.
pub fn try_resolve(view: &BoardView, event: &DragEvent) -> Result<ReorderPlan, InvalidDrag> {
    let Some(destination) = event.destination.as_ref() else {
        return Ok(ReorderPlan::empty());
    };
    if event.is_noop() {
        return Ok(ReorderPlan::empty());
    }

    let updates = match event.kind {
        DragKind::Column => vec![plan_column_move(view, event, destination)?],
        DragKind::Task => plan_task_move(view, event, destination)?,
    };
    Ok(ReorderPlan { updates })
}

fn plan_column_move(
    view: &BoardView,
    event: &DragEvent,
    destination: &DragLocation,
) -> Result<PlannedUpdate, InvalidDrag> {
    let previous = view.board.ordered.clone();
    let ordered = move_within(
        &previous,
        event.source.index,
        destination.index,
        &event.dragged_id,
    )?;
    Ok(PlannedUpdate::BoardOrder {
        board_id: view.board.id.clone(),
        ordered,
        previous,
    })
}

fn plan_task_move(
    view: &BoardView,
    event: &DragEvent,
    destination: &DragLocation,
) -> Result<Vec<PlannedUpdate>, InvalidDrag> {
    let source_column = view
        .columns
        .get(&event.source.container_id)
        .ok_or_else(|| InvalidDrag::UnknownColumn(event.source.container_id.clone()))?;
    let destination_column = view
        .columns
        .get(&destination.container_id)
        .ok_or_else(|| InvalidDrag::UnknownColumn(destination.container_id.clone()))?;

    if source_column.id == destination_column.id {
        let task_ids = move_within(
            &source_column.task_ids,
            event.source.index,
            destination.index,
            &event.dragged_id,
        )?;
        return Ok(vec![PlannedUpdate::ColumnTasks {
            column_id: source_column.id.clone(),
            task_ids,
            previous: source_column.task_ids.clone(),
        }]);
    }

    let mut source_ids = source_column.task_ids.clone();
    take_at(&mut source_ids, event.source.index, &event.dragged_id)?;

    let mut destination_ids = destination_column.task_ids.clone();
    insert_at(&mut destination_ids, destination.index, &event.dragged_id)?;

    Ok(vec![
        PlannedUpdate::ColumnTasks {
            column_id: source_column.id.clone(),
            task_ids: source_ids,
            previous: source_column.task_ids.clone(),
        },
        PlannedUpdate::ColumnTasks {
            column_id: destination_column.id.clone(),
            task_ids: destination_ids,
            previous: destination_column.task_ids.clone(),
        },
    ])
}

/// Remove at `from`, then insert `dragged` at `to` (indexing the shortened list).
fn move_within(
    ids: &[String],
    from: usize,
    to: usize,
    dragged: &str,
) -> Result<Vec<String>, InvalidDrag> {
    let mut next = ids.to_vec();
    take_at(&mut next, from, dragged)?;
    insert_at(&mut next, to, dragged)?;
    Ok(next)
}

fn take_at(ids: &mut Vec<String>, index: usize, dragged: &str) -> Result<(), InvalidDrag> {
    if index >= ids.len() {
        return Err(InvalidDrag::IndexOutOfRange {
            index,
            len: ids.len(),
        });
    }
    if ids[index] != dragged {
        return Err(InvalidDrag::DraggedIdMismatch {
            expected: dragged.to_string(),
            found: ids[index].clone(),
        });
    }
    ids.remove(index);
    Ok(())
}

fn insert_at(ids: &mut Vec<String>, index: usize, dragged: &str) -> Result<(), InvalidDrag> {
    if index > ids.len() {
        return Err(InvalidDrag::IndexOutOfRange {
            index,
            len: ids.len(),
        });
    }
    ids.insert(index, dragged.to_string());
    Ok(())
}
