/// Board view assembly.
///
/// Joins the flat board, column and task collections into one read-only
/// snapshot for the selected board:
/// - columns: non-archived columns owned by the board, keyed by id
/// - tasks: tasks listed in some retained column's `taskIds`, keyed by id
///
/// The snapshot is rebuilt whenever an input changes, never patched.
/// `ViewCache` skips the rebuild when the inputs fingerprint the same.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{ColumnId, KanbanBoard, KanbanColumn, KanbanTask, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    #[serde(flatten)]
    pub board: KanbanBoard,
    pub columns: BTreeMap<ColumnId, KanbanColumn>,
    pub tasks: BTreeMap<TaskId, KanbanTask>,
}

impl BoardView {
    /// Retained columns in the board's display order.
    /// Ids in `ordered` that don't resolve (archived, foreign, not loaded) are skipped.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &KanbanColumn> {
        self.board
            .ordered
            .iter()
            .filter_map(|id| self.columns.get(id))
    }

    /// Resolved tasks of one column in `taskIds` order.
    pub fn column_tasks<'a>(&'a self, column_id: &str) -> impl Iterator<Item = &'a KanbanTask> {
        self.columns
            .get(column_id)
            .into_iter()
            .flat_map(|column| column.task_ids.iter())
            .filter_map(|id| self.tasks.get(id))
    }
}

/// Build the view for `selected`. Returns `None` when nothing is selected or
/// the board isn't in `boards`. Collections that haven't loaded yet are
/// passed as empty slices and simply yield empty maps.
pub fn assemble(
    selected: Option<&str>,
    boards: &[KanbanBoard],
    columns: &[KanbanColumn],
    tasks: &[KanbanTask],
) -> Option<BoardView> {
    let selected = selected?;
    let board = boards.iter().find(|board| board.id == selected)?;

    let columns: BTreeMap<ColumnId, KanbanColumn> = columns
        .iter()
        .filter(|column| column.board_id == selected && !column.archived)
        .map(|column| (column.id.clone(), column.clone()))
        .collect();

    let reachable: HashSet<&str> = columns
        .values()
        .flat_map(|column| column.task_ids.iter().map(String::as_str))
        .collect();

    let tasks: BTreeMap<TaskId, KanbanTask> = tasks
        .iter()
        .filter(|task| reachable.contains(task.id.as_str()))
        .map(|task| (task.id.clone(), task.clone()))
        .collect();

    Some(BoardView {
        board: board.clone(),
        columns,
        tasks,
    })
}

/// SHA-256 over the serialized assembly inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewFingerprint(pub String);

impl ViewFingerprint {
    pub fn of(
        selected: Option<&str>,
        boards: &[KanbanBoard],
        columns: &[KanbanColumn],
        tasks: &[KanbanTask],
    ) -> Result<Self, serde_json::Error> {
        let mut hasher = Sha256::new();
        serde_json::to_writer(&mut hasher, &(selected, boards, columns, tasks))?;
        Ok(Self(hex::encode(hasher.finalize())))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes the last assembled view.
#[derive(Debug, Default)]
pub struct ViewCache {
    last: Option<(ViewFingerprint, Option<Arc<BoardView>>)>,
    stats: CacheStats,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached view when the inputs are unchanged, otherwise
    /// reassemble and remember the result.
    pub fn get_or_assemble(
        &mut self,
        selected: Option<&str>,
        boards: &[KanbanBoard],
        columns: &[KanbanColumn],
        tasks: &[KanbanTask],
    ) -> Option<Arc<BoardView>> {
        let fingerprint = match ViewFingerprint::of(selected, boards, columns, tasks) {
            Ok(fp) => fp,
            Err(e) => {
                log::warn!(target: "kanban.view", "Failed to fingerprint view inputs: {}", e);
                self.last = None;
                self.stats.misses += 1;
                return assemble(selected, boards, columns, tasks).map(Arc::new);
            }
        };

        if let Some((cached_fp, view)) = &self.last {
            if *cached_fp == fingerprint {
                self.stats.hits += 1;
                return view.clone();
            }
        }

        self.stats.misses += 1;
        let view = assemble(selected, boards, columns, tasks).map(Arc::new);
        log::debug!(
            target: "kanban.view",
            "Assembled view for {:?}: {} columns, {} tasks",
            selected,
            view.as_ref().map_or(0, |v| v.columns.len()),
            view.as_ref().map_or(0, |v| v.tasks.len())
        );
        self.last = Some((fingerprint, view.clone()));
        view
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
