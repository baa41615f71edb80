use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{ColumnId, TaskId};

/// A remote collection the read model caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Boards,
    Columns,
    Tasks,
    Notifications,
}

/// Persistence calls issued when a reorder is committed.
/// Implementations: the REST session in `kanban-client`, in-memory fakes in tests.
pub trait ReorderStore: Send + Sync {
    /// Replace a board's column order.
    fn update_board_order(
        &self,
        board_id: &str,
        ordered: &[ColumnId],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace a column's task order.
    fn update_column_tasks(
        &self,
        column_id: &str,
        task_ids: &[TaskId],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The cached read side. Invalidated collections are refetched before the
/// next assembly.
pub trait ReadModel: Send + Sync {
    fn invalidate(&self, collection: Collection);
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn board_not_found(board_id: &str) -> Self {
        Self::NotFound(format!("board {}", board_id))
    }

    pub fn column_not_found(column_id: &str) -> Self {
        Self::NotFound(format!("column {}", column_id))
    }
}
