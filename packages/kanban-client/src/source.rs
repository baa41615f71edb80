use std::future::Future;

use kanban_core::types::{KanbanBoard, KanbanColumn, KanbanTask, NewTask, Notification};

use crate::api::ApiError;

/// Read side of the remote API: whole collections, refetched on invalidation.
pub trait CollectionSource: Send + Sync {
    fn fetch_boards(&self) -> impl Future<Output = Result<Vec<KanbanBoard>, ApiError>> + Send;
    fn fetch_columns(&self) -> impl Future<Output = Result<Vec<KanbanColumn>, ApiError>> + Send;
    fn fetch_tasks(&self) -> impl Future<Output = Result<Vec<KanbanTask>, ApiError>> + Send;
    fn fetch_notifications(
        &self,
    ) -> impl Future<Output = Result<Vec<Notification>, ApiError>> + Send;

    /// One task, bypassing the cache.
    fn fetch_task(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<KanbanTask, ApiError>> + Send;
}

/// Write side: full-entity replacement plus task create/delete.
///
/// Replacements succeed on any 2xx; whatever body comes back is ignored and
/// the read side refetches.
pub trait EntityWriter: Send + Sync {
    fn put_board(&self, board: &KanbanBoard) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn put_column(
        &self,
        column: &KanbanColumn,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn put_task(&self, task: &KanbanTask) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn put_notification(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Returns the created task; its server-assigned id is needed to place it.
    fn create_task(
        &self,
        task: &NewTask,
    ) -> impl Future<Output = Result<KanbanTask, ApiError>> + Send;
    fn delete_task(&self, task_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}
