/// One viewer's working session against the API.
///
/// Owns the collection cache and the memoized board view, and is the
/// `ReorderStore` the reorder commit writes through: each order update is
/// sent as the full cached entity with only the order field replaced.
/// The other writes (task create, unarchive, delete, notification read)
/// live here too. Failures are broadcast as transient notices for the UI.

use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use kanban_core::feed::{self, ArchivedTaskRow, TaskNotifications, Viewer};
use kanban_core::reorder::{self, CommitError, CommitOutcome, DragEvent};
use kanban_core::store::{Collection, ReadModel, ReorderStore, StoreError};
use kanban_core::types::{
    BoardId, ColumnId, KanbanBoard, KanbanTask, NewTask, Notification, TaskId,
};
use kanban_core::view::{BoardView, ViewCache};

use crate::cache::CollectionCache;
use crate::source::{CollectionSource, EntityWriter};

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A dismissible message for the UI. Never blocks interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The task exists on the server but no column lists it. `removed` is
    /// true when it was deleted again.
    #[error("Task {task_id} was created but could not be added to column {column_id}: {source}")]
    Unattached {
        task_id: TaskId,
        column_id: ColumnId,
        removed: bool,
        source: StoreError,
    },
}

pub struct KanbanSession<S> {
    source: Arc<S>,
    cache: CollectionCache<S>,
    view_cache: Mutex<ViewCache>,
    viewer: Viewer,
    selected: RwLock<Option<BoardId>>,
    notice_tx: broadcast::Sender<Notice>,
    /// Serializes writes: one drag or task action in flight at a time.
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: CollectionSource + EntityWriter> KanbanSession<S> {
    pub fn new(source: Arc<S>, viewer: Viewer) -> Self {
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            cache: CollectionCache::new(source.clone()),
            source,
            view_cache: Mutex::new(ViewCache::new()),
            viewer,
            selected: RwLock::new(None),
            notice_tx,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn cache(&self) -> &CollectionCache<S> {
        &self.cache
    }

    pub fn select_board(&self, board_id: Option<BoardId>) {
        *self.selected.write().unwrap_or_else(|e| e.into_inner()) = board_id;
    }

    pub fn selected_board(&self) -> Option<BoardId> {
        self.selected
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The view for the selected board. Selects the viewer's first board
    /// when nothing is selected yet.
    pub async fn board_view(&self) -> Option<Arc<BoardView>> {
        let snapshot = self.cache.snapshot().await;

        let selected = match self.selected_board() {
            Some(id) => Some(id),
            None => {
                let default =
                    feed::default_board(&snapshot.boards, &self.viewer).map(str::to_string);
                if default.is_some() {
                    log::info!(
                        target: "kanban.session",
                        "Selected board {:?} for {}",
                        default,
                        self.viewer.name
                    );
                    self.select_board(default.clone());
                }
                default
            }
        };

        self.view_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_or_assemble(
                selected.as_deref(),
                &snapshot.boards,
                &snapshot.columns,
                &snapshot.tasks,
            )
    }

    pub async fn visible_boards(&self) -> Vec<KanbanBoard> {
        let snapshot = self.cache.snapshot().await;
        feed::visible_boards(&snapshot.boards, &self.viewer)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        match self.cache.notifications().await {
            Ok(all) => feed::visible_notifications(&all, &self.viewer)
                .into_iter()
                .cloned()
                .collect(),
            Err(e) => {
                self.notify(NoticeLevel::Error, e.to_string());
                Vec::new()
            }
        }
    }

    pub async fn has_unread_notifications(&self) -> bool {
        self.notifications().await.iter().any(|n| !n.view)
    }

    /// The viewer's notifications grouped per task.
    pub async fn notification_groups(&self) -> Vec<TaskNotifications> {
        let notifications = self.notifications().await;
        let snapshot = self.cache.snapshot().await;
        feed::notifications_by_task(&snapshot.tasks, &notifications)
    }

    pub async fn archived_tasks(&self) -> Vec<ArchivedTaskRow> {
        let snapshot = self.cache.snapshot().await;
        feed::archived_tasks(&snapshot.tasks, &snapshot.columns)
    }

    /// Resolve a finished drag against the current view and persist it.
    /// No-op and invalid drags write nothing.
    pub async fn handle_drag_end(&self, event: &DragEvent) -> Result<CommitOutcome, CommitError> {
        let _in_flight = self.write_lock.lock().await;

        if event.is_noop() {
            return Ok(CommitOutcome::default());
        }
        let Some(view) = self.board_view().await else {
            log::debug!(
                target: "kanban.session",
                "Drag of {} with no board selected",
                event.dragged_id
            );
            return Ok(CommitOutcome::default());
        };

        let plan = reorder::resolve(&view, event);
        reorder::commit(&plan, self, &self.cache)
            .await
            .inspect_err(|e| {
                let level = match e {
                    // nothing was lost, the task is back where it started
                    CommitError::PartialMove {
                        compensated: true, ..
                    } => NoticeLevel::Warning,
                    _ => NoticeLevel::Error,
                };
                self.notify(level, e.to_string())
            })
    }

    /// [`handle_drag_end`](Self::handle_drag_end) for the raw payload from
    /// the drag-and-drop layer. A malformed payload writes nothing.
    pub async fn handle_drag_payload(
        &self,
        payload: &serde_json::Value,
    ) -> Result<CommitOutcome, CommitError> {
        match DragEvent::parse(payload) {
            Some(event) => self.handle_drag_end(&event).await,
            None => Ok(CommitOutcome::default()),
        }
    }

    /// Set `view` on one notification and refetch the feed.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), StoreError> {
        let _in_flight = self.write_lock.lock().await;
        self.put_notification_read(notification_id)
            .await
            .inspect_err(|e| self.notify(NoticeLevel::Error, e.to_string()))
    }

    async fn put_notification_read(&self, notification_id: &str) -> Result<(), StoreError> {
        let mut notification = self
            .cache
            .notifications()
            .await?
            .iter()
            .find(|n| n.id == notification_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?;
        if notification.view {
            return Ok(());
        }
        notification.view = true;
        self.source.put_notification(&notification).await?;
        self.cache.invalidate(Collection::Notifications);
        Ok(())
    }

    /// Create a task and append it to `column_id`. A blank name creates
    /// nothing. If the column can't be updated the new task is deleted again.
    pub async fn create_task(
        &self,
        column_id: &str,
        name: &str,
    ) -> Result<Option<KanbanTask>, ActionError> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        let _in_flight = self.write_lock.lock().await;
        self.create_in_column(column_id, name)
            .await
            .map(Some)
            .inspect_err(|e| {
                let level = match e {
                    ActionError::Unattached { removed: true, .. } => NoticeLevel::Warning,
                    _ => NoticeLevel::Error,
                };
                self.notify(level, e.to_string())
            })
    }

    async fn create_in_column(
        &self,
        column_id: &str,
        name: &str,
    ) -> Result<KanbanTask, ActionError> {
        let mut column = self
            .cache
            .columns()
            .await
            .map_err(StoreError::from)?
            .iter()
            .find(|c| c.id == column_id)
            .cloned()
            .ok_or_else(|| StoreError::column_not_found(column_id))?;

        let author = self
            .viewer
            .user_id
            .clone()
            .unwrap_or_else(|| self.viewer.name.clone());
        let created = self
            .source
            .create_task(&NewTask::named(name, &author, Utc::now()))
            .await
            .map_err(StoreError::from)?;
        self.cache.invalidate(Collection::Tasks);

        column.task_ids.push(created.id.clone());
        if let Err(e) = self.source.put_column(&column).await {
            let removed = match self.source.delete_task(&created.id).await {
                Ok(()) => true,
                Err(delete_err) => {
                    log::error!(
                        target: "kanban.session",
                        "Task {} is orphaned: delete after failed placement failed: {}",
                        created.id,
                        delete_err
                    );
                    false
                }
            };
            return Err(ActionError::Unattached {
                task_id: created.id,
                column_id: column_id.to_string(),
                removed,
                source: e.into(),
            });
        }
        self.cache.invalidate(Collection::Columns);

        log::info!(
            target: "kanban.session",
            "Created task {} in column {}",
            created.id,
            column_id
        );
        Ok(created)
    }

    /// Clear `archived` on a task, starting from the server's current copy.
    pub async fn unarchive_task(&self, task_id: &str) -> Result<(), StoreError> {
        let _in_flight = self.write_lock.lock().await;
        self.put_unarchived(task_id)
            .await
            .inspect_err(|e| self.notify(NoticeLevel::Error, e.to_string()))
    }

    async fn put_unarchived(&self, task_id: &str) -> Result<(), StoreError> {
        let mut task = self.source.fetch_task(task_id).await?;
        task.archived = false;
        self.source.put_task(&task).await?;
        self.cache.invalidate(Collection::Tasks);
        Ok(())
    }

    /// Delete a task, then drop its id from the column still listing it.
    /// A failed detach is logged; the dangling id is skipped by the view.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let _in_flight = self.write_lock.lock().await;
        self.delete_and_detach(task_id)
            .await
            .inspect_err(|e| self.notify(NoticeLevel::Error, e.to_string()))
    }

    async fn delete_and_detach(&self, task_id: &str) -> Result<(), StoreError> {
        self.source.delete_task(task_id).await?;
        self.cache.invalidate(Collection::Tasks);

        let holder = match self.cache.columns().await {
            Ok(columns) => columns
                .iter()
                .find(|c| c.task_ids.iter().any(|id| id == task_id))
                .cloned(),
            Err(e) => {
                log::warn!(target: "kanban.session", "Can't detach deleted task {}: {}", task_id, e);
                None
            }
        };
        if let Some(mut column) = holder {
            column.task_ids.retain(|id| id != task_id);
            match self.source.put_column(&column).await {
                Ok(()) => self.cache.invalidate(Collection::Columns),
                Err(e) => log::warn!(
                    target: "kanban.session",
                    "Deleted task {} is still listed in column {}: {}",
                    task_id,
                    column.id,
                    e
                ),
            }
        }
        Ok(())
    }

    fn notify(&self, level: NoticeLevel, message: String) {
        // No subscribers is fine: nothing is showing notices.
        let _ = self.notice_tx.send(Notice { level, message });
    }
}

impl<S: CollectionSource + EntityWriter> ReorderStore for KanbanSession<S> {
    async fn update_board_order(
        &self,
        board_id: &str,
        ordered: &[ColumnId],
    ) -> Result<(), StoreError> {
        let mut board = self
            .cache
            .cached_board(board_id)
            .await
            .ok_or_else(|| StoreError::board_not_found(board_id))?;
        board.ordered = ordered.to_vec();
        self.source.put_board(&board).await?;
        Ok(())
    }

    async fn update_column_tasks(
        &self,
        column_id: &str,
        task_ids: &[TaskId],
    ) -> Result<(), StoreError> {
        let mut column = self
            .cache
            .cached_column(column_id)
            .await
            .ok_or_else(|| StoreError::column_not_found(column_id))?;
        column.task_ids = task_ids.to_vec();
        self.source.put_column(&column).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::cache::tests::{column, FakeSource};
    use kanban_core::reorder::DragLocation;
    use kanban_core::types::{KanbanColumn, Role};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// FakeSource plus a write log, optionally rejecting writes to one column.
    #[derive(Default)]
    struct FakeApi {
        read: FakeSource,
        writes: Mutex<Vec<(String, Vec<String>)>>,
        deleted: Mutex<Vec<String>>,
        next_id: AtomicUsize,
        reject_column: Option<String>,
    }

    impl CollectionSource for FakeApi {
        async fn fetch_boards(&self) -> Result<Vec<KanbanBoard>, ApiError> {
            self.read.fetch_boards().await
        }

        async fn fetch_columns(&self) -> Result<Vec<KanbanColumn>, ApiError> {
            self.read.fetch_columns().await
        }

        async fn fetch_tasks(&self) -> Result<Vec<KanbanTask>, ApiError> {
            self.read.fetch_tasks().await
        }

        async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
            self.read.fetch_notifications().await
        }

        async fn fetch_task(&self, task_id: &str) -> Result<KanbanTask, ApiError> {
            self.read.fetch_task(task_id).await
        }
    }

    impl EntityWriter for FakeApi {
        async fn put_board(&self, board: &KanbanBoard) -> Result<(), ApiError> {
            self.writes
                .lock()
                .unwrap()
                .push((board.id.clone(), board.ordered.clone()));
            let mut boards = self.read.boards.lock().unwrap();
            if let Some(stored) = boards.iter_mut().find(|b| b.id == board.id) {
                *stored = board.clone();
            }
            Ok(())
        }

        async fn put_column(&self, column: &KanbanColumn) -> Result<(), ApiError> {
            if self.reject_column.as_deref() == Some(column.id.as_str()) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "Column update failed".to_string(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((column.id.clone(), column.task_ids.clone()));
            let mut columns = self.read.columns.lock().unwrap();
            if let Some(stored) = columns.iter_mut().find(|c| c.id == column.id) {
                *stored = column.clone();
            }
            Ok(())
        }

        async fn put_task(&self, task: &KanbanTask) -> Result<(), ApiError> {
            let mut tasks = self.read.tasks.lock().unwrap();
            if let Some(stored) = tasks.iter_mut().find(|t| t.id == task.id) {
                *stored = task.clone();
            }
            Ok(())
        }

        async fn put_notification(&self, notification: &Notification) -> Result<(), ApiError> {
            let mut notifications = self.read.notifications.lock().unwrap();
            if let Some(stored) = notifications.iter_mut().find(|n| n.id == notification.id) {
                *stored = notification.clone();
            }
            Ok(())
        }

        async fn create_task(&self, new: &NewTask) -> Result<KanbanTask, ApiError> {
            let id = format!("new{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut created = task(&id);
            created.name = new.name.clone();
            created.user_id = Some(new.user_id.clone());
            self.read.tasks.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
            self.deleted.lock().unwrap().push(task_id.to_string());
            self.read.tasks.lock().unwrap().retain(|t| t.id != task_id);
            Ok(())
        }
    }

    fn board(id: &str, ordered: &[&str], users: &[&str]) -> KanbanBoard {
        KanbanBoard {
            id: id.to_string(),
            name: id.to_uppercase(),
            column_ids: ordered.iter().map(|s| s.to_string()).collect(),
            ordered: ordered.iter().map(|s| s.to_string()).collect(),
            users_ids: users.iter().map(|s| s.to_string()).collect(),
            extra: Default::default(),
        }
    }

    fn task(id: &str) -> KanbanTask {
        serde_json::from_value(serde_json::json!({ "_id": id, "name": id })).unwrap()
    }

    fn member() -> Viewer {
        Viewer {
            user_id: Some("u1".to_string()),
            name: "ana".to_string(),
            role: Role::User,
        }
    }

    fn seeded(reject_column: Option<&str>) -> Arc<FakeApi> {
        let api = FakeApi {
            reject_column: reject_column.map(str::to_string),
            ..FakeApi::default()
        };
        *api.read.boards.lock().unwrap() = vec![
            board("b0", &[], &["u2"]),
            board("b1", &["c1", "c2"], &["u1"]),
        ];
        *api.read.columns.lock().unwrap() =
            vec![column("c1", "b1", &["t1"]), column("c2", "b1", &[])];
        *api.read.tasks.lock().unwrap() = vec![task("t1")];
        Arc::new(api)
    }

    fn cross_move() -> DragEvent {
        DragEvent::task(
            "t1",
            DragLocation::new("c1", 0),
            Some(DragLocation::new("c2", 0)),
        )
    }

    #[tokio::test]
    async fn test_selects_first_visible_board() {
        let session = KanbanSession::new(seeded(None), member());
        let view = session.board_view().await.unwrap();
        assert_eq!(view.board.id, "b1");
        assert_eq!(session.selected_board().as_deref(), Some("b1"));
        assert_eq!(session.visible_boards().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cross_column_drag_persists_and_refetches() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        session.board_view().await.unwrap();

        let outcome = session.handle_drag_end(&cross_move()).await.unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(
            *api.writes.lock().unwrap(),
            vec![
                ("c1".to_string(), vec![]),
                ("c2".to_string(), vec!["t1".to_string()]),
            ]
        );
        assert!(session.cache().is_stale(Collection::Columns));

        let view = session.board_view().await.unwrap();
        assert!(view.columns["c1"].task_ids.is_empty());
        assert_eq!(view.columns["c2"].task_ids, vec!["t1"]);
    }

    #[tokio::test]
    async fn test_column_drag_sends_full_board() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        session.board_view().await.unwrap();

        session
            .handle_drag_end(&DragEvent::column("c2", 1, 0))
            .await
            .unwrap();

        let boards = api.read.boards.lock().unwrap().clone();
        let b1 = boards.iter().find(|b| b.id == "b1").unwrap();
        assert_eq!(b1.ordered, vec!["c2", "c1"]);
        assert_eq!(b1.users_ids, vec!["u1"]);
        assert!(session.cache().is_stale(Collection::Boards));
    }

    #[tokio::test]
    async fn test_noop_drag_writes_nothing() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        let fetches_before = api.read.fetches.load(Ordering::SeqCst);

        let aborted = DragEvent::task("t1", DragLocation::new("c1", 0), None);
        session.handle_drag_end(&aborted).await.unwrap();

        assert!(api.writes.lock().unwrap().is_empty());
        assert_eq!(api.read.fetches.load(Ordering::SeqCst), fetches_before);
    }

    #[tokio::test]
    async fn test_drag_payloads() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());

        let malformed = serde_json::json!({ "type": "DEFAULT", "destination": null });
        let outcome = session.handle_drag_payload(&malformed).await.unwrap();
        assert_eq!(outcome, CommitOutcome::default());
        assert!(api.writes.lock().unwrap().is_empty());

        let cross = serde_json::json!({
            "draggableId": "t1",
            "type": "DEFAULT",
            "source": { "droppableId": "c1", "index": 0 },
            "destination": { "droppableId": "c2", "index": 0 }
        });
        let outcome = session.handle_drag_payload(&cross).await.unwrap();
        assert_eq!(outcome.applied, 2);
    }

    #[tokio::test]
    async fn test_failed_move_is_restored_and_noticed() {
        let api = seeded(Some("c2"));
        let session = KanbanSession::new(api.clone(), member());
        let mut notices = session.subscribe();
        session.board_view().await.unwrap();

        let err = session.handle_drag_end(&cross_move()).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::PartialMove {
                compensated: true,
                ..
            }
        ));

        // source emptied, then restored
        assert_eq!(
            *api.writes.lock().unwrap(),
            vec![
                ("c1".to_string(), vec![]),
                ("c1".to_string(), vec!["t1".to_string()]),
            ]
        );

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("Column update failed"));
    }

    #[tokio::test]
    async fn test_missing_cached_column_is_not_found() {
        let api = seeded(None);
        let session = KanbanSession::new(api, member());
        let result = session.update_column_tasks("c9", &[]).await;
        assert_eq!(result, Err(StoreError::column_not_found("c9")));
    }

    #[tokio::test]
    async fn test_archived_rows_and_notifications() {
        let api = seeded(None);
        let mut archived = task("t1");
        archived.archived = true;
        *api.read.tasks.lock().unwrap() = vec![archived];
        *api.read.notifications.lock().unwrap() = vec![serde_json::from_value(
            serde_json::json!({
                "_id": "n1",
                "title": "Assigned",
                "view": false,
                "assignee": [{ "userId": "u1" }]
            }),
        )
        .unwrap()];

        let session = KanbanSession::new(api, member());
        let rows = session.archived_tasks().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "C1");
        assert!(session.has_unread_notifications().await);
    }

    fn notification(id: &str, task_id: &str, view: bool) -> Notification {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": "Assigned",
            "taskId": task_id,
            "view": view,
            "assignee": [{ "userId": "u1" }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_mark_notification_read() {
        let api = seeded(None);
        *api.read.notifications.lock().unwrap() = vec![notification("n1", "t1", false)];
        let session = KanbanSession::new(api.clone(), member());
        assert!(session.has_unread_notifications().await);

        session.mark_notification_read("n1").await.unwrap();

        assert!(api.read.notifications.lock().unwrap()[0].view);
        assert!(session.cache().is_stale(Collection::Notifications));
        assert!(!session.has_unread_notifications().await);
    }

    #[tokio::test]
    async fn test_mark_unknown_notification_is_not_found() {
        let session = KanbanSession::new(seeded(None), member());
        let mut notices = session.subscribe();
        assert!(matches!(
            session.mark_notification_read("n9").await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_notification_groups_follow_tasks() {
        let api = seeded(None);
        *api.read.tasks.lock().unwrap() = vec![task("t1"), task("t2")];
        *api.read.notifications.lock().unwrap() = vec![
            notification("n1", "t2", false),
            notification("n2", "t2", true),
        ];
        let session = KanbanSession::new(api, member());

        let groups = session.notification_groups().await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].task.id, "t2");
        assert_eq!(groups[0].unread, 1);
    }

    #[tokio::test]
    async fn test_create_task_appends_to_column() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        session.board_view().await.unwrap();

        let created = session
            .create_task("c1", "Write report")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.name, "Write report");
        assert_eq!(created.user_id.as_deref(), Some("u1"));
        assert!(session.cache().is_stale(Collection::Tasks));
        assert!(session.cache().is_stale(Collection::Columns));

        let view = session.board_view().await.unwrap();
        assert_eq!(view.columns["c1"].task_ids, vec!["t1".to_string(), created.id.clone()]);
        assert!(view.tasks.contains_key(&created.id));
    }

    #[tokio::test]
    async fn test_blank_task_name_creates_nothing() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        assert!(session.create_task("c1", "   ").await.unwrap().is_none());
        assert_eq!(api.read.tasks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_created_task_removed_when_column_rejects() {
        let api = seeded(Some("c1"));
        let session = KanbanSession::new(api.clone(), member());
        let mut notices = session.subscribe();

        let err = session.create_task("c1", "Write report").await.unwrap_err();
        let (task_id, removed) = match err {
            ActionError::Unattached {
                task_id, removed, ..
            } => (task_id, removed),
            other => panic!("unexpected error {:?}", other),
        };
        assert!(removed);
        assert_eq!(*api.deleted.lock().unwrap(), vec![task_id]);
        assert_eq!(api.read.tasks.lock().unwrap().len(), 1);
        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_create_in_unknown_column_sends_nothing() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());
        let err = session.create_task("c9", "Write report").await.unwrap_err();
        assert!(matches!(err, ActionError::Store(StoreError::NotFound(_))));
        assert_eq!(api.read.tasks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unarchive_task() {
        let api = seeded(None);
        let mut archived = task("t1");
        archived.archived = true;
        archived.description = "kept".to_string();
        *api.read.tasks.lock().unwrap() = vec![archived];
        let session = KanbanSession::new(api.clone(), member());
        assert_eq!(session.archived_tasks().await.len(), 1);

        session.unarchive_task("t1").await.unwrap();

        let stored = api.read.tasks.lock().unwrap()[0].clone();
        assert!(!stored.archived);
        assert_eq!(stored.description, "kept");
        assert!(session.archived_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_detaches_from_column() {
        let api = seeded(None);
        let session = KanbanSession::new(api.clone(), member());

        session.delete_task("t1").await.unwrap();

        assert_eq!(*api.deleted.lock().unwrap(), vec!["t1".to_string()]);
        assert_eq!(
            *api.writes.lock().unwrap(),
            vec![("c1".to_string(), Vec::<String>::new())]
        );
        assert!(session.cache().is_stale(Collection::Tasks));
        assert!(session.cache().is_stale(Collection::Columns));
    }
}
