/// Read-through cache over the remote collections.
///
/// Each collection is fetched on first use and kept until invalidated.
/// Invalidation only flags the slot; the refetch happens on the next read.
/// A failed refetch keeps serving the last good copy (or an empty list if
/// there never was one) so the board can still render.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use kanban_core::store::{Collection, ReadModel};
use kanban_core::types::{KanbanBoard, KanbanColumn, KanbanTask, Notification};

use crate::api::ApiError;
use crate::source::CollectionSource;

struct Slot<T> {
    data: RwLock<Option<Arc<Vec<T>>>>,
    stale: AtomicBool,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            data: RwLock::new(None),
            stale: AtomicBool::new(true),
        }
    }

    async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<Vec<T>>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        if !self.stale.load(Ordering::Acquire) {
            if let Some(items) = self.data.read().await.as_ref() {
                return Ok(items.clone());
            }
        }

        let mut guard = self.data.write().await;
        // Another reader may have refetched while we waited for the lock
        if !self.stale.load(Ordering::Acquire) {
            if let Some(items) = guard.as_ref() {
                return Ok(items.clone());
            }
        }

        // Cleared before fetching so an invalidation that lands mid-fetch survives
        self.stale.store(false, Ordering::Release);
        match fetch().await {
            Ok(items) => {
                let items = Arc::new(items);
                *guard = Some(items.clone());
                Ok(items)
            }
            Err(e) => {
                self.stale.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    async fn peek(&self) -> Option<Arc<Vec<T>>> {
        self.data.read().await.clone()
    }

    fn invalidate(&self) {
        self.stale.store(true, Ordering::Release);
    }
}

/// The three collections the board view is assembled from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub boards: Arc<Vec<KanbanBoard>>,
    pub columns: Arc<Vec<KanbanColumn>>,
    pub tasks: Arc<Vec<KanbanTask>>,
}

pub struct CollectionCache<S> {
    source: Arc<S>,
    boards: Slot<KanbanBoard>,
    columns: Slot<KanbanColumn>,
    tasks: Slot<KanbanTask>,
    notifications: Slot<Notification>,
}

impl<S: CollectionSource> CollectionCache<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            boards: Slot::new(),
            columns: Slot::new(),
            tasks: Slot::new(),
            notifications: Slot::new(),
        }
    }

    pub async fn boards(&self) -> Result<Arc<Vec<KanbanBoard>>, ApiError> {
        self.boards.get_or_fetch(|| self.source.fetch_boards()).await
    }

    pub async fn columns(&self) -> Result<Arc<Vec<KanbanColumn>>, ApiError> {
        self.columns.get_or_fetch(|| self.source.fetch_columns()).await
    }

    pub async fn tasks(&self) -> Result<Arc<Vec<KanbanTask>>, ApiError> {
        self.tasks.get_or_fetch(|| self.source.fetch_tasks()).await
    }

    pub async fn notifications(&self) -> Result<Arc<Vec<Notification>>, ApiError> {
        self.notifications
            .get_or_fetch(|| self.source.fetch_notifications())
            .await
    }

    /// Current boards, columns and tasks. Never fails: a collection that
    /// can't be fetched falls back to its last copy or to empty.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            boards: or_last(self.boards().await, &self.boards, Collection::Boards).await,
            columns: or_last(self.columns().await, &self.columns, Collection::Columns).await,
            tasks: or_last(self.tasks().await, &self.tasks, Collection::Tasks).await,
        }
    }

    /// Cached board, without fetching.
    pub async fn cached_board(&self, board_id: &str) -> Option<KanbanBoard> {
        self.boards
            .peek()
            .await?
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
    }

    /// Cached column, without fetching.
    pub async fn cached_column(&self, column_id: &str) -> Option<KanbanColumn> {
        self.columns
            .peek()
            .await?
            .iter()
            .find(|c| c.id == column_id)
            .cloned()
    }

    pub fn is_stale(&self, collection: Collection) -> bool {
        let stale = match collection {
            Collection::Boards => &self.boards.stale,
            Collection::Columns => &self.columns.stale,
            Collection::Tasks => &self.tasks.stale,
            Collection::Notifications => &self.notifications.stale,
        };
        stale.load(Ordering::Acquire)
    }
}

async fn or_last<T>(
    fetched: Result<Arc<Vec<T>>, ApiError>,
    slot: &Slot<T>,
    collection: Collection,
) -> Arc<Vec<T>> {
    match fetched {
        Ok(items) => items,
        Err(e) => {
            log::warn!(
                target: "kanban.client.cache",
                "Refetch of {:?} failed, serving last copy: {}",
                collection,
                e
            );
            slot.peek().await.unwrap_or_default()
        }
    }
}

impl<S: CollectionSource> ReadModel for CollectionCache<S> {
    fn invalidate(&self, collection: Collection) {
        log::debug!(target: "kanban.client.cache", "Invalidated {:?}", collection);
        match collection {
            Collection::Boards => self.boards.invalidate(),
            Collection::Columns => self.columns.invalidate(),
            Collection::Tasks => self.tasks.invalidate(),
            Collection::Notifications => self.notifications.invalidate(),
        }
    }
}
