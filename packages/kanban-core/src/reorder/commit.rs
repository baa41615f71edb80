/// Reorder commit.
///
/// Applies a plan through a `ReorderStore`, one update at a time and in
/// order. There is no transaction across updates, so a cross-column move is
/// a two-step saga:
/// - first write fails  -> stop, nothing else is sent
/// - second write fails -> restore the first column, report `PartialMove`
///
/// No optimistic state is kept. Once any write reached the server the
/// affected collections are invalidated so the read model refetches the
/// truth, whether the commit succeeded or not.

use super::plan::{PlannedUpdate, ReorderPlan};
use crate::store::{Collection, ReadModel, ReorderStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitOutcome {
    /// Number of updates written.
    pub applied: usize,
    pub invalidated: Vec<Collection>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitError {
    #[error("Failed to save {target}: {source}")]
    Failed { target: String, source: StoreError },

    #[error("Task left {moved_from} but did not reach {moved_to} (restored: {compensated}): {source}")]
    PartialMove {
        moved_from: String,
        moved_to: String,
        compensated: bool,
        source: StoreError,
    },
}

impl CommitError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            CommitError::Failed { source, .. } => source,
            CommitError::PartialMove { source, .. } => source,
        }
    }
}

pub async fn commit<S, R>(
    plan: &ReorderPlan,
    store: &S,
    read_model: &R,
) -> Result<CommitOutcome, CommitError>
where
    S: ReorderStore,
    R: ReadModel,
{
    if plan.is_empty() {
        return Ok(CommitOutcome::default());
    }

    let mut applied: Vec<&PlannedUpdate> = Vec::with_capacity(plan.len());
    for update in plan.iter() {
        if let Err(source) = apply(store, update).await {
            log::warn!(target: "kanban.reorder", "Failed to save {}: {}", update, source);

            let Some(first) = applied.first() else {
                return Err(CommitError::Failed {
                    target: update.to_string(),
                    source,
                });
            };

            let compensated = compensate(store, &applied).await;
            invalidate(plan, read_model);
            return Err(CommitError::PartialMove {
                moved_from: first.target_id().to_string(),
                moved_to: update.target_id().to_string(),
                compensated,
                source,
            });
        }
        applied.push(update);
    }

    log::debug!(target: "kanban.reorder", "Committed {} update(s)", applied.len());
    Ok(CommitOutcome {
        applied: applied.len(),
        invalidated: invalidate(plan, read_model),
    })
}

async fn apply<S: ReorderStore>(store: &S, update: &PlannedUpdate) -> Result<(), StoreError> {
    match update {
        PlannedUpdate::BoardOrder {
            board_id, ordered, ..
        } => store.update_board_order(board_id, ordered).await,
        PlannedUpdate::ColumnTasks {
            column_id,
            task_ids,
            ..
        } => store.update_column_tasks(column_id, task_ids).await,
    }
}

/// Undo applied updates, newest first. Returns true when every undo succeeded.
async fn compensate<S: ReorderStore>(store: &S, applied: &[&PlannedUpdate]) -> bool {
    let mut restored = true;
    for update in applied.iter().rev() {
        if let Err(e) = apply(store, &update.reverted()).await {
            log::error!(
                target: "kanban.reorder",
                "Failed to restore {} after partial move: {}",
                update,
                e
            );
            restored = false;
        }
    }
    restored
}

fn invalidate<R: ReadModel>(plan: &ReorderPlan, read_model: &R) -> Vec<Collection> {
    let collections = plan.affected_collections();
    for collection in &collections {
        read_model.invalidate(*collection);
    }
    collections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::{resolve, DragEvent, DragLocation};
    use crate::view::assemble;
    use crate::view::tests::{board, column, task};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Board(String, Vec<String>),
        Column(String, Vec<String>),
    }

    #[derive(Default)]
    struct FakeStore {
        calls: Mutex<Vec<Call>>,
        /// 1-based call numbers that fail.
        fail_on: Vec<usize>,
    }

    impl FakeStore {
        fn failing(fail_on: &[usize]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: fail_on.to_vec(),
            }
        }

        fn record(&self, call: Call) -> Result<(), StoreError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            if self.fail_on.contains(&calls.len()) {
                Err(StoreError::Transport("connection reset".to_string()))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReorderStore for FakeStore {
        async fn update_board_order(
            &self,
            board_id: &str,
            ordered: &[String],
        ) -> Result<(), StoreError> {
            self.record(Call::Board(board_id.to_string(), ordered.to_vec()))
        }

        async fn update_column_tasks(
            &self,
            column_id: &str,
            task_ids: &[String],
        ) -> Result<(), StoreError> {
            self.record(Call::Column(column_id.to_string(), task_ids.to_vec()))
        }
    }

    #[derive(Default)]
    struct FakeReadModel {
        invalidated: Mutex<Vec<Collection>>,
    }

    impl ReadModel for FakeReadModel {
        fn invalidate(&self, collection: Collection) {
            self.invalidated.lock().unwrap().push(collection);
        }
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn two_column_view() -> crate::view::BoardView {
        let columns = vec![
            column("c1", "b1", false, &["t1"]),
            column("c2", "b1", false, &[]),
        ];
        assemble(
            Some("b1"),
            &[board("b1", &["c1", "c2"])],
            &columns,
            &[task("t1")],
        )
        .unwrap()
    }

    fn cross_move() -> DragEvent {
        DragEvent::task(
            "t1",
            DragLocation::new("c1", 0),
            Some(DragLocation::new("c2", 0)),
        )
    }

    #[tokio::test]
    async fn test_empty_plan_issues_nothing() {
        let store = FakeStore::default();
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        let aborted = DragEvent::task("t1", DragLocation::new("c1", 0), None);
        let outcome = commit(&resolve(&view, &aborted), &store, &read_model)
            .await
            .unwrap();

        assert_eq!(outcome, CommitOutcome::default());
        assert!(store.calls().is_empty());
        assert!(read_model.invalidated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_column_end_to_end() {
        let store = FakeStore::default();
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        let outcome = commit(&resolve(&view, &cross_move()), &store, &read_model)
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::Column("c1".to_string(), vec![]),
                Call::Column("c2".to_string(), ids(&["t1"])),
            ]
        );
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.invalidated, vec![Collection::Columns]);
        assert_eq!(
            *read_model.invalidated.lock().unwrap(),
            vec![Collection::Columns]
        );
    }

    #[tokio::test]
    async fn test_column_move_invalidates_boards() {
        let store = FakeStore::default();
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        commit(&resolve(&view, &DragEvent::column("c2", 1, 0)), &store, &read_model)
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Board("b1".to_string(), ids(&["c2", "c1"]))]
        );
        assert_eq!(
            *read_model.invalidated.lock().unwrap(),
            vec![Collection::Boards]
        );
    }

    #[tokio::test]
    async fn test_first_failure_stops_saga() {
        let store = FakeStore::failing(&[1]);
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        let err = commit(&resolve(&view, &cross_move()), &store, &read_model)
            .await
            .unwrap_err();

        assert!(matches!(err, CommitError::Failed { ref target, .. } if target == "column c1"));
        assert_eq!(store.calls().len(), 1);
        assert!(read_model.invalidated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_failure_restores_source() {
        let store = FakeStore::failing(&[2]);
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        let err = commit(&resolve(&view, &cross_move()), &store, &read_model)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CommitError::PartialMove {
                moved_from: "c1".to_string(),
                moved_to: "c2".to_string(),
                compensated: true,
                source: StoreError::Transport("connection reset".to_string()),
            }
        );
        assert_eq!(
            store.calls(),
            vec![
                Call::Column("c1".to_string(), vec![]),
                Call::Column("c2".to_string(), ids(&["t1"])),
                Call::Column("c1".to_string(), ids(&["t1"])),
            ]
        );
        assert_eq!(
            *read_model.invalidated.lock().unwrap(),
            vec![Collection::Columns]
        );
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported() {
        let store = FakeStore::failing(&[2, 3]);
        let read_model = FakeReadModel::default();
        let view = two_column_view();

        let err = commit(&resolve(&view, &cross_move()), &store, &read_model)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommitError::PartialMove {
                compensated: false,
                ..
            }
        ));
        assert_eq!(store.calls().len(), 3);
    }
}
