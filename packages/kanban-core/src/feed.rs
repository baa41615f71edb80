/// Viewer-scoped helpers for the UI shell: which boards and notifications a
/// viewer sees, the board selected on first load, and the archived task list.
///
/// The role flag is trusted as given. Nothing here reads global state; the
/// viewer is always passed in.

use serde::Serialize;

use crate::types::{
    KanbanBoard, KanbanColumn, KanbanTask, Notification, Role, User, UserId, ANONYMOUS_USER,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<UserId>,
    pub name: String,
    pub role: Role,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            name: ANONYMOUS_USER.to_string(),
            role: Role::User,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            name: user.name.clone(),
            role: user.permissions,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none() && self.name == ANONYMOUS_USER
    }

    fn is(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

pub fn can_view_board(board: &KanbanBoard, viewer: &Viewer) -> bool {
    viewer.is_admin() || board.users_ids.iter().any(|id| viewer.is(id))
}

pub fn visible_boards<'a>(boards: &'a [KanbanBoard], viewer: &Viewer) -> Vec<&'a KanbanBoard> {
    boards
        .iter()
        .filter(|board| can_view_board(board, viewer))
        .collect()
}

/// Board to select when nothing is selected yet: the first one the viewer can see.
pub fn default_board<'a>(boards: &'a [KanbanBoard], viewer: &Viewer) -> Option<&'a str> {
    boards
        .iter()
        .find(|board| can_view_board(board, viewer))
        .map(|board| board.id.as_str())
}

pub fn visible_notifications<'a>(
    notifications: &'a [Notification],
    viewer: &Viewer,
) -> Vec<&'a Notification> {
    notifications
        .iter()
        .filter(|n| {
            viewer.is_admin()
                || viewer
                    .user_id
                    .as_deref()
                    .is_some_and(|id| n.is_assigned_to(id))
        })
        .collect()
}

pub fn has_unread(notifications: &[Notification], viewer: &Viewer) -> bool {
    visible_notifications(notifications, viewer)
        .iter()
        .any(|n| !n.view)
}

/// One task's notifications, as the notification dialog lists them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNotifications {
    pub task: KanbanTask,
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// Group notifications under their task, in task order. Tasks with no
/// notifications are left out, and so are notifications whose task is unknown.
pub fn notifications_by_task(
    tasks: &[KanbanTask],
    notifications: &[Notification],
) -> Vec<TaskNotifications> {
    tasks
        .iter()
        .filter_map(|task| {
            let notifications: Vec<Notification> = notifications
                .iter()
                .filter(|n| n.task_id.as_deref() == Some(task.id.as_str()))
                .cloned()
                .collect();
            if notifications.is_empty() {
                return None;
            }
            let unread = notifications.iter().filter(|n| !n.view).count();
            Some(TaskNotifications {
                task: task.clone(),
                notifications,
                unread,
            })
        })
        .collect()
}

/// An archived task and the name of the column still listing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedTaskRow {
    #[serde(flatten)]
    pub task: KanbanTask,
    /// Empty when no column lists the task.
    pub status: String,
}

pub fn archived_tasks(tasks: &[KanbanTask], columns: &[KanbanColumn]) -> Vec<ArchivedTaskRow> {
    tasks
        .iter()
        .filter(|task| task.archived)
        .map(|task| {
            let status = columns
                .iter()
                .find(|column| column.task_ids.contains(&task.id))
                .map(|column| column.name.clone())
                .unwrap_or_default();
            ArchivedTaskRow {
                task: task.clone(),
                status,
            }
        })
        .collect()
}
