/// REST endpoint URLs.
///
///   GET  /boards?userName=..          -> all boards
///   PUT  /boards/{id}?userName=..     -> replace a board
///   GET  /columns                     -> all columns
///   PUT  /columns/{id}?userName=..    -> replace a column
///   GET  /tasks?userName=..           -> all tasks
///   POST /tasks                       -> create a task
///   GET  /tasks/{id}                  -> one task
///   PUT  /tasks/{id}?userName=..      -> replace a task
///   DELETE /tasks/{id}                -> delete a task
///   GET  /notifications               -> notification feed
///   PUT  /notifications/{id}          -> replace a notification
///   GET  /users/{id}                  -> one user

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone in query values and path segments.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    user_query: String,
}

impl Endpoints {
    pub fn new(host_api: &str, user_name: &str) -> Self {
        Self {
            base: host_api.trim_end_matches('/').to_string(),
            user_query: format!("userName={}", encode(user_name)),
        }
    }

    pub fn all_boards(&self) -> String {
        format!("{}/boards?{}", self.base, self.user_query)
    }

    pub fn board(&self, id: &str) -> String {
        format!("{}/boards/{}?{}", self.base, encode(id), self.user_query)
    }

    pub fn all_columns(&self) -> String {
        format!("{}/columns", self.base)
    }

    pub fn column(&self, id: &str) -> String {
        format!("{}/columns/{}?{}", self.base, encode(id), self.user_query)
    }

    pub fn all_tasks(&self) -> String {
        format!("{}/tasks?{}", self.base, self.user_query)
    }

    pub fn create_task(&self) -> String {
        format!("{}/tasks", self.base)
    }

    /// Update URL, scoped to the user like the other writes.
    pub fn task(&self, id: &str) -> String {
        format!("{}/tasks/{}?{}", self.base, encode(id), self.user_query)
    }

    /// Read and delete URL.
    pub fn task_item(&self, id: &str) -> String {
        format!("{}/tasks/{}", self.base, encode(id))
    }

    pub fn notification(&self, id: &str) -> String {
        format!("{}/notifications/{}", self.base, encode(id))
    }

    pub fn all_notifications(&self) -> String {
        format!("{}/notifications", self.base)
    }

    pub fn user(&self, id: &str) -> String {
        format!("{}/users/{}", self.base, encode(id))
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
