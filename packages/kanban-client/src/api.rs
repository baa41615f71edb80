/// HTTP client for the Kanban REST API.
///
/// Non-2xx responses carry `{ "errors": ["..."] }`; the messages are joined
/// into one `ApiError::Server`. Every failure is logged once here so callers
/// only decide what to show the user.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use kanban_core::store::StoreError;
use kanban_core::types::{KanbanBoard, KanbanColumn, KanbanTask, NewTask, Notification, User};

use crate::config::ClientConfig;
use crate::endpoints::Endpoints;
use crate::source::{CollectionSource, EntityWriter};

/// Shown when the server gives no usable reason.
pub const DEFAULT_ERROR_TEXT: &str = "Check your internet connection and try again.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ApiError> for StoreError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server { status: 404, message } => StoreError::NotFound(message),
            ApiError::Server { status, message } => StoreError::Rejected { status, message },
            other => StoreError::Transport(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Join the server's error list, or fall back to the default text.
pub fn server_message(body: &str) -> String {
    let errors: Vec<String> = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.errors)
        .unwrap_or_default()
        .into_iter()
        .filter(|e| !e.trim().is_empty())
        .collect();
    if errors.is_empty() {
        DEFAULT_ERROR_TEXT.to_string()
    } else {
        errors.join(", ")
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            endpoints: Endpoints::new(&config.host_api, config.effective_user_name()),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.get(&self.endpoints.user(user_id)).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
    ) -> Result<reqwest::Response, ApiError> {
        request.send().await.map_err(|e| {
            log::warn!(target: "kanban.client.api", "{} {} failed: {}", method, url, e);
            ApiError::from(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.send(self.http.get(url), "GET", url).await?;
        read_json(resp, "GET", url).await
    }

    /// Any 2xx counts as applied, whatever the body holds.
    async fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<(), ApiError> {
        let resp = self.send(self.http.put(url).json(body), "PUT", url).await?;
        read_body(resp, "PUT", url).await?;
        Ok(())
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self.send(self.http.post(url).json(body), "POST", url).await?;
        read_json(resp, "POST", url).await
    }

    async fn delete(&self, url: &str) -> Result<(), ApiError> {
        let resp = self.send(self.http.delete(url), "DELETE", url).await?;
        read_body(resp, "DELETE", url).await?;
        Ok(())
    }
}

/// The response body, or `ApiError::Server` for a non-2xx status.
async fn read_body(resp: reqwest::Response, method: &str, url: &str) -> Result<String, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = server_message(&body);
        log_api_issue(status, &format!("{} {} -> {}: {}", method, url, status, message));
        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    method: &str,
    url: &str,
) -> Result<T, ApiError> {
    let body = read_body(resp, method, url).await?;
    serde_json::from_str(&body).map_err(|e| {
        log::warn!(target: "kanban.client.api", "{} {}: invalid body: {}", method, url, e);
        ApiError::Decode(e)
    })
}

fn log_api_issue(status: StatusCode, message: &str) {
    if status.is_server_error() {
        log::error!(target: "kanban.client.api", "{}", message);
    } else {
        log::warn!(target: "kanban.client.api", "{}", message);
    }
}

impl CollectionSource for ApiClient {
    async fn fetch_boards(&self) -> Result<Vec<KanbanBoard>, ApiError> {
        self.get(&self.endpoints.all_boards()).await
    }

    async fn fetch_columns(&self) -> Result<Vec<KanbanColumn>, ApiError> {
        self.get(&self.endpoints.all_columns()).await
    }

    async fn fetch_tasks(&self) -> Result<Vec<KanbanTask>, ApiError> {
        self.get(&self.endpoints.all_tasks()).await
    }

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get(&self.endpoints.all_notifications()).await
    }

    async fn fetch_task(&self, task_id: &str) -> Result<KanbanTask, ApiError> {
        self.get(&self.endpoints.task_item(task_id)).await
    }
}

impl EntityWriter for ApiClient {
    async fn put_board(&self, board: &KanbanBoard) -> Result<(), ApiError> {
        self.put(&self.endpoints.board(&board.id), board).await
    }

    async fn put_column(&self, column: &KanbanColumn) -> Result<(), ApiError> {
        self.put(&self.endpoints.column(&column.id), column).await
    }

    async fn put_task(&self, task: &KanbanTask) -> Result<(), ApiError> {
        self.put(&self.endpoints.task(&task.id), task).await
    }

    async fn put_notification(&self, notification: &Notification) -> Result<(), ApiError> {
        self.put(&self.endpoints.notification(&notification.id), notification)
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<KanbanTask, ApiError> {
        self.post(&self.endpoints.create_task(), task).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        self.delete(&self.endpoints.task_item(task_id)).await
    }
}
