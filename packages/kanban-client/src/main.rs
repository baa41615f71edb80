use std::path::PathBuf;
use std::sync::Arc;

use kanban_client::api::ApiClient;
use kanban_client::config;
use kanban_client::session::KanbanSession;
use kanban_core::feed::Viewer;
use kanban_core::types::Role;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);

    let api = match ApiClient::new(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let viewer = match config.user_id.as_deref() {
        Some(user_id) => match api.fetch_user(user_id).await {
            Ok(user) => Viewer::from_user(&user),
            Err(e) => {
                log::warn!("Failed to load user {}: {}", user_id, e);
                Viewer::anonymous()
            }
        },
        None => Viewer {
            user_id: None,
            name: config.effective_user_name().to_string(),
            role: Role::User,
        },
    };
    if viewer.is_anonymous() {
        log::warn!("Viewing as anonymous user; ask an administrator for an account");
    }

    let session = KanbanSession::new(api, viewer);
    match session.board_view().await {
        Some(view) => match serde_json::to_string_pretty(&*view) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to render board view: {}", e),
        },
        None => log::info!("No board available for {}", session.viewer().name),
    }
}
