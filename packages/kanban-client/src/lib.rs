/// Kanban client: REST API access, collection cache, config, and the
/// per-viewer session that ties them to the board core.

pub mod api;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod session;
pub mod source;
