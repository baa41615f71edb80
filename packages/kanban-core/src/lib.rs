pub mod feed;
pub mod reorder;
pub mod store;
pub mod types;
pub mod view;
