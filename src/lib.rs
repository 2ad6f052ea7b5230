pub mod app;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schedule;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
