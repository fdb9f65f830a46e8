pub mod app;
pub mod audit;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

pub use app::router;
pub use state::{AppState, Stores};
