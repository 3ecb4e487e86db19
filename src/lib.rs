// Dataset Dashboard - upload, catalogue and annotate tabular datasets

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod analysis;
pub mod sniff;
pub mod keywords;
pub mod store;
pub mod routes;
pub mod middleware;
pub mod utils;
pub mod cli;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
