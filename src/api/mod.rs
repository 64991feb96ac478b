//! API Module
//!
//! HTTP serving surface over the hybrid cache engine.

mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::create_router;
