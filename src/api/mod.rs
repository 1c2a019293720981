//! Blockscope HTTP API
//! Read-only query endpoints over the cached query service

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::{bind_listener, create_router};
pub use types::*;
