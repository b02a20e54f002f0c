//! HTTP transport for movescan.
//!
//! Wires the [`movescan_core`] pipeline to an axum router, loads layered
//! configuration and owns the background retention task.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_router;
