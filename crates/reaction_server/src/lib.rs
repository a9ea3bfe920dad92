//! HTTP server for the emoji reaction ledger.
//!
//! Thin axum adapter over `reaction_core::ReactionApi`: each request opens
//! its own SQLite connection on the blocking pool.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::ReactionServer;
pub use state::AppState;
