//! HTTP API Layer
//!
//! Exposes the submission pipeline over HTTP (`POST /yt`) and owns request
//! validation, so the core only ever sees well-formed requests.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;
pub mod validation;

pub use handler::AppState;
pub use server::{router, HttpServer, HttpServerConfig, ServerHandle};
