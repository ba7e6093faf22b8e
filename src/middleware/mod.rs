//! Middleware module
//!
//! Request logging and caller key extraction

pub mod auth;
pub mod logging;

pub use auth::CallerKey;
pub use logging::request_logging_middleware;
