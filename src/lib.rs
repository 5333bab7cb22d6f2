//! wicket - session-aware static and worker HTTP server
//!
//! Core library: request parsing, sessions, response contexts, dispatching
//! and the server lifecycle.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod server;
pub mod session;
pub mod workers;
