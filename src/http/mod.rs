//! HTTP protocol implementation.
//!
//! This module implements the request/response side of the server: one
//! request per connection, `GET` only, no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine (read, dispatch, close)
//! - **`parser`**: byte state machine for the request head, request-line and query parsing
//! - **`request`**: parsed request representation
//! - **`context`**: response state with write-once header commit and parameter scopes
//! - **`cookie`**: outbound cookies and inbound `Cookie:` parsing
//! - **`response`**: status codes
//! - **`writer`**: serialization of header blocks and error responses
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Scan bytes until CRLFCRLF / LFLF
//!        └──────┬──────┘
//!               │ Request parsed          (malformed → 400, Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Resolve session, run worker / script / file
//!        └──────┬───────────┘
//!               │ Response written        (not found → 404)
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod context;
pub mod cookie;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
