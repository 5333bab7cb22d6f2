//! Cookie-based sessions.
//!
//! A session is created the first time a client shows up without a valid
//! `sid` cookie and lives in the [`SessionRegistry`] until it expires. Expired
//! sessions are dropped lazily by `resolve` and periodically by `sweep`.

pub mod registry;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

pub use registry::{ResolvedSession, SessionRegistry};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Length of a generated session id.
pub const SESSION_ID_LEN: usize = 20;

/// Session attribute map, shared by every request carrying the same `sid`.
pub type SharedAttributes = Arc<RwLock<HashMap<String, String>>>;

/// Server-side record for one client session.
#[derive(Debug)]
pub struct Session {
    id: String,
    /// Epoch seconds; only written while the registry lock is held.
    valid_until: AtomicU64,
    attributes: SharedAttributes,
}

impl Session {
    pub(crate) fn new(id: String, valid_until: u64) -> Self {
        Self {
            id,
            valid_until: AtomicU64::new(valid_until),
            attributes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn valid_until(&self) -> u64 {
        self.valid_until.load(Ordering::Acquire)
    }

    pub(crate) fn refresh(&self, valid_until: u64) {
        self.valid_until.store(valid_until, Ordering::Release);
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.valid_until() > now
    }

    pub fn attributes(&self) -> SharedAttributes {
        Arc::clone(&self.attributes)
    }
}

/// Current time in whole seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
