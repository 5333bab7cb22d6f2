use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;

use crate::http::cookie::{Cookie, find_cookie};
use crate::session::{SESSION_COOKIE, SESSION_ID_LEN, Session, now_secs};

/// Session picked for one request, plus the cookie to send back when the
/// session is new.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: Arc<Session>,
    pub cookie: Option<Cookie>,
}

impl ResolvedSession {
    pub fn is_new(&self) -> bool {
        self.cookie.is_some()
    }
}

/// In-memory store of live sessions.
///
/// Lookup, expiry check, refresh, creation and sweeping all happen under the
/// same map lock, so a sweep can never remove a session between the check and
/// the refresh of a concurrent `resolve`.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    timeout: Duration,
    default_domain: String,
}

impl SessionRegistry {
    pub fn new(timeout: Duration, default_domain: impl Into<String>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
            default_domain: default_domain.into(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Finds the session named by the `sid` cookie or creates a fresh one.
    ///
    /// `cookie_headers` are the values of every `Cookie:` header of the request
    /// and `host` is the `Host:` header, used as the domain of a new cookie.
    pub async fn resolve<'a, I>(&self, cookie_headers: I, host: Option<&str>) -> ResolvedSession
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.resolve_at(cookie_headers, host, now_secs()).await
    }

    pub async fn resolve_at<'a, I>(&self, cookie_headers: I, host: Option<&str>, now: u64) -> ResolvedSession
    where
        I: IntoIterator<Item = &'a str>,
    {
        let candidate = cookie_headers
            .into_iter()
            .find_map(|value| find_cookie(value, SESSION_COOKIE))
            .map(str::to_string);

        let mut sessions = self.sessions.lock().await;

        if let Some(id) = candidate {
            let existing = sessions.get(&id).cloned();
            match existing {
                Some(session) if session.is_valid_at(now) => {
                    session.refresh(self.expiry_from(now));
                    tracing::debug!(sid = %id, "Session reused");
                    return ResolvedSession {
                        session,
                        cookie: None,
                    };
                }
                Some(_) => {
                    sessions.remove(&id);
                    tracing::debug!(sid = %id, "Expired session replaced");
                }
                None => {
                    tracing::debug!(sid = %id, "Unknown session id");
                }
            }
        }

        self.insert_new(&mut sessions, host, now)
    }

    /// Creates and registers a new session.
    pub async fn create(&self, host: Option<&str>) -> ResolvedSession {
        self.create_at(host, now_secs()).await
    }

    pub async fn create_at(&self, host: Option<&str>, now: u64) -> ResolvedSession {
        let mut sessions = self.sessions.lock().await;
        self.insert_new(&mut sessions, host, now)
    }

    /// Removes every session whose lifetime has run out and returns how many
    /// were removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(now_secs()).await
    }

    pub async fn sweep_at(&self, now: u64) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        before - sessions.len()
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn insert_new(
        &self,
        sessions: &mut HashMap<String, Arc<Session>>,
        host: Option<&str>,
        now: u64,
    ) -> ResolvedSession {
        let mut id = generate_id();
        while sessions.contains_key(&id) {
            id = generate_id();
        }

        let session = Arc::new(Session::new(id.clone(), self.expiry_from(now)));
        sessions.insert(id.clone(), Arc::clone(&session));

        let domain = host
            .map(strip_port)
            .filter(|h| is_cookie_domain(h))
            .unwrap_or(self.default_domain.as_str());

        let cookie = Cookie::new(SESSION_COOKIE, id.as_str())
            .domain(domain)
            .path("/")
            .http_only();

        tracing::debug!(sid = %id, "Session created");

        ResolvedSession {
            session,
            cookie: Some(cookie),
        }
    }

    fn expiry_from(&self, now: u64) -> u64 {
        now.saturating_add(self.timeout.as_secs())
    }
}

/// 20 random uppercase ASCII letters.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect()
}

/// Accepts hostnames, IPv4 literals and bracketed IPv6 literals. Anything
/// else would leak into the `Set-Cookie` attribute list.
fn is_cookie_domain(host: &str) -> bool {
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return !inner.is_empty() && inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
    }
    !host.is_empty()
        && host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    host.split(':').next().unwrap_or(host)
}
