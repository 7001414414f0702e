//! Single-admin session handling
//!
//! Sessions live server-side in a concurrent map keyed by a random id; the
//! browser only ever holds the opaque id in a cookie. Login compares both
//! submitted fields against the configured admin identity in constant time
//! and reports one indistinguishable failure for any mismatch.

use dashmap::DashMap;
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "homelinks_session";

/// How long a session stays valid without re-login
const SESSION_TTL: Duration = Duration::from_secs(24 * 3600);

/// An authenticated admin session
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    created_at: Instant,
}

/// Server-side session store
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    cookie_secure: bool,
}

impl SessionStore {
    pub fn new(cookie_secure: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_secure,
        }
    }

    /// Start a new session, returning its id
    pub fn create(&self, email: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                email: email.to_string(),
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Look up a live session. Expired entries are removed on access.
    pub fn get(&self, id: &str) -> Option<Session> {
        let expired = match self.sessions.get(id) {
            Some(session) if session.created_at.elapsed() < SESSION_TTL => {
                return Some(session.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(id);
        }
        None
    }

    /// Destroy a session (logout)
    pub fn destroy(&self, id: &str) {
        self.sessions.remove(id);
    }

    /// Set-Cookie value establishing a session
    pub fn session_cookie(&self, id: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            id,
            SESSION_TTL.as_secs()
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Set-Cookie value clearing the session cookie
    pub fn logout_cookie(&self) -> String {
        format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
    }

    /// Pull the session id out of a Cookie request header
    pub fn id_from_cookie_header(&self, cookie_header: &str) -> Option<String> {
        for cookie in cookie_header.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }
}

/// The single configured admin identity
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Verify a login attempt. Both fields are compared constant-time so
    /// neither leaks which one was wrong through response timing, and the
    /// result does not distinguish them either.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email_match = constant_time_compare(
            &email.trim().to_lowercase(),
            &self.email.trim().to_lowercase(),
        );
        let password_match = constant_time_compare(password, &self.password);
        email_match && password_match
    }
}

/// Constant-time string comparison to prevent timing attacks. Inputs of
/// unknown length are walked over a common padded width so the comparison
/// does not leak the secret's length through an early return.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut result = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        result |= (x ^ y) as usize;
    }
    result == 0
}

/// Sliding-window login rate limiter, keyed by client address
pub struct LoginRateLimiter {
    attempts: DashMap<String, Vec<Instant>>,
    max_attempts: usize,
    window: Duration,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Record an attempt for this client. Returns false when the client has
    /// exhausted its budget for the current window; the attempt is rejected
    /// before any credential check.
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.attempts.entry(client.to_string()).or_default();

        entry.retain(|t| now.duration_since(*t) < self.window);
        if entry.len() >= self.max_attempts {
            return false;
        }
        entry.push(now);
        true
    }

    /// Drop clients whose window has fully elapsed
    pub fn prune(&self) {
        let now = Instant::now();
        self.attempts
            .retain(|_, attempts| attempts.iter().any(|t| now.duration_since(*t) < self.window));
    }
}
