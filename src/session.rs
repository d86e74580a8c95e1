use std::cell::{Cell, RefCell};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }

    /// Anything that is not one of the three known names falls back to the
    /// default role, matching how persisted values are re-read.
    pub fn parse(value: &str) -> Role {
        match value {
            "ADMIN" => Role::Admin,
            "TEACHER" => Role::Teacher,
            _ => Role::Student,
        }
    }
}

type Subscriber = Box<dyn Fn(Role)>;

/// The client's current belief about who is logged in and with what
/// role/credential. Constructor-injected wherever it is needed; the daemon
/// is single-threaded so interior mutability is enough.
///
/// Persistence is best-effort: without an attached workspace database every
/// write silently stays in memory only.
pub struct SessionStore {
    role: Cell<Role>,
    token: RefCell<Option<String>>,
    storage: RefCell<Option<Connection>>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            role: Cell::new(Role::default()),
            token: RefCell::new(None),
            storage: RefCell::new(None),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Attaches the workspace database and seeds in-memory state from the
    /// persisted role/token, then notifies subscribers of the (possibly
    /// unchanged) current role.
    pub fn attach_storage(&self, conn: Connection) {
        let persisted_role = db::kv_get(&conn, db::KEY_ROLE)
            .ok()
            .flatten()
            .map(|v| Role::parse(&v))
            .unwrap_or_default();
        let persisted_token = db::kv_get(&conn, db::KEY_TOKEN).ok().flatten();

        self.role.set(persisted_role);
        *self.token.borrow_mut() = persisted_token;
        *self.storage.borrow_mut() = Some(conn);
        self.notify();
    }

    pub fn role(&self) -> Role {
        self.role.get()
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Sets the current role and, when supplied, the bearer token. Notifies
    /// all subscribers synchronously.
    pub fn set_session(&self, role: Role, token: Option<&str>) {
        self.role.set(role);
        self.persist(db::KEY_ROLE, Some(role.as_str()));
        if let Some(token) = token {
            *self.token.borrow_mut() = Some(token.to_string());
            self.persist(db::KEY_TOKEN, Some(token));
        }
        self.notify();
    }

    pub fn set_token(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_string());
        self.persist(db::KEY_TOKEN, Some(token));
    }

    /// True while a well-formed token with an unexpired `exp` is held. An
    /// expired or undecodable token resets the session and reads as
    /// unauthenticated; it never raises an error to the caller.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(chrono::Utc::now().timestamp_millis())
    }

    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        let token = self.token();
        let Some(token) = token else {
            return false;
        };
        if token.trim().is_empty() {
            return false;
        }

        match token::decode_payload(&token) {
            Ok(payload) => {
                if token::is_expired(&payload, now_ms) {
                    tracing::debug!("bearer token expired, resetting session");
                    self.clear();
                    return false;
                }
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "bearer token undecodable, resetting session");
                self.clear();
                false
            }
        }
    }

    /// Profile claims for the current token, if it decodes. Display-only.
    pub fn profile(&self) -> Option<token::TokenPayload> {
        let token = self.token()?;
        token::decode_payload(&token).ok()
    }

    /// Logout / expiry reset. Safe to call repeatedly; a second clear only
    /// re-asserts the default state.
    pub fn clear(&self) {
        self.role.set(Role::default());
        *self.token.borrow_mut() = None;
        self.persist(db::KEY_ROLE, None);
        self.persist(db::KEY_TOKEN, None);
        self.notify();
    }

    /// Hot role stream with replay-of-one: the subscriber is invoked with
    /// the current role immediately, then on every change.
    pub fn subscribe(&self, f: impl Fn(Role) + 'static) {
        f(self.role.get());
        self.subscribers.borrow_mut().push(Box::new(f));
    }

    fn notify(&self) {
        let role = self.role.get();
        for sub in self.subscribers.borrow().iter() {
            sub(role);
        }
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let storage = self.storage.borrow();
        let Some(conn) = storage.as_ref() else {
            return;
        };
        let result = match value {
            Some(value) => db::kv_set(conn, key, value),
            None => db::kv_delete(conn, key),
        };
        if let Err(e) = result {
            // Persistence is advisory; the in-memory session stays valid.
            tracing::debug!(key, error = %e, "session persistence skipped");
        }
    }
}
