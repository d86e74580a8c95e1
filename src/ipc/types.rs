use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use crate::api::BackendClient;
use crate::identity::ProviderGate;
use crate::marks::SubjectSummary;
use crate::session::SessionStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub session: Rc<SessionStore>,
    pub api: BackendClient,
    pub identity: ProviderGate,
    /// Transient per-student subject rollups, keyed by student id. View
    /// memory only; `marks.subjects` with `refresh` discards an entry.
    pub subject_cache: HashMap<i64, Vec<SubjectSummary>>,
}

impl AppState {
    pub fn new(base_url: impl Into<String>, identity_client_id: Option<String>) -> Self {
        let session = Rc::new(SessionStore::new());
        let api = BackendClient::new(Rc::clone(&session), base_url);
        AppState {
            workspace: None,
            session,
            api,
            identity: ProviderGate::new(identity_client_id),
            subject_cache: HashMap::new(),
        }
    }
}
