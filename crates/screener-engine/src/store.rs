//! Persistence seam. The engine never stores anything itself; callers plug a
//! [`SessionStore`] in to keep snapshots between requests.

use std::collections::HashMap;

use uuid::Uuid;

use screener_core::error::CoreError;
use screener_core::keys;

use crate::session::SessionState;

/// Loads and saves session snapshots keyed by session id. Implementations
/// must allow at most one writer per session at a time.
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self, session_id: Uuid) -> Result<Option<SessionState>, Self::Error>;

    fn save(&mut self, state: &SessionState) -> Result<(), Self::Error>;

    /// Drop a snapshot once its session is submitted or abandoned.
    fn remove(&mut self, session_id: Uuid) -> Result<(), Self::Error>;
}

/// In-process store holding serialized snapshots under their canonical keys.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    objects: HashMap<String, Vec<u8>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Session ids currently held.
    pub fn session_ids(&self) -> Result<Vec<Uuid>, CoreError> {
        self.objects
            .keys()
            .map(|key| keys::session_id_from_key(key))
            .collect()
    }
}

impl SessionStore for MemorySessionStore {
    type Error = CoreError;

    fn load(&self, session_id: Uuid) -> Result<Option<SessionState>, CoreError> {
        self.objects
            .get(&keys::session(session_id))
            .map(|body| serde_json::from_slice(body).map_err(CoreError::from))
            .transpose()
    }

    fn save(&mut self, state: &SessionState) -> Result<(), CoreError> {
        let body = serde_json::to_vec_pretty(state)?;
        self.objects.insert(keys::session(state.session_id()), body);
        Ok(())
    }

    fn remove(&mut self, session_id: Uuid) -> Result<(), CoreError> {
        self.objects.remove(&keys::session(session_id));
        Ok(())
    }
}
