//! Storage key conventions for session snapshots.
//!
//! Pure string functions. The persistence collaborator decides where the
//! bytes live, these define the canonical layout of the objects it writes.

use uuid::Uuid;

use crate::error::CoreError;

pub const SESSIONS_PREFIX: &str = "sessions/";

pub fn session(id: Uuid) -> String {
    format!("sessions/{id}.json")
}

pub fn questionnaire(id: &str, version: u32) -> String {
    format!("questionnaires/{id}/v{version}.json")
}

/// Recover the session id from a key produced by [`session`].
pub fn session_id_from_key(key: &str) -> Result<Uuid, CoreError> {
    let id = key
        .strip_prefix(SESSIONS_PREFIX)
        .and_then(|rest| rest.strip_suffix(".json"))
        .ok_or_else(|| CoreError::InvalidKey(key.to_string()))?;
    Ok(Uuid::parse_str(id)?)
}
