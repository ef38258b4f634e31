use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use screener_instruments::config::Questionnaire;

use crate::error::CatalogError;
use crate::settings::{DeploymentStage, EngineSettings};

/// The published versions of one questionnaire: the stable version and, while
/// a new version is rolling out, a candidate.
#[derive(Debug, Clone)]
pub struct Catalog {
    stable: Questionnaire,
    candidate: Option<Questionnaire>,
}

impl Catalog {
    pub fn new(stable: Questionnaire) -> Self {
        Self {
            stable,
            candidate: None,
        }
    }

    pub fn with_candidate(mut self, candidate: Questionnaire) -> Result<Self, CatalogError> {
        if candidate.id() != self.stable.id() {
            return Err(CatalogError::CandidateMismatch {
                stable: self.stable.id().to_string(),
                candidate: candidate.id().to_string(),
            });
        }
        if candidate.version() <= self.stable.version() {
            return Err(CatalogError::CandidateNotNewer {
                stable: self.stable.version(),
                candidate: candidate.version(),
            });
        }
        self.candidate = Some(candidate);
        Ok(self)
    }

    pub fn stable(&self) -> &Questionnaire {
        &self.stable
    }

    pub fn candidate(&self) -> Option<&Questionnaire> {
        self.candidate.as_ref()
    }

    /// Version to serve a new session. The choice is a pure function of the
    /// session id and settings, so it is stable across requests.
    pub fn select(&self, session_id: Uuid, settings: &EngineSettings) -> &Questionnaire {
        let Some(candidate) = &self.candidate else {
            return &self.stable;
        };
        let bucket = rollout_bucket(session_id);
        let serve_candidate = settings.stage == DeploymentStage::Development
            || bucket < settings.rollout_percent;
        debug!(%session_id, bucket, serve_candidate, "questionnaire version selected");
        if serve_candidate { candidate } else { &self.stable }
    }

    /// The version a persisted session was started on, if still published.
    pub fn get(&self, version: u32) -> Option<&Questionnaire> {
        std::iter::once(&self.stable)
            .chain(self.candidate.as_ref())
            .find(|q| q.version() == version)
    }
}

/// Deterministic 0-99 bucket for a session id.
pub fn rollout_bucket(session_id: Uuid) -> u8 {
    let digest = Sha256::digest(session_id.as_bytes());
    let prefix = u16::from_be_bytes([digest[0], digest[1]]);
    (prefix % 100) as u8
}
