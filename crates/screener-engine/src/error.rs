use thiserror::Error;

use crate::session::SessionStatus;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is {status} and accepts no further events")]
    Terminal { status: SessionStatus },

    #[error("{event} is not permitted while {status}")]
    NotPermitted {
        event: &'static str,
        status: SessionStatus,
    },

    #[error("unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("cannot advance: required questions not valid: {}", .question_ids.join(", "))]
    AdvanceBlocked { question_ids: Vec<String> },

    #[error("submission blocked by required questions: {}", .question_ids.join(", "))]
    SubmissionBlocked { question_ids: Vec<String> },

    #[error("submit is only allowed from the final step, session is on step {step}")]
    NotOnFinalStep { step: usize },

    #[error("snapshot belongs to {found}, controller serves {expected}")]
    QuestionnaireMismatch { expected: String, found: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown deployment stage '{0}', expected development, staging or production")]
    InvalidStage(String),

    #[error("rollout percent must be 0-100, got '{0}'")]
    InvalidRollout(String),

    #[error("SCREENER_ANALYTICS_SALT must be set outside development")]
    MissingSalt,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("candidate '{candidate}' does not match stable questionnaire '{stable}'")]
    CandidateMismatch { stable: String, candidate: String },

    #[error("candidate version {candidate} is not newer than stable version {stable}")]
    CandidateNotNewer { stable: u32, candidate: u32 },
}
