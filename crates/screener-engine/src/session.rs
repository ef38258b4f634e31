//! The wizard state machine.
//!
//! [`StepController::apply`] takes the previous [`SessionState`] snapshot and
//! an event and returns the next snapshot. The input is never modified, so a
//! rejected event leaves the caller holding the state it started with.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use screener_core::error::CoreError;
use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::question::Question;
use screener_core::models::result::QuestionnaireResult;
use screener_instruments::config::{Questionnaire, VisibleQuestion};

use crate::error::SessionError;
use crate::validate::{failing_required_in, validate_in, ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum SessionStatus {
    InProgress { step: usize },
    ReadyToSubmit,
    Submitted,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Abandoned)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::InProgress { .. } => "in_progress",
            Self::ReadyToSubmit => "ready_to_submit",
            Self::Submitted => "submitted",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress { step } => write!(f, "in progress on step {step}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Everything the rendering layer can ask the controller to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum SessionEvent {
    AnswerChanged {
        question_id: String,
        value: AnswerValue,
    },
    AdvanceStep,
    GoBack,
    Submit {
        at: Timestamp,
    },
    Abandon,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AnswerChanged { .. } => "answer_changed",
            Self::AdvanceStep => "advance_step",
            Self::GoBack => "go_back",
            Self::Submit { .. } => "submit",
            Self::Abandon => "abandon",
        }
    }
}

/// Snapshot of one wizard session. Persisted between requests by the caller;
/// never shared between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionState {
    session_id: Uuid,
    questionnaire_id: String,
    questionnaire_version: u32,
    status: SessionStatus,
    total_steps: usize,
    answers: AnswerMap,
    visible: Vec<VisibleQuestion>,
    errors: BTreeMap<String, ValidationError>,
    started_at: Timestamp,
}

impl SessionState {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn questionnaire_id(&self) -> &str {
        &self.questionnaire_id
    }

    pub fn questionnaire_version(&self) -> u32 {
        self.questionnaire_version
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The step being shown, if the session is still on one.
    pub fn current_step(&self) -> Option<usize> {
        match self.status {
            SessionStatus::InProgress { step } => Some(step),
            _ => None,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// The whole visible set across all steps.
    pub fn visible(&self) -> &[VisibleQuestion] {
        &self.visible
    }

    pub fn questions_on_step(&self, step: usize) -> impl Iterator<Item = &Question> {
        self.visible
            .iter()
            .filter(move |v| v.step == step)
            .map(|v| &v.question)
    }

    /// Visible questions on the current step; empty once the session has
    /// left the steps.
    pub fn current_questions(&self) -> Vec<&Question> {
        match self.current_step() {
            Some(step) => self.questions_on_step(step).collect(),
            None => Vec::new(),
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, ValidationError> {
        &self.errors
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    fn with_status(&self, status: SessionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// The outcome of an accepted event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    /// Present only when the event was a successful submit.
    pub result: Option<QuestionnaireResult>,
}

impl Transition {
    fn to(state: SessionState) -> Self {
        Self {
            state,
            result: None,
        }
    }
}

/// Drives sessions of one questionnaire version.
#[derive(Debug, Clone, Copy)]
pub struct StepController<'q> {
    questionnaire: &'q Questionnaire,
}

impl<'q> StepController<'q> {
    pub fn new(questionnaire: &'q Questionnaire) -> Self {
        Self { questionnaire }
    }

    pub fn questionnaire(&self) -> &'q Questionnaire {
        self.questionnaire
    }

    pub fn start(&self, session_id: Uuid, started_at: Timestamp) -> SessionState {
        let answers = AnswerMap::new();
        let visible = self.questionnaire.visible_questions(&answers);
        debug!(
            %session_id,
            questionnaire_id = %self.questionnaire.id(),
            version = self.questionnaire.version(),
            "session started"
        );
        SessionState {
            session_id,
            questionnaire_id: self.questionnaire.id().to_string(),
            questionnaire_version: self.questionnaire.version(),
            status: SessionStatus::InProgress { step: 0 },
            total_steps: self.questionnaire.total_steps(),
            answers,
            visible,
            errors: BTreeMap::new(),
            started_at,
        }
    }

    pub fn apply(
        &self,
        state: &SessionState,
        event: SessionEvent,
    ) -> Result<Transition, SessionError> {
        self.check_snapshot(state)?;
        if state.status.is_terminal() {
            return Err(SessionError::Terminal {
                status: state.status,
            });
        }

        let event_name = event.name();
        let transition = match event {
            SessionEvent::AnswerChanged { question_id, value } => {
                Transition::to(self.on_answer(state, question_id, value)?)
            }
            SessionEvent::AdvanceStep => Transition::to(self.on_advance(state)?),
            SessionEvent::GoBack => Transition::to(self.on_back(state)),
            SessionEvent::Submit { at } => self.on_submit(state, at)?,
            SessionEvent::Abandon => Transition::to(state.with_status(SessionStatus::Abandoned)),
        };

        debug!(
            session_id = %state.session_id,
            event = event_name,
            status = transition.state.status.name(),
            "session transition"
        );
        Ok(transition)
    }

    pub fn answer(
        &self,
        state: &SessionState,
        question_id: impl Into<String>,
        value: impl Into<AnswerValue>,
    ) -> Result<SessionState, SessionError> {
        let event = SessionEvent::AnswerChanged {
            question_id: question_id.into(),
            value: value.into(),
        };
        Ok(self.apply(state, event)?.state)
    }

    pub fn advance(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        Ok(self.apply(state, SessionEvent::AdvanceStep)?.state)
    }

    pub fn go_back(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        Ok(self.apply(state, SessionEvent::GoBack)?.state)
    }

    pub fn submit(
        &self,
        state: &SessionState,
        at: Timestamp,
    ) -> Result<(SessionState, QuestionnaireResult), SessionError> {
        let transition = self.apply(state, SessionEvent::Submit { at })?;
        match transition.result {
            Some(result) => Ok((transition.state, result)),
            // on_submit always attaches a result
            None => Err(SessionError::NotPermitted {
                event: "submit",
                status: state.status,
            }),
        }
    }

    pub fn abandon(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        Ok(self.apply(state, SessionEvent::Abandon)?.state)
    }

    fn check_snapshot(&self, state: &SessionState) -> Result<(), SessionError> {
        let q = self.questionnaire;
        if state.questionnaire_id != q.id()
            || state.questionnaire_version != q.version()
            || state.total_steps != q.total_steps()
        {
            return Err(SessionError::QuestionnaireMismatch {
                expected: format!("{} v{}", q.id(), q.version()),
                found: format!("{} v{}", state.questionnaire_id, state.questionnaire_version),
            });
        }
        Ok(())
    }

    fn on_answer(
        &self,
        state: &SessionState,
        question_id: String,
        value: AnswerValue,
    ) -> Result<SessionState, SessionError> {
        let question = self
            .questionnaire
            .question(&question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))?;
        let outcome = validate_in(self.questionnaire, question, Some(&value));

        let mut next = state.clone();
        next.answers.insert(question_id.clone(), value);
        next.visible = self.questionnaire.visible_questions(&next.answers);

        match outcome {
            ValidationResult::Valid => {
                next.errors.remove(&question_id);
            }
            ValidationResult::Invalid(error) => {
                next.errors.insert(question_id, error);
            }
        }
        let visible_ids: HashSet<&str> = next.visible.iter().map(|v| v.question.id.as_str()).collect();
        next.errors.retain(|id, _| visible_ids.contains(id.as_str()));

        Ok(next)
    }

    fn on_advance(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        let SessionStatus::InProgress { step } = state.status else {
            return Err(SessionError::NotPermitted {
                event: "advance_step",
                status: state.status,
            });
        };

        let failing =
            failing_required_in(self.questionnaire, state.questions_on_step(step), &state.answers);
        if !failing.is_empty() {
            debug!(
                session_id = %state.session_id,
                step,
                failing = failing.len(),
                "advance rejected"
            );
            return Err(SessionError::AdvanceBlocked {
                question_ids: failing,
            });
        }

        let status = if step + 1 >= state.total_steps {
            SessionStatus::ReadyToSubmit
        } else {
            SessionStatus::InProgress { step: step + 1 }
        };
        Ok(state.with_status(status))
    }

    fn on_back(&self, state: &SessionState) -> SessionState {
        let step = match state.status {
            SessionStatus::InProgress { step } => step.saturating_sub(1),
            _ => state.total_steps.saturating_sub(1),
        };
        state.with_status(SessionStatus::InProgress { step })
    }

    fn on_submit(&self, state: &SessionState, at: Timestamp) -> Result<Transition, SessionError> {
        let last = state.total_steps.saturating_sub(1);
        match state.status {
            SessionStatus::ReadyToSubmit => {}
            SessionStatus::InProgress { step } if step == last => {}
            SessionStatus::InProgress { step } => {
                return Err(SessionError::NotOnFinalStep { step });
            }
            status => {
                return Err(SessionError::NotPermitted {
                    event: "submit",
                    status,
                });
            }
        }

        let blocking = failing_required_in(
            self.questionnaire,
            state.visible.iter().map(|v| &v.question),
            &state.answers,
        );
        if !blocking.is_empty() {
            return Err(SessionError::SubmissionBlocked {
                question_ids: blocking,
            });
        }

        let instrument_scores = self.questionnaire.score_all(&state.answers);
        let risk_band = self.questionnaire.classify(&instrument_scores);
        let result = QuestionnaireResult {
            instrument_scores,
            risk_band,
            duration_since_start: at.duration_since(state.started_at),
        };

        info!(
            session_id = %state.session_id,
            questionnaire_id = %state.questionnaire_id,
            %risk_band,
            "questionnaire submitted"
        );
        Ok(Transition {
            state: state.with_status(SessionStatus::Submitted),
            result: Some(result),
        })
    }
}
