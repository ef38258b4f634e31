//! screener-instruments
//!
//! Screening instrument definitions, scoring, risk banding and branching
//! rules. Pure data and pure functions, no I/O. Also owns questionnaire
//! configuration loading, which rejects malformed versions before they can
//! be served.

pub mod config;
pub mod error;
pub mod instruments;
pub mod risk;
pub mod rules;
pub mod scoring;

use screener_core::models::question::Question;

use config::{Questionnaire, QuestionnaireDefinition, StepDefinition};
use error::ConfigurationError;
use risk::RiskThresholds;
use rules::BranchingRule;
use scoring::InstrumentDefinition;

/// Trait implemented by each built-in screening instrument.
pub trait Instrument: Send + Sync {
    /// Unique identifier for this instrument (e.g., "phq9", "gad7").
    fn id(&self) -> &str;

    /// Human-readable name (e.g., "PHQ-9").
    fn name(&self) -> &str;

    /// The scored items, in scoring order.
    fn items(&self) -> &[Question];

    /// Follow-up rules this instrument contributes to a questionnaire.
    fn branching_rules(&self) -> &[BranchingRule] {
        &[]
    }

    fn thresholds(&self) -> Option<RiskThresholds> {
        None
    }

    /// The scoring definition: the item ids summed without weighting.
    fn definition(&self) -> InstrumentDefinition {
        InstrumentDefinition {
            id: self.id().to_string(),
            name: self.name().to_string(),
            question_ids: self.items().iter().map(|q| q.id.clone()).collect(),
            thresholds: self.thresholds(),
        }
    }

    /// A wizard step presenting every item of this instrument.
    fn step(&self) -> StepDefinition {
        StepDefinition {
            id: self.id().to_string(),
            title: self.name().to_string(),
            questions: self.items().to_vec(),
        }
    }
}

/// Return all registered instruments.
pub fn all_instruments() -> Vec<Box<dyn Instrument>> {
    vec![
        Box::new(instruments::phq9::Phq9),
        Box::new(instruments::gad7::Gad7),
    ]
}

/// Look up an instrument by ID.
pub fn get_instrument(id: &str) -> Option<Box<dyn Instrument>> {
    all_instruments().into_iter().find(|i| i.id() == id)
}

pub const DEFAULT_QUESTIONNAIRE_ID: &str = "mental_health_screening";

/// The built-in screening questionnaire: one step per registered instrument
/// followed by a follow-up step that only holds rule-revealed questions.
pub fn default_definition() -> QuestionnaireDefinition {
    let instruments = all_instruments();

    let mut steps: Vec<StepDefinition> = instruments.iter().map(|i| i.step()).collect();
    steps.push(StepDefinition {
        id: instruments::FOLLOW_UP_STEP.to_string(),
        title: "Follow-up".to_string(),
        questions: Vec::new(),
    });

    QuestionnaireDefinition {
        id: DEFAULT_QUESTIONNAIRE_ID.to_string(),
        version: 1,
        title: "Mental Health Screening".to_string(),
        steps,
        rules: instruments
            .iter()
            .flat_map(|i| i.branching_rules().iter().cloned())
            .collect(),
        instruments: instruments.iter().map(|i| i.definition()).collect(),
        risk_thresholds: RiskThresholds::default(),
    }
}

pub fn default_screening() -> Result<Questionnaire, ConfigurationError> {
    Questionnaire::load(default_definition())
}
