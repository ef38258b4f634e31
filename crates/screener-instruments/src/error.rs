use thiserror::Error;

/// A defect found while loading a questionnaire definition. Every defect is
/// collected before the definition is rejected so authors can fix them in
/// one pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigDefect {
    #[error("questionnaire has no steps")]
    NoSteps,

    #[error("duplicate step id '{step_id}'")]
    DuplicateStep { step_id: String },

    #[error("step '{step_id}' has no questions and no rule reveals any into it")]
    EmptyStep { step_id: String },

    #[error("question with empty id in step '{step_id}'")]
    EmptyQuestionId { step_id: String },

    #[error("question '{question_id}' is defined more than once")]
    DuplicateQuestion { question_id: String },

    #[error("question '{question_id}' is redefined with different content by rule '{rule_id}'")]
    ConflictingQuestion { question_id: String, rule_id: String },

    #[error("choice question '{question_id}' has no choices")]
    MissingChoices { question_id: String },

    #[error("question '{question_id}' has min {min} greater than max {max}")]
    InvertedRange {
        question_id: String,
        min: f64,
        max: f64,
    },

    #[error("question '{question_id}' has an invalid pattern: {message}")]
    InvalidPattern {
        question_id: String,
        message: String,
    },

    #[error("questionnaire declares no instruments")]
    NoInstruments,

    #[error("duplicate instrument id '{instrument_id}'")]
    DuplicateInstrument { instrument_id: String },

    #[error("instrument '{instrument_id}' has an empty question list")]
    EmptyInstrument { instrument_id: String },

    #[error("instrument '{instrument_id}' lists question '{question_id}' more than once")]
    DuplicateInstrumentQuestion {
        instrument_id: String,
        question_id: String,
    },

    #[error("instrument '{instrument_id}' lists undefined question '{question_id}'")]
    UnknownInstrumentQuestion {
        instrument_id: String,
        question_id: String,
    },

    #[error("threshold table for {scope} is malformed: {message}")]
    InvalidThresholds { scope: String, message: String },

    #[error("duplicate rule id '{rule_id}'")]
    DuplicateRule { rule_id: String },

    #[error("rule '{rule_id}' reveals no questions")]
    EmptyRule { rule_id: String },

    #[error("rule '{rule_id}' targets unknown step '{step_id}'")]
    UnknownRuleStep { rule_id: String, step_id: String },

    #[error("rule '{rule_id}' references unknown question '{question_id}'")]
    UnknownConditionQuestion {
        rule_id: String,
        question_id: String,
    },

    #[error("rule '{rule_id}' references unknown instrument '{instrument_id}'")]
    UnknownConditionInstrument {
        rule_id: String,
        instrument_id: String,
    },

    #[error("rule '{rule_id}' has an empty all/any condition")]
    EmptyCondition { rule_id: String },
}

/// Fatal at load time: a questionnaire version that fails here is never
/// served.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("questionnaire definition is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(
        "questionnaire '{questionnaire_id}' v{version} rejected with {} defect(s): {}",
        .defects.len(),
        join_defects(.defects)
    )]
    Defects {
        questionnaire_id: String,
        version: u32,
        defects: Vec<ConfigDefect>,
    },
}

fn join_defects(defects: &[ConfigDefect]) -> String {
    defects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A branching condition that could not be evaluated. The rule is skipped
/// and the rest of the visible set is still computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleEvaluationError {
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
