use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use ts_rs::TS;

use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::question::Question;
use screener_instruments::config::Questionnaire;

/// Why a single answer was rejected. Serialized as the reason codes the
/// rendering layer keys its messages on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Error)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ValidationError {
    #[error("required")]
    Required,
    #[error("out_of_range")]
    OutOfRange,
    #[error("pattern_mismatch")]
    PatternMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn error(self) -> Option<ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(error) => Some(error),
        }
    }
}

/// Validate a candidate answer. Checks run in order (required, range,
/// pattern) and stop at the first failure. A missing or blank answer to an
/// optional question is valid.
///
/// Compiles the question's pattern on each call; sessions go through
/// [`validate_in`], which reuses the questionnaire's compiled patterns.
pub fn validate(question: &Question, value: Option<&AnswerValue>) -> ValidationResult {
    check(question, value, None)
}

/// [`validate`] with the pattern taken from the questionnaire's compiled set.
pub fn validate_in(
    questionnaire: &Questionnaire,
    question: &Question,
    value: Option<&AnswerValue>,
) -> ValidationResult {
    check(question, value, questionnaire.pattern(&question.id))
}

fn check(question: &Question, value: Option<&AnswerValue>, compiled: Option<&Regex>) -> ValidationResult {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return if question.required {
            ValidationResult::Invalid(ValidationError::Required)
        } else {
            ValidationResult::Valid
        };
    };

    let (min, max) = (question.min(), question.max());
    if question.question_type.is_numeric() && (min.is_some() || max.is_some()) {
        let in_range = value.as_number().is_some_and(|n| {
            min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
        });
        if !in_range {
            return ValidationResult::Invalid(ValidationError::OutOfRange);
        }
    }

    if let Some(pattern) = question.pattern() {
        let matched = match compiled {
            Some(re) => re.is_match(&value.to_string()),
            None => match Regex::new(pattern) {
                Ok(re) => re.is_match(&value.to_string()),
                Err(error) => {
                    warn!(question_id = %question.id, %error, "validation pattern does not compile");
                    false
                }
            },
        };
        if !matched {
            return ValidationResult::Invalid(ValidationError::PatternMismatch);
        }
    }

    ValidationResult::Valid
}

/// Ids of the required questions in `questions` whose current answer does
/// not validate, in the order given.
pub fn failing_required<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    answers: &AnswerMap,
) -> Vec<String> {
    collect_failing(questions, |q| validate(q, answers.get(&q.id)))
}

/// [`failing_required`] using the questionnaire's compiled patterns.
pub fn failing_required_in<'a>(
    questionnaire: &Questionnaire,
    questions: impl IntoIterator<Item = &'a Question>,
    answers: &AnswerMap,
) -> Vec<String> {
    collect_failing(questions, |q| validate_in(questionnaire, q, answers.get(&q.id)))
}

fn collect_failing<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    validate: impl Fn(&Question) -> ValidationResult,
) -> Vec<String> {
    questions
        .into_iter()
        .filter(|q| q.required)
        .filter(|q| !validate(*q).is_valid())
        .map(|q| q.id.clone())
        .collect()
}
