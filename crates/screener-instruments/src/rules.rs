//! Declarative branching rules and their interpreter.
//!
//! A rule pairs a [`Condition`] with the questions it reveals. Conditions are
//! plain data so a questionnaire version can be serialized, diffed and
//! checked before it is ever served.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::question::Question;

use crate::error::RuleEvaluationError;
use crate::scoring::{self, InstrumentDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Condition {
    AnswerEquals {
        question_id: String,
        value: AnswerValue,
    },
    AnswerGreaterThan {
        question_id: String,
        value: f64,
    },
    AnswerAtLeast {
        question_id: String,
        value: f64,
    },
    Answered {
        question_id: String,
    },
    ScoreAtLeast {
        instrument: String,
        threshold: i64,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Evaluate against the current answers. Missing or non-numeric answers
    /// make comparisons false; only a dangling instrument reference is an
    /// error.
    pub fn evaluate(
        &self,
        answers: &AnswerMap,
        instruments: &[InstrumentDefinition],
    ) -> Result<bool, RuleEvaluationError> {
        let holds = match self {
            Self::AnswerEquals { question_id, value } => answers
                .get(question_id)
                .is_some_and(|answer| answer.loosely_equals(value)),
            Self::AnswerGreaterThan { question_id, value } => {
                numeric_answer(answers, question_id).is_some_and(|n| n > *value)
            }
            Self::AnswerAtLeast { question_id, value } => {
                numeric_answer(answers, question_id).is_some_and(|n| n >= *value)
            }
            Self::Answered { question_id } => answers
                .get(question_id)
                .is_some_and(|answer| !answer.is_empty()),
            Self::ScoreAtLeast {
                instrument,
                threshold,
            } => {
                let definition = scoring::find(instruments, instrument)
                    .ok_or_else(|| RuleEvaluationError::UnknownInstrument(instrument.clone()))?;
                scoring::score(&definition.question_ids, answers) >= *threshold
            }
            Self::All { conditions } => {
                for condition in conditions {
                    if !condition.evaluate(answers, instruments)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Any { conditions } => {
                for condition in conditions {
                    if condition.evaluate(answers, instruments)? {
                        return Ok(true);
                    }
                }
                false
            }
            Self::Not { condition } => !condition.evaluate(answers, instruments)?,
        };
        Ok(holds)
    }

    /// Visit this condition and every nested one.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Condition)) {
        visit(self);
        match self {
            Self::All { conditions } | Self::Any { conditions } => {
                for condition in conditions {
                    condition.walk(visit);
                }
            }
            Self::Not { condition } => condition.walk(visit),
            _ => {}
        }
    }
}

fn numeric_answer(answers: &AnswerMap, question_id: &str) -> Option<f64> {
    answers.get(question_id).and_then(AnswerValue::as_number)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BranchingRule {
    pub id: String,
    pub description: String,
    pub condition: Condition,
    /// Id of the wizard step the revealed questions are shown on.
    pub step: String,
    pub questions: Vec<Question>,
}

/// Questions revealed by `rules`, in rule-declaration order, deduplicated by
/// id with the first rule winning. A rule whose condition cannot be
/// evaluated is skipped.
pub fn evaluate(
    rules: &[BranchingRule],
    answers: &AnswerMap,
    instruments: &[InstrumentDefinition],
) -> Vec<Question> {
    revealed(rules, answers, instruments)
        .into_iter()
        .map(|(_, question)| question.clone())
        .collect()
}

/// Like [`evaluate`], but keeps the rule each question came from.
pub(crate) fn revealed<'r>(
    rules: &'r [BranchingRule],
    answers: &AnswerMap,
    instruments: &[InstrumentDefinition],
) -> Vec<(&'r BranchingRule, &'r Question)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();

    for rule in rules {
        match rule.condition.evaluate(answers, instruments) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(error) => {
                warn!(rule_id = %rule.id, %error, "branching rule skipped");
                continue;
            }
        }
        for question in &rule.questions {
            if seen.insert(question.id.as_str()) {
                out.push((rule, question));
            }
        }
    }
    out
}
