//! Questionnaire configuration: the versioned definition supplied by the
//! configuration collaborator and the validated [`Questionnaire`] built from
//! it. A definition with any defect is rejected as a whole.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use ts_rs::TS;

use screener_core::models::answer::AnswerMap;
use screener_core::models::question::Question;
use screener_core::models::result::{InstrumentScore, RiskBand};

use crate::error::{ConfigDefect, ConfigurationError, InstrumentError};
use crate::risk::{self, RiskThresholds};
use crate::rules::{self, BranchingRule, Condition};
use crate::scoring::{self, InstrumentDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One published questionnaire version, as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionnaireDefinition {
    pub id: String,
    pub version: u32,
    pub title: String,
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub rules: Vec<BranchingRule>,
    pub instruments: Vec<InstrumentDefinition>,
    #[serde(default)]
    pub risk_thresholds: RiskThresholds,
}

/// A question placed on a wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VisibleQuestion {
    pub step: usize,
    pub question: Question,
}

/// A validated questionnaire version. Only obtainable through
/// [`Questionnaire::load`], so holding one means the configuration is sound.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    definition: QuestionnaireDefinition,
    step_index: HashMap<String, usize>,
    questions: HashMap<String, Question>,
    patterns: HashMap<String, Regex>,
}

impl Questionnaire {
    pub fn load(definition: QuestionnaireDefinition) -> Result<Self, ConfigurationError> {
        let defects = check(&definition);
        if !defects.is_empty() {
            error!(
                questionnaire_id = %definition.id,
                version = definition.version,
                defects = defects.len(),
                "questionnaire definition rejected"
            );
            return Err(ConfigurationError::Defects {
                questionnaire_id: definition.id,
                version: definition.version,
                defects,
            });
        }

        let step_index = definition
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| (step.id.clone(), i))
            .collect();
        let questions = all_questions(&definition)
            .map(|(_, question)| (question.id.clone(), question.clone()))
            .collect();
        // Every pattern compiled during the check above.
        let patterns = all_questions(&definition)
            .filter_map(|(_, question)| {
                let re = Regex::new(question.pattern()?).ok()?;
                Some((question.id.clone(), re))
            })
            .collect();

        debug!(
            questionnaire_id = %definition.id,
            version = definition.version,
            steps = definition.steps.len(),
            rules = definition.rules.len(),
            "questionnaire loaded"
        );
        Ok(Self {
            definition,
            step_index,
            questions,
            patterns,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let definition: QuestionnaireDefinition = serde_json::from_str(json)?;
        Self::load(definition)
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn version(&self) -> u32 {
        self.definition.version
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn definition(&self) -> &QuestionnaireDefinition {
        &self.definition
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.definition.steps
    }

    pub fn total_steps(&self) -> usize {
        self.definition.steps.len()
    }

    pub fn rules(&self) -> &[BranchingRule] {
        &self.definition.rules
    }

    pub fn instruments(&self) -> &[InstrumentDefinition] {
        &self.definition.instruments
    }

    /// Any question defined by this version, base or rule-revealed.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    /// The compiled validation pattern of a question, if it has one.
    pub fn pattern(&self, question_id: &str) -> Option<&Regex> {
        self.patterns.get(question_id)
    }

    /// The visible question set for `answers`: base questions in step order,
    /// then rule-revealed questions in rule order, each id at most once.
    pub fn visible_questions(&self, answers: &AnswerMap) -> Vec<VisibleQuestion> {
        let mut visible: Vec<VisibleQuestion> = self
            .definition
            .steps
            .iter()
            .enumerate()
            .flat_map(|(step, definition)| {
                definition.questions.iter().map(move |question| VisibleQuestion {
                    step,
                    question: question.clone(),
                })
            })
            .collect();

        let base: HashSet<String> = visible.iter().map(|v| v.question.id.clone()).collect();
        for (rule, question) in rules::revealed(self.rules(), answers, self.instruments()) {
            if base.contains(&question.id) {
                continue;
            }
            // Rule steps are checked at load time.
            if let Some(&step) = self.step_index.get(&rule.step) {
                visible.push(VisibleQuestion {
                    step,
                    question: question.clone(),
                });
            }
        }
        visible
    }

    pub fn score_all(&self, answers: &AnswerMap) -> Vec<InstrumentScore> {
        self.instruments()
            .iter()
            .map(|instrument| instrument.score(answers))
            .collect()
    }

    pub fn score_instrument(
        &self,
        instrument_id: &str,
        answers: &AnswerMap,
    ) -> Result<InstrumentScore, InstrumentError> {
        scoring::find(self.instruments(), instrument_id)
            .map(|instrument| instrument.score(answers))
            .ok_or_else(|| InstrumentError::UnknownInstrument(instrument_id.to_string()))
    }

    /// Band every score with its instrument's table, falling back to the
    /// questionnaire-wide table, and return the most severe band.
    pub fn classify(&self, scores: &[InstrumentScore]) -> RiskBand {
        let banded: Vec<(i64, &RiskThresholds)> = scores
            .iter()
            .map(|s| (s.score, self.thresholds_for(&s.instrument_id)))
            .collect();
        risk::classify_each(&banded)
    }

    pub fn thresholds_for(&self, instrument_id: &str) -> &RiskThresholds {
        scoring::find(self.instruments(), instrument_id)
            .and_then(|instrument| instrument.thresholds.as_ref())
            .unwrap_or(&self.definition.risk_thresholds)
    }
}

/// Every question definition with the rule that introduced it, if any.
fn all_questions(
    definition: &QuestionnaireDefinition,
) -> impl Iterator<Item = (Option<&BranchingRule>, &Question)> {
    let base = definition
        .steps
        .iter()
        .flat_map(|step| step.questions.iter().map(|q| (None, q)));
    let revealed = definition
        .rules
        .iter()
        .flat_map(|rule| rule.questions.iter().map(move |q| (Some(rule), q)));
    base.chain(revealed)
}

fn check(definition: &QuestionnaireDefinition) -> Vec<ConfigDefect> {
    let mut defects = Vec::new();

    check_steps(definition, &mut defects);
    let known_questions = check_questions(definition, &mut defects);
    check_instruments(definition, &known_questions, &mut defects);
    check_rules(definition, &known_questions, &mut defects);

    defects
}

fn check_steps(definition: &QuestionnaireDefinition, defects: &mut Vec<ConfigDefect>) {
    if definition.steps.is_empty() {
        defects.push(ConfigDefect::NoSteps);
    }

    let mut seen = HashSet::new();
    for step in &definition.steps {
        if !seen.insert(step.id.as_str()) {
            defects.push(ConfigDefect::DuplicateStep {
                step_id: step.id.clone(),
            });
        }
        let targeted = definition.rules.iter().any(|rule| rule.step == step.id);
        if step.questions.is_empty() && !targeted {
            defects.push(ConfigDefect::EmptyStep {
                step_id: step.id.clone(),
            });
        }
        if step.questions.iter().any(|q| q.id.trim().is_empty()) {
            defects.push(ConfigDefect::EmptyQuestionId {
                step_id: step.id.clone(),
            });
        }
    }
}

/// Returns the ids of every defined question.
fn check_questions<'d>(
    definition: &'d QuestionnaireDefinition,
    defects: &mut Vec<ConfigDefect>,
) -> HashSet<&'d str> {
    let mut defined: HashMap<&str, &Question> = HashMap::new();

    for (rule, question) in all_questions(definition) {
        match (defined.get(question.id.as_str()), rule) {
            (None, _) => {
                defined.insert(&question.id, question);
                check_question(question, defects);
            }
            // Two base definitions of one id.
            (Some(_), None) => defects.push(ConfigDefect::DuplicateQuestion {
                question_id: question.id.clone(),
            }),
            // Rules may share a question as long as they agree on it.
            (Some(existing), Some(rule)) if *existing != question => {
                defects.push(ConfigDefect::ConflictingQuestion {
                    question_id: question.id.clone(),
                    rule_id: rule.id.clone(),
                })
            }
            (Some(_), Some(_)) => {}
        }
    }

    defined.into_keys().collect()
}

fn check_question(question: &Question, defects: &mut Vec<ConfigDefect>) {
    if question.question_type.has_choices() && question.choices.is_empty() {
        defects.push(ConfigDefect::MissingChoices {
            question_id: question.id.clone(),
        });
    }
    if let (Some(min), Some(max)) = (question.min(), question.max())
        && min > max
    {
        defects.push(ConfigDefect::InvertedRange {
            question_id: question.id.clone(),
            min,
            max,
        });
    }
    if let Some(pattern) = question.pattern()
        && let Err(e) = Regex::new(pattern)
    {
        defects.push(ConfigDefect::InvalidPattern {
            question_id: question.id.clone(),
            message: e.to_string(),
        });
    }
}

fn check_instruments(
    definition: &QuestionnaireDefinition,
    known_questions: &HashSet<&str>,
    defects: &mut Vec<ConfigDefect>,
) {
    if definition.instruments.is_empty() {
        defects.push(ConfigDefect::NoInstruments);
    }
    if let Err(message) = definition.risk_thresholds.check() {
        defects.push(ConfigDefect::InvalidThresholds {
            scope: "questionnaire".to_string(),
            message,
        });
    }

    let mut seen = HashSet::new();
    for instrument in &definition.instruments {
        if !seen.insert(instrument.id.as_str()) {
            defects.push(ConfigDefect::DuplicateInstrument {
                instrument_id: instrument.id.clone(),
            });
        }
        if instrument.question_ids.is_empty() {
            defects.push(ConfigDefect::EmptyInstrument {
                instrument_id: instrument.id.clone(),
            });
        }

        let mut listed = HashSet::new();
        for question_id in &instrument.question_ids {
            if !listed.insert(question_id.as_str()) {
                defects.push(ConfigDefect::DuplicateInstrumentQuestion {
                    instrument_id: instrument.id.clone(),
                    question_id: question_id.clone(),
                });
            }
            if !known_questions.contains(question_id.as_str()) {
                defects.push(ConfigDefect::UnknownInstrumentQuestion {
                    instrument_id: instrument.id.clone(),
                    question_id: question_id.clone(),
                });
            }
        }

        if let Some(thresholds) = &instrument.thresholds
            && let Err(message) = thresholds.check()
        {
            defects.push(ConfigDefect::InvalidThresholds {
                scope: format!("instrument '{}'", instrument.id),
                message,
            });
        }
    }
}

fn check_rules(
    definition: &QuestionnaireDefinition,
    known_questions: &HashSet<&str>,
    defects: &mut Vec<ConfigDefect>,
) {
    let mut seen = HashSet::new();
    for rule in &definition.rules {
        if !seen.insert(rule.id.as_str()) {
            defects.push(ConfigDefect::DuplicateRule {
                rule_id: rule.id.clone(),
            });
        }
        if rule.questions.is_empty() {
            defects.push(ConfigDefect::EmptyRule {
                rule_id: rule.id.clone(),
            });
        }
        if !definition.steps.iter().any(|step| step.id == rule.step) {
            defects.push(ConfigDefect::UnknownRuleStep {
                rule_id: rule.id.clone(),
                step_id: rule.step.clone(),
            });
        }

        rule.condition.walk(&mut |condition| match condition {
            Condition::AnswerEquals { question_id, .. }
            | Condition::AnswerGreaterThan { question_id, .. }
            | Condition::AnswerAtLeast { question_id, .. }
            | Condition::Answered { question_id } => {
                if !known_questions.contains(question_id.as_str()) {
                    defects.push(ConfigDefect::UnknownConditionQuestion {
                        rule_id: rule.id.clone(),
                        question_id: question_id.clone(),
                    });
                }
            }
            Condition::ScoreAtLeast { instrument, .. } => {
                if scoring::find(&definition.instruments, instrument).is_none() {
                    defects.push(ConfigDefect::UnknownConditionInstrument {
                        rule_id: rule.id.clone(),
                        instrument_id: instrument.clone(),
                    });
                }
            }
            Condition::All { conditions } | Condition::Any { conditions } => {
                if conditions.is_empty() {
                    defects.push(ConfigDefect::EmptyCondition {
                        rule_id: rule.id.clone(),
                    });
                }
            }
            Condition::Not { .. } => {}
        });
    }
}
