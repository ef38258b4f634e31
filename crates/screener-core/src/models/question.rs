use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::answer::AnswerValue;

/// The input control a question is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuestionType {
    ShortText,
    Number,
    SingleChoice,
    MultipleChoice,
    FreeText,
    /// Likert-style rating (e.g. 0–3 for PHQ-9 items).
    OrdinalScale,
}

impl QuestionType {
    /// Whether answers to this type are subject to `min`/`max` checks.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::OrdinalScale)
    }

    pub fn has_choices(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChoiceOption {
    pub value: AnswerValue,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<AnswerValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

/// A single question. Immutable once published in a questionnaire version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            question_type,
            required: false,
            choices: Vec::new(),
            constraints: None,
            help_text: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_choices(mut self, choices: Vec<ChoiceOption>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        let constraints = self.constraints.get_or_insert_with(Constraints::default);
        constraints.min = Some(min);
        constraints.max = Some(max);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints
            .get_or_insert_with(Constraints::default)
            .pattern = Some(pattern.into());
        self
    }

    pub fn with_help(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn min(&self) -> Option<f64> {
        self.constraints.as_ref().and_then(|c| c.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.constraints.as_ref().and_then(|c| c.max)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.constraints.as_ref().and_then(|c| c.pattern.as_deref())
    }
}
