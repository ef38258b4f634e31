pub mod gad7;
pub mod phq9;

use screener_core::models::question::{ChoiceOption, Question, QuestionType};

/// Step that rule-revealed follow-up questions are placed on in the default
/// screening questionnaire.
pub const FOLLOW_UP_STEP: &str = "follow_up";

/// "Over the last two weeks, how often…" frequency scale shared by PHQ-9 and
/// GAD-7 items, scored 0–3.
pub(crate) fn frequency_item(id: &str, text: &str) -> Question {
    Question::new(id, text, QuestionType::OrdinalScale)
        .required()
        .with_choices(vec![
            ChoiceOption::new(0.0, "Not at all"),
            ChoiceOption::new(1.0, "Several days"),
            ChoiceOption::new(2.0, "More than half the days"),
            ChoiceOption::new(3.0, "Nearly every day"),
        ])
        .with_range(0.0, 3.0)
}
