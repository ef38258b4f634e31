use screener_core::models::question::{Question, QuestionType};

use super::{frequency_item, FOLLOW_UP_STEP};
use crate::rules::{BranchingRule, Condition};
use crate::Instrument;

/// GAD-7: Generalized Anxiety Disorder scale, seven items rated 0–3.
/// Total 0–21. 10 or more warrants asking about panic episodes.
pub struct Gad7;

pub const ID: &str = "gad7";

impl Instrument for Gad7 {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "GAD-7"
    }

    fn items(&self) -> &[Question] {
        static ITEMS: std::sync::LazyLock<Vec<Question>> = std::sync::LazyLock::new(|| {
            let items = [
                ("gad7_q1", "Feeling nervous, anxious, or on edge"),
                ("gad7_q2", "Not being able to stop or control worrying"),
                ("gad7_q3", "Worrying too much about different things"),
                ("gad7_q4", "Trouble relaxing"),
                ("gad7_q5", "Being so restless that it is hard to sit still"),
                ("gad7_q6", "Becoming easily annoyed or irritable"),
                ("gad7_q7", "Feeling afraid, as if something awful might happen"),
            ];
            items
                .iter()
                .map(|(id, text)| frequency_item(id, text))
                .collect()
        });
        &ITEMS
    }

    fn branching_rules(&self) -> &[BranchingRule] {
        static RULES: std::sync::LazyLock<Vec<BranchingRule>> = std::sync::LazyLock::new(|| {
            vec![BranchingRule {
                id: "gad7_panic".to_string(),
                description: "Ask about panic episodes when GAD-7 reaches the moderate cutoff".to_string(),
                condition: Condition::ScoreAtLeast {
                    instrument: ID.to_string(),
                    threshold: 10,
                },
                step: FOLLOW_UP_STEP.to_string(),
                questions: vec![
                    Question::new(
                        "panic_episodes",
                        "In the past four weeks, how many times have you had a sudden attack of fear or panic?",
                        QuestionType::Number,
                    )
                    .required()
                    .with_range(0.0, 100.0),
                ],
            }]
        });
        &RULES
    }
}
