use screener_core::models::question::{ChoiceOption, Question, QuestionType};

use super::{frequency_item, FOLLOW_UP_STEP};
use crate::rules::{BranchingRule, Condition};
use crate::Instrument;

/// PHQ-9: Patient Health Questionnaire, nine depression items rated 0–3.
/// Total 0–27. Item 9 screens for thoughts of self-harm.
pub struct Phq9;

pub const ID: &str = "phq9";
pub const SELF_HARM_ITEM: &str = "phq9_q9";

impl Instrument for Phq9 {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "PHQ-9"
    }

    fn items(&self) -> &[Question] {
        static ITEMS: std::sync::LazyLock<Vec<Question>> = std::sync::LazyLock::new(|| {
            let items = [
                ("phq9_q1", "Little interest or pleasure in doing things"),
                ("phq9_q2", "Feeling down, depressed, or hopeless"),
                ("phq9_q3", "Trouble falling or staying asleep, or sleeping too much"),
                ("phq9_q4", "Feeling tired or having little energy"),
                ("phq9_q5", "Poor appetite or overeating"),
                (
                    "phq9_q6",
                    "Feeling bad about yourself, or that you are a failure or have let yourself or your family down",
                ),
                (
                    "phq9_q7",
                    "Trouble concentrating on things, such as reading the newspaper or watching television",
                ),
                (
                    "phq9_q8",
                    "Moving or speaking so slowly that other people could have noticed, or being so fidgety or restless that you have been moving around a lot more than usual",
                ),
                (
                    SELF_HARM_ITEM,
                    "Thoughts that you would be better off dead, or of hurting yourself in some way",
                ),
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
            vec![
                BranchingRule {
                    id: "phq9_difficulty".to_string(),
                    description: "Ask how much the problems interfere with daily life once any item is endorsed".to_string(),
                    condition: Condition::ScoreAtLeast {
                        instrument: ID.to_string(),
                        threshold: 1,
                    },
                    step: ID.to_string(),
                    questions: vec![
                        Question::new(
                            "phq9_difficulty",
                            "How difficult have these problems made it for you to do your work, take care of things at home, or get along with other people?",
                            QuestionType::SingleChoice,
                        )
                        .with_choices(vec![
                            ChoiceOption::new("not_difficult", "Not difficult at all"),
                            ChoiceOption::new("somewhat_difficult", "Somewhat difficult"),
                            ChoiceOption::new("very_difficult", "Very difficult"),
                            ChoiceOption::new("extremely_difficult", "Extremely difficult"),
                        ]),
                    ],
                },
                BranchingRule {
                    id: "phq9_safety_plan".to_string(),
                    description: "Collect a safety plan when item 9 is endorsed at any frequency".to_string(),
                    condition: Condition::AnswerGreaterThan {
                        question_id: SELF_HARM_ITEM.to_string(),
                        value: 0.0,
                    },
                    step: FOLLOW_UP_STEP.to_string(),
                    questions: safety_plan_questions(),
                },
            ]
        });
        &RULES
    }
}

fn safety_plan_questions() -> Vec<Question> {
    vec![
        Question::new(
            "safety_plan_contact",
            "Who is someone you can reach out to if you feel unsafe?",
            QuestionType::ShortText,
        )
        .required()
        .with_help("A friend, family member, or professional you trust."),
        Question::new(
            "safety_plan_activities",
            "What are some things you can do to help yourself feel better in a difficult moment?",
            QuestionType::FreeText,
        )
        .required(),
    ]
}

