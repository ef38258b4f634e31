use pretty_assertions::assert_eq;

use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::question::{Question, QuestionType};
use screener_core::models::result::{InstrumentScore, RiskBand};
use screener_instruments::config::{Questionnaire, QuestionnaireDefinition, StepDefinition};
use screener_instruments::error::{ConfigDefect, ConfigurationError};
use screener_instruments::risk::RiskThresholds;
use screener_instruments::rules::{BranchingRule, Condition};
use screener_instruments::scoring::InstrumentDefinition;
use screener_instruments::{default_definition, default_screening};

fn defects(definition: QuestionnaireDefinition) -> Vec<ConfigDefect> {
    match Questionnaire::load(definition) {
        Err(ConfigurationError::Defects { defects, .. }) => defects,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("definition should have been rejected"),
    }
}

fn minimal_definition() -> QuestionnaireDefinition {
    QuestionnaireDefinition {
        id: "mini".to_string(),
        version: 1,
        title: "Mini".to_string(),
        steps: vec![StepDefinition {
            id: "main".to_string(),
            title: "Main".to_string(),
            questions: vec![Question::new("q1", "Q1", QuestionType::Number).with_range(0.0, 3.0)],
        }],
        rules: Vec::new(),
        instruments: vec![InstrumentDefinition {
            id: "mini".to_string(),
            name: "Mini".to_string(),
            question_ids: vec!["q1".to_string()],
            thresholds: None,
        }],
        risk_thresholds: RiskThresholds::default(),
    }
}

#[test]
fn default_questionnaire_loads() {
    let questionnaire = default_screening().unwrap();
    assert_eq!(questionnaire.total_steps(), 3);
    assert_eq!(questionnaire.instruments().len(), 2);
    assert!(questionnaire.question("safety_plan_contact").is_some());
    assert!(questionnaire.question("panic_episodes").is_some());
    assert!(questionnaire.question("nope").is_none());
}

#[test]
fn minimal_definition_is_valid() {
    assert!(Questionnaire::load(minimal_definition()).is_ok());
}

#[test]
fn empty_instrument_list_is_rejected() {
    let mut definition = minimal_definition();
    definition.instruments[0].question_ids.clear();
    assert_eq!(
        defects(definition),
        vec![ConfigDefect::EmptyInstrument {
            instrument_id: "mini".to_string()
        }]
    );
}

#[test]
fn malformed_threshold_tables_are_rejected() {
    let mut definition = minimal_definition();
    definition.risk_thresholds = RiskThresholds {
        low: 10,
        moderate: 5,
        high: 15,
    };
    definition.instruments[0].thresholds = Some(RiskThresholds {
        low: 1,
        moderate: 2,
        high: 2,
    });
    let found = defects(definition);
    assert_eq!(found.len(), 2);
    assert!(found
        .iter()
        .all(|d| matches!(d, ConfigDefect::InvalidThresholds { .. })));
}

#[test]
fn every_defect_is_reported_at_once() {
    let mut definition = minimal_definition();
    definition.steps[0].questions.push(
        Question::new("q1", "duplicate", QuestionType::ShortText).with_pattern("("),
    );
    definition.steps[0]
        .questions
        .push(Question::new("choice", "Pick", QuestionType::SingleChoice));
    definition.steps[0]
        .questions
        .push(Question::new("range", "Range", QuestionType::Number).with_range(5.0, 1.0));
    definition.instruments[0].question_ids.push("q1".to_string());
    definition.instruments[0].question_ids.push("ghost".to_string());
    definition.rules.push(BranchingRule {
        id: "bad".to_string(),
        description: "references things that do not exist".to_string(),
        condition: Condition::All {
            conditions: vec![
                Condition::ScoreAtLeast {
                    instrument: "unknown".to_string(),
                    threshold: 1,
                },
                Condition::Answered {
                    question_id: "missing".to_string(),
                },
                Condition::Any {
                    conditions: Vec::new(),
                },
            ],
        },
        step: "nowhere".to_string(),
        questions: Vec::new(),
    });

    let found = defects(definition);
    let expected = [
        ConfigDefect::DuplicateQuestion {
            question_id: "q1".to_string(),
        },
        ConfigDefect::MissingChoices {
            question_id: "choice".to_string(),
        },
        ConfigDefect::InvertedRange {
            question_id: "range".to_string(),
            min: 5.0,
            max: 1.0,
        },
        ConfigDefect::DuplicateInstrumentQuestion {
            instrument_id: "mini".to_string(),
            question_id: "q1".to_string(),
        },
        ConfigDefect::UnknownInstrumentQuestion {
            instrument_id: "mini".to_string(),
            question_id: "ghost".to_string(),
        },
        ConfigDefect::EmptyRule {
            rule_id: "bad".to_string(),
        },
        ConfigDefect::UnknownRuleStep {
            rule_id: "bad".to_string(),
            step_id: "nowhere".to_string(),
        },
        ConfigDefect::UnknownConditionInstrument {
            rule_id: "bad".to_string(),
            instrument_id: "unknown".to_string(),
        },
        ConfigDefect::UnknownConditionQuestion {
            rule_id: "bad".to_string(),
            question_id: "missing".to_string(),
        },
        ConfigDefect::EmptyCondition {
            rule_id: "bad".to_string(),
        },
    ];
    for defect in &expected {
        assert!(found.contains(defect), "missing {defect:?} in {found:?}");
    }
}

#[test]
fn invalid_pattern_is_a_configuration_defect() {
    let mut definition = minimal_definition();
    definition.steps[0]
        .questions
        .push(Question::new("zip", "ZIP", QuestionType::ShortText).with_pattern("[0-9"));
    assert!(matches!(
        defects(definition).as_slice(),
        [ConfigDefect::InvalidPattern { question_id, .. }] if question_id == "zip"
    ));
}

#[test]
fn patterns_are_compiled_once_at_load() {
    let mut definition = minimal_definition();
    definition.steps[0]
        .questions
        .push(Question::new("zip", "ZIP", QuestionType::ShortText).with_pattern(r"^\d{5}$"));
    let questionnaire = Questionnaire::load(definition).unwrap();

    let zip = questionnaire.pattern("zip").unwrap();
    assert_eq!(zip.as_str(), r"^\d{5}$");
    assert!(zip.is_match("02139"));
    assert!(questionnaire.pattern("q1").is_none());
}

#[test]
fn rules_may_share_identical_questions_but_not_conflicting_ones() {
    let follow_up = Question::new("follow", "Follow up", QuestionType::ShortText);
    let make_rule = |id: &str, question: Question| BranchingRule {
        id: id.to_string(),
        description: String::new(),
        condition: Condition::Answered {
            question_id: "q1".to_string(),
        },
        step: "main".to_string(),
        questions: vec![question],
    };

    let mut shared = minimal_definition();
    shared.rules.push(make_rule("a", follow_up.clone()));
    shared.rules.push(make_rule("b", follow_up.clone()));
    assert!(Questionnaire::load(shared).is_ok());

    let mut conflicting = minimal_definition();
    conflicting.rules.push(make_rule("a", follow_up.clone()));
    conflicting
        .rules
        .push(make_rule("b", follow_up.required()));
    assert_eq!(
        defects(conflicting),
        vec![ConfigDefect::ConflictingQuestion {
            question_id: "follow".to_string(),
            rule_id: "b".to_string(),
        }]
    );
}

#[test]
fn malformed_json_is_a_configuration_error() {
    assert!(matches!(
        Questionnaire::from_json("{ not json"),
        Err(ConfigurationError::Parse(_))
    ));
}

#[test]
fn definitions_round_trip_through_json() {
    let json = serde_json::to_string(&default_definition()).unwrap();
    let questionnaire = Questionnaire::from_json(&json).unwrap();
    assert_eq!(questionnaire.definition(), &default_definition());
}

#[test]
fn visible_set_is_base_questions_then_revealed_in_rule_order() {
    let questionnaire = default_screening().unwrap();
    let empty = questionnaire.visible_questions(&AnswerMap::new());
    assert_eq!(empty.len(), 16);
    assert!(empty[..9].iter().all(|v| v.step == 0));
    assert!(empty[9..].iter().all(|v| v.step == 1));

    let mut answers = AnswerMap::new();
    answers.insert("phq9_q9".to_string(), AnswerValue::Number(2.0));
    let visible = questionnaire.visible_questions(&answers);
    let tail: Vec<(usize, &str)> = visible[16..]
        .iter()
        .map(|v| (v.step, v.question.id.as_str()))
        .collect();
    assert_eq!(
        tail,
        vec![
            (0, "phq9_difficulty"),
            (2, "safety_plan_contact"),
            (2, "safety_plan_activities"),
        ]
    );
}

#[test]
fn instrument_thresholds_override_the_questionnaire_table() {
    let mut definition = minimal_definition();
    definition.instruments[0].thresholds = Some(RiskThresholds {
        low: 1,
        moderate: 2,
        high: 3,
    });
    let questionnaire = Questionnaire::load(definition).unwrap();
    let scores = vec![InstrumentScore {
        instrument_id: "mini".to_string(),
        score: 3,
    }];
    assert_eq!(questionnaire.classify(&scores), RiskBand::High);
    assert!(questionnaire.score_instrument("other", &AnswerMap::new()).is_err());
}
