use pretty_assertions::assert_eq;
use proptest::prelude::*;

use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::question::{Question, QuestionType};
use screener_instruments::default_definition;
use screener_instruments::rules::{evaluate, BranchingRule, Condition};
use screener_instruments::scoring::InstrumentDefinition;

fn answers(pairs: &[(&str, f64)]) -> AnswerMap {
    pairs
        .iter()
        .map(|(id, v)| (id.to_string(), AnswerValue::Number(*v)))
        .collect()
}

fn revealed_ids(rules: &[BranchingRule], answers: &AnswerMap, instruments: &[InstrumentDefinition]) -> Vec<String> {
    evaluate(rules, answers, instruments)
        .into_iter()
        .map(|q| q.id)
        .collect()
}

fn text_question(id: &str) -> Question {
    Question::new(id, id, QuestionType::ShortText)
}

fn rule(id: &str, condition: Condition, questions: &[&str]) -> BranchingRule {
    BranchingRule {
        id: id.to_string(),
        description: format!("test rule {id}"),
        condition,
        step: "main".to_string(),
        questions: questions.iter().map(|q| text_question(q)).collect(),
    }
}

fn answered(question_id: &str) -> Condition {
    Condition::Answered {
        question_id: question_id.to_string(),
    }
}

#[test]
fn phq9_item_nine_reveals_the_safety_plan() {
    let definition = default_definition();
    let ids = revealed_ids(&definition.rules, &answers(&[("phq9_q9", 1.0)]), &definition.instruments);
    assert!(ids.contains(&"safety_plan_contact".to_string()));
    assert!(ids.contains(&"safety_plan_activities".to_string()));

    let ids = revealed_ids(&definition.rules, &answers(&[("phq9_q9", 0.0)]), &definition.instruments);
    assert!(!ids.contains(&"safety_plan_contact".to_string()));
    assert!(!ids.contains(&"safety_plan_activities".to_string()));
}

#[test]
fn gad7_total_of_ten_reveals_panic_question() {
    let definition = default_definition();
    let ten = answers(&[
        ("gad7_q1", 3.0),
        ("gad7_q2", 3.0),
        ("gad7_q3", 2.0),
        ("gad7_q4", 1.0),
        ("gad7_q5", 1.0),
        ("gad7_q6", 0.0),
        ("gad7_q7", 0.0),
    ]);
    let ids = revealed_ids(&definition.rules, &ten, &definition.instruments);
    assert!(ids.contains(&"panic_episodes".to_string()));

    let mut nine = ten.clone();
    nine.insert("gad7_q5".to_string(), AnswerValue::Number(0.0));
    let ids = revealed_ids(&definition.rules, &nine, &definition.instruments);
    assert!(!ids.contains(&"panic_episodes".to_string()));
}

#[test]
fn questions_appear_once_in_first_rule_order() {
    let rules = vec![
        rule("first", answered("a"), &["x", "shared", "y"]),
        rule("second", answered("a"), &["shared", "z", "x"]),
    ];
    let map: AnswerMap = [("a".to_string(), AnswerValue::from("yes"))].into_iter().collect();
    assert_eq!(revealed_ids(&rules, &map, &[]), vec!["x", "shared", "y", "z"]);
}

#[test]
fn a_later_rule_keeps_its_position_when_an_earlier_one_is_off() {
    let rules = vec![
        rule("off", answered("missing"), &["shared"]),
        rule("on", answered("a"), &["z", "shared"]),
    ];
    let map: AnswerMap = [("a".to_string(), AnswerValue::from("yes"))].into_iter().collect();
    assert_eq!(revealed_ids(&rules, &map, &[]), vec!["z", "shared"]);
}

#[test]
fn a_failing_rule_is_skipped_without_affecting_others() {
    let broken = rule(
        "broken",
        Condition::ScoreAtLeast {
            instrument: "not_configured".to_string(),
            threshold: 0,
        },
        &["never"],
    );
    let good = rule("good", answered("a"), &["shown"]);
    let map: AnswerMap = [("a".to_string(), AnswerValue::from("yes"))].into_iter().collect();

    let with_broken = revealed_ids(&[broken, good.clone()], &map, &[]);
    let without = revealed_ids(&[good], &map, &[]);
    assert_eq!(with_broken, without);
    assert_eq!(without, vec!["shown"]);
}

#[test]
fn comparisons_on_missing_or_text_answers_are_false() {
    let condition = Condition::AnswerGreaterThan {
        question_id: "q".to_string(),
        value: 0.0,
    };
    assert!(!condition.evaluate(&AnswerMap::new(), &[]).unwrap());
    let text: AnswerMap = [("q".to_string(), AnswerValue::from("lots"))].into_iter().collect();
    assert!(!condition.evaluate(&text, &[]).unwrap());
    let numeric_text: AnswerMap = [("q".to_string(), AnswerValue::from("2"))].into_iter().collect();
    assert!(condition.evaluate(&numeric_text, &[]).unwrap());
}

#[test]
fn answer_equals_matches_a_multiple_choice_selection() {
    let both = AnswerValue::List(vec![AnswerValue::from("sleep"), AnswerValue::from("work")]);
    let rules = vec![rule(
        "both_selected",
        Condition::AnswerEquals {
            question_id: "triggers".to_string(),
            value: both.clone(),
        },
        &["triggers_detail"],
    )];

    let reordered = AnswerMap::from([(
        "triggers".to_string(),
        AnswerValue::List(vec![AnswerValue::from("work"), AnswerValue::from("sleep")]),
    )]);
    assert_eq!(revealed_ids(&rules, &reordered, &[]), vec!["triggers_detail"]);

    let partial = AnswerMap::from([(
        "triggers".to_string(),
        AnswerValue::List(vec![AnswerValue::from("sleep")]),
    )]);
    assert!(revealed_ids(&rules, &partial, &[]).is_empty());
}

#[test]
fn composite_conditions_combine() {
    let map = answers(&[("a", 2.0), ("b", 0.0)]);
    let a_at_least_two = Condition::AnswerAtLeast {
        question_id: "a".to_string(),
        value: 2.0,
    };
    let b_equals_one = Condition::AnswerEquals {
        question_id: "b".to_string(),
        value: AnswerValue::Number(1.0),
    };

    let all = Condition::All {
        conditions: vec![a_at_least_two.clone(), b_equals_one.clone()],
    };
    let any = Condition::Any {
        conditions: vec![a_at_least_two, b_equals_one.clone()],
    };
    let not = Condition::Not {
        condition: Box::new(b_equals_one),
    };
    assert!(!all.evaluate(&map, &[]).unwrap());
    assert!(any.evaluate(&map, &[]).unwrap());
    assert!(not.evaluate(&map, &[]).unwrap());
}

#[test]
fn conditions_deserialize_from_tagged_json() {
    let condition: Condition = serde_json::from_str(
        r#"{"kind": "any", "conditions": [
            {"kind": "score_at_least", "instrument": "gad7", "threshold": 10},
            {"kind": "answer_equals", "question_id": "q", "value": "yes"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(
        condition,
        Condition::Any {
            conditions: vec![
                Condition::ScoreAtLeast {
                    instrument: "gad7".to_string(),
                    threshold: 10,
                },
                Condition::AnswerEquals {
                    question_id: "q".to_string(),
                    value: AnswerValue::from("yes"),
                },
            ],
        }
    );
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(
        phq in proptest::collection::vec(0u8..=3, 9),
        gad in proptest::collection::vec(0u8..=3, 7),
    ) {
        let definition = default_definition();
        let mut map = AnswerMap::new();
        for (i, v) in phq.iter().enumerate() {
            map.insert(format!("phq9_q{}", i + 1), AnswerValue::Number(f64::from(*v)));
        }
        for (i, v) in gad.iter().enumerate() {
            map.insert(format!("gad7_q{}", i + 1), AnswerValue::Number(f64::from(*v)));
        }
        let first = evaluate(&definition.rules, &map, &definition.instruments);
        let second = evaluate(&definition.rules, &map, &definition.instruments);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn a_faulty_rule_never_changes_the_result(position in 0usize..4, a in proptest::option::of(0u8..3)) {
        let mut rules = vec![
            rule("r1", answered("a"), &["x", "y"]),
            rule("r2", Condition::Not { condition: Box::new(answered("a")) }, &["y", "z"]),
            rule("r3", Condition::AnswerAtLeast { question_id: "a".to_string(), value: 1.0 }, &["w", "x"]),
        ];
        let map: AnswerMap = a
            .map(|v| ("a".to_string(), AnswerValue::Number(f64::from(v))))
            .into_iter()
            .collect();
        let expected = revealed_ids(&rules, &map, &[]);

        let faulty = rule(
            "faulty",
            Condition::ScoreAtLeast { instrument: "ghost".to_string(), threshold: 0 },
            &["x", "ghost_q"],
        );
        rules.insert(position.min(rules.len()), faulty);
        prop_assert_eq!(revealed_ids(&rules, &map, &[]), expected);
    }
}
