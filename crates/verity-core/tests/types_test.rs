//! Tests for identifiers and answers.

use std::collections::{BTreeSet, HashSet};

use verity_core::{Answer, ChoiceId, ParticipantId, QuestionId};

#[test]
fn test_answer_new_accepts_strings_and_ids() {
    let participant = ParticipantId::new("worker-7");
    let a = Answer::new(&participant, "q1", String::from("yes"));
    assert_eq!(a.participant, participant);
    assert_eq!(a.question.as_str(), "q1");
    assert_eq!(a.choice, ChoiceId::from("yes"));
}

#[test]
fn test_ids_hash_and_compare_by_value() {
    let a = QuestionId::new("q1");
    let b = QuestionId::from(String::from("q1"));
    assert_eq!(a, b);

    let set: HashSet<QuestionId> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_duplicate_answers_are_equal() {
    let a = Answer::new("w1", "q1", "A");
    let b = Answer::new("w1", "q1", "A");
    assert_eq!(a, b);
    let ordered: BTreeSet<Answer> = [Answer::new("w2", "q1", "A"), a, b].into_iter().collect();
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered.iter().next().unwrap().participant.as_str(), "w1");
}

#[test]
fn test_answer_json_shape() {
    let a = Answer::new("w1", "q1", "A");
    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"participant": "w1", "question": "q1", "choice": "A"})
    );
    let back: Answer = serde_json::from_value(json).unwrap();
    assert_eq!(back, a);
}

#[test]
fn test_display_matches_underlying_string() {
    assert_eq!(ParticipantId::new("alice").to_string(), "alice");
}
