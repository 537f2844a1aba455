//! Tagged estimator output, algorithm dispatch, and final decisions.

use verity_core::config::{ConfigOverrides, InferenceConfig, VerityConfig};
use verity_core::errors::LookupError;
use verity_core::{Answer, ChoiceId, ParticipantId, QuestionId};
use verity_engine::estimators::MajorityVote;
use verity_engine::{run_algorithm, Algorithm, AnswerIndex, Decision, EstimatorOutput, TruthEstimator};

fn crowd() -> AnswerIndex {
    let choices = ["a", "b", "c"];
    let mut answers = Vec::new();
    for i in 0..10 {
        let question = format!("q{i:02}");
        let correct = choices[i % 3];
        for reliable in ["alice", "bob", "carol"] {
            answers.push(Answer::new(reliable, question.as_str(), correct));
        }
        answers.push(Answer::new("erin", question.as_str(), "c"));
    }
    AnswerIndex::new(answers)
}

fn two_raters() -> AnswerIndex {
    AnswerIndex::new(vec![
        Answer::new("r1", "q1", "yes"),
        Answer::new("r2", "q1", "yes"),
        Answer::new("r1", "q2", "no"),
        Answer::new("r2", "q2", "no"),
        Answer::new("r1", "q3", "yes"),
        Answer::new("r2", "q3", "no"),
    ])
}

#[test]
fn test_every_algorithm_dispatches() {
    let index = crowd();
    let config = InferenceConfig::default();
    for algorithm in Algorithm::ALL {
        let output = run_algorithm(algorithm, &index, &config).unwrap();
        assert_eq!(output.algorithm(), algorithm);

        let decisions = output.decisions();
        assert_eq!(decisions.len(), 10, "{}", algorithm);
        for (question, decision) in &decisions {
            let i: usize = question.as_str()[1..].parse().unwrap();
            assert_eq!(
                decision.choice().map(ChoiceId::as_str),
                Some(["a", "b", "c"][i % 3]),
                "{} on {}",
                algorithm,
                question
            );
        }
    }
}

#[test]
fn test_participant_scores_rank_reliable_above_spammer() {
    let index = crowd();
    let config = InferenceConfig::default();
    for algorithm in Algorithm::ALL {
        let output = run_algorithm(algorithm, &index, &config).unwrap();
        let alice = output.participant_score(&ParticipantId::new("alice")).unwrap();
        let erin = output.participant_score(&ParticipantId::new("erin")).unwrap();
        assert!(alice > erin, "{}: alice {} erin {}", algorithm, alice, erin);
    }
}

#[test]
fn test_unknown_participant_fails_fast() {
    let output = run_algorithm(Algorithm::Catd, &crowd(), &InferenceConfig::default()).unwrap();
    let err = output
        .participant_score(&ParticipantId::new("mallory"))
        .unwrap_err();
    assert_eq!(err, LookupError::UnknownParticipant(ParticipantId::new("mallory")));
}

#[test]
fn test_unknown_question_fails_fast() {
    let output = run_algorithm(Algorithm::ZenCrowd, &crowd(), &InferenceConfig::default()).unwrap();
    assert!(output.decision_for(&QuestionId::new("q99")).is_err());
    assert!(output.question_scores(&QuestionId::new("q99")).is_none());
}

#[test]
fn test_symmetric_split_is_undecidable() {
    let output = run_algorithm(Algorithm::DawidSkene, &two_raters(), &InferenceConfig::default()).unwrap();
    assert_eq!(
        output.decision_for(&QuestionId::new("q3")).unwrap(),
        Decision::Undecidable {
            tied: vec![ChoiceId::new("no"), ChoiceId::new("yes")]
        }
    );
    assert!(output.decision_for(&QuestionId::new("q1")).unwrap().is_decided());
}

#[test]
fn test_fast_schedule_breaks_split_by_smallest_choice() {
    let output =
        run_algorithm(Algorithm::FastDawidSkene, &two_raters(), &InferenceConfig::default()).unwrap();
    let decision = output.decision_for(&QuestionId::new("q3")).unwrap();
    assert_eq!(decision.choice().map(ChoiceId::as_str), Some("no"));
}

#[test]
fn test_majority_tie_is_undecidable() {
    let output: EstimatorOutput = MajorityVote.estimate(&two_raters()).into();
    assert!(!output.decision_for(&QuestionId::new("q3")).unwrap().is_decided());
    let scores = output.question_scores(&QuestionId::new("q3")).unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|(_, share)| (*share - 0.5).abs() < 1e-12));
}

#[test]
fn test_config_flows_into_estimators() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("verity.toml"), "[inference]\nmax_iterations = 1\n").unwrap();
    let overrides = ConfigOverrides {
        parallel: Some(false),
        ..Default::default()
    };
    let config = VerityConfig::load(dir.path(), Some(&overrides)).unwrap();

    let output = run_algorithm(Algorithm::DawidSkene, &two_raters(), &config.inference).unwrap();
    match output {
        EstimatorOutput::DawidSkene(result) => assert_eq!(result.convergence.iterations, 1),
        other => panic!("unexpected output {:?}", other.algorithm()),
    }
}

#[test]
fn test_algorithm_names_parse() {
    assert_eq!("hybrid-dawid-skene".parse::<Algorithm>().unwrap(), Algorithm::HybridDawidSkene);
    assert!("learning-from-crowds".parse::<Algorithm>().is_err());
}

#[test]
fn test_output_serializes_with_family_tag() {
    let output = run_algorithm(Algorithm::Crh, &crowd(), &InferenceConfig::default()).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["family"], "crh");
    assert_eq!(json["result"]["algorithm"], "crh");
    assert!(json["result"]["weights"]["alice"].is_number());
}
