//! Dense, integer-indexed counts derived from an `AnswerIndex`.
//!
//! Estimators iterate over positions into the sorted key vectors instead of
//! hashing identifiers inside their loops. Because the key vectors are
//! sorted, "smallest position" is the same as "lexicographically smallest
//! identifier", which is the tie-break every estimator uses.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use super::AnswerIndex;

/// How many times one participant picked one choice for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub participant: usize,
    pub question: usize,
    pub choice: usize,
    pub count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Tally {
    pub questions: Vec<QuestionId>,
    pub participants: Vec<ParticipantId>,
    pub choices: Vec<ChoiceId>,
    /// Per question, sorted by participant then choice.
    pub by_question: Vec<Vec<Response>>,
    /// Per participant, sorted by question then choice.
    pub by_participant: Vec<Vec<Response>>,
}

impl Tally {
    pub fn from_index(index: &AnswerIndex) -> Self {
        Self::with_extra_choices(index, &[])
    }

    /// Like `from_index`, but the choice universe also contains `extra`
    /// choices nobody picked (a closed task's full vocabulary).
    pub fn with_extra_choices(index: &AnswerIndex, extra: &[ChoiceId]) -> Self {
        let questions = index.questions().to_vec();
        let participants = index.participants().to_vec();
        let mut choices: Vec<ChoiceId> = index.choices().iter().chain(extra).cloned().collect();
        choices.sort();
        choices.dedup();

        let question_pos = positions(&questions);
        let participant_pos = positions(&participants);
        let choice_pos = positions(&choices);

        let mut counts: BTreeMap<(usize, usize, usize), u32> = BTreeMap::new();
        for answer in index.answers() {
            let key = (
                question_pos[&answer.question],
                participant_pos[&answer.participant],
                choice_pos[&answer.choice],
            );
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut by_question = vec![Vec::new(); questions.len()];
        let mut by_participant = vec![Vec::new(); participants.len()];
        for (&(question, participant, choice), &count) in &counts {
            let response = Response {
                participant,
                question,
                choice,
                count,
            };
            by_question[question].push(response);
            by_participant[participant].push(response);
        }

        Self {
            questions,
            participants,
            choices,
            by_question,
            by_participant,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Total answers given by a participant, repeats included.
    pub fn answer_count(&self, participant: usize) -> u32 {
        self.by_participant[participant].iter().map(|r| r.count).sum()
    }

    /// Per-participant answer vectors for one question: each item is a
    /// participant and the responses that participant gave to the question.
    pub fn vectors(&self, question: usize) -> impl Iterator<Item = (usize, &[Response])> {
        self.by_question[question]
            .chunk_by(|a, b| a.participant == b.participant)
            .map(|chunk| (chunk[0].participant, chunk))
    }

    /// Per-question answer vectors for one participant.
    pub fn vectors_of(&self, participant: usize) -> impl Iterator<Item = (usize, &[Response])> {
        self.by_participant[participant]
            .chunk_by(|a, b| a.question == b.question)
            .map(|chunk| (chunk[0].question, chunk))
    }

    /// Per-question choice counts, summed over participants.
    pub fn choice_counts(&self, question: usize) -> Vec<u32> {
        let mut counts = vec![0u32; self.choices.len()];
        for response in &self.by_question[question] {
            counts[response.choice] += response.count;
        }
        counts
    }
}

fn positions<K: std::hash::Hash + Eq + Clone>(keys: &[K]) -> FxHashMap<K, usize> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_core::Answer;

    #[test]
    fn test_counts_collapse_repeats() {
        let index = AnswerIndex::new(vec![
            Answer::new("w1", "q1", "B"),
            Answer::new("w1", "q1", "B"),
            Answer::new("w2", "q1", "A"),
        ]);
        let tally = Tally::from_index(&index);
        assert_eq!(tally.by_question[0].len(), 2);
        assert_eq!(tally.choice_counts(0), vec![1, 2]);
        assert_eq!(tally.answer_count(0), 2);
    }

    #[test]
    fn test_extra_choices_extend_universe() {
        let index = AnswerIndex::new(vec![Answer::new("w1", "q1", "B")]);
        let tally = Tally::with_extra_choices(&index, &[ChoiceId::new("A"), ChoiceId::new("B")]);
        let names: Vec<&str> = tally.choices.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(tally.by_question[0][0].choice, 1);
    }

    #[test]
    fn test_vectors_group_by_participant() {
        let index = AnswerIndex::new(vec![
            Answer::new("w1", "q1", "A"),
            Answer::new("w1", "q1", "B"),
            Answer::new("w2", "q1", "A"),
        ]);
        let tally = Tally::from_index(&index);
        let grouped: Vec<(usize, usize)> = tally.vectors(0).map(|(p, r)| (p, r.len())).collect();
        assert_eq!(grouped, vec![(0, 2), (1, 1)]);
    }
}
