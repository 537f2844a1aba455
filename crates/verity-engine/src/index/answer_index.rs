//! Inverted views over a set of answers, built in a single pass.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use verity_core::{Answer, ChoiceId, ParticipantId, QuestionId};

/// Read-only index over a finite set of answers.
///
/// Every answer appears in exactly one slice of each of the four views (by
/// question, by participant, by choice, by participant and question). The
/// index is never mutated after construction; estimators keep their working
/// state elsewhere.
#[derive(Debug, Clone, Default)]
pub struct AnswerIndex {
    answers: Vec<Answer>,
    by_question: FxHashMap<QuestionId, Vec<usize>>,
    by_participant: FxHashMap<ParticipantId, Vec<usize>>,
    by_choice: FxHashMap<ChoiceId, Vec<usize>>,
    by_participant_question: FxHashMap<(ParticipantId, QuestionId), SmallVec<[usize; 2]>>,
    questions: Vec<QuestionId>,
    participants: Vec<ParticipantId>,
    choices: Vec<ChoiceId>,
}

impl AnswerIndex {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        let answers: Vec<Answer> = answers.into_iter().collect();
        let mut by_question: FxHashMap<QuestionId, Vec<usize>> = FxHashMap::default();
        let mut by_participant: FxHashMap<ParticipantId, Vec<usize>> = FxHashMap::default();
        let mut by_choice: FxHashMap<ChoiceId, Vec<usize>> = FxHashMap::default();
        let mut by_participant_question: FxHashMap<(ParticipantId, QuestionId), SmallVec<[usize; 2]>> =
            FxHashMap::default();

        for (position, answer) in answers.iter().enumerate() {
            by_question
                .entry(answer.question.clone())
                .or_default()
                .push(position);
            by_participant
                .entry(answer.participant.clone())
                .or_default()
                .push(position);
            by_choice
                .entry(answer.choice.clone())
                .or_default()
                .push(position);
            by_participant_question
                .entry((answer.participant.clone(), answer.question.clone()))
                .or_default()
                .push(position);
        }

        let questions = sorted_keys(&by_question);
        let participants = sorted_keys(&by_participant);
        let choices = sorted_keys(&by_choice);

        Self {
            answers,
            by_question,
            by_participant,
            by_choice,
            by_participant_question,
            questions,
            participants,
            choices,
        }
    }

    /// All answers in insertion order.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Distinct questions, sorted.
    pub fn questions(&self) -> &[QuestionId] {
        &self.questions
    }

    /// Distinct participants, sorted.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// Distinct choices, sorted.
    pub fn choices(&self) -> &[ChoiceId] {
        &self.choices
    }

    pub fn answers_for_question(&self, question: &QuestionId) -> AnswerIter<'_> {
        self.view(self.by_question.get(question).map(Vec::as_slice))
    }

    pub fn answers_for_participant(&self, participant: &ParticipantId) -> AnswerIter<'_> {
        self.view(self.by_participant.get(participant).map(Vec::as_slice))
    }

    pub fn answers_for_choice(&self, choice: &ChoiceId) -> AnswerIter<'_> {
        self.view(self.by_choice.get(choice).map(Vec::as_slice))
    }

    pub fn answers_for_participant_and_question(
        &self,
        participant: &ParticipantId,
        question: &QuestionId,
    ) -> AnswerIter<'_> {
        let key = (participant.clone(), question.clone());
        self.view(self.by_participant_question.get(&key).map(SmallVec::as_slice))
    }

    pub fn contains_participant(&self, participant: &ParticipantId) -> bool {
        self.by_participant.contains_key(participant)
    }

    pub fn contains_question(&self, question: &QuestionId) -> bool {
        self.by_question.contains_key(question)
    }

    pub fn contains_choice(&self, choice: &ChoiceId) -> bool {
        self.by_choice.contains_key(choice)
    }

    /// A new index over the answers of the participants `keep` accepts, in
    /// the same insertion order.
    pub fn filter_participants<F>(&self, mut keep: F) -> AnswerIndex
    where
        F: FnMut(&ParticipantId) -> bool,
    {
        AnswerIndex::new(
            self.answers
                .iter()
                .filter(|answer| keep(&answer.participant))
                .cloned(),
        )
    }

    fn view<'a>(&'a self, positions: Option<&'a [usize]>) -> AnswerIter<'a> {
        AnswerIter {
            answers: &self.answers,
            positions: positions.unwrap_or(&[]).iter(),
        }
    }
}

impl FromIterator<Answer> for AnswerIndex {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Iterator over one slice of an index view. Unknown keys yield an empty
/// iterator.
#[derive(Debug, Clone)]
pub struct AnswerIter<'a> {
    answers: &'a [Answer],
    positions: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for AnswerIter<'a> {
    type Item = &'a Answer;

    fn next(&mut self) -> Option<Self::Item> {
        self.positions.next().map(|&i| &self.answers[i])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl ExactSizeIterator for AnswerIter<'_> {}

fn sorted_keys<K: Ord + Clone, V>(map: &FxHashMap<K, V>) -> Vec<K> {
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnswerIndex {
        AnswerIndex::new(vec![
            Answer::new("w2", "q1", "A"),
            Answer::new("w1", "q1", "B"),
            Answer::new("w1", "q1", "B"),
            Answer::new("w1", "q2", "A"),
        ])
    }

    #[test]
    fn test_keys_are_sorted_and_distinct() {
        let index = sample();
        let participants: Vec<&str> = index.participants().iter().map(|p| p.as_str()).collect();
        assert_eq!(participants, vec!["w1", "w2"]);
        assert_eq!(index.questions().len(), 2);
        assert_eq!(index.choices().len(), 2);
    }

    #[test]
    fn test_unknown_keys_yield_empty() {
        let index = sample();
        assert_eq!(index.answers_for_question(&QuestionId::new("nope")).len(), 0);
        assert_eq!(
            index
                .answers_for_participant_and_question(&ParticipantId::new("w2"), &QuestionId::new("q2"))
                .count(),
            0
        );
    }

    #[test]
    fn test_repeat_annotations_are_kept() {
        let index = sample();
        let pair = index
            .answers_for_participant_and_question(&ParticipantId::new("w1"), &QuestionId::new("q1"));
        assert_eq!(pair.len(), 2);
    }
}
