//! Projector state machine
//!
//! The projector is the single screen the room watches and the only writer
//! of the countdown record. It walks the question list through a fixed
//! sequence of phases: show a question, open it for answers by publishing
//! the countdown, collect the answers when the window closes, then move
//! on. Every action pattern-matches the current state and is a silent
//! no-op anywhere else, so a double-clicked button or a stale event
//! cannot derail the machine.

use serde::{Deserialize, Serialize};

use crate::{
    answer::Answer,
    countdown::{CountdownRequest, Tracker},
    question::Question,
    store::{self, Keyed, Store},
};

/// The phase the projector screen is currently in
///
/// The machine only ever moves forward: `Idle` through the per-question
/// cycle to `FinalResult`, which is terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum State {
    /// Waiting for the quiz to start
    #[default]
    Idle,
    /// Presenting a question before answers are open
    Open(Question),
    /// The question is open for answers and the countdown is live
    Answering(Question),
    /// Showing the collected answers for a question
    Result {
        /// The question whose answers are displayed
        question: Question,
        /// Every answer submitted for it, in store order
        answers: Vec<Keyed<Answer>>,
    },
    /// The terminal screen; the final aggregation is produced externally
    FinalResult,
}

/// Drives the projector through the quiz
///
/// Transitions that write to or read from the store only commit after the
/// operation succeeds: a failed request surfaces its error and leaves the
/// machine where it was.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Projector {
    state: State,
}

impl Projector {
    /// Creates a projector in the idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Starts the quiz with the first question of the list
    ///
    /// No-op unless idle, and no-op while the question list is empty or
    /// unavailable.
    pub fn start(&mut self, questions: &[Question]) {
        if !matches!(self.state, State::Idle) {
            return;
        }
        let Some(first) = questions.first() else {
            return;
        };
        self.state = State::Open(first.clone());
    }

    /// Opens the presented question for answers
    ///
    /// Publishes the countdown record (the question minus its text; the
    /// store's server stamps the start time) and seeds the local tracker
    /// with the full window so the screen shows it immediately, before the
    /// resolved record comes back. No-op unless a question is being
    /// presented.
    ///
    /// # Errors
    ///
    /// Returns the store's error if publishing fails; the state is then
    /// unchanged and the tracker untouched.
    pub fn begin_answering<S: Store>(
        &mut self,
        store: &S,
        countdown: &mut Tracker,
    ) -> Result<(), S::Error> {
        let State::Open(question) = &self.state else {
            return Ok(());
        };
        let question = question.clone();

        let request = CountdownRequest {
            question: question.without_text(),
        };
        store.publish_countdown(&request)?;
        countdown.seed(request.question);

        self.state = State::Answering(question);
        Ok(())
    }

    /// Closes the answering phase and collects the submitted answers
    ///
    /// Performs a one-shot read of every answer for the open question at
    /// this moment (not a live subscription), skipping malformed records;
    /// no answers at all yields an empty result list. Reached from the
    /// countdown expiring or from a manual trigger, both through the same
    /// guard. No-op unless a question is open for answers.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the read fails; the state is then
    /// unchanged.
    pub fn show_result<S: Store>(&mut self, store: &S) -> Result<(), S::Error> {
        let State::Answering(question) = &self.state else {
            return Ok(());
        };
        let question = question.clone();

        let answers = store
            .answers_for_question(question.id)?
            .into_iter()
            .filter_map(store::decode_keyed::<Answer>)
            .collect();

        self.state = State::Result { question, answers };
        Ok(())
    }

    /// Moves on to the question following the displayed one
    ///
    /// "Following" is by position in the supplied list. No-op unless a
    /// result is displayed, when the displayed question is the last one,
    /// or when it no longer appears in the list.
    pub fn advance(&mut self, questions: &[Question]) {
        let State::Result { question, .. } = &self.state else {
            return;
        };
        let current_id = question.id;

        let Some(index) = questions.iter().position(|q| q.id == current_id) else {
            return;
        };
        let Some(next) = questions.get(index + 1) else {
            return;
        };

        self.state = State::Open(next.clone());
    }

    /// Moves to the terminal final-result screen
    ///
    /// Only reachable from the result of the last question in the list;
    /// everywhere else this is a no-op. There is no way out of
    /// `FinalResult`.
    pub fn finish(&mut self, questions: &[Question]) {
        let State::Result { question, .. } = &self.state else {
            return;
        };
        let current_id = question.id;

        match questions.iter().position(|q| q.id == current_id) {
            Some(index) if index + 1 == questions.len() => {
                self.state = State::FinalResult;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{
        question::QuestionId,
        store::{
            RawRecord, RecordKey,
            mock::{MockStore, Op},
        },
    };

    fn sample_question(id: i64) -> Question {
        Question {
            id: QuestionId::from(id),
            text: format!("Question {id}"),
            seconds: Duration::from_secs(30),
            min: 0.0,
            max: 100.0,
            step: 1.0,
            unit: String::new(),
        }
    }

    fn questions() -> Vec<Question> {
        vec![sample_question(1), sample_question(2)]
    }

    fn answer_record(key: &str, user_id: &str, question_id: i64, value: f64) -> Keyed<RawRecord> {
        Keyed {
            key: RecordKey::from(key),
            value: json!({
                "userId": user_id,
                "questionId": question_id,
                "answer": value,
            }),
        }
    }

    fn current_question_id(projector: &Projector) -> Option<QuestionId> {
        match projector.state() {
            State::Open(question) | State::Answering(question) => Some(question.id),
            State::Result { question, .. } => Some(question.id),
            State::Idle | State::FinalResult => None,
        }
    }

    #[test]
    fn test_start_requires_questions() {
        let mut projector = Projector::new();

        projector.start(&[]);
        assert!(matches!(projector.state(), State::Idle));

        projector.start(&questions());
        assert!(matches!(projector.state(), State::Open(q) if q.id == QuestionId::from(1)));
    }

    #[test]
    fn test_start_is_guarded_against_repeats() {
        let mut projector = Projector::new();
        projector.start(&questions());

        // A second click must not rewind to the first question later on.
        projector.start(&questions());
        assert!(matches!(projector.state(), State::Open(q) if q.id == QuestionId::from(1)));
    }

    #[test]
    fn test_begin_answering_publishes_and_seeds() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        projector.begin_answering(&store, &mut countdown).unwrap();

        assert!(matches!(projector.state(), State::Answering(_)));
        assert_eq!(countdown.remaining(), 30);

        let ops = store.ops();
        let Op::PublishCountdown(request) = &ops[0] else {
            panic!("expected a countdown publish");
        };
        assert_eq!(request.question.id, QuestionId::from(1));
        // The published record carries the question minus its text.
        let value = serde_json::to_value(request).unwrap();
        assert!(value["question"].get("text").is_none());
    }

    #[test]
    fn test_begin_answering_requires_open_state() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.begin_answering(&store, &mut countdown).unwrap();

        assert!(matches!(projector.state(), State::Idle));
        assert!(store.ops().is_empty());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn test_begin_answering_keeps_state_on_store_failure() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        store.fail_next_requests(true);

        assert!(projector.begin_answering(&store, &mut countdown).is_err());
        assert!(matches!(projector.state(), State::Open(_)));
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn test_show_result_fetches_answers_for_the_open_question() {
        let store = MockStore::with_answers(vec![
            answer_record("-a1", "alice", 1, 40.0),
            answer_record("-a2", "bob", 1, 60.0),
            Keyed {
                key: RecordKey::from("-bad"),
                value: json!({ "userId": "carol" }),
            },
        ]);
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        let State::Result { question, answers } = projector.state() else {
            panic!("expected the result phase");
        };
        assert_eq!(question.id, QuestionId::from(1));
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].value.answer, 40.0);

        assert!(
            store
                .ops()
                .contains(&Op::AnswersForQuestion(QuestionId::from(1)))
        );
    }

    #[test]
    fn test_show_result_with_no_answers_is_empty() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        let State::Result { answers, .. } = projector.state() else {
            panic!("expected the result phase");
        };
        assert!(answers.is_empty());
    }

    #[test]
    fn test_show_result_keeps_state_on_store_failure() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        projector.begin_answering(&store, &mut countdown).unwrap();
        store.fail_next_requests(true);

        assert!(projector.show_result(&store).is_err());
        assert!(matches!(projector.state(), State::Answering(_)));
    }

    #[test]
    fn test_advance_moves_to_the_next_question() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();
        let questions = questions();

        projector.start(&questions);
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        projector.advance(&questions);
        assert!(matches!(projector.state(), State::Open(q) if q.id == QuestionId::from(2)));
    }

    #[test]
    fn test_advance_past_the_last_question_is_a_no_op() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();
        let questions = questions();

        projector.start(&questions);
        for _ in 0..2 {
            projector.begin_answering(&store, &mut countdown).unwrap();
            projector.show_result(&store).unwrap();
            projector.advance(&questions);
        }

        // The second advance ran from the last question's result.
        assert!(
            matches!(projector.state(), State::Result { question, .. } if question.id == QuestionId::from(2))
        );

        projector.advance(&questions);
        assert!(matches!(projector.state(), State::Result { .. }));
    }

    #[test]
    fn test_advance_with_vanished_question_is_a_no_op() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();

        projector.start(&questions());
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        // The admin re-authored the list while the quiz was running.
        projector.advance(&[sample_question(5), sample_question(6)]);
        assert!(matches!(projector.state(), State::Result { .. }));
    }

    #[test]
    fn test_finish_only_from_the_last_result() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();
        let questions = questions();

        projector.start(&questions);
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        // Result of question 1: not the last, stays put.
        projector.finish(&questions);
        assert!(matches!(projector.state(), State::Result { .. }));

        projector.advance(&questions);
        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();

        projector.finish(&questions);
        assert!(matches!(projector.state(), State::FinalResult));

        // Terminal: nothing moves the machine anymore.
        projector.advance(&questions);
        projector.start(&questions);
        assert!(matches!(projector.state(), State::FinalResult));
    }

    #[test]
    fn test_full_walkthrough_order() {
        let store = MockStore::new();
        let mut projector = Projector::new();
        let mut countdown = Tracker::new();
        let questions = questions();

        assert_eq!(current_question_id(&projector), None);

        projector.start(&questions);
        assert_eq!(current_question_id(&projector), Some(QuestionId::from(1)));

        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();
        projector.advance(&questions);
        assert_eq!(current_question_id(&projector), Some(QuestionId::from(2)));

        projector.begin_answering(&store, &mut countdown).unwrap();
        projector.show_result(&store).unwrap();
        projector.finish(&questions);
        assert_eq!(current_question_id(&projector), None);

        // Two publishes and two fetches, one per question, in order.
        let published: Vec<QuestionId> = store
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::PublishCountdown(request) => Some(request.question.id),
                _ => None,
            })
            .collect();
        assert_eq!(published, vec![QuestionId::from(1), QuestionId::from(2)]);
    }
}
