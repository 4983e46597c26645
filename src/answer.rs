//! Participant answer submission
//!
//! Each participant holds at most one answer per question. The store does
//! not enforce that invariant, so the client does: the participant's view
//! keeps track of the answer record already written for the pair, and a
//! resubmission updates that record in place instead of appending a new
//! one. Validation runs strictly before any write; a rejected value never
//! reaches storage.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    question::{self, AnswerError, CountdownQuestion},
    store::{self, Keyed, RawRecord, Store},
    user::UserId,
};

/// One participant's numeric answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// The submitting participant
    #[garde(skip)]
    pub user_id: UserId,
    /// The question being answered
    #[garde(skip)]
    pub question_id: question::QuestionId,
    /// The submitted value
    #[garde(custom(question::validate_finite))]
    pub answer: f64,
}

/// Errors reported by an answer submission
#[derive(Error, Debug)]
pub enum SubmitError<E: std::error::Error> {
    /// The value failed validation; nothing was written
    #[error("answer rejected: {0}")]
    Rejected(#[from] AnswerError),
    /// The store write failed; the slot is unchanged
    #[error("store write failed: {0}")]
    Store(E),
}

/// A participant's answer slot for the currently live question
///
/// One slot exists per (user, question) pair, mirroring the answer form on
/// the participant's device. It is fed by the live subscription to the
/// participant's own answer records and performs the upsert on submission.
///
/// Two concurrent sessions of the same user are not deduplicated at this
/// layer: both can pass the lookup before either write lands, leaving
/// duplicate records behind. The read side tolerates that by keeping the
/// last match; last write wins.
#[derive(Debug, Clone)]
pub struct AnswerSlot {
    user_id: UserId,
    question: CountdownQuestion,
    current: Option<Keyed<Answer>>,
}

impl AnswerSlot {
    /// Creates an empty slot for one participant and one live question
    pub fn new(user_id: UserId, question: CountdownQuestion) -> Self {
        Self {
            user_id,
            question,
            current: None,
        }
    }

    /// Returns the question this slot accepts answers for
    pub fn question(&self) -> &CountdownQuestion {
        &self.question
    }

    /// Returns the answer already recorded for this pair, if any
    pub fn current(&self) -> Option<&Answer> {
        self.current.as_ref().map(|keyed| &keyed.value)
    }

    /// Returns the recorded answer value, if any
    pub fn current_value(&self) -> Option<f64> {
        self.current().map(|answer| answer.answer)
    }

    /// Applies a push notification of the participant's answer records
    ///
    /// The feed is filtered by user id on the store side; this narrows it
    /// further to the slot's question. Malformed records are skipped. More
    /// than one match is a data-integrity anomaly: the last one wins.
    pub fn apply_snapshot(&mut self, records: Vec<Keyed<RawRecord>>) {
        let mut matches: Vec<Keyed<Answer>> = records
            .into_iter()
            .filter_map(store::decode_keyed::<Answer>)
            .filter(|keyed| {
                keyed.value.user_id == self.user_id && keyed.value.question_id == self.question.id
            })
            .collect();

        if matches.len() > 1 {
            debug!(
                user = %self.user_id,
                question = %self.question.id,
                count = matches.len(),
                "duplicate answer records for one pair, keeping the last"
            );
        }

        self.current = matches.pop();
    }

    /// Submits an answer value, creating or updating the stored record
    ///
    /// The value is checked against the question's range and step first;
    /// a rejected value never reaches the store. With no known record the
    /// answer is appended, otherwise only the existing record's `answer`
    /// field is updated in place, preserving its identity.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Rejected`] for an invalid value and
    /// [`SubmitError::Store`] when the write fails; in both cases the
    /// slot keeps its previous state.
    pub fn submit<S: Store>(&mut self, value: f64, store: &S) -> Result<(), SubmitError<S::Error>> {
        self.question.check_answer(value)?;

        match &self.current {
            None => {
                let answer = Answer {
                    user_id: self.user_id.clone(),
                    question_id: self.question.id,
                    answer: value,
                };
                let key = store.insert_answer(&answer).map_err(SubmitError::Store)?;
                self.current = Some(Keyed { key, value: answer });
            }
            Some(existing) => {
                store
                    .update_answer_value(&existing.key, value)
                    .map_err(SubmitError::Store)?;
                if let Some(current) = &mut self.current {
                    current.value.answer = value;
                }
            }
        }

        Ok(())
    }
}
