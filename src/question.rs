//! Question records and question-set management
//!
//! Questions ask for a numeric estimate: each carries the answerable range,
//! the step the answer must land on, a unit label, and the length of the
//! answering window. The admin authors the whole set at once and replaces
//! it wholesale in the store; every other actor only reads it.

use std::time::Duration;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::question::*,
    store::{self, RawRecord, Store},
};

/// Identifier of a question, unique within the active question set
///
/// Questions are presented in ascending id order. Negative ids denote
/// practice questions: they are displayed distinctly but carry no other
/// special treatment in the data model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct QuestionId(i64);

impl QuestionId {
    /// Whether this id denotes a practice question
    pub fn is_practice(self) -> bool {
        self.0 < 0
    }
}

/// Validation result type for custom validators
type ValidationResult = garde::Result;

/// Validates that a duration is a whole number of seconds within bounds.
///
/// This is a custom validation function for use with the `garde` crate.
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside
/// `[MIN_SECONDS, MAX_SECONDS]` or carries a fractional second.
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if val.subsec_nanos() != 0 {
        return Err(garde::Error::new("must be a whole number of seconds"));
    }
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates that a string has no surrounding whitespace
fn validate_trimmed(value: &str, _ctx: &()) -> ValidationResult {
    if value.trim() == value {
        Ok(())
    } else {
        Err(garde::Error::new("has surrounding whitespace"))
    }
}

/// Validates that a number is finite
pub(crate) fn validate_finite(value: &f64, _ctx: &()) -> ValidationResult {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite number"))
    }
}

/// Validates that a step is finite and strictly positive
fn validate_step(value: &f64, _ctx: &()) -> ValidationResult {
    if value.is_finite() && *value > 0.0 {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite positive number"))
    }
}

/// A single numeric-estimation question
///
/// Authored by the admin, read by every other actor. The `seconds` field is
/// the answering window, stored on the wire as a whole number of seconds.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier, unique within the set; also the presentation order
    #[garde(skip)]
    pub id: QuestionId,
    /// The question text shown on the projector
    #[garde(length(bytes, min = 1, max = MAX_TEXT_BYTES), custom(validate_trimmed))]
    pub text: String,
    /// Length of the answering window
    #[garde(custom(validate_duration::<MIN_ANSWER_SECONDS, MAX_ANSWER_SECONDS>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub seconds: Duration,
    /// Smallest accepted answer
    #[garde(custom(validate_finite))]
    pub min: f64,
    /// Largest accepted answer
    #[garde(custom(validate_finite))]
    pub max: f64,
    /// Accepted answers are multiples of this step
    #[garde(custom(validate_step))]
    pub step: f64,
    /// Unit label displayed next to answers, possibly empty
    #[garde(length(bytes, max = MAX_UNIT_BYTES), custom(validate_trimmed))]
    pub unit: String,
}

impl Question {
    /// Strips the question text, producing the form published in the
    /// countdown record
    ///
    /// Participants never receive the text through the countdown; the
    /// projector shows it to the room.
    pub fn without_text(&self) -> CountdownQuestion {
        CountdownQuestion {
            id: self.id,
            seconds: self.seconds,
            min: self.min,
            max: self.max,
            step: self.step,
            unit: self.unit.clone(),
        }
    }
}

/// A question as carried by the countdown record: everything but the text
///
/// This is what participant devices receive and validate answers against.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CountdownQuestion {
    /// Identifier of the question currently open for answers
    #[garde(skip)]
    pub id: QuestionId,
    /// Length of the answering window
    #[garde(custom(validate_duration::<MIN_ANSWER_SECONDS, MAX_ANSWER_SECONDS>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub seconds: Duration,
    /// Smallest accepted answer
    #[garde(custom(validate_finite))]
    pub min: f64,
    /// Largest accepted answer
    #[garde(custom(validate_finite))]
    pub max: f64,
    /// Accepted answers are multiples of this step
    #[garde(custom(validate_step))]
    pub step: f64,
    /// Unit label displayed next to answers, possibly empty
    #[garde(length(bytes, max = MAX_UNIT_BYTES), custom(validate_trimmed))]
    pub unit: String,
}

/// Errors reported when an answer value does not satisfy a question
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum AnswerError {
    /// The value is NaN or infinite
    #[error("answer is not a finite number")]
    NotFinite,
    /// The value lies outside the question's accepted range
    #[error("answer {value} is outside the range [{min}, {max}]")]
    OutOfRange {
        /// The rejected value
        value: f64,
        /// Smallest accepted answer
        min: f64,
        /// Largest accepted answer
        max: f64,
    },
    /// The value does not land on the question's step
    #[error("answer {value} is not a multiple of {step}")]
    NotStepMultiple {
        /// The rejected value
        value: f64,
        /// The step answers must be a multiple of
        step: f64,
    },
}

/// Whether `value` is a multiple of `step`, tolerating float rounding
fn is_step_multiple(value: f64, step: f64) -> bool {
    let ratio = value / step;
    (ratio - ratio.round()).abs() <= 1e-9 * ratio.abs().max(1.0)
}

impl CountdownQuestion {
    /// Checks an answer value against this question's range and step
    ///
    /// This runs before any store write: a rejected value never reaches
    /// storage.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] describing the first violated constraint.
    pub fn check_answer(&self, value: f64) -> Result<(), AnswerError> {
        if !value.is_finite() {
            return Err(AnswerError::NotFinite);
        }
        if value < self.min || value > self.max {
            return Err(AnswerError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        if !is_step_multiple(value, self.step) {
            return Err(AnswerError::NotStepMultiple {
                value,
                step: self.step,
            });
        }
        Ok(())
    }
}

/// Errors that can occur when assembling a question set
#[derive(Error, Debug)]
pub enum SetError {
    /// A question in the set failed validation
    #[error("question {id} is malformed: {report}")]
    Invalid {
        /// Identifier of the offending question
        id: QuestionId,
        /// The violated constraints
        report: garde::Report,
    },
    /// Two questions in the set share an identifier
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

/// An admin-authored set of questions, validated and ordered by id
///
/// Construction is the validation gate: every contained question satisfies
/// its constraints and ids are unique, so the set can be published as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Validates and orders a collection of questions
    ///
    /// # Errors
    ///
    /// Returns a [`SetError`] when any question is malformed or an id
    /// appears twice.
    pub fn new(questions: Vec<Question>) -> Result<Self, SetError> {
        for question in &questions {
            question
                .validate()
                .map_err(|report| SetError::Invalid {
                    id: question.id,
                    report,
                })?;
        }

        if let Some(id) = questions.iter().map(|q| q.id).duplicates().next() {
            return Err(SetError::DuplicateId(id));
        }

        Ok(Self {
            questions: questions
                .into_iter()
                .sorted_by_key(|question| question.id)
                .collect(),
        })
    }

    /// Returns the questions in ascending id order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the number of questions in the set
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks whether the set contains no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Replaces the stored question list with this set
    ///
    /// The replace is not atomic: the subtree is deleted first and the
    /// questions are appended one by one in id order, so readers can
    /// observe an empty or partial list while a replace is in flight.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the delete or any insert fails; an
    /// insert failure leaves the list partially written.
    pub fn publish<S: Store>(&self, store: &S) -> Result<(), S::Error> {
        store.delete_questions()?;
        for question in &self.questions {
            store.insert_question(question)?;
        }
        Ok(())
    }
}

/// Live view of the stored question list
///
/// Fed by the `/questions` subscription (ordered by id). Malformed records
/// are skipped rather than surfaced; an absent subtree is distinct from an
/// empty list and renders as "unavailable".
#[derive(Debug, Default, Clone)]
pub struct QuestionList {
    questions: Option<Vec<Question>>,
}

impl QuestionList {
    /// Applies a push notification of the question subtree
    ///
    /// `None` means the subtree does not exist. Records that fail schema
    /// validation are dropped; the remainder is ordered by id.
    pub fn apply_snapshot(&mut self, snapshot: Option<Vec<RawRecord>>) {
        self.questions = snapshot.map(|records| {
            records
                .into_iter()
                .filter_map(store::decode::<Question>)
                .sorted_by_key(|question| question.id)
                .collect()
        });
    }

    /// Returns the current question list, or `None` while unavailable
    pub fn questions(&self) -> Option<&[Question]> {
        self.questions.as_deref()
    }
}
