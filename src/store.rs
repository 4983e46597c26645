//! Realtime document store seam
//!
//! All persistence, fan-out, and timestamp authority live in a hosted
//! realtime document store. This module defines the trait through which
//! the quiz core drives that store, the envelope types for records read
//! back from it, and the handle type that scopes the lifetime of live
//! push subscriptions. Implementations might speak to a cloud service,
//! an emulator, or an in-memory double in tests.
//!
//! The store holds five logical collections: `/questions` (ordered by
//! `id`), `/answers` (filterable by `userId` or `questionId`), `/ratings`
//! (filterable by `userId`), the `/countdown` singleton, and a
//! server-minus-local clock offset feed. Only the operations the core
//! actually needs are on the trait.

use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    answer::Answer,
    countdown::CountdownRequest,
    question::{Question, QuestionId},
};

/// A record payload delivered by the store, not yet schema-checked
///
/// Push notifications and one-shot reads hand the core raw JSON; the core
/// gates every record through [`decode`] before it reaches any view state.
pub type RawRecord = serde_json::Value;

/// A store-generated key identifying one record in a collection
///
/// Keys are assigned by the store on append-insert and are the only way
/// to address a record for in-place updates.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

/// A record read back from the store, paired with its generated key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<T> {
    /// The store-generated key addressing this record
    pub key: RecordKey,
    /// The record payload
    pub value: T,
}

impl<T> Keyed<T> {
    /// Maps a function over the payload while keeping the key
    pub fn map<F, U>(self, f: F) -> Keyed<U>
    where
        F: FnOnce(T) -> U,
    {
        Keyed {
            key: self.key,
            value: f(self.value),
        }
    }
}

/// Decodes and validates a raw record into a typed one
///
/// Records that fail deserialization or validation are discarded with a
/// warning rather than propagated: one malformed record written by a buggy
/// or hostile client must not poison the views of every other client.
///
/// # Returns
///
/// The typed record, or `None` if the payload does not match the schema
pub fn decode<T>(raw: RawRecord) -> Option<T>
where
    T: serde::de::DeserializeOwned + garde::Validate<Context = ()>,
{
    let value: T = match serde_json::from_value(raw) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "discarding record that failed to deserialize");
            return None;
        }
    };

    if let Err(report) = value.validate() {
        warn!(%report, "discarding record that failed validation");
        return None;
    }

    Some(value)
}

/// Decodes a keyed raw record, keeping its key
///
/// See [`decode`] for the handling of malformed payloads.
pub fn decode_keyed<T>(raw: Keyed<RawRecord>) -> Option<Keyed<T>>
where
    T: serde::de::DeserializeOwned + garde::Validate<Context = ()>,
{
    let Keyed { key, value } = raw;
    Some(Keyed {
        key,
        value: decode(value)?,
    })
}

/// Write/read surface of the hosted document store
///
/// Every method is a single non-blocking request whose outcome is known by
/// the time it returns; no retry policy is applied at this layer, so a
/// failed operation simply surfaces its error to the caller. Cross-writer
/// races are avoided structurally (each record class has one writer role),
/// not by locking: the admin writes questions, the projector writes the
/// countdown, each participant writes only their own answers, and the
/// external scorer writes ratings.
pub trait Store {
    /// Error reported by failed store operations
    type Error: std::error::Error;

    /// Deletes the whole `/questions` subtree
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the delete request fails.
    fn delete_questions(&self) -> Result<(), Self::Error>;

    /// Appends a question record under a store-generated key
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the insert request fails.
    fn insert_question(&self, question: &Question) -> Result<RecordKey, Self::Error>;

    /// Appends an answer record under a store-generated key
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the insert request fails.
    fn insert_answer(&self, answer: &Answer) -> Result<RecordKey, Self::Error>;

    /// Updates only the `answer` field of an existing answer record
    ///
    /// This is a partial-field update: the record keeps its key and its
    /// other fields, so resubmission never duplicates a record.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the update request fails.
    fn update_answer_value(&self, key: &RecordKey, value: f64) -> Result<(), Self::Error>;

    /// One-shot read of every answer whose `questionId` equals `question`
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the read request fails.
    fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<Keyed<RawRecord>>, Self::Error>;

    /// Deletes the whole `/answers` subtree
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the delete request fails.
    fn delete_answers(&self) -> Result<(), Self::Error>;

    /// Deletes the whole `/ratings` subtree
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the delete request fails.
    fn delete_ratings(&self) -> Result<(), Self::Error>;

    /// Replaces the `/countdown` singleton wholesale
    ///
    /// The store's server stamps the record's start time at write time;
    /// the resolved timestamp is only observable by reading the record
    /// back, never synchronously from this call.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the write request fails.
    fn publish_countdown(&self, request: &CountdownRequest) -> Result<(), Self::Error>;

    /// Deletes the `/countdown` singleton
    ///
    /// Subscribed participant views fall back to "not accepting answers"
    /// on their next push notification.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the delete request fails.
    fn delete_countdown(&self) -> Result<(), Self::Error>;
}

/// Handle scoping the lifetime of a live push listener
///
/// Subscriptions are acquired when a view is mounted and must be released
/// when it goes away, on every exit path, or the listener keeps firing
/// into state nobody displays anymore. Dropping the handle releases the
/// listener, so tying it to the owning view's lifetime is enough;
/// [`unsubscribe`] releases it explicitly. Cancellation runs exactly once.
///
/// [`unsubscribe`]: Subscription::unsubscribe
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps a cancellation callback into a scoped handle
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Releases the listener now instead of at drop time
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancel.is_some() {
            write!(f, "subscription (active)")
        } else {
            write!(f, "subscription (released)")
        }
    }
}


#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use serde_json::json;

    use super::*;
    use crate::rating::Rating;

    #[test]
    fn test_decode_accepts_valid_record() {
        let raw = json!({
            "userId": "alice",
            "score": 12.5,
            "rank": 3,
            "isTie": false,
        });

        let rating: Rating = decode(raw).unwrap();
        assert_eq!(rating.user_id.as_str(), "alice");
        assert_eq!(rating.rank, 3);
    }

    #[test]
    fn test_decode_discards_wrong_shape() {
        let raw = json!({ "userId": "alice", "score": "not a number" });
        assert!(decode::<Rating>(raw).is_none());
    }

    #[test]
    fn test_decode_discards_constraint_violation() {
        // Rank zero deserializes fine but fails validation.
        let raw = json!({
            "userId": "alice",
            "score": 12.5,
            "rank": 0,
            "isTie": false,
        });
        assert!(decode::<Rating>(raw).is_none());
    }

    #[test]
    fn test_decode_keyed_keeps_key() {
        let keyed = Keyed {
            key: RecordKey::from("-r1"),
            value: json!({
                "userId": "alice",
                "score": 1.0,
                "rank": 1,
                "isTie": true,
            }),
        };

        let decoded: Keyed<Rating> = decode_keyed(keyed).unwrap();
        assert_eq!(decoded.key, RecordKey::from("-r1"));
        assert!(decoded.value.is_tie);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);

        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        assert_eq!(released.get(), 0);

        drop(subscription);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_subscription_releases_exactly_once() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);

        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        subscription.unsubscribe();

        // unsubscribe consumed the handle; the drop ran inside it and the
        // cancellation must not have fired twice.
        assert_eq!(released.get(), 1);
    }
}
