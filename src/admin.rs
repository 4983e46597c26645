//! Admin maintenance operations
//!
//! Besides authoring questions (see [`crate::question::QuestionSet`]), the
//! admin screen offers blunt reset actions for running an event: wiping
//! answers between rehearsals, clearing stale ratings, and tearing down a
//! countdown left behind by a crashed projector. Each one is a whole-value
//! or whole-subtree delete; subscribed views observe it on their next push
//! notification.

use crate::store::Store;

/// Deletes every authored question
///
/// Participant and projector views fall back to "unavailable" on their
/// next push.
///
/// # Errors
///
/// Returns the store's error if the delete fails.
pub fn clear_questions<S: Store>(store: &S) -> Result<(), S::Error> {
    store.delete_questions()
}

/// Deletes every submitted answer
///
/// # Errors
///
/// Returns the store's error if the delete fails.
pub fn clear_answers<S: Store>(store: &S) -> Result<(), S::Error> {
    store.delete_answers()
}

/// Deletes every published rating
///
/// # Errors
///
/// Returns the store's error if the delete fails.
pub fn clear_ratings<S: Store>(store: &S) -> Result<(), S::Error> {
    store.delete_ratings()
}

/// Deletes the countdown singleton
///
/// Every subscribed participant view shows "not accepting answers" within
/// one push-notification cycle.
///
/// # Errors
///
/// Returns the store's error if the delete fails.
pub fn clear_countdown<S: Store>(store: &S) -> Result<(), S::Error> {
    store.delete_countdown()
}
