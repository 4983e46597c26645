//! Score and rank display
//!
//! Ratings are produced by an external aggregation process after the quiz
//! and written to the store, one record per participant. This crate only
//! reads them back for display; no scoring happens client-side.

use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    store::{self, RawRecord},
    user::UserId,
};

/// One participant's externally computed score and rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    /// The rated participant
    #[garde(skip)]
    pub user_id: UserId,
    /// Total score across the quiz
    #[garde(custom(crate::question::validate_finite))]
    pub score: f64,
    /// Position in the final ranking, starting at 1
    #[garde(range(min = 1))]
    pub rank: u32,
    /// Whether the rank is shared with another participant
    #[garde(skip)]
    pub is_tie: bool,
}

/// Live view of one participant's rating
///
/// Fed by the subscription to rating records filtered by user id. The
/// expected cardinality is zero or one; more than one record for a user is
/// a data-integrity anomaly and the first encountered wins.
#[derive(Debug, Clone)]
pub struct RatingView {
    user_id: UserId,
    current: Option<Rating>,
}

impl RatingView {
    /// Creates an empty view for one participant
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current: None,
        }
    }

    /// Applies a push notification of the participant's rating records
    ///
    /// Malformed records are skipped; an empty feed (records absent or
    /// deleted) clears the view.
    pub fn apply_snapshot(&mut self, records: Vec<RawRecord>) {
        let mut ratings = records
            .into_iter()
            .filter_map(store::decode::<Rating>)
            .filter(|rating| rating.user_id == self.user_id);

        self.current = ratings.next();

        if ratings.next().is_some() {
            debug!(
                user = %self.user_id,
                "multiple rating records for one user, keeping the first"
            );
        }
    }

    /// Returns the participant's rating, if one has been published
    pub fn current(&self) -> Option<&Rating> {
        self.current.as_ref()
    }
}
