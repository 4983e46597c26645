//! Shared countdown record and remaining-time derivation
//!
//! The projector announces the currently live question by replacing a
//! single shared countdown record; every client (participants and the
//! projector itself) subscribes to that record and derives the remaining
//! answering time locally. The record's start time is stamped by the
//! store's server at write time, so the derivation corrects the local
//! clock with the server offset before comparing.
//!
//! Between push notifications the display is kept moving by a local
//! repeating timer: hosts call [`Tracker::tick`] every
//! [`crate::constants::countdown::TICK_INTERVAL`] and stop the timer when
//! the tick reports [`Tick::Closed`].

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    clock::{ClockOffset, Timestamp},
    question::CountdownQuestion,
};

/// The countdown singleton as written by the projector
///
/// The start time is intentionally absent: the store's server assigns it
/// at write time, and the projector must not assume it is known
/// synchronously at publish time. Readers observe it through the resolved
/// [`Countdown`] record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountdownRequest {
    /// The question being opened for answers, without its text
    pub question: CountdownQuestion,
}

/// The countdown singleton as read back from the store
///
/// Exactly one instance exists at a time; the record is replaced wholesale
/// when the projector opens a new question and is absent when no question
/// is accepting answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    /// The question currently open for answers, without its text
    #[garde(dive)]
    pub question: CountdownQuestion,
    /// Server-assigned start of the answering window
    #[garde(skip)]
    pub start_at: Timestamp,
}

/// Derives the remaining whole seconds of an answering window
///
/// Computed as `ceil((seconds − (server_now − start_at)) / 1s)` and
/// clamped at zero, so a window with half a second left still shows one
/// second and never goes negative.
pub fn remaining_seconds(seconds: Duration, start_at: Timestamp, server_now: Timestamp) -> u32 {
    let left_millis = seconds.as_millis() as i64 - server_now.millis_since(start_at);
    if left_millis <= 0 {
        0
    } else {
        (left_millis as u64).div_ceil(1_000) as u32
    }
}

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown record exists; there is nothing to tick
    Idle,
    /// The window is open with this many whole seconds remaining
    Running(u32),
    /// The window has reached zero; the repeating timer should stop
    Closed,
}

/// What a consumer should currently display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase<'a> {
    /// No countdown record exists: answers are not being accepted
    Inactive,
    /// A question is open for answers
    Open {
        /// The live question, without its text
        question: &'a CountdownQuestion,
        /// Whole seconds left in the answering window
        remaining: u32,
    },
    /// The live question's window has closed
    Closed {
        /// The question whose window closed
        question: &'a CountdownQuestion,
    },
}

/// The live question together with its locally derived remaining time
#[derive(Debug, Clone)]
struct Active {
    question: CountdownQuestion,
    /// Resolved server start time; `None` while locally seeded and the
    /// server timestamp is still being assigned
    start_at: Option<Timestamp>,
    remaining: u32,
    closed: bool,
}

/// Tracks the shared countdown record and derives remaining time
///
/// Fed from two sides: [`apply_snapshot`] on every push notification of
/// the countdown record, and [`tick`] from the host's 100ms repeating
/// timer. A replaced record restarts the derivation from the new start
/// time; old and new windows are never blended.
///
/// [`apply_snapshot`]: Tracker::apply_snapshot
/// [`tick`]: Tracker::tick
#[derive(Debug, Default, Clone)]
pub struct Tracker {
    active: Option<Active>,
}

impl Tracker {
    /// Creates a tracker with no live countdown
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a push notification of the countdown record
    ///
    /// `None` means the record was deleted: the view falls back to "not
    /// accepting answers" immediately. A present record replaces whatever
    /// was live before and the remaining time is recomputed from its start
    /// time right away, regardless of any previously displayed value.
    pub fn apply_snapshot(
        &mut self,
        snapshot: Option<Countdown>,
        offset: ClockOffset,
        local_now: Timestamp,
    ) {
        self.active = snapshot.map(|countdown| {
            let remaining = remaining_seconds(
                countdown.question.seconds,
                countdown.start_at,
                offset.server_now(local_now),
            );
            Active {
                question: countdown.question,
                start_at: Some(countdown.start_at),
                remaining,
                closed: remaining == 0,
            }
        });
    }

    /// Seeds the tracker with the full window of a just-published question
    ///
    /// The projector calls this right after publishing the countdown
    /// record, before the server has resolved the start time. Ticks hold
    /// the seeded value until the resolved record arrives through
    /// [`apply_snapshot`].
    ///
    /// [`apply_snapshot`]: Tracker::apply_snapshot
    pub fn seed(&mut self, question: CountdownQuestion) {
        let remaining = question.seconds.as_secs() as u32;
        self.active = Some(Active {
            question,
            start_at: None,
            remaining,
            closed: remaining == 0,
        });
    }

    /// Re-derives the remaining time on the host's repeating timer
    ///
    /// Once a window reports [`Tick::Closed`] it stays closed for that
    /// record, even if the clock offset later shifts backwards; only a new
    /// record reopens the tracker.
    pub fn tick(&mut self, offset: ClockOffset, local_now: Timestamp) -> Tick {
        let Some(active) = &mut self.active else {
            return Tick::Idle;
        };

        if active.closed {
            return Tick::Closed;
        }

        if let Some(start_at) = active.start_at {
            active.remaining =
                remaining_seconds(active.question.seconds, start_at, offset.server_now(local_now));
        }

        if active.remaining == 0 {
            active.closed = true;
            Tick::Closed
        } else {
            Tick::Running(active.remaining)
        }
    }

    /// Returns what a consumer should currently display
    pub fn phase(&self) -> Phase<'_> {
        match &self.active {
            None => Phase::Inactive,
            Some(active) if active.closed => Phase::Closed {
                question: &active.question,
            },
            Some(active) => Phase::Open {
                question: &active.question,
                remaining: active.remaining,
            },
        }
    }

    /// Returns the live question, if any
    pub fn question(&self) -> Option<&CountdownQuestion> {
        self.active.as_ref().map(|active| &active.question)
    }

    /// Returns the remaining whole seconds, zero when nothing is live
    pub fn remaining(&self) -> u32 {
        self.active
            .as_ref()
            .map_or(0, |active| if active.closed { 0 } else { active.remaining })
    }

    /// Whether answers are currently being accepted
    pub fn is_accepting(&self) -> bool {
        matches!(self.phase(), Phase::Open { .. })
    }
}
