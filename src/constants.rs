//! Configuration constants for the Tally quiz system
//!
//! This module contains the limits and timing constants used throughout
//! the quiz system to ensure data integrity and provide consistent
//! boundaries for the different record types.

/// Question record configuration constants
pub mod question {
    /// Maximum length of the question text in UTF-8 bytes
    pub const MAX_TEXT_BYTES: usize = 127;
    /// Maximum length of the answer unit label in UTF-8 bytes
    pub const MAX_UNIT_BYTES: usize = 31;
    /// Minimum answering window in seconds
    pub const MIN_ANSWER_SECONDS: u64 = 1;
    /// Maximum answering window in seconds
    pub const MAX_ANSWER_SECONDS: u64 = 86_400;
}

/// Participant identity configuration constants
pub mod user {
    /// Maximum length of a self-declared user id in UTF-8 bytes
    pub const MAX_ID_BYTES: usize = 63;
}

/// Countdown rendering configuration constants
pub mod countdown {
    use std::time::Duration;

    /// Cadence at which hosts should tick the countdown tracker so the
    /// display counts down smoothly between push notifications
    pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
}
