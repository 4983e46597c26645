//! # Tally Quiz Library
//!
//! This library provides the core client logic for Tally, a live
//! numeric-estimation quiz. An admin authors numeric-answer questions, a
//! projector screen walks the room through them with a shared countdown,
//! participants submit answers from their own devices, and externally
//! computed score/rank records are displayed back to each participant.
//!
//! Persistence, real-time fan-out, and timestamp authority are delegated to
//! a hosted realtime document store. The crate talks to that store through
//! the [`store::Store`] trait and consumes its push notifications through
//! `apply_snapshot` methods on the view types; it contains no network code
//! of its own and runs equally well on native and WASM targets.
//!
//! The moving parts:
//!
//! - [`question`]: question records, admin authoring, and the shared
//!   question-list view.
//! - [`countdown`]: the shared countdown record and the tracker deriving
//!   remaining time from it.
//! - [`projector`]: the host-side state machine driving the quiz forward.
//! - [`answer`]: per-participant answer submission with upsert semantics.
//! - [`rating`]: display of externally computed scores and ranks.
//! - [`clock`]: server/local clock offset correction.
//! - [`admin`]: blunt maintenance resets for running an event.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod admin;
pub mod answer;
pub mod clock;
pub mod constants;
pub mod countdown;
pub mod projector;
pub mod question;
pub mod rating;
pub mod store;
pub mod user;
