//! Participant identity
//!
//! Participants are not authenticated: a user id is a self-declared label
//! typed at check-in and used purely as a lookup key for answers and
//! ratings. This module validates those labels, filters inappropriate
//! content, and keeps the parsed form as the only way to obtain one.

use std::{fmt::Display, str::FromStr};

use rustrict::CensorStr;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants;

/// Errors that can occur during user id validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The id is empty
    #[error("user id cannot be empty")]
    Empty,
    /// The id carries leading or trailing whitespace
    #[error("user id has surrounding whitespace")]
    Padded,
    /// The id exceeds the maximum allowed length
    #[error("user id is too long")]
    TooLong,
    /// The id contains inappropriate content
    #[error("user id is inappropriate")]
    Sinful,
}

/// A participant's self-declared identifier
///
/// Valid ids are 1 to 63 UTF-8 bytes with no surrounding whitespace.
/// Parsing via [`FromStr`] is the only constructor, so any `UserId` in
/// circulation (including ones deserialized from store records) has
/// already passed validation.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct UserId(String);

impl UserId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = Error;

    /// Validates and parses a self-declared user id
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the id is empty, padded with whitespace,
    /// longer than [`constants::user::MAX_ID_BYTES`] bytes, or filtered as
    /// inappropriate.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::Empty);
        }
        if s.trim() != s {
            return Err(Error::Padded);
        }
        if s.len() > constants::user::MAX_ID_BYTES {
            return Err(Error::TooLong);
        }
        if s.is_inappropriate() {
            return Err(Error::Sinful);
        }
        Ok(Self(s.to_owned()))
    }
}
