//! Fractional ordering keys for task lists.
//!
//! A [`Position`] is a finite floating-point key carried on the wire as a
//! string-encoded decimal (`"1"`, `"1.5"`, `"1.75"`). The ascending sort
//! of positions defines the total order of a task list. Inserting between
//! two neighbors takes their arithmetic midpoint, so no unrelated task
//! ever needs renumbering.
//!
//! Repeated insertion between the same two neighbors shrinks the gap
//! geometrically; [`Position::gap_exhausted`] detects the point where the
//! midpoint is no longer strictly between its neighbors so callers can
//! renumber instead of silently producing a duplicate key.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing or constructing a position.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PositionError {
    /// The string did not parse as a decimal number.
    #[error("invalid position {0:?}: not a decimal number")]
    NotANumber(String),
    /// The value parsed but is NaN or infinite.
    #[error("invalid position {0:?}: not finite")]
    NotFinite(String),
}

/// An ordering key for a task within a list.
///
/// Compared numerically; encoded on the wire as a string-encoded decimal.
/// Values are always finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position(f64);

impl Position {
    /// The position assigned to the first task of an empty list.
    pub const FIRST: Self = Self(1.0);

    /// Creates a position from a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::NotFinite`] if `value` is NaN or infinite.
    pub fn new(value: f64) -> Result<Self, PositionError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(PositionError::NotFinite(value.to_string()))
        }
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Computes the position for a task inserted immediately below this one.
    ///
    /// With no following task the result is `self + 1`; otherwise it is the
    /// arithmetic midpoint of `self` and `next`, which lies strictly between
    /// them as long as the gap is not exhausted (see [`Self::gap_exhausted`]).
    #[must_use]
    pub fn below(self, next: Option<Self>) -> Self {
        match next {
            None => Self(self.0 + 1.0),
            Some(next) => Self(self.0.midpoint(next.0)),
        }
    }

    /// Returns `true` if no representable position exists strictly between
    /// `self` and `next`.
    ///
    /// This is the floating-point precision limit of the fractional scheme:
    /// once the midpoint collides with either neighbor, further insertion
    /// in this gap requires renumbering the list.
    #[must_use]
    pub fn gap_exhausted(self, next: Self) -> bool {
        let mid = self.0.midpoint(next.0);
        mid <= self.0.min(next.0) || mid >= self.0.max(next.0)
    }

    /// Integer position for slot `index` of a renumbered list (1-based).
    ///
    /// Used when renumbering a list after gap exhaustion.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_index(index: usize) -> Self {
        // Lists are far below 2^52 entries, so the cast is exact.
        Self((index + 1) as f64)
    }

    /// Total ordering for sorting, delegating to [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display already prints the shortest round-trippable decimal
        // ("1" for 1.0, "1.5" for 1.5).
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Position {
    type Error = PositionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let value: f64 = s
            .parse()
            .map_err(|_| PositionError::NotANumber(s.clone()))?;
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(PositionError::NotFinite(s))
        }
    }
}

impl std::str::FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.to_string()
    }
}
