//! Initiative values and rolls.
//!
//! Initiative is stored in fixed point with four decimal places so that
//! equality (ties) and ordering are exact.

use std::fmt;

use initiative_core::error::DomainError;
use initiative_core::library::ActorCategory;
use initiative_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};

/// Number of fixed-point units per whole initiative point.
pub const SCALE: i64 = 10_000;

/// Largest tie-break offset magnitude, in ten-thousandths (0.1999).
pub const MAX_TIE_BREAK_OFFSET: u32 = 1_999;

/// Largest accepted magnitude for a manually entered initiative.
pub const MAX_MAGNITUDE: f64 = 10_000.0;

/// Faces on the initiative die.
pub const DIE_FACES: u32 = 20;

/// An initiative value in ten-thousandths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Initiative(i64);

impl Initiative {
    /// A whole-number initiative.
    #[must_use]
    pub fn from_whole(value: i32) -> Self {
        Self(i64::from(value) * SCALE)
    }

    /// An initiative from raw fixed-point units.
    #[must_use]
    pub fn from_ten_thousandths(value: i64) -> Self {
        Self(value)
    }

    /// Converts a user-entered value, rounding to four decimal places.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInitiative` for non-finite values or
    /// values beyond `MAX_MAGNITUDE`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::InvalidInitiative(format!("{value} is not a finite number")));
        }
        if value.abs() > MAX_MAGNITUDE {
            return Err(DomainError::InvalidInitiative(format!(
                "{value} is outside ±{MAX_MAGNITUDE}"
            )));
        }
        // Bounded by MAX_MAGNITUDE * SCALE, well inside i64.
        Ok(Self((value * 10_000.0).round() as i64))
    }

    /// Raw fixed-point units.
    #[must_use]
    pub fn ten_thousandths(self) -> i64 {
        self.0
    }

    /// Lossy floating point view, for display layers.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Returns `true` if the value has no fractional component.
    #[must_use]
    pub fn is_whole(self) -> bool {
        self.0 % SCALE == 0
    }
}

impl fmt::Display for Initiative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        let whole = magnitude / scale;
        let fraction = magnitude % scale;
        if fraction == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{fraction:04}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// The pieces of one initiative roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    /// The natural die result, 1..=20.
    pub natural: u32,
    /// Modifier added to the die.
    pub modifier: i32,
    /// Tie-break offset in ten-thousandths, in `[-1999, 0]`. Always zero for
    /// players.
    pub offset: i64,
}

impl InitiativeRoll {
    /// Rolls a d20 plus `modifier`. Non-player categories also draw a
    /// negative fractional offset so their totals practically never tie.
    pub fn roll(rng: &mut dyn DeterministicRng, modifier: i32, category: ActorCategory) -> Self {
        let natural = rng.next_u32_range(1, DIE_FACES).clamp(1, DIE_FACES);
        let offset = if category.is_player() {
            0
        } else {
            -i64::from(
                rng.next_u32_range(0, MAX_TIE_BREAK_OFFSET)
                    .min(MAX_TIE_BREAK_OFFSET),
            )
        };
        Self {
            natural,
            modifier,
            offset,
        }
    }

    /// The resulting initiative value.
    #[must_use]
    pub fn total(&self) -> Initiative {
        let whole = i64::from(self.natural) + i64::from(self.modifier);
        Initiative(whole * SCALE + self.offset)
    }
}
