//! Conditions: inert labels with a countdown.

use initiative_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// The standard tabletop conditions. The engine attaches no rules to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Blinded,
    Charmed,
    Deafened,
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl ConditionKind {
    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Blinded => "Blinded",
            Self::Charmed => "Charmed",
            Self::Deafened => "Deafened",
            Self::Exhaustion => "Exhaustion",
            Self::Frightened => "Frightened",
            Self::Grappled => "Grappled",
            Self::Incapacitated => "Incapacitated",
            Self::Invisible => "Invisible",
            Self::Paralyzed => "Paralyzed",
            Self::Petrified => "Petrified",
            Self::Poisoned => "Poisoned",
            Self::Prone => "Prone",
            Self::Restrained => "Restrained",
            Self::Stunned => "Stunned",
            Self::Unconscious => "Unconscious",
        }
    }
}

/// How long a condition lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionDuration {
    /// Never expires on its own.
    Permanent,
    /// Expires once this many round advances have passed.
    Turns(u32),
}

impl ConditionDuration {
    /// Builds a duration from the two request-level inputs.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConditionDuration` unless exactly one of
    /// `permanent` or a positive `remaining_turns` is given.
    pub fn from_parts(permanent: bool, remaining_turns: Option<u32>) -> Result<Self, DomainError> {
        match (permanent, remaining_turns) {
            (true, None) => Ok(Self::Permanent),
            (true, Some(_)) => Err(DomainError::InvalidConditionDuration(
                "a permanent condition cannot also have remaining turns".to_owned(),
            )),
            (false, Some(turns)) => Self::Turns(turns).validated(),
            (false, None) => Err(DomainError::InvalidConditionDuration(
                "either permanent or a positive number of turns is required".to_owned(),
            )),
        }
    }

    /// Checks that the duration is resolvable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConditionDuration` for `Turns(0)`.
    pub fn validated(self) -> Result<Self, DomainError> {
        match self {
            Self::Turns(0) => Err(DomainError::InvalidConditionDuration(
                "remaining turns must be positive".to_owned(),
            )),
            other => Ok(other),
        }
    }

    /// One countdown step. `None` means the condition has expired.
    #[must_use]
    pub fn tick(self) -> Option<Self> {
        match self {
            Self::Permanent => Some(Self::Permanent),
            Self::Turns(turns) if turns > 1 => Some(Self::Turns(turns - 1)),
            Self::Turns(_) => None,
        }
    }

    /// Returns `true` for permanent conditions.
    #[must_use]
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Remaining turns, or `None` when permanent.
    #[must_use]
    pub fn remaining_turns(self) -> Option<u32> {
        match self {
            Self::Permanent => None,
            Self::Turns(turns) => Some(turns),
        }
    }
}

/// A condition attached to a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCondition {
    /// Which condition.
    pub kind: ConditionKind,
    /// Its remaining duration.
    pub duration: ConditionDuration,
}
