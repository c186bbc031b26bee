//! Commands for the turn order engine.

use initiative_core::command::Command;
use initiative_core::library::LibraryActor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregates::{MoveDirection, RollMode};
use super::condition::ConditionKind;

/// Command to replace the live encounter with a fresh, empty one.
#[derive(Debug, Clone)]
pub struct StartEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier for the new encounter.
    pub encounter_id: Uuid,
    /// Encounter title.
    pub title: String,
}

impl Command for StartEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a library actor to the encounter.
#[derive(Debug, Clone)]
pub struct AddParticipant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier for the new participant.
    pub participant_id: Uuid,
    /// The library actor to instantiate.
    pub actor: LibraryActor,
}

impl Command for AddParticipant {
    fn command_type(&self) -> &'static str {
        "encounter.add_participant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to remove a participant.
#[derive(Debug, Clone)]
pub struct RemoveParticipant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant to remove.
    pub participant_id: Uuid,
}

impl Command for RemoveParticipant {
    fn command_type(&self) -> &'static str {
        "encounter.remove_participant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to roll initiative.
#[derive(Debug, Clone)]
pub struct RollInitiative {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who to roll for.
    pub mode: RollMode,
}

impl Command for RollInitiative {
    fn command_type(&self) -> &'static str {
        "encounter.roll_initiative"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to enter initiative by hand.
#[derive(Debug, Clone)]
pub struct SetInitiative {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant.
    pub participant_id: Uuid,
    /// The value as entered.
    pub value: f64,
}

impl Command for SetInitiative {
    fn command_type(&self) -> &'static str {
        "encounter.set_initiative"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to override a participant's initiative modifier.
#[derive(Debug, Clone)]
pub struct SetInitiativeModifier {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant.
    pub participant_id: Uuid,
    /// The new modifier.
    pub initiative_modifier: i32,
}

impl Command for SetInitiativeModifier {
    fn command_type(&self) -> &'static str {
        "encounter.set_initiative_modifier"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to move a tied participant one place.
#[derive(Debug, Clone)]
pub struct MoveParticipant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant.
    pub participant_id: Uuid,
    /// Which way to move.
    pub direction: MoveDirection,
}

impl Command for MoveParticipant {
    fn command_type(&self) -> &'static str {
        "encounter.move_participant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to apply a condition.
#[derive(Debug, Clone)]
pub struct ApplyCondition {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant.
    pub participant_id: Uuid,
    /// Which condition.
    pub condition: ConditionKind,
    /// Whether the condition never expires.
    pub permanent: bool,
    /// Round advances until expiry, when not permanent.
    pub remaining_turns: Option<u32>,
}

impl Command for ApplyCondition {
    fn command_type(&self) -> &'static str {
        "encounter.apply_condition"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Command to remove a condition.
#[derive(Debug, Clone)]
pub struct RemoveCondition {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant.
    pub participant_id: Uuid,
    /// Which condition.
    pub condition: ConditionKind,
}

impl Command for RemoveCondition {
    fn command_type(&self) -> &'static str {
        "encounter.remove_condition"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn participant_id(&self) -> Option<Uuid> {
        Some(self.participant_id)
    }
}

/// Turn and round controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    Advance,
    End,
    Skip,
    Retreat,
    AdvanceRound,
    RetreatRound,
}

/// Command to drive the turn/round state machine.
#[derive(Debug, Clone)]
pub struct ControlTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// What to do.
    pub action: TurnAction,
}

impl Command for ControlTurn {
    fn command_type(&self) -> &'static str {
        match self.action {
            TurnAction::Advance => "encounter.advance_turn",
            TurnAction::End => "encounter.end_turn",
            TurnAction::Skip => "encounter.skip_turn",
            TurnAction::Retreat => "encounter.retreat_turn",
            TurnAction::AdvanceRound => "encounter.advance_round",
            TurnAction::RetreatRound => "encounter.retreat_round",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to save the live encounter.
#[derive(Debug, Clone)]
pub struct SaveEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Save name; generated from the title and time when absent.
    pub name: Option<String>,
}

impl Command for SaveEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.save"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to replace the live encounter with a saved one.
#[derive(Debug, Clone)]
pub struct LoadEncounter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Save name.
    pub name: String,
}

impl Command for LoadEncounter {
    fn command_type(&self) -> &'static str {
        "encounter.load"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
