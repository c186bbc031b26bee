//! Domain events for the turn order engine.
//!
//! Events double as change notifications for the UI layer: every
//! successful mutation of an encounter is exactly one or two of these.

use initiative_core::event::{DomainEvent, EventMetadata};
use initiative_core::library::ActorCategory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::condition::{ConditionDuration, ConditionKind};
use super::initiative::{Initiative, InitiativeRoll};

/// Emitted when a participant joins the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAdded {
    /// The new participant.
    pub participant_id: Uuid,
    /// The library actor it was created from.
    pub actor_id: Uuid,
    /// Actor category.
    pub category: ActorCategory,
    /// Library name.
    pub base_name: String,
    /// Instance number issued for `base_name`.
    pub instance_number: u32,
    /// Initiative modifier copied from the library.
    pub initiative_modifier: i32,
    /// Position in the join order.
    pub insertion_order: u64,
}

/// Emitted when a participant leaves the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRemoved {
    /// The removed participant.
    pub participant_id: Uuid,
    /// Who holds the turn afterwards.
    pub active_participant_id: Option<Uuid>,
}

/// One participant's share of an initiative roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledInitiative {
    /// The participant that rolled.
    pub participant_id: Uuid,
    /// The dice.
    pub roll: InitiativeRoll,
    /// The resulting initiative.
    pub initiative: Initiative,
}

/// Emitted when initiative is rolled for a group of participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRolled {
    /// Per-participant results, in join order.
    pub rolls: Vec<RolledInitiative>,
}

/// Emitted when initiative is entered by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeSet {
    /// The participant.
    pub participant_id: Uuid,
    /// The new value.
    pub initiative: Initiative,
}

/// Emitted when a participant's initiative modifier is overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeModifierChanged {
    /// The participant.
    pub participant_id: Uuid,
    /// The new modifier.
    pub initiative_modifier: i32,
}

/// Emitted the first time every participant has initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStarted {
    /// Always round 1.
    pub round: u32,
}

/// Emitted when two tied participants swap places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantReordered {
    /// The participant that was moved.
    pub participant_id: Uuid,
    /// The neighbour it swapped with.
    pub neighbor_id: Uuid,
}

/// Emitted when a condition is applied or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionApplied {
    /// The participant.
    pub participant_id: Uuid,
    /// Which condition.
    pub condition: ConditionKind,
    /// Its duration.
    pub duration: ConditionDuration,
}

/// Emitted when a condition is removed by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRemoved {
    /// The participant.
    pub participant_id: Uuid,
    /// Which condition.
    pub condition: ConditionKind,
}

/// A condition that ran out during a round advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredCondition {
    /// The participant.
    pub participant_id: Uuid,
    /// Which condition.
    pub condition: ConditionKind,
}

/// Emitted when a turn ends (or the first turn of combat begins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAdvanced {
    /// The participant whose turn ended; `None` when combat was waiting for
    /// its first turn.
    pub ended_participant_id: Option<Uuid>,
    /// The participant whose turn begins; `None` when the round is complete.
    pub active_participant_id: Option<Uuid>,
}

/// Emitted when the active participant defers its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSkipped {
    /// The participant that deferred.
    pub skipped_participant_id: Uuid,
    /// The participant whose turn begins.
    pub active_participant_id: Uuid,
}

/// Emitted when the previous turn is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRetreated {
    /// The participant that holds the turn again.
    pub active_participant_id: Uuid,
}

/// Emitted when a new round begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundAdvanced {
    /// The new round number.
    pub round: u32,
    /// The participant whose turn begins.
    pub active_participant_id: Option<Uuid>,
    /// Conditions that ran out and were removed.
    pub expired: Vec<ExpiredCondition>,
}

/// Emitted when the previous round is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRetreated {
    /// The restored round number.
    pub round: u32,
}

/// Event payload variants for the turn order engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterEventKind {
    /// A participant joined.
    ParticipantAdded(ParticipantAdded),
    /// A participant left.
    ParticipantRemoved(ParticipantRemoved),
    /// Initiative was rolled.
    InitiativeRolled(InitiativeRolled),
    /// Initiative was entered by hand.
    InitiativeSet(InitiativeSet),
    /// An initiative modifier was overridden.
    InitiativeModifierChanged(InitiativeModifierChanged),
    /// Combat started.
    CombatStarted(CombatStarted),
    /// Two tied participants swapped places.
    ParticipantReordered(ParticipantReordered),
    /// A condition was applied.
    ConditionApplied(ConditionApplied),
    /// A condition was removed.
    ConditionRemoved(ConditionRemoved),
    /// A turn ended.
    TurnAdvanced(TurnAdvanced),
    /// A turn was deferred.
    TurnSkipped(TurnSkipped),
    /// The previous turn was restored.
    TurnRetreated(TurnRetreated),
    /// A round began.
    RoundAdvanced(RoundAdvanced),
    /// The previous round was restored.
    RoundRetreated(RoundRetreated),
}

impl EncounterEventKind {
    /// The routing name of this event kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ParticipantAdded(_) => "encounter.participant_added",
            Self::ParticipantRemoved(_) => "encounter.participant_removed",
            Self::InitiativeRolled(_) => "encounter.initiative_rolled",
            Self::InitiativeSet(_) => "encounter.initiative_set",
            Self::InitiativeModifierChanged(_) => "encounter.initiative_modifier_changed",
            Self::CombatStarted(_) => "encounter.combat_started",
            Self::ParticipantReordered(_) => "encounter.participant_reordered",
            Self::ConditionApplied(_) => "encounter.condition_applied",
            Self::ConditionRemoved(_) => "encounter.condition_removed",
            Self::TurnAdvanced(_) => "encounter.turn_advanced",
            Self::TurnSkipped(_) => "encounter.turn_skipped",
            Self::TurnRetreated(_) => "encounter.turn_retreated",
            Self::RoundAdvanced(_) => "encounter.round_advanced",
            Self::RoundRetreated(_) => "encounter.round_retreated",
        }
    }
}

/// Domain event envelope for the turn order engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: EncounterEventKind,
}

impl DomainEvent for EncounterEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("EncounterEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
