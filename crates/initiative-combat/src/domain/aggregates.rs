//! Aggregate root for the turn order engine.

use std::collections::{BTreeMap, BTreeSet};

use initiative_core::aggregate::AggregateRoot;
use initiative_core::clock::Clock;
use initiative_core::error::DomainError;
use initiative_core::event::EventMetadata;
use initiative_core::library::{ActorCategory, LibraryActor};
use initiative_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::condition::{AppliedCondition, ConditionDuration, ConditionKind};
use super::events::{
    CombatStarted, ConditionApplied, ConditionRemoved, EncounterEvent, EncounterEventKind,
    ExpiredCondition, InitiativeModifierChanged, InitiativeRolled, InitiativeSet, ParticipantAdded,
    ParticipantRemoved, ParticipantReordered, RolledInitiative, RoundAdvanced, RoundRetreated,
    TurnAdvanced, TurnRetreated, TurnSkipped,
};
use super::initiative::{Initiative, InitiativeRoll};
use super::ordering;
use super::participant::{Participant, display_name};

/// Combat phase, derived from state on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    /// At least one participant lacks initiative (or there are none).
    NotStarted,
    /// A participant holds the turn, or one is waiting to take it.
    InProgress,
    /// Everyone has acted this round.
    RoundComplete,
}

/// Which participants an initiative roll targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// Every participant.
    All,
    /// Every participant except players.
    NonPlayers,
}

impl RollMode {
    fn includes(self, category: ActorCategory) -> bool {
        match self {
            Self::All => true,
            Self::NonPlayers => !category.is_player(),
        }
    }
}

/// Direction of a manual tie-break move. Left is earlier in the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Towards the front of the order.
    Left,
    /// Towards the back of the order.
    Right,
}

/// Turn state captured just before a turn ends or is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// The participant that held the turn.
    pub active_participant_id: Uuid,
    /// Participants that had already acted.
    pub acted: BTreeSet<Uuid>,
    /// Deferred participants, in queue order.
    pub deferred: Vec<Uuid>,
}

/// Round state captured just before a round advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// The round being left.
    pub round: u32,
    /// Who held the turn.
    pub active_participant_id: Option<Uuid>,
    /// Participants that had acted.
    pub acted: BTreeSet<Uuid>,
    /// Deferred participants, in queue order.
    pub deferred: Vec<Uuid>,
    /// The round's turn history.
    pub turn_history: Vec<TurnSnapshot>,
    /// Conditions before the countdown tick.
    pub conditions: BTreeMap<Uuid, Vec<AppliedCondition>>,
}

/// The aggregate root for one live encounter.
#[derive(Debug)]
pub struct Encounter {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Encounter title, used for generated save names.
    pub(crate) title: String,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Round number; 0 until combat starts.
    pub(crate) round: u32,
    /// Participant holding the turn.
    pub(crate) active: Option<Uuid>,
    /// Participants in join order.
    pub(crate) participants: Vec<Participant>,
    /// Highest instance number issued per base name. Never decremented.
    pub(crate) instance_counters: BTreeMap<String, u32>,
    /// Next join-order value.
    pub(crate) next_insertion_order: u64,
    /// Participants that skipped their turn this round, in queue order.
    pub(crate) deferred: Vec<Uuid>,
    /// Turns finished or skipped this round.
    pub(crate) turn_history: Vec<TurnSnapshot>,
    /// Rounds left behind, most recent last.
    pub(crate) round_history: Vec<RoundSnapshot>,
    /// Uncommitted events pending drain.
    uncommitted_events: Vec<EncounterEvent>,
}

impl Encounter {
    /// Creates a new, empty encounter.
    #[must_use]
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            version: 0,
            round: 0,
            active: None,
            participants: Vec::new(),
            instance_counters: BTreeMap::new(),
            next_insertion_order: 0,
            deferred: Vec::new(),
            turn_history: Vec::new(),
            round_history: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    // --- queries ---

    /// Encounter title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current round; 0 before combat starts.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The participant holding the turn.
    #[must_use]
    pub fn active_participant_id(&self) -> Option<Uuid> {
        self.active
    }

    /// Participants in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Looks up a participant.
    #[must_use]
    pub fn participant(&self, participant_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// Participants in turn order. Recomputed on every call.
    #[must_use]
    pub fn turn_order(&self) -> Vec<&Participant> {
        ordering::turn_order(&self.participants)
    }

    /// Highest instance number issued for `base_name`.
    #[must_use]
    pub fn instance_counter(&self, base_name: &str) -> u32 {
        self.instance_counters.get(base_name).copied().unwrap_or(0)
    }

    /// `true` when there is at least one participant and all have initiative.
    #[must_use]
    pub fn initiative_complete(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(Participant::has_initiative)
    }

    /// The derived combat phase.
    #[must_use]
    pub fn phase(&self) -> CombatPhase {
        if !self.initiative_complete() {
            CombatPhase::NotStarted
        } else if self.active.is_some() || self.participants.iter().any(|p| !p.has_acted) {
            CombatPhase::InProgress
        } else {
            CombatPhase::RoundComplete
        }
    }

    /// Whether the participant is part of a tie that needs manual resolution.
    #[must_use]
    pub fn is_tied(&self, participant_id: Uuid) -> bool {
        self.participant(participant_id)
            .is_some_and(|p| ordering::is_tied(p, &self.participants))
    }

    /// Whether the participant skipped its turn and is waiting to act.
    #[must_use]
    pub fn is_deferred(&self, participant_id: Uuid) -> bool {
        self.deferred.contains(&participant_id)
    }

    /// Whether `move_participant` would do anything.
    #[must_use]
    pub fn can_move(&self, participant_id: Uuid, direction: MoveDirection) -> bool {
        self.move_target(participant_id, direction).is_some()
    }

    /// Whether `advance_turn` is available.
    #[must_use]
    pub fn can_advance_turn(&self) -> bool {
        self.phase() == CombatPhase::InProgress
    }

    /// Whether `end_turn` is available.
    #[must_use]
    pub fn can_end_turn(&self) -> bool {
        self.can_advance_turn() && self.active.is_some()
    }

    /// Whether `skip_turn` would hand the turn to someone else.
    #[must_use]
    pub fn can_skip_turn(&self) -> bool {
        self.can_end_turn() && self.next_in_turn(self.active).is_some()
    }

    /// Whether `retreat_turn` is available.
    #[must_use]
    pub fn can_retreat_turn(&self) -> bool {
        self.initiative_complete() && !self.turn_history.is_empty()
    }

    /// Whether `advance_round` is available.
    #[must_use]
    pub fn can_advance_round(&self) -> bool {
        self.initiative_complete() && self.round > 0
    }

    /// Whether `retreat_round` is available.
    #[must_use]
    pub fn can_retreat_round(&self) -> bool {
        self.initiative_complete() && !self.round_history.is_empty()
    }

    // --- roster commands ---

    /// Adds a participant created from a library actor.
    ///
    /// The first instance of a base name is shown without a number; once a
    /// second instance is added, every instance of that name shows its
    /// number. Numbers are never reused within the encounter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateName` if the resulting names would not
    /// be unique.
    pub fn add_participant(
        &mut self,
        participant_id: Uuid,
        actor: &LibraryActor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let instance_number = self
            .instance_counter(&actor.name)
            .checked_add(1)
            .ok_or_else(|| DomainError::DuplicateName(actor.name.clone()))?;
        let numbered = instance_number > 1;

        let mut taken = BTreeSet::new();
        for existing in &self.participants {
            let name = if existing.base_name == actor.name {
                display_name(&existing.base_name, existing.instance_number, numbered)
            } else {
                existing.display_name.clone()
            };
            if !taken.insert(name.clone()) {
                return Err(DomainError::DuplicateName(name));
            }
        }
        let new_name = display_name(&actor.name, instance_number, numbered);
        if taken.contains(&new_name) {
            return Err(DomainError::DuplicateName(new_name));
        }

        debug!(%participant_id, name = %new_name, "adding participant");
        self.record(
            EncounterEventKind::ParticipantAdded(ParticipantAdded {
                participant_id,
                actor_id: actor.id,
                category: actor.category,
                base_name: actor.name.clone(),
                instance_number,
                initiative_modifier: actor.initiative_modifier,
                insertion_order: self.next_insertion_order,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes a participant. If it held the turn, the turn passes on as if
    /// it had just acted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids.
    pub fn remove_participant(
        &mut self,
        participant_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.participant_or_err(participant_id)?;

        let active_participant_id = if self.active == Some(participant_id) {
            self.next_in_turn(Some(participant_id))
        } else {
            self.active
        };

        debug!(%participant_id, ?active_participant_id, "removing participant");
        self.record(
            EncounterEventKind::ParticipantRemoved(ParticipantRemoved {
                participant_id,
                active_participant_id,
            }),
            correlation_id,
            clock,
        );
        self.start_combat_if_ready(correlation_id, clock);
        Ok(())
    }

    // --- initiative commands ---

    /// Rolls initiative for every participant selected by `mode`,
    /// overwriting existing values.
    pub fn roll_initiative(
        &mut self,
        mode: RollMode,
        correlation_id: Uuid,
        clock: &dyn Clock,
        rng: &mut dyn DeterministicRng,
    ) {
        let rolls: Vec<RolledInitiative> = self
            .participants
            .iter()
            .filter(|p| mode.includes(p.category))
            .map(|p| {
                let roll = InitiativeRoll::roll(rng, p.initiative_modifier, p.category);
                RolledInitiative {
                    participant_id: p.id,
                    roll,
                    initiative: roll.total(),
                }
            })
            .collect();

        if rolls.is_empty() {
            debug!(?mode, "no participants to roll for");
            return;
        }

        debug!(?mode, count = rolls.len(), "rolling initiative");
        self.record(
            EncounterEventKind::InitiativeRolled(InitiativeRolled { rolls }),
            correlation_id,
            clock,
        );
        self.start_combat_if_ready(correlation_id, clock);
    }

    /// Sets initiative by hand.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids and
    /// `DomainError::InvalidInitiative` for non-finite values or fractional
    /// values on players.
    pub fn set_initiative(
        &mut self,
        participant_id: Uuid,
        value: f64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let participant = self.participant_or_err(participant_id)?;
        let initiative = Initiative::from_f64(value)?;
        if participant.category.is_player() && !initiative.is_whole() {
            return Err(DomainError::InvalidInitiative(format!(
                "player initiative must be a whole number, got {value}"
            )));
        }

        debug!(%participant_id, %initiative, "setting initiative");
        self.record(
            EncounterEventKind::InitiativeSet(InitiativeSet {
                participant_id,
                initiative,
            }),
            correlation_id,
            clock,
        );
        self.start_combat_if_ready(correlation_id, clock);
        Ok(())
    }

    /// Overrides a participant's initiative modifier for this encounter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids.
    pub fn set_initiative_modifier(
        &mut self,
        participant_id: Uuid,
        initiative_modifier: i32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.participant_or_err(participant_id)?;
        self.record(
            EncounterEventKind::InitiativeModifierChanged(InitiativeModifierChanged {
                participant_id,
                initiative_modifier,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Swaps a tied participant with its neighbour. Does nothing when the
    /// neighbour is not part of the same tie; query `can_move` first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids.
    pub fn move_participant(
        &mut self,
        participant_id: Uuid,
        direction: MoveDirection,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.participant_or_err(participant_id)?;
        let Some(neighbor_id) = self.move_target(participant_id, direction) else {
            debug!(%participant_id, ?direction, "move ignored: no tied neighbour");
            return Ok(());
        };

        self.record(
            EncounterEventKind::ParticipantReordered(ParticipantReordered {
                participant_id,
                neighbor_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    // --- condition commands ---

    /// Applies (or replaces) a condition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids and
    /// `DomainError::InvalidConditionDuration` for a zero-turn duration.
    pub fn apply_condition(
        &mut self,
        participant_id: Uuid,
        condition: ConditionKind,
        duration: ConditionDuration,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.participant_or_err(participant_id)?;
        let duration = duration.validated()?;

        self.record(
            EncounterEventKind::ConditionApplied(ConditionApplied {
                participant_id,
                condition,
                duration,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes a condition before it expires. Absent conditions are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for unknown ids.
    pub fn remove_condition(
        &mut self,
        participant_id: Uuid,
        condition: ConditionKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let participant = self.participant_or_err(participant_id)?;
        if !participant.conditions.contains_key(&condition) {
            return Ok(());
        }

        self.record(
            EncounterEventKind::ConditionRemoved(ConditionRemoved {
                participant_id,
                condition,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    // --- turn and round commands ---

    /// Finishes the active participant's turn and hands the turn to the next
    /// participant that has not acted. When combat is waiting for its first
    /// turn, activates the first participant instead.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoActiveActor` unless the phase is `InProgress`.
    pub fn advance_turn(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase() != CombatPhase::InProgress {
            return Err(DomainError::NoActiveActor);
        }
        let ended_participant_id = self.active;
        self.finish_turn(ended_participant_id, correlation_id, clock);
        Ok(())
    }

    /// Ends the active participant's turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoActiveActor` unless a participant holds the
    /// turn.
    pub fn end_turn(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.phase() != CombatPhase::InProgress {
            return Err(DomainError::NoActiveActor);
        }
        let Some(current) = self.active else {
            return Err(DomainError::NoActiveActor);
        };
        self.finish_turn(Some(current), correlation_id, clock);
        Ok(())
    }

    /// Defers the active participant's turn to the end of this round's
    /// remaining order without marking it as acted. Does nothing when nobody
    /// else is left to act.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoActiveActor` unless a participant holds the
    /// turn.
    pub fn skip_turn(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase() != CombatPhase::InProgress {
            return Err(DomainError::NoActiveActor);
        }
        let Some(current) = self.active else {
            return Err(DomainError::NoActiveActor);
        };
        let Some(next) = self.next_in_turn(Some(current)) else {
            debug!(participant_id = %current, "skip ignored: nobody else left to act");
            return Ok(());
        };

        debug!(skipped = %current, active = %next, "skipping turn");
        self.record(
            EncounterEventKind::TurnSkipped(TurnSkipped {
                skipped_participant_id: current,
                active_participant_id: next,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Restores the previous turn of this round. Does nothing on the first
    /// turn of a round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CombatNotStarted` while any participant lacks
    /// initiative.
    pub fn retreat_turn(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.initiative_complete() {
            return Err(DomainError::CombatNotStarted);
        }
        let Some(previous) = self.turn_history.last() else {
            debug!("retreat ignored: first turn of the round");
            return Ok(());
        };
        let active_participant_id = previous.active_participant_id;

        self.record(
            EncounterEventKind::TurnRetreated(TurnRetreated {
                active_participant_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Starts the next round: clears acted flags, counts condition durations
    /// down (removing those that reach zero), and activates the first
    /// participant in order. Allowed mid-round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CombatNotStarted` while any participant lacks
    /// initiative.
    pub fn advance_round(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.can_advance_round() {
            return Err(DomainError::CombatNotStarted);
        }

        let active_participant_id = self.turn_order().first().map(|p| p.id);
        let expired: Vec<ExpiredCondition> = self
            .participants
            .iter()
            .flat_map(|p| {
                p.conditions
                    .iter()
                    .filter(|(_, duration)| duration.tick().is_none())
                    .map(|(condition, _)| ExpiredCondition {
                        participant_id: p.id,
                        condition: *condition,
                    })
            })
            .collect();
        let round = self.round + 1;

        debug!(round, expired = expired.len(), "advancing round");
        self.record(
            EncounterEventKind::RoundAdvanced(RoundAdvanced {
                round,
                active_participant_id,
                expired,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Restores the state from just before the last round advance. Does
    /// nothing in the first round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CombatNotStarted` while any participant lacks
    /// initiative.
    pub fn retreat_round(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.initiative_complete() {
            return Err(DomainError::CombatNotStarted);
        }
        let Some(previous) = self.round_history.last() else {
            debug!("retreat ignored: no earlier round");
            return Ok(());
        };
        let round = previous.round;

        debug!(round, "retreating round");
        self.record(
            EncounterEventKind::RoundRetreated(RoundRetreated { round }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    // --- internals ---

    fn participant_or_err(&self, participant_id: Uuid) -> Result<&Participant, DomainError> {
        self.participant(participant_id)
            .ok_or(DomainError::ParticipantNotFound(participant_id))
    }

    fn participant_mut(&mut self, participant_id: Uuid) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == participant_id)
    }

    /// Next participant to take the turn: the first in order that has
    /// initiative, has not acted and is not deferred; otherwise the oldest
    /// deferred participant.
    fn next_in_turn(&self, excluding: Option<Uuid>) -> Option<Uuid> {
        let eligible =
            |p: &Participant| p.has_initiative() && !p.has_acted && Some(p.id) != excluding;

        self.turn_order()
            .into_iter()
            .find(|p| eligible(p) && !self.deferred.contains(&p.id))
            .map(|p| p.id)
            .or_else(|| {
                self.deferred
                    .iter()
                    .copied()
                    .find(|id| self.participant(*id).is_some_and(eligible))
            })
    }

    fn move_target(&self, participant_id: Uuid, direction: MoveDirection) -> Option<Uuid> {
        let order = self.turn_order();
        let position = order.iter().position(|p| p.id == participant_id)?;
        let participant = order[position];
        let neighbor = match direction {
            MoveDirection::Left => order.get(position.checked_sub(1)?)?,
            MoveDirection::Right => order.get(position + 1)?,
        };

        let initiative = participant.initiative?;
        if neighbor.initiative != Some(initiative) {
            return None;
        }
        ordering::is_tied(participant, &self.participants).then_some(neighbor.id)
    }

    fn finish_turn(&mut self, ended: Option<Uuid>, correlation_id: Uuid, clock: &dyn Clock) {
        let active_participant_id = self.next_in_turn(ended);
        debug!(?ended, ?active_participant_id, "advancing turn");
        self.record(
            EncounterEventKind::TurnAdvanced(TurnAdvanced {
                ended_participant_id: ended,
                active_participant_id,
            }),
            correlation_id,
            clock,
        );
    }

    fn start_combat_if_ready(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        if self.round == 0 && self.initiative_complete() {
            debug!("initiative complete, combat starts");
            self.record(
                EncounterEventKind::CombatStarted(CombatStarted { round: 1 }),
                correlation_id,
                clock,
            );
        }
    }

    fn record(&mut self, kind: EncounterEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = EncounterEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    pub(crate) fn refresh_display_names(&mut self, base_name: &str) {
        let numbered = self.instance_counter(base_name) > 1;
        for participant in self
            .participants
            .iter_mut()
            .filter(|p| p.base_name == base_name)
        {
            participant.display_name =
                display_name(base_name, participant.instance_number, numbered);
        }
    }

    fn acted_set(&self) -> BTreeSet<Uuid> {
        self.participants
            .iter()
            .filter(|p| p.has_acted)
            .map(|p| p.id)
            .collect()
    }

    fn restore_acted(&mut self, acted: &BTreeSet<Uuid>, deferred: &[Uuid]) {
        for participant in &mut self.participants {
            participant.has_acted = acted.contains(&participant.id);
        }
        self.deferred = deferred
            .iter()
            .copied()
            .filter(|id| self.participants.iter().any(|p| p.id == *id))
            .collect();
    }

    fn swap_manual_order(&mut self, participant_id: Uuid, neighbor_id: Uuid) {
        let Some(initiative) = self.participant(participant_id).and_then(|p| p.initiative) else {
            return;
        };
        let group: Vec<Uuid> = ordering::tie_group(initiative, &self.participants)
            .iter()
            .map(|p| p.id)
            .collect();
        for (position, id) in group.iter().enumerate() {
            if let Some(member) = self.participant_mut(*id) {
                member.manual_order = i32::try_from(position).unwrap_or(i32::MAX);
            }
        }

        let own = self.participant(participant_id).map(|p| p.manual_order);
        let theirs = self.participant(neighbor_id).map(|p| p.manual_order);
        if let (Some(own), Some(theirs)) = (own, theirs) {
            if let Some(p) = self.participant_mut(participant_id) {
                p.manual_order = theirs;
            }
            if let Some(p) = self.participant_mut(neighbor_id) {
                p.manual_order = own;
            }
        }
    }

    fn restore_round(&mut self, snapshot: RoundSnapshot) {
        self.restore_acted(&snapshot.acted, &snapshot.deferred);
        self.active = snapshot
            .active_participant_id
            .filter(|id| self.participant(*id).is_some());
        self.turn_history = snapshot
            .turn_history
            .into_iter()
            .filter(|turn| self.participant(turn.active_participant_id).is_some())
            .collect();

        for participant in &mut self.participants {
            let Some(saved) = snapshot.conditions.get(&participant.id) else {
                continue;
            };
            let mut restored: BTreeMap<ConditionKind, ConditionDuration> =
                saved.iter().map(|c| (c.kind, c.duration)).collect();
            for (kind, duration) in &participant.conditions {
                restored.entry(*kind).or_insert(*duration);
            }
            participant.conditions = restored;
        }
    }
}

impl AggregateRoot for Encounter {
    type Event = EncounterEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    #[allow(clippy::too_many_lines)]
    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            EncounterEventKind::ParticipantAdded(payload) => {
                let counter = self
                    .instance_counters
                    .entry(payload.base_name.clone())
                    .or_insert(0);
                *counter = (*counter).max(payload.instance_number);
                self.next_insertion_order = self
                    .next_insertion_order
                    .max(payload.insertion_order.saturating_add(1));
                self.participants.push(Participant {
                    id: payload.participant_id,
                    actor_id: payload.actor_id,
                    category: payload.category,
                    base_name: payload.base_name.clone(),
                    instance_number: payload.instance_number,
                    display_name: payload.base_name.clone(),
                    initiative: None,
                    initiative_modifier: payload.initiative_modifier,
                    has_acted: false,
                    manual_order: 0,
                    conditions: BTreeMap::new(),
                    insertion_order: payload.insertion_order,
                });
                self.refresh_display_names(&payload.base_name);
            }
            EncounterEventKind::ParticipantRemoved(payload) => {
                let removed = payload.participant_id;
                self.participants.retain(|p| p.id != removed);
                self.deferred.retain(|id| *id != removed);
                self.turn_history
                    .retain(|turn| turn.active_participant_id != removed);
                self.active = payload.active_participant_id;
            }
            EncounterEventKind::InitiativeRolled(payload) => {
                for rolled in &payload.rolls {
                    if let Some(p) = self.participant_mut(rolled.participant_id) {
                        p.initiative = Some(rolled.initiative);
                        p.manual_order = 0;
                    }
                }
            }
            EncounterEventKind::InitiativeSet(payload) => {
                if let Some(p) = self.participant_mut(payload.participant_id) {
                    p.initiative = Some(payload.initiative);
                    p.manual_order = 0;
                }
            }
            EncounterEventKind::InitiativeModifierChanged(payload) => {
                if let Some(p) = self.participant_mut(payload.participant_id) {
                    p.initiative_modifier = payload.initiative_modifier;
                }
            }
            EncounterEventKind::CombatStarted(payload) => {
                self.round = payload.round;
                self.active = None;
            }
            EncounterEventKind::ParticipantReordered(payload) => {
                self.swap_manual_order(payload.participant_id, payload.neighbor_id);
            }
            EncounterEventKind::ConditionApplied(payload) => {
                if let Some(p) = self.participant_mut(payload.participant_id) {
                    p.conditions.insert(payload.condition, payload.duration);
                }
            }
            EncounterEventKind::ConditionRemoved(payload) => {
                if let Some(p) = self.participant_mut(payload.participant_id) {
                    p.conditions.remove(&payload.condition);
                }
            }
            EncounterEventKind::TurnAdvanced(payload) => {
                if let Some(ended) = payload.ended_participant_id {
                    self.turn_history.push(TurnSnapshot {
                        active_participant_id: ended,
                        acted: self.acted_set(),
                        deferred: self.deferred.clone(),
                    });
                    self.deferred.retain(|id| *id != ended);
                    if let Some(p) = self.participant_mut(ended) {
                        p.has_acted = true;
                    }
                }
                if let Some(next) = payload.active_participant_id {
                    self.deferred.retain(|id| *id != next);
                }
                self.active = payload.active_participant_id;
            }
            EncounterEventKind::TurnSkipped(payload) => {
                let skipped = payload.skipped_participant_id;
                let next = payload.active_participant_id;
                self.turn_history.push(TurnSnapshot {
                    active_participant_id: skipped,
                    acted: self.acted_set(),
                    deferred: self.deferred.clone(),
                });
                self.deferred.retain(|id| *id != skipped && *id != next);
                self.deferred.push(skipped);
                self.active = Some(next);
            }
            EncounterEventKind::TurnRetreated(payload) => {
                if let Some(previous) = self.turn_history.pop() {
                    self.restore_acted(&previous.acted, &previous.deferred);
                }
                self.active = Some(payload.active_participant_id);
            }
            EncounterEventKind::RoundAdvanced(payload) => {
                let snapshot = RoundSnapshot {
                    round: self.round,
                    active_participant_id: self.active,
                    acted: self.acted_set(),
                    deferred: self.deferred.clone(),
                    turn_history: std::mem::take(&mut self.turn_history),
                    conditions: self
                        .participants
                        .iter()
                        .map(|p| (p.id, p.applied_conditions()))
                        .collect(),
                };
                self.round_history.push(snapshot);
                for participant in &mut self.participants {
                    participant.has_acted = false;
                    participant.conditions = std::mem::take(&mut participant.conditions)
                        .into_iter()
                        .filter_map(|(kind, duration)| duration.tick().map(|d| (kind, d)))
                        .collect();
                }
                self.deferred.clear();
                self.round = payload.round;
                self.active = payload.active_participant_id;
            }
            EncounterEventKind::RoundRetreated(payload) => {
                if let Some(previous) = self.round_history.pop() {
                    self.restore_round(previous);
                }
                self.round = payload.round;
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted_events)
    }
}
