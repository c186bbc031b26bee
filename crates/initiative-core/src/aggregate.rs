//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots whose state changes are expressed as events.
///
/// Command methods validate first and only then record an event; recording
/// applies the event immediately, so a rejected command never leaves a
/// partial state change behind.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Apply an event to mutate internal state (also used during replay).
    fn apply(&mut self, event: &Self::Event);

    /// Returns events recorded since the last drain.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Removes and returns the events recorded since the last drain.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;

    /// Applies `events` in order. A fresh aggregate fed the full event
    /// stream of another ends up in the same state.
    fn replay<'a, I>(&mut self, events: I)
    where
        Self: Sized,
        Self::Event: 'a,
        I: IntoIterator<Item = &'a Self::Event>,
    {
        for event in events {
            self.apply(event);
        }
    }
}
