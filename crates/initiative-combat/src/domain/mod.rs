//! Domain layer for the turn order engine.

pub mod aggregates;
pub mod commands;
pub mod condition;
pub mod events;
pub mod initiative;
pub mod ordering;
pub mod participant;
pub mod record;
