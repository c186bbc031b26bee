//! Turn order engine for the initiative tracker.
//!
//! Responsible for the participants of one live encounter: their
//! initiative values and tie-breaks, turn and round progression,
//! condition countdowns, and point-in-time save/load of the whole state.

pub mod application;
pub mod domain;
