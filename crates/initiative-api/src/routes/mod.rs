//! Route modules.

pub mod actors;
pub mod encounter;
pub mod health;
