//! Initiative core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the combat
//! engine, the storage adapters and the HTTP surface depend on. It contains
//! no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod library;
pub mod repository;
pub mod rng;
