//! Axiom simulation (workspace facade crate).
//!
//! Re-exports the core and shared types crates under short names and hosts the
//! scripted-run [`harness`] used by the `axiom-headless` shell.

pub use axiom_core as core;
pub use axiom_types as types;

pub mod harness;
