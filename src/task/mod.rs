//! Sub-task dispatch for Fieldops.
//!
//! This module validates and applies every sub-task status transition,
//! enforces which actor may perform it, records reports and an audit trail,
//! and cascades effects to sibling sub-tasks and the parent task. It follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
