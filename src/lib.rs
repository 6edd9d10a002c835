//! Fieldops: sub-task dispatch for utility field service.
//!
//! Customer work orders ("tasks") decompose into ordered stages of field work
//! ("sub-tasks") that field executors claim and perform, field supervisors
//! verify, and the back office signs off. This crate provides the
//! transactional state engine behind those transitions.
//!
//! # Architecture
//!
//! Fieldops follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task and sub-task state engine with cascades
//! - [`config`]: Engine configuration
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod logging;
pub mod task;
