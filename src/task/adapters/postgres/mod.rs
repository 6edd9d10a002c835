//! `PostgreSQL` adapters for dispatch persistence.

mod models;
mod schema;
mod store;

pub use store::{DispatchPgPool, PostgresDispatchStore};
