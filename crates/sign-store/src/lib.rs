//! Relational store for synchronized signs.
//!
//! The [`SignStore`] trait abstracts over the backing database so the
//! synchronizer can be written once. [`PostgresStore`] is the production
//! backend; [`memory::MemoryStore`] mirrors its constraint semantics for tests.
//!
//! Writers queue [`WriteOp`]s through a [`BatchWriter`], which turns them into
//! one transaction per flush.

mod batch;
pub mod memory;
mod postgres;
mod traits;

pub use batch::{BatchWriter, DEFAULT_BATCH_SIZE};
pub use postgres::{ensure_schema, new_postgres_client, PostgresStore, SCHEMA};
pub use traits::{SignRow, SignStore, StoreError, WriteOp};
