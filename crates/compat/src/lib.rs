//! Backward compatibility for legacy sign clients
//!
//! Legacy clients expect the old identifier numbering with every identifier
//! rendered as text. Two passes make that possible:
//!
//! - [`build_indexes`] scans the legacy dataset once and records which legacy
//!   ids correspond to which reference ids and tag names.
//! - [`transform_stream`] rewrites a current-schema sign array into the legacy
//!   shape record by record, remapping identifiers through those tables.
//!
//! Both work on any `Read`; [`remote`] wires them to HTTP sources and the
//! index cache.

mod error;
mod index;
pub mod remote;
mod transform;

pub use error::Error;
pub use index::build_indexes;
pub use transform::{to_legacy, transform_stream};
