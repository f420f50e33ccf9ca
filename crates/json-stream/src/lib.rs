//! Streaming JSON arrays
//!
//! Upstream sources publish their data as a single top-level JSON array. This
//! crate decodes such arrays one element at a time and writes arrays one element
//! at a time, so memory stays bounded by the size of a single element no matter
//! how long the array is.
//!
//! - [`for_each_element`] drives a callback per decoded element from any `Read`
//! - [`spawn_decoder`] runs the decoder on a blocking thread and hands elements
//!   to async code through a bounded channel
//! - [`JsonArrayWriter`] appends elements to any `Write`
//! - [`http`] opens an HTTP response body as a blocking `Read`

mod error;
pub mod http;
mod reader;
mod writer;

pub use error::StreamError;
pub use reader::{for_each_element, spawn_decoder, ElementStream, DEFAULT_CHANNEL_CAPACITY};
pub use writer::JsonArrayWriter;
