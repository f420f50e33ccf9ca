//! Incremental JSON array encoding

use serde::Serialize;
use std::io::Write;

use crate::StreamError;

/// Writes a JSON array to `W` one element at a time.
///
/// The opening bracket is written by [`JsonArrayWriter::begin`], elements are
/// comma-separated as they arrive, and [`JsonArrayWriter::finish`] closes the
/// array and flushes. Nothing but the current element is ever buffered.
pub struct JsonArrayWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn begin(mut inner: W) -> Result<Self, StreamError> {
        inner.write_all(b"[")?;
        Ok(Self { inner, written: 0 })
    }

    pub fn write_element<T: Serialize + ?Sized>(&mut self, element: &T) -> Result<(), StreamError> {
        if self.written > 0 {
            self.inner.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.inner, element).map_err(StreamError::Encode)?;
        self.written += 1;
        Ok(())
    }

    /// Number of elements written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Close the array, flush, and hand back the sink.
    pub fn finish(mut self) -> Result<W, StreamError> {
        self.inner.write_all(b"]")?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}
