//! Buffered writes flushed in fixed-size batches

use crate::{SignStore, StoreError, WriteOp};

/// Default number of ops buffered before a flush
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Buffers [`WriteOp`]s and hands them to the store in batches.
///
/// A flush happens when the buffer reaches `batch_size` and when
/// [`BatchWriter::flush`] or [`BatchWriter::finish`] is called. Each flush is
/// one transaction; earlier flushes stay committed if a later one fails.
pub struct BatchWriter<'a, S: SignStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    pending: Vec<WriteOp>,
    written: usize,
    flushes: usize,
}

impl<'a, S: SignStore + ?Sized> BatchWriter<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            written: 0,
            flushes: 0,
        }
    }

    pub async fn push(&mut self, op: WriteOp) -> Result<(), StoreError> {
        self.pending.push(op);
        if self.pending.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    pub async fn extend<I>(&mut self, ops: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = WriteOp>,
    {
        for op in ops {
            self.push(op).await?;
        }
        Ok(())
    }

    /// Send everything buffered so far. A no-op when the buffer is empty.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let ops = std::mem::take(&mut self.pending);
        self.store.execute_batch(&ops).await?;
        self.written += ops.len();
        self.flushes += 1;
        tracing::debug!("Flushed batch of {} ops", ops.len());

        self.pending = Vec::with_capacity(self.batch_size);
        Ok(())
    }

    /// Flush the remainder and return the total number of ops written.
    pub async fn finish(mut self) -> Result<usize, StoreError> {
        self.flush().await?;
        Ok(self.written)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Ops committed by completed flushes
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}
