//! Lazy conversion of raw records into documents.

use crate::error::EtlResult;
use crate::transform::RowTransformer;
use crate::types::{RawRecord, StopDocument};

/// Single-pass iterator applying a [`RowTransformer`] to each source record.
///
/// Construction does no work; each call to [`Iterator::next`] pulls and transforms exactly one
/// record, so at most one record is in flight. A record that fails to read or transform yields
/// one `Err` item and the consumer decides whether to keep going.
#[derive(Debug)]
pub struct DocumentProducer<I> {
    records: I,
    transformer: RowTransformer,
    rows_read: u64,
}

impl<I> DocumentProducer<I>
where
    I: Iterator<Item = EtlResult<RawRecord>>,
{
    pub fn new(records: I, transformer: RowTransformer) -> Self {
        Self {
            records,
            transformer,
            rows_read: 0,
        }
    }

    /// Number of source rows pulled so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

impl<I> Iterator for DocumentProducer<I>
where
    I: Iterator<Item = EtlResult<RawRecord>>,
{
    type Item = EtlResult<StopDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.rows_read += 1;

        Some(record.and_then(|record| self.transformer.transform(&record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
