use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::engine::table::FrequencyTable;
use crate::error::Phase;
use crate::utils::{format_counts, word_to_str};
use crate::{PipelineError, Word};

/// How many words a mapper counts between two cancellation checks.
pub(crate) const CANCEL_CHECK_INTERVAL: usize = 1024;

/// The local counts of one mapper's chunk.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MapperResult {
    pub mapper_id: usize,
    /// Unique word -> count for this chunk only, in first-seen order.
    pub table: FrequencyTable,
}

/// Counts the words of one chunk.
pub fn map(chunk: &[Word], mapper_id: usize) -> MapperResult {
    let mut table = FrequencyTable::new();
    for word in chunk {
        table.increment(word);
    }
    emitted(chunk, mapper_id, table)
}

/// Like [`map`], but gives up as soon as `cancel` fires.
pub fn map_cancellable(
    chunk: &[Word],
    mapper_id: usize,
    cancel: &CancellationToken,
) -> Result<MapperResult, PipelineError> {
    let mut table = FrequencyTable::new();
    for (i, word) in chunk.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            debug!(mapper_id, "mapper observed cancellation");
            return Err(PipelineError::Cancelled(Phase::Map));
        }
        table.increment(word);
    }
    Ok(emitted(chunk, mapper_id, table))
}

fn emitted(chunk: &[Word], mapper_id: usize, table: FrequencyTable) -> MapperResult {
    debug!(
        mapper_id,
        words = chunk.len(),
        distinct = table.len(),
        "mapper finished"
    );
    trace!(
        "mapper {mapper_id} chunk: {}\nemits:\n{}",
        itertools::join(chunk.iter().map(word_to_str), " "),
        format_counts(&table)
    );
    MapperResult { mapper_id, table }
}
