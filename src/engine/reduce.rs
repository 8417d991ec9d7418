use anyhow::{anyhow, Context};
use fnv::FnvHashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::engine::combine::PartitionAssignment;
use crate::engine::map::CANCEL_CHECK_INTERVAL;
use crate::error::Phase;
use crate::utils::{format_counts, word_to_str};
use crate::{PipelineError, ReduceFn, Word, WordCount};

/// The finalized counts of one partition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReducerOutput {
    pub reducer_id: usize,
    /// One entry per word received, in the order the words were received.
    pub counts: Vec<WordCount>,
}

/// Finalizes one partition with `reduce_fn`.
pub fn reduce(
    partition: &PartitionAssignment,
    reduce_fn: ReduceFn,
) -> Result<ReducerOutput, PipelineError> {
    reduce_inner(partition, reduce_fn, None)
}

/// Like [`reduce`], but gives up as soon as `cancel` fires.
pub fn reduce_cancellable(
    partition: &PartitionAssignment,
    reduce_fn: ReduceFn,
    cancel: &CancellationToken,
) -> Result<ReducerOutput, PipelineError> {
    reduce_inner(partition, reduce_fn, Some(cancel))
}

fn reduce_inner(
    partition: &PartitionAssignment,
    reduce_fn: ReduceFn,
    cancel: Option<&CancellationToken>,
) -> Result<ReducerOutput, PipelineError> {
    let reducer_id = partition.reducer_id;
    trace!(
        "reducer {reducer_id} received:\n{}",
        format_counts(&partition.entries)
    );

    // Group counts by word, keeping the order of first occurrence. The
    // shuffle already hands over unique words, so groups are usually
    // singletons.
    let mut index: FnvHashMap<&Word, usize> = FnvHashMap::default();
    let mut groups: Vec<(&Word, Vec<u64>)> = Vec::with_capacity(partition.entries.len());
    for wc in &partition.entries {
        match index.get(&wc.word) {
            Some(&pos) => groups[pos].1.push(wc.count),
            None => {
                index.insert(&wc.word, groups.len());
                groups.push((&wc.word, vec![wc.count]));
            }
        }
    }

    let mut counts = Vec::with_capacity(groups.len());
    for (i, (word, values)) in groups.into_iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!(reducer_id, "reducer observed cancellation");
            return Err(PipelineError::Cancelled(Phase::Reduce));
        }
        let count = finalize(word, values, reduce_fn).map_err(|source| PipelineError::TaskFailed {
            phase: Phase::Reduce,
            task_id: reducer_id,
            source,
        })?;
        counts.push(WordCount {
            word: word.clone(),
            count,
        });
    }

    debug!(reducer_id, words = counts.len(), "reducer finished");
    trace!("reducer {reducer_id} emits:\n{}", format_counts(&counts));
    Ok(ReducerOutput { reducer_id, counts })
}

fn finalize(word: &Word, values: Vec<u64>, reduce_fn: ReduceFn) -> anyhow::Result<u64> {
    let count = reduce_fn(word, Box::new(values.into_iter()))
        .with_context(|| format!("reduce failed for `{}`", word_to_str(word)))?;
    if count == 0 {
        return Err(anyhow!(
            "reduce produced a zero count for `{}`",
            word_to_str(word)
        ));
    }
    Ok(count)
}
