use tracing::{debug, trace};

use crate::engine::map::MapperResult;
use crate::engine::table::FrequencyTable;
use crate::utils::{format_counts, word_to_str};
use crate::{PipelineError, WordCount};

/// The words, with their global counts, handed to one reducer.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PartitionAssignment {
    pub reducer_id: usize,
    pub entries: Vec<WordCount>,
}

/// Merges all mapper results and distributes the distinct words across
/// `m_reducers` partitions.
///
/// `results` must be ordered by mapper id. Both the merge and the
/// distribution depend only on that order, never on which mapper finished
/// first, so the same inputs always produce the same partitions.
pub fn combine(
    results: &[MapperResult],
    m_reducers: usize,
) -> Result<Vec<PartitionAssignment>, PipelineError> {
    if m_reducers < 1 {
        return Err(PipelineError::invalid_config(
            "cannot distribute words across zero reducers",
        ));
    }
    let merged = merge(results);
    Ok(distribute(merged, m_reducers))
}

/// Folds every mapper's table into one global table.
///
/// Results are consumed in slice order and each table in its own order; a
/// word keeps the position at which the merge first encountered it.
pub fn merge(results: &[MapperResult]) -> FrequencyTable {
    let mut global = FrequencyTable::new();
    for result in results {
        for wc in &result.table {
            global.add(&wc.word, wc.count);
        }
    }
    debug!(
        mappers = results.len(),
        distinct = global.len(),
        total = global.total(),
        "merged mapper outputs"
    );
    trace!("grouped pairs:\n{}", format_counts(&global));
    global
}

/// Assigns the word at global index `i` to reducer `i % m_reducers`.
///
/// Always returns `m_reducers` partitions, some possibly empty.
/// `m_reducers` must be at least 1.
pub(crate) fn distribute(global: FrequencyTable, m_reducers: usize) -> Vec<PartitionAssignment> {
    let per_reducer = global.len().div_ceil(m_reducers);
    let mut partitions: Vec<PartitionAssignment> = (0..m_reducers)
        .map(|reducer_id| PartitionAssignment {
            reducer_id,
            entries: Vec::with_capacity(per_reducer),
        })
        .collect();

    for (i, wc) in global.into_entries().into_iter().enumerate() {
        let reducer_id = i % m_reducers;
        trace!("({}, {}) -> reducer {reducer_id}", word_to_str(&wc.word), wc.count);
        partitions[reducer_id].entries.push(wc);
    }
    partitions
}
