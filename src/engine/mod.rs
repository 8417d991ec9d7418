//! The three-phase word count pipeline.
//!
//! ```text
//! corpus -> partition -> N mappers -> barrier -> combine -> M partitions
//!        -> barrier -> M reducers -> output
//! ```
//!
//! Mappers and reducers each run on their own scoped worker thread and
//! write only to their own result slot in the shared run context. The
//! coordinator joins every task of a phase before the next phase starts;
//! the shuffle runs on the coordinator's own thread.

use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info, info_span, warn, Span};
use uuid::Uuid;

use crate::error::Phase;
use crate::{PipelineConfig, PipelineError, Word, WordCount, Workload};

mod context;
pub mod combine;
pub mod map;
pub mod partition;
pub mod reduce;
pub mod table;

use context::PipelineContext;

pub use combine::{combine, merge, PartitionAssignment};
pub use map::{map, MapperResult};
pub use partition::partition;
pub use reduce::{reduce, ReducerOutput};
pub use table::FrequencyTable;

/////////////////////////////////////////////////////////////////////////////
// Coordinator states
/////////////////////////////////////////////////////////////////////////////

/// The states a run moves through, strictly in declaration order.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PipelineState {
    Init,
    MapPhase,
    MapBarrier,
    Shuffle,
    ReducePartitionReady,
    ReducePhase,
    Done,
}

impl PipelineState {
    /// The only state reachable from `self`, or `None` once done.
    pub fn successor(self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Init => Some(MapPhase),
            MapPhase => Some(MapBarrier),
            MapBarrier => Some(Shuffle),
            Shuffle => Some(ReducePartitionReady),
            ReducePartitionReady => Some(ReducePhase),
            ReducePhase => Some(Done),
            Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Run output
/////////////////////////////////////////////////////////////////////////////

/// Wall-clock time spent in each phase of a run.
#[derive(Copy, Clone, Default, Debug)]
pub struct PhaseTimings {
    pub map: Duration,
    pub shuffle: Duration,
    pub reduce: Duration,
    pub total: Duration,
}

/// The result of a completed run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub config: PipelineConfig,
    /// Each reducer's output, ordered by reducer id.
    pub partitions: Vec<ReducerOutput>,
    pub timings: PhaseTimings,
    counts: Vec<WordCount>,
}

impl PipelineOutput {
    /// Every distinct word with its count, in the order the shuffle first
    /// encountered it.
    pub fn counts(&self) -> &[WordCount] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<WordCount> {
        self.counts
    }

    /// The final counts sorted by word bytes.
    pub fn sorted_by_word(&self) -> Vec<WordCount> {
        let mut counts = self.counts.clone();
        counts.sort_unstable_by(|a, b| a.word.cmp(&b.word));
        counts
    }

    /// Looks up the count of a single word. This is a linear scan.
    pub fn get(&self, word: &[u8]) -> Option<u64> {
        self.counts
            .iter()
            .find(|wc| wc.word.as_ref() == word)
            .map(|wc| wc.count)
    }

    /// Number of distinct words.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts; equals the corpus length.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|wc| wc.count).sum()
    }
}

/// Rebuilds first-seen order from round-robin partitions: global index `i`
/// sits at position `i / m` of partition `i % m`.
fn interleave(partitions: &[ReducerOutput]) -> Vec<WordCount> {
    let len = partitions.iter().map(|p| p.counts.len()).sum();
    let mut cursors: Vec<_> = partitions.iter().map(|p| p.counts.iter()).collect();
    let mut counts = Vec::with_capacity(len);
    'rounds: loop {
        for cursor in cursors.iter_mut() {
            match cursor.next() {
                Some(wc) => counts.push(wc.clone()),
                None => break 'rounds,
            }
        }
    }
    counts
}

/// Counts `corpus` in a single pass on the calling thread. The result is
/// in first-seen order, like [`PipelineOutput::counts`].
pub fn sequential_count(corpus: &[Word]) -> Vec<WordCount> {
    let mut table = FrequencyTable::new();
    for word in corpus {
        table.increment(word);
    }
    table.into_entries()
}

/////////////////////////////////////////////////////////////////////////////
// Coordinator
/////////////////////////////////////////////////////////////////////////////

/// Orchestrates one pipeline run.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    workload: Workload,
    cancel: CancellationToken,
    state: PipelineState,
}

impl Pipeline {
    /// Validates `config`. An invalid configuration is reported here,
    /// before anything runs.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Pipeline {
            config,
            workload: Workload::default(),
            cancel: CancellationToken::new(),
            state: PipelineState::Init,
        })
    }

    /// Uses `workload`'s reduce function in the reduce phase.
    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }

    /// Observes `cancel` at every phase boundary and inside running tasks.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// The state the most recent run reached. `Done` after a successful
    /// run; a failed or cancelled run stays in the state it failed in.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs all phases over `corpus`. Every call starts over from `Init`.
    pub fn run(&mut self, corpus: &[Word]) -> Result<PipelineOutput, PipelineError> {
        self.state = PipelineState::Init;
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);
        let _entered = span.enter();
        info!(
            words = corpus.len(),
            n_mappers = self.config.n_mappers,
            m_reducers = self.config.m_reducers,
            "starting run"
        );

        let started = Instant::now();
        let mut timings = PhaseTimings::default();
        let mut ctx = PipelineContext::new(corpus, self.config);

        self.check_cancelled(Phase::Map)?;
        self.advance(PipelineState::MapPhase);
        let phase_start = Instant::now();
        self.map_phase(&mut ctx, &span)?;

        self.advance(PipelineState::MapBarrier);
        let results = ctx.take_mapper_results()?;
        timings.map = phase_start.elapsed();
        debug!(elapsed = ?timings.map, "map phase complete");

        self.check_cancelled(Phase::Shuffle)?;
        self.advance(PipelineState::Shuffle);
        let phase_start = Instant::now();
        ctx.partitions = combine(&results, ctx.config.m_reducers)?;
        drop(results);
        timings.shuffle = phase_start.elapsed();
        debug!(elapsed = ?timings.shuffle, "shuffle complete");

        self.advance(PipelineState::ReducePartitionReady);
        self.check_cancelled(Phase::Reduce)?;
        self.advance(PipelineState::ReducePhase);
        let phase_start = Instant::now();
        self.reduce_phase(&mut ctx, &span)?;
        let partitions = ctx.take_reducer_outputs()?;
        timings.reduce = phase_start.elapsed();
        debug!(elapsed = ?timings.reduce, "reduce phase complete");

        self.advance(PipelineState::Done);
        let counts = interleave(&partitions);
        timings.total = started.elapsed();
        info!(
            distinct = counts.len(),
            elapsed = ?timings.total,
            "run complete"
        );

        Ok(PipelineOutput {
            run_id,
            config: self.config,
            partitions,
            timings,
            counts,
        })
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert_eq!(self.state.successor(), Some(next));
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    fn check_cancelled(&self, phase: Phase) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            warn!(%phase, "run cancelled");
            return Err(PipelineError::Cancelled(phase));
        }
        Ok(())
    }

    fn map_phase(&self, ctx: &mut PipelineContext<'_>, parent: &Span) -> Result<(), PipelineError> {
        let ranges = partition(ctx.corpus.len(), ctx.config.n_mappers)?;
        let corpus = ctx.corpus;
        let cancel = &self.cancel;

        thread::scope(|s| {
            let tasks = ranges
                .into_iter()
                .zip(ctx.map_slots.iter_mut())
                .enumerate()
                .map(|(mapper_id, (range, slot))| {
                    let chunk = &corpus[range];
                    let span = debug_span!(parent: parent, "mapper", mapper_id);
                    (mapper_id, move || {
                        span.in_scope(|| -> Result<(), PipelineError> {
                            *slot = Some(map::map_cancellable(chunk, mapper_id, cancel)?);
                            Ok(())
                        })
                    })
                });
            spawn_and_join(s, Phase::Map, tasks)
        })
    }

    fn reduce_phase(
        &self,
        ctx: &mut PipelineContext<'_>,
        parent: &Span,
    ) -> Result<(), PipelineError> {
        let reduce_fn = self.workload.reduce_fn;
        let cancel = &self.cancel;
        let partitions = &ctx.partitions;
        let slots = &mut ctx.reduce_slots;

        thread::scope(|s| {
            let tasks = partitions
                .iter()
                .zip(slots.iter_mut())
                .map(|(assignment, slot)| {
                    let reducer_id = assignment.reducer_id;
                    let span = debug_span!(parent: parent, "reducer", reducer_id);
                    (reducer_id, move || {
                        span.in_scope(|| -> Result<(), PipelineError> {
                            *slot = Some(reduce::reduce_cancellable(assignment, reduce_fn, cancel)?);
                            Ok(())
                        })
                    })
                });
            spawn_and_join(s, Phase::Reduce, tasks)
        })
    }
}

/// Starts one named worker thread per task, then waits for all of them.
///
/// This is the phase barrier: it only returns once every started task has
/// finished. The first failure by task id is reported.
fn spawn_and_join<'scope, 'env, I, F>(
    s: &'scope Scope<'scope, 'env>,
    phase: Phase,
    tasks: I,
) -> Result<(), PipelineError>
where
    I: IntoIterator<Item = (usize, F)>,
    F: FnOnce() -> Result<(), PipelineError> + Send + 'scope,
{
    let mut handles: Vec<(usize, ScopedJoinHandle<'scope, Result<(), PipelineError>>)> =
        Vec::new();
    let mut spawn_err = None;
    for (task_id, task) in tasks {
        let spawned = thread::Builder::new()
            .name(format!("{phase}-{task_id}"))
            .spawn_scoped(s, task);
        match spawned {
            Ok(handle) => handles.push((task_id, handle)),
            Err(source) => {
                spawn_err = Some(PipelineError::Spawn {
                    phase,
                    task_id,
                    source,
                });
                break;
            }
        }
    }

    let mut first_err = None;
    for (task_id, handle) in handles {
        let outcome = handle
            .join()
            .unwrap_or_else(|_| Err(PipelineError::TaskPanicked { phase, task_id }));
        if let Err(err) = outcome {
            warn!(%phase, task_id, error = %err, "task failed");
            first_err.get_or_insert(err);
        }
    }

    match spawn_err.or(first_err) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
