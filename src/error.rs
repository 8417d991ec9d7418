use std::fmt;

use thiserror::Error;

/// The pipeline phases that run tasks or can observe a cancellation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Phase {
    Map,
    Shuffle,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Map => "map",
            Phase::Shuffle => "shuffle",
            Phase::Reduce => "reduce",
        };
        f.write_str(name)
    }
}

/// Errors reported by a pipeline run.
///
/// Any error aborts the whole run; a failed run never exposes partial output.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The mapper or reducer count is out of range. Reported before any
    /// phase starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A task returned an error.
    #[error("{phase} task {task_id} failed")]
    TaskFailed {
        phase: Phase,
        task_id: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A task's worker thread panicked.
    #[error("{phase} task {task_id} panicked")]
    TaskPanicked { phase: Phase, task_id: usize },

    /// The worker thread for a task could not be started.
    #[error("failed to spawn {phase} task {task_id}")]
    Spawn {
        phase: Phase,
        task_id: usize,
        #[source]
        source: std::io::Error,
    },

    /// A barrier was passed while some task slots were still empty.
    #[error("{phase} barrier passed with {missing} unwritten result slot(s)")]
    IncompleteBarrier { phase: Phase, missing: usize },

    /// The run was cancelled.
    #[error("pipeline cancelled during {0} phase")]
    Cancelled(Phase),
}

impl PipelineError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        PipelineError::InvalidConfig(msg.into())
    }
}
