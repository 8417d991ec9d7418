//! Pipeline configuration.

use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Accepted number of mappers and of reducers.
pub const WORKER_RANGE: RangeInclusive<usize> = 1..=16;

pub const DEFAULT_MAPPERS: usize = 4;
pub const DEFAULT_REDUCERS: usize = 2;

/// How many mappers and reducers a run uses.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub n_mappers: usize,
    pub m_reducers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            n_mappers: DEFAULT_MAPPERS,
            m_reducers: DEFAULT_REDUCERS,
        }
    }
}

impl PipelineConfig {
    pub fn new(n_mappers: usize, m_reducers: usize) -> Self {
        PipelineConfig {
            n_mappers,
            m_reducers,
        }
    }

    /// Reads a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open config file `{}`", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config file `{}`", path.display()))?;
        Ok(config)
    }

    /// Checks that both worker counts are within [`WORKER_RANGE`].
    pub fn validate(&self) -> Result<(), PipelineError> {
        check_workers("n_mappers", self.n_mappers)?;
        check_workers("m_reducers", self.m_reducers)
    }
}

fn check_workers(name: &str, value: usize) -> Result<(), PipelineError> {
    if WORKER_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::invalid_config(format!(
            "{name} must be between {} and {}, got {value}",
            WORKER_RANGE.start(),
            WORKER_RANGE.end()
        )))
    }
}
