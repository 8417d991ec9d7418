use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::PipelineConfig;

pub mod engine;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count the words of a set of local files
    Submit {
        /// Glob spec for the input files
        #[arg(short, long)]
        input: String,

        /// Name of the workload (`wc` or `wc-alnum`)
        #[arg(short, long, default_value = "wc")]
        workload: String,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Count the built-in 56 word sample corpus
    Sample {
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by every command that runs the pipeline.
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of mappers, 1 to 16
    #[arg(short = 'n', long = "mappers", env = "MRL_MAPPERS")]
    pub n_mappers: Option<usize>,

    /// Number of reducers, 1 to 16
    #[arg(short = 'm', long = "reducers", env = "MRL_REDUCERS")]
    pub m_reducers: Option<usize>,

    /// JSON config file; explicit flags take precedence over it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also count sequentially and fail if the results differ
    #[arg(long)]
    pub compare: bool,

    /// How to print the result
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Starts from the config file (or the defaults) and applies any
    /// explicit overrides. The result is validated when the pipeline is
    /// created, not here.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(n) = self.n_mappers {
            config.n_mappers = n;
        }
        if let Some(m) = self.m_reducers {
            config.m_reducers = m;
        }
        Ok(config)
    }
}

#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Input {
    /// Every file matching the glob, in path order.
    Files(String),
    /// The built-in sample corpus.
    Sample,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub input: Input,
    pub workload: String,
    pub config: PipelineConfig,
    pub compare: bool,
    pub format: OutputFormat,
}

impl Job {
    pub fn from_args(args: Args) -> Result<Job> {
        let (input, workload, run) = match args.command {
            Commands::Submit {
                input,
                workload,
                run,
            } => (Input::Files(input), workload, run),
            Commands::Sample { run } => (Input::Sample, "wc".to_string(), run),
        };
        Ok(Job {
            input,
            workload,
            config: run.pipeline_config()?,
            compare: run.compare,
            format: run.format,
        })
    }
}
