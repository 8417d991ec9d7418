use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use glob::glob;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::PhaseTimings;
use crate::standalone::{Input, Job, OutputFormat};
use crate::utils::{string_from_bytes, word_to_str};
use crate::workload::{self, sample::sample_corpus};
use crate::*;

/// A finished job: the pipeline output and, if requested, the sequential
/// baseline it was checked against.
#[derive(Debug)]
pub struct JobReport {
    pub corpus_len: usize,
    pub output: PipelineOutput,
    pub sequential: Option<SequentialReport>,
}

#[derive(Debug)]
pub struct SequentialReport {
    pub counts: Vec<WordCount>,
    pub elapsed: Duration,
}

/// Reads every file matching `pattern`, in path order, and tokenizes the
/// concatenated words with `engine`.
pub fn load_corpus(pattern: &str, engine: &Workload) -> Result<Vec<Word>> {
    // Iterator going through all files matching the pattern, e.g. input/*
    let input_files = glob(pattern).with_context(|| format!("bad input glob `{pattern}`"))?;
    let tokenize = engine.tokenize_fn;
    let mut corpus = Vec::new();
    let mut n_files = 0;
    for entry in input_files {
        // An unreadable directory would otherwise silently shrink the corpus.
        let pathspec = entry.context("failed to read input path")?;
        if !pathspec.is_file() {
            continue;
        }
        let mut buf = Vec::new();
        {
            // a scope so that the file is closed right after reading
            let mut file = File::open(&pathspec)
                .with_context(|| format!("failed to open `{}`", pathspec.display()))?;
            file.read_to_end(&mut buf)
                .with_context(|| format!("failed to read `{}`", pathspec.display()))?;
        }
        let text = string_from_bytes(Bytes::from(buf))
            .with_context(|| format!("`{}` is not valid UTF-8", pathspec.display()))?;
        let words = tokenize(&text);
        debug!(file = %pathspec.display(), words = words.len(), "loaded input file");
        corpus.extend(words);
        n_files += 1;
    }
    if n_files == 0 {
        bail!("no input files match `{pattern}`");
    }
    info!(files = n_files, words = corpus.len(), "loaded corpus");
    Ok(corpus)
}

/// Loads the job's corpus and runs the pipeline over it.
pub fn run_job(job: &Job, cancel: CancellationToken) -> Result<JobReport> {
    let engine = workload::named(&job.workload)?;
    let corpus = match &job.input {
        Input::Files(pattern) => load_corpus(pattern, &engine)?,
        Input::Sample => sample_corpus(),
    };

    let output = Pipeline::new(job.config)?
        .with_workload(engine)
        .with_cancellation(cancel)
        .run(&corpus)?;

    let sequential = if job.compare {
        let started = Instant::now();
        let counts = sequential_count(&corpus);
        let elapsed = started.elapsed();
        check_agrees(&output, &counts)?;
        info!(elapsed = ?elapsed, "sequential count agrees with pipeline");
        Some(SequentialReport { counts, elapsed })
    } else {
        None
    };

    Ok(JobReport {
        corpus_len: corpus.len(),
        output,
        sequential,
    })
}

/// Fails unless the pipeline found exactly the same (word, count) pairs as
/// the sequential count.
fn check_agrees(output: &PipelineOutput, sequential: &[WordCount]) -> Result<()> {
    let mut expected = sequential.to_vec();
    expected.sort_unstable_by(|a, b| a.word.cmp(&b.word));
    let actual = output.sorted_by_word();
    if actual != expected {
        bail!(
            "pipeline result ({} words) differs from sequential count ({} words)",
            actual.len(),
            expected.len()
        );
    }
    Ok(())
}

/////////////////////////////////////////////////////////////////////////////
// Rendering
/////////////////////////////////////////////////////////////////////////////

pub fn render(report: &JobReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(report))?),
    }
}

fn render_text(report: &JobReport) -> String {
    let output = &report.output;
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "=== CONFIGURATION ===");
    let _ = writeln!(out, "n_mappers = {}", output.config.n_mappers);
    let _ = writeln!(out, "m_reducers = {}", output.config.m_reducers);
    let _ = writeln!(out, "corpus size = {} words", report.corpus_len);

    for partition in &output.partitions {
        let _ = writeln!(out, "\n=== REDUCER {} ===", partition.reducer_id);
        for wc in &partition.counts {
            let _ = writeln!(out, "  {wc}");
        }
    }

    let _ = writeln!(out, "\n=== FINAL RESULT ===");
    for wc in output.counts() {
        let _ = writeln!(out, "{wc}");
    }
    let _ = writeln!(
        out,
        "\nTotal words: {} ({} distinct)",
        output.total(),
        output.distinct()
    );
    let _ = writeln!(out, "{}", format_timings(&output.timings));
    if let Some(seq) = &report.sequential {
        let _ = writeln!(out, "\n=== SEQUENTIAL RESULT ===");
        for wc in &seq.counts {
            let _ = writeln!(out, "{wc}");
        }
        let _ = writeln!(
            out,
            "\nSequential count: {} distinct words in {:.6} s (matches)",
            seq.counts.len(),
            seq.elapsed.as_secs_f64()
        );
    }
    out
}

fn format_timings(t: &PhaseTimings) -> String {
    format!(
        "Parallel run time: {:.6} s (map {:.6} s, shuffle {:.6} s, reduce {:.6} s)",
        t.total.as_secs_f64(),
        t.map.as_secs_f64(),
        t.shuffle.as_secs_f64(),
        t.reduce.as_secs_f64()
    )
}

#[derive(Serialize)]
struct JsonCount {
    word: String,
    count: u64,
}

impl From<&WordCount> for JsonCount {
    fn from(wc: &WordCount) -> Self {
        JsonCount {
            word: word_to_str(&wc.word).into_owned(),
            count: wc.count,
        }
    }
}

#[derive(Serialize)]
struct JsonPartition {
    reducer_id: usize,
    counts: Vec<JsonCount>,
}

#[derive(Serialize)]
struct JsonTimings {
    map_secs: f64,
    shuffle_secs: f64,
    reduce_secs: f64,
    total_secs: f64,
    sequential_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonReport {
    run_id: String,
    config: PipelineConfig,
    corpus_len: usize,
    total: u64,
    distinct: usize,
    counts: Vec<JsonCount>,
    partitions: Vec<JsonPartition>,
    timings: JsonTimings,
}

impl From<&JobReport> for JsonReport {
    fn from(report: &JobReport) -> Self {
        let output = &report.output;
        JsonReport {
            run_id: output.run_id.to_string(),
            config: output.config,
            corpus_len: report.corpus_len,
            total: output.total(),
            distinct: output.distinct(),
            counts: output.counts().iter().map(JsonCount::from).collect(),
            partitions: output
                .partitions
                .iter()
                .map(|p| JsonPartition {
                    reducer_id: p.reducer_id,
                    counts: p.counts.iter().map(JsonCount::from).collect(),
                })
                .collect(),
            timings: JsonTimings {
                map_secs: output.timings.map.as_secs_f64(),
                shuffle_secs: output.timings.shuffle.as_secs_f64(),
                reduce_secs: output.timings.reduce.as_secs_f64(),
                total_secs: output.timings.total.as_secs_f64(),
                sequential_secs: report.sequential.as_ref().map(|s| s.elapsed.as_secs_f64()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn job(input: Input, workload: &str, compare: bool) -> Job {
        Job {
            input,
            workload: workload.to_string(),
            config: PipelineConfig::new(3, 2),
            compare,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn loads_matching_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "c d").unwrap();
        fs::write(dir.path().join("a.txt"), "a b\nb").unwrap();
        fs::write(dir.path().join("skip.md"), "zzz").unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());

        let corpus = load_corpus(&pattern, &Workload::default()).unwrap();
        assert_eq!(corpus, corpus_from(["a", "b", "b", "c", "d"]));
    }

    #[test]
    fn no_matching_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        assert!(load_corpus(&pattern, &Workload::default()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for sub in ["ok", "locked"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("ok/in.txt"), "a b c").unwrap();
        fs::write(dir.path().join("locked/in.txt"), "d e f g").unwrap();
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user.
        let still_readable = fs::read_dir(&locked).is_ok();
        let pattern = format!("{}/*/*.txt", dir.path().display());
        let loaded = load_corpus(&pattern, &Workload::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if still_readable {
            assert_eq!(loaded.unwrap().len(), 7);
        } else {
            let err = loaded.unwrap_err();
            assert!(format!("{err:#}").contains("failed to read input path"), "{err:#}");
        }
    }

    #[test]
    fn empty_file_gives_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());

        let report = run_job(&job(Input::Files(pattern), "wc", true), CancellationToken::new())
            .unwrap();
        assert_eq!(report.corpus_len, 0);
        assert_eq!(report.output.distinct(), 0);
    }

    #[test]
    fn sample_job_agrees_with_sequential_count() {
        let report = run_job(&job(Input::Sample, "wc", true), CancellationToken::new()).unwrap();

        assert_eq!(report.corpus_len, 56);
        assert_eq!(report.output.total(), 56);
        assert_eq!(report.output.get(b"gato"), Some(14));
        assert_eq!(report.output.get(b"perro"), Some(13));
        assert_eq!(report.output.get(b"luna"), Some(5));
        assert!(report.sequential.is_some());
    }

    #[test]
    fn unknown_workload_fails() {
        assert!(run_job(&job(Input::Sample, "grep", false), CancellationToken::new()).is_err());
    }

    #[test]
    fn text_output_lists_final_counts() {
        let report = run_job(&job(Input::Sample, "wc", false), CancellationToken::new()).unwrap();
        let text = render(&report, OutputFormat::Text).unwrap();

        assert!(text.contains("=== FINAL RESULT ===\n(gato, 14)\n(perro, 13)\n(casa, 10)\n"));
        assert!(text.contains("Total words: 56 (6 distinct)"));
    }

    #[test]
    fn compare_prints_sequential_counts() {
        let report = run_job(&job(Input::Sample, "wc", true), CancellationToken::new()).unwrap();
        let text = render(&report, OutputFormat::Text).unwrap();

        assert!(text.contains("=== SEQUENTIAL RESULT ===\n(gato, 14)\n(perro, 13)\n(casa, 10)\n"));
        assert!(text.contains("(luna, 5)\n\nSequential count: 6 distinct words"));
    }

    #[test]
    fn json_output_is_parseable() {
        let report = run_job(&job(Input::Sample, "wc", true), CancellationToken::new()).unwrap();
        let json = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total"], 56);
        assert_eq!(value["distinct"], 6);
        assert_eq!(value["counts"][0]["word"], "gato");
        assert_eq!(value["partitions"].as_array().unwrap().len(), 2);
        assert!(value["timings"]["sequential_secs"].is_number());
    }
}
