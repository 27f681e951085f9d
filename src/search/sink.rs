//! Live result sinks.
//!
//! The search publishes every new best schedule to a [`ResultSink`]. File
//! sinks write each snapshot to a temporary file in the target directory and
//! rename it into place, so a reader only ever sees a complete snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::schema::{
    CandidateSchedule, DateSlot, Fixture, FitnessScore, InvalidScheduleError, OutputConfig,
};

use super::fitness::FitnessEvaluator;

/// File name written by [`JsonFileSink`].
pub const BEST_SCHEDULE_FILE: &str = "best_schedule.json";
/// Schedule listing written by [`ReportSink`].
pub const FORMATTED_SCHEDULE_FILE: &str = "formatted_schedule.txt";
/// Fitness breakdown written by [`ReportSink`].
pub const FITNESS_REPORT_FILE: &str = "fitness_report.txt";

/// Receives the best schedule found so far.
pub trait ResultSink {
    /// Record a complete snapshot. Called at iteration 0 for the seed and on
    /// every new best after that.
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError> {
        (**self).publish(schedule, score, iteration)
    }
}

/// One published best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub iteration: u64,
    pub generation: u64,
    pub score: FitnessScore,
    pub fixtures: Vec<Fixture>,
}

impl PublishedSnapshot {
    fn new(schedule: &CandidateSchedule, score: FitnessScore, iteration: u64) -> Self {
        Self {
            iteration,
            generation: schedule.generation(),
            score,
            fixtures: schedule.as_slice().to_vec(),
        }
    }

    /// Rebuild the published schedule with its score cached.
    pub fn to_schedule(&self) -> CandidateSchedule {
        CandidateSchedule::new(self.fixtures.clone()).with_score(self.score)
    }
}

/// Sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to move snapshot into place: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("Cannot report on schedule: {0}")]
    Report(#[from] InvalidScheduleError),
}

/// Write `contents` to `dir/name` via a temporary file and rename.
fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, SinkError> {
    let path = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path)?;
    Ok(path)
}

/// Keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    snapshots: Vec<PublishedSnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[PublishedSnapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&PublishedSnapshot> {
        self.snapshots.last()
    }

    /// Published scores in order.
    pub fn scores(&self) -> Vec<FitnessScore> {
        self.snapshots.iter().map(|s| s.score).collect()
    }
}

impl ResultSink for MemorySink {
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError> {
        self.snapshots
            .push(PublishedSnapshot::new(schedule, score, iteration));
        Ok(())
    }
}

/// Writes the latest snapshot to `best_schedule.json`.
#[derive(Debug)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Create the sink, creating `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(BEST_SCHEDULE_FILE)
    }

    /// Read back the last snapshot written to `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<PublishedSnapshot, SinkError> {
        let content = fs::read_to_string(dir.as_ref().join(BEST_SCHEDULE_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ResultSink for JsonFileSink {
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError> {
        let snapshot = PublishedSnapshot::new(schedule, score, iteration);
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.dir, BEST_SCHEDULE_FILE, json.as_bytes())?;
        Ok(())
    }
}

/// Writes a human-readable schedule and a per-term fitness report.
pub struct ReportSink {
    dir: PathBuf,
    evaluator: Arc<FitnessEvaluator>,
}

impl ReportSink {
    pub fn new<P: AsRef<Path>>(dir: P, evaluator: Arc<FitnessEvaluator>) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, evaluator })
    }

    fn format_schedule(schedule: &CandidateSchedule, score: FitnessScore, iteration: u64) -> String {
        let mut by_date: BTreeMap<DateSlot, Vec<&Fixture>> = BTreeMap::new();
        for f in schedule.fixtures() {
            by_date.entry(f.date()).or_default().push(f);
        }

        let mut lines = vec![format!(
            "Best schedule: score {score}, iteration {iteration}, generation {}",
            schedule.generation()
        )];
        for (date, fixtures) in by_date {
            lines.push(String::new());
            lines.push(format!("Date {date}"));
            for f in fixtures {
                lines.push(format!("  {} vs {} at {}", f.home(), f.away(), f.venue()));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }

    fn format_fitness(
        &self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
    ) -> Result<String, SinkError> {
        let mut lines = vec![format!("Total score: {score}"), String::new()];
        let reports: BTreeMap<String, Vec<String>> =
            self.evaluator.report(schedule)?.into_iter().collect();

        for term in self.evaluator.breakdown(schedule)? {
            lines.push(format!(
                "{}: {} x {} = {}",
                term.name, term.value, term.weight, term.weighted
            ));
            if let Some(details) = reports.get(&term.name) {
                lines.extend(details.iter().map(|d| format!("  - {d}")));
            }
        }
        lines.push(String::new());
        Ok(lines.join("\n"))
    }
}

impl ResultSink for ReportSink {
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError> {
        let fitness = self.format_fitness(schedule, score)?;
        let listing = Self::format_schedule(schedule, score, iteration);
        write_atomic(&self.dir, FORMATTED_SCHEDULE_FILE, listing.as_bytes())?;
        write_atomic(&self.dir, FITNESS_REPORT_FILE, fitness.as_bytes())?;
        Ok(())
    }
}

/// Publishes to several sinks in order, stopping at the first error.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Sinks selected by an [`OutputConfig`].
    pub fn from_config(
        output: &OutputConfig,
        evaluator: Arc<FitnessEvaluator>,
    ) -> Result<Self, SinkError> {
        let mut sinks = Self::new();
        if output.json {
            sinks = sinks.with(JsonFileSink::new(&output.dir)?);
        }
        if output.reports {
            sinks = sinks.with(ReportSink::new(&output.dir, evaluator)?);
        }
        Ok(sinks)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for FanOutSink {
    fn publish(
        &mut self,
        schedule: &CandidateSchedule,
        score: FitnessScore,
        iteration: u64,
    ) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.publish(schedule, score, iteration)?;
        }
        Ok(())
    }
}
