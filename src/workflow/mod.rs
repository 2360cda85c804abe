//! Workflow tracing, retry bookkeeping, and escalation.
//!
//! Every run appends structured entries to `{base}_trace.jsonl` for
//! post-mortem analysis. When a phase exhausts its retries the tracer
//! writes an escalation manifest with a resume hint, and a summary over
//! the trace decides where a resumed run picks up.

use crate::naming::BaseName;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Retries allowed per phase before escalating to a human.
pub const MAX_RETRIES: u32 = 3;

/// The phases of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    Plan,
    PrepareTemplate,
    Extract,
    Summarize,
    Translate,
    ReviewJson,
    Build,
    ReviewPptx,
    Done,
    Escalate,
}

impl Phase {
    /// Pipeline order, escalation excluded.
    pub const PIPELINE: [Phase; 10] = [
        Phase::Init,
        Phase::Plan,
        Phase::PrepareTemplate,
        Phase::Extract,
        Phase::Summarize,
        Phase::Translate,
        Phase::ReviewJson,
        Phase::Build,
        Phase::ReviewPptx,
        Phase::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Plan => "PLAN",
            Phase::PrepareTemplate => "PREPARE_TEMPLATE",
            Phase::Extract => "EXTRACT",
            Phase::Summarize => "SUMMARIZE",
            Phase::Translate => "TRANSLATE",
            Phase::ReviewJson => "REVIEW_JSON",
            Phase::Build => "BUILD",
            Phase::ReviewPptx => "REVIEW_PPTX",
            Phase::Done => "DONE",
            Phase::Escalate => "ESCALATE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "INIT" => Ok(Phase::Init),
            "PLAN" => Ok(Phase::Plan),
            "PREPARE_TEMPLATE" => Ok(Phase::PrepareTemplate),
            "EXTRACT" => Ok(Phase::Extract),
            "SUMMARIZE" => Ok(Phase::Summarize),
            "TRANSLATE" => Ok(Phase::Translate),
            "REVIEW_JSON" => Ok(Phase::ReviewJson),
            "BUILD" => Ok(Phase::Build),
            "REVIEW_PPTX" => Ok(Phase::ReviewPptx),
            "DONE" => Ok(Phase::Done),
            "ESCALATE" => Ok(Phase::Escalate),
            other => Err(Error::Other(format!("unknown phase: {other}"))),
        }
    }
}

/// Outcome status of a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Started,
    Success,
    Failed,
    Warning,
    Escalated,
}

/// One line of the trace file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub trace_id: String,
    pub base_name: String,
    pub timestamp: String,
    pub phase: Phase,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

/// Extra detail attached when a phase ends.
#[derive(Debug, Clone, Default)]
pub struct PhaseOutcome {
    message: Option<String>,
    output_file: Option<String>,
    metrics: BTreeMap<String, serde_json::Value>,
    error: Option<String>,
}

impl PhaseOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    pub fn with_output(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    #[inline]
    pub fn with_metric(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }

    #[inline]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Escalation manifest handed to a human operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub trace_id: String,
    pub base_name: String,
    pub escalated_at: String,
    pub phase: Phase,
    pub reason: String,
    pub retry_count: u32,
    pub resume_command: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl Escalation {
    pub fn path_for(manifest_dir: &Path, base_name: &str) -> PathBuf {
        manifest_dir.join(format!("{base_name}_escalation.json"))
    }

    pub fn load(manifest_dir: &Path, base_name: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(Self::path_for(manifest_dir, base_name))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Mark the escalation as handled and write it back.
    pub fn resolve(&mut self, manifest_dir: &Path) -> Result<()> {
        self.status = "resolved".to_string();
        self.resolved_at = Some(Utc::now().to_rfc3339());
        let path = Self::path_for(manifest_dir, &self.base_name);
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Structured trace recorder for one pipeline run.
///
/// Entries accumulate in memory and are appended to the trace file on
/// [`Tracer::save`], so a crashed run loses at most the unsaved tail.
///
/// # Examples
///
/// ```no_run
/// use deckforge::workflow::{Phase, PhaseOutcome, Status, Tracer};
///
/// let mut tracer = Tracer::new("20251214_branch_report", "output_manifest")?;
/// tracer.start_phase(Phase::Extract, Some("input/deck.pptx"));
/// tracer.end_phase(
///     Phase::Extract,
///     Status::Success,
///     PhaseOutcome::new().with_metric("slides", 45),
/// );
/// tracer.save()?;
/// # Ok::<(), deckforge::Error>(())
/// ```
#[derive(Debug)]
pub struct Tracer {
    base_name: String,
    trace_id: String,
    manifest_dir: PathBuf,
    entries: Vec<TraceEntry>,
    phase_started: Option<(Phase, Instant)>,
    retry_counts: HashMap<Phase, u32>,
}

impl Tracer {
    pub fn new(base_name: &str, manifest_dir: impl Into<PathBuf>) -> Result<Self> {
        let manifest_dir = manifest_dir.into();
        std::fs::create_dir_all(&manifest_dir)?;
        let trace_id = format!("{base_name}_{:08x}", rand::random::<u32>());
        Ok(Self {
            base_name: base_name.to_string(),
            trace_id,
            manifest_dir,
            entries: Vec::new(),
            phase_started: None,
            retry_counts: HashMap::new(),
        })
    }

    /// Tracer rooted at the conventional manifest directory.
    pub fn for_base(base: &BaseName) -> Result<Self> {
        Self::new(&base.to_string(), "output_manifest")
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn trace_path(&self) -> PathBuf {
        self.manifest_dir
            .join(format!("{}_trace.jsonl", self.base_name))
    }

    /// Record a free-standing entry.
    pub fn log(&mut self, phase: Phase, status: Status, message: impl Into<String>) {
        self.push(phase, status, message.into(), None, None, BTreeMap::new(), None);
    }

    /// Mark a phase as started and arm its duration clock.
    pub fn start_phase(&mut self, phase: Phase, input_file: Option<&str>) {
        self.phase_started = Some((phase, Instant::now()));
        self.push(
            phase,
            Status::Started,
            format!("starting {phase}"),
            input_file.map(str::to_string),
            None,
            BTreeMap::new(),
            None,
        );
    }

    /// Mark a phase as ended, recording its duration in the metrics.
    pub fn end_phase(&mut self, phase: Phase, status: Status, outcome: PhaseOutcome) {
        let mut metrics = outcome.metrics;
        let duration_ms = match self.phase_started.take() {
            Some((started_phase, at)) if started_phase == phase => at.elapsed().as_millis() as u64,
            other => {
                self.phase_started = other;
                0
            },
        };
        metrics.insert("duration_ms".to_string(), duration_ms.into());

        let message = outcome
            .message
            .unwrap_or_else(|| format!("{phase} completed"));
        self.push(
            phase,
            status,
            message,
            None,
            outcome.output_file,
            metrics,
            outcome.error,
        );
    }

    /// Record a retry attempt for a phase.
    pub fn record_retry(&mut self, phase: Phase, reason: &str, retry_num: u32) {
        self.retry_counts.insert(phase, retry_num);
        let mut metrics = BTreeMap::new();
        metrics.insert("retry_number".to_string(), retry_num.into());
        self.push(
            phase,
            Status::Warning,
            format!("retry #{retry_num}: {reason}"),
            None,
            None,
            metrics,
            None,
        );
    }

    /// Whether the phase has exhausted its retries.
    pub fn retry_limit_reached(&self, phase: Phase) -> bool {
        self.retry_counts.get(&phase).copied().unwrap_or(0) >= MAX_RETRIES
    }

    /// Escalate a phase to a human, writing the escalation manifest.
    pub fn escalate(&mut self, phase: Phase, reason: &str) -> Result<Escalation> {
        let retry_count = self.retry_counts.get(&phase).copied().unwrap_or(0);
        let mut metrics = BTreeMap::new();
        metrics.insert("total_retries".to_string(), retry_count.into());
        self.push(
            phase,
            Status::Escalated,
            format!("escalated to human: {reason}"),
            None,
            None,
            metrics,
            Some(reason.to_string()),
        );

        let escalation = Escalation {
            trace_id: self.trace_id.clone(),
            base_name: self.base_name.clone(),
            escalated_at: Utc::now().to_rfc3339(),
            phase,
            reason: reason.to_string(),
            retry_count,
            resume_command: format!("deckforge trace-summary {}", self.base_name),
            status: "pending_human_action".to_string(),
            resolved_at: None,
        };
        let path = Escalation::path_for(&self.manifest_dir, &self.base_name);
        std::fs::write(path, serde_json::to_string_pretty(&escalation)?)?;
        Ok(escalation)
    }

    /// Append buffered entries to the trace file and clear them.
    pub fn save(&mut self) -> Result<usize> {
        if self.entries.is_empty() {
            return Ok(0);
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.trace_path())?;
        for entry in &self.entries {
            serde_json::to_writer(&mut file, entry)?;
            file.write_all(b"\n")?;
        }
        let saved = self.entries.len();
        self.entries.clear();
        Ok(saved)
    }

    /// Summary over the trace file plus unsaved entries.
    pub fn summary(&self) -> Result<TraceSummary> {
        let mut entries = if self.trace_path().exists() {
            read_trace(self.trace_path())?
        } else {
            Vec::new()
        };
        entries.extend(self.entries.iter().cloned());
        Ok(summarize(&entries))
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        phase: Phase,
        status: Status,
        message: String,
        input: Option<String>,
        output: Option<String>,
        metrics: BTreeMap<String, serde_json::Value>,
        error: Option<String>,
    ) {
        let retry_count = self.retry_counts.get(&phase).copied();
        log::info!("[{phase}] {status:?}: {message}");
        self.entries.push(TraceEntry {
            trace_id: self.trace_id.clone(),
            base_name: self.base_name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            phase,
            status,
            message,
            input,
            output,
            metrics,
            error,
            retry_count,
        });
    }
}

/// Read every entry of a JSONL trace file.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>> {
    let file = std::fs::File::open(path)?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Rollup of a run's trace entries.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub base_name: String,
    pub phases_completed: Vec<Phase>,
    pub total_duration_ms: u64,
    pub total_entries: usize,
    pub errors: Vec<String>,
    pub has_escalation: bool,
}

impl TraceSummary {
    /// The phase a resumed run should start from.
    ///
    /// First pipeline phase without a recorded success; `None` once the
    /// run reached DONE.
    pub fn next_phase(&self) -> Option<Phase> {
        if self.phases_completed.contains(&Phase::Done) {
            return None;
        }
        Phase::PIPELINE
            .iter()
            .copied()
            .find(|phase| !self.phases_completed.contains(phase))
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Trace {} ({} entries, {} ms)\n",
            self.trace_id, self.total_entries, self.total_duration_ms
        );
        let completed: Vec<&str> = self.phases_completed.iter().map(Phase::as_str).collect();
        out.push_str(&format!("Completed: {}\n", completed.join(", ")));
        match self.next_phase() {
            Some(phase) => out.push_str(&format!("Next phase: {phase}\n")),
            None => out.push_str("Workflow complete\n"),
        }
        for error in &self.errors {
            out.push_str(&format!("  error: {error}\n"));
        }
        if self.has_escalation {
            out.push_str("Escalation pending\n");
        }
        out
    }
}

/// Summarize a slice of trace entries.
pub fn summarize(entries: &[TraceEntry]) -> TraceSummary {
    let mut completed = BTreeSet::new();
    let mut total_duration_ms = 0u64;
    let mut errors = Vec::new();
    let mut has_escalation = false;

    for entry in entries {
        if entry.status == Status::Success {
            completed.insert(entry.phase);
        }
        if let Some(ms) = entry.metrics.get("duration_ms").and_then(|v| v.as_u64()) {
            total_duration_ms += ms;
        }
        if let Some(error) = &entry.error {
            errors.push(error.clone());
        }
        if entry.status == Status::Escalated {
            has_escalation = true;
        }
    }

    TraceSummary {
        trace_id: entries
            .last()
            .map(|e| e.trace_id.clone())
            .unwrap_or_default(),
        base_name: entries
            .last()
            .map(|e| e.base_name.clone())
            .unwrap_or_default(),
        phases_completed: completed.into_iter().collect(),
        total_duration_ms,
        total_entries: entries.len(),
        errors,
        has_escalation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serde_names() {
        let json = serde_json::to_string(&Phase::PrepareTemplate).unwrap();
        assert_eq!(json, "\"PREPARE_TEMPLATE\"");
        let phase: Phase = serde_json::from_str("\"REVIEW_JSON\"").unwrap();
        assert_eq!(phase, Phase::ReviewJson);
        assert_eq!("build".parse::<Phase>().unwrap(), Phase::Build);
    }

    #[test]
    fn test_trace_id_suffix_is_hex() {
        let dir = tempfile::tempdir().unwrap();
        let tracer = Tracer::new("20251214_demo_report", dir.path()).unwrap();
        let suffix = tracer.trace_id().rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tracer_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = Tracer::new("20251214_demo_report", dir.path()).unwrap();

        tracer.start_phase(Phase::Extract, Some("input/demo.pptx"));
        tracer.end_phase(
            Phase::Extract,
            Status::Success,
            PhaseOutcome::new()
                .with_output("output_manifest/20251214_demo_report_content.json")
                .with_metric("slides_extracted", 45),
        );
        assert_eq!(tracer.save().unwrap(), 2);
        assert_eq!(tracer.save().unwrap(), 0);

        let entries = read_trace(tracer.trace_path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, Status::Started);
        assert_eq!(entries[0].input.as_deref(), Some("input/demo.pptx"));
        assert_eq!(entries[1].metrics["slides_extracted"], 45);
        assert!(entries[1].metrics.contains_key("duration_ms"));
    }

    #[test]
    fn test_retry_counts_reach_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = Tracer::new("20251214_demo_report", dir.path()).unwrap();

        for attempt in 1..=MAX_RETRIES {
            assert!(!tracer.retry_limit_reached(Phase::Translate));
            tracer.record_retry(Phase::Translate, "rate limit exceeded", attempt);
        }
        assert!(tracer.retry_limit_reached(Phase::Translate));
        assert!(!tracer.retry_limit_reached(Phase::Build));
    }

    #[test]
    fn test_escalation_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = Tracer::new("20251214_demo_report", dir.path()).unwrap();
        tracer.record_retry(Phase::Translate, "validation kept failing", 3);
        let escalation = tracer.escalate(Phase::Translate, "validation kept failing").unwrap();
        assert_eq!(escalation.status, "pending_human_action");
        assert_eq!(escalation.retry_count, 3);

        let mut loaded = Escalation::load(dir.path(), "20251214_demo_report").unwrap();
        assert_eq!(loaded.phase, Phase::Translate);
        loaded.resolve(dir.path()).unwrap();
        let resolved = Escalation::load(dir.path(), "20251214_demo_report").unwrap();
        assert_eq!(resolved.status, "resolved");
        assert!(resolved.resolved_at.is_some());
    }

    #[test]
    fn test_summary_and_resume_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = Tracer::new("20251214_demo_report", dir.path()).unwrap();
        for phase in [Phase::Init, Phase::Plan, Phase::PrepareTemplate, Phase::Extract] {
            tracer.start_phase(phase, None);
            tracer.end_phase(phase, Status::Success, PhaseOutcome::new());
        }
        tracer.start_phase(Phase::Summarize, None);
        tracer.end_phase(
            Phase::Summarize,
            Status::Failed,
            PhaseOutcome::new().with_error("agent timed out"),
        );
        tracer.save().unwrap();

        let summary = tracer.summary().unwrap();
        assert_eq!(summary.phases_completed.len(), 4);
        assert_eq!(summary.next_phase(), Some(Phase::Summarize));
        assert_eq!(summary.errors, vec!["agent timed out".to_string()]);
        assert!(!summary.has_escalation);
    }
}
