// Pipeline Tracer - stage-by-stage diagnostics for the cough analysis pipeline
//
// When switched on, every stage (preprocess, STFT, mel projection, reduction,
// cough gate, similarity, classification) writes one `[TRACE]` log line with
// a sequence number, the microseconds since the first trace and its metrics.
// A recording that classifies unexpectedly can be followed end to end.
//
// Switch on with COUGH_TRACE=1 (or `true`), or call `set_enabled(true)`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Environment variable read by [`init`]
pub const TRACE_ENV_VAR: &str = "COUGH_TRACE";

static ENABLED: AtomicBool = AtomicBool::new(false);
static SEQUENCE: AtomicU64 = AtomicU64::new(0);
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Read COUGH_TRACE and switch tracing accordingly
pub fn init() {
    let enabled = std::env::var(TRACE_ENV_VAR)
        .map(|value| is_truthy(&value))
        .unwrap_or(false);
    set_enabled(enabled);
    if enabled {
        log::info!("[TRACE] pipeline tracing on ({}=0 turns it off)", TRACE_ENV_VAR);
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1") || value.trim().eq_ignore_ascii_case("true")
}

#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::SeqCst);
}

/// Analysis stage a trace line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Downmix and resample finished
    Preprocess,
    /// Short-time spectrum computed
    Stft,
    /// Log-mel spectrogram projected
    Mel,
    /// Statistics vector and side features ready
    Reduce,
    /// Cough gate decision
    Gate,
    /// Query scored against the corpus
    Similarity,
    /// Final classification
    Classify,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Preprocess => "PREPROCESS",
            PipelineStage::Stft => "STFT",
            PipelineStage::Mel => "MEL",
            PipelineStage::Reduce => "REDUCE",
            PipelineStage::Gate => "GATE",
            PipelineStage::Similarity => "SIMILARITY",
            PipelineStage::Classify => "CLASSIFY",
        }
    }
}

fn elapsed_us() -> u64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// Write one trace line for `stage` (no-op while tracing is off)
///
/// # Arguments
/// * `stage` - Stage that produced the metrics
/// * `message` - Metrics as `key=value` pairs
#[inline]
pub fn trace(stage: PipelineStage, message: &str) {
    if !is_enabled() {
        return;
    }
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    log::info!(
        "[TRACE] {:>10} #{:06} @{:>10}us | {}",
        stage.label(),
        sequence,
        elapsed_us(),
        message
    );
}

/// `trace` with `format!` arguments, formatted only while tracing is on
#[macro_export]
macro_rules! trace_pipeline {
    ($stage:expr, $($arg:tt)*) => {
        if $crate::debug::pipeline_tracer::is_enabled() {
            $crate::debug::pipeline_tracer::trace($stage, &format!($($arg)*));
        }
    };
}

pub fn trace_preprocess(input_frames: usize, channels: u16, input_rate: u32, output_len: usize) {
    trace_pipeline!(
        PipelineStage::Preprocess,
        "frames={} channels={} rate={}Hz -> mono samples={}",
        input_frames,
        channels,
        input_rate,
        output_len
    );
}

pub fn trace_gate(score: f32, threshold: f32, is_cough: bool) {
    trace_pipeline!(
        PipelineStage::Gate,
        "score={:.3} threshold={:.3} {}",
        score,
        threshold,
        if is_cough { "COUGH" } else { "REJECTED" }
    );
}

pub fn trace_classification(dominant: &str, probability: f32, candidates: usize) {
    trace_pipeline!(
        PipelineStage::Classify,
        "dominant={} probability={:.1}% candidates={}",
        dominant,
        probability,
        candidates
    );
}
