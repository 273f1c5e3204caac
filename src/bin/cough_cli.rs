use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use cough_analyzer::analysis::classifier::ClassificationResult;
use cough_analyzer::analysis::cough_gate::CoughDecision;
use cough_analyzer::analysis::features::AcousticDescriptor;
use cough_analyzer::analysis::CoughAnalyzer;
use cough_analyzer::audio::AudioBuffer;
use cough_analyzer::config::AppConfig;
use cough_analyzer::corpus::ReferenceCorpus;
use cough_analyzer::debug::pipeline_tracer;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "cough_cli",
    about = "Developer harness for the cough analysis pipeline"
)]
struct Cli {
    /// Analyzer configuration JSON (defaults to assets/analyzer_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference corpus JSON (defaults to the built-in corpus)
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Log pipeline progress to stderr
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one WAV recording and print the result as JSON
    Classify {
        input: PathBuf,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the cough gate and always classify against the corpus
        #[arg(long, default_value_t = false)]
        no_gate: bool,
    },
    /// Classify several WAV recordings, one JSON report per input
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Worker threads (1 = sequential)
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
    /// Print the extracted feature descriptor of a WAV recording
    Features {
        input: PathBuf,
        /// Include the full feature vector
        #[arg(long, default_value_t = false)]
        full: bool,
    },
    /// List the reference corpus
    Corpus {
        /// Print the samples as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    pipeline_tracer::init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    let corpus = Arc::new(load_corpus(cli.corpus.as_deref())?);

    match cli.command {
        Commands::Classify {
            input,
            output,
            no_gate,
        } => {
            if no_gate {
                config.cough_gate.enabled = false;
            }
            run_classify(config, corpus, &input, output)
        }
        Commands::Batch { inputs, workers } => run_batch(config, corpus, &inputs, workers),
        Commands::Features { input, full } => run_features(config, corpus, &input, full),
        Commands::Corpus { json } => run_corpus(&corpus, json),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn load_corpus(path: Option<&Path>) -> Result<ReferenceCorpus> {
    match path {
        Some(path) => ReferenceCorpus::load_from_file(path)
            .with_context(|| format!("loading corpus {}", path.display())),
        None => ReferenceCorpus::load().context("loading built-in corpus"),
    }
}

fn build_analyzer(config: AppConfig, corpus: Arc<ReferenceCorpus>) -> Result<CoughAnalyzer> {
    CoughAnalyzer::new(config, corpus).context("creating analyzer")
}

fn run_classify(
    config: AppConfig,
    corpus: Arc<ReferenceCorpus>,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let analyzer = build_analyzer(config, corpus)?;
    let buffer = read_wav(input)?;
    let result = analyzer
        .analyze(&buffer)
        .with_context(|| format!("analyzing {}", input.display()))?;

    let report = ClassifyReport::new(input, &buffer, Ok(&result));
    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output {
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_batch(
    config: AppConfig,
    corpus: Arc<ReferenceCorpus>,
    inputs: &[PathBuf],
    workers: usize,
) -> Result<ExitCode> {
    let analyzer = build_analyzer(config, corpus)?;
    let buffers = inputs
        .iter()
        .map(|path| read_wav(path))
        .collect::<Result<Vec<_>>>()?;

    let results = analyzer.analyze_batch_parallel(&buffers, workers, None);
    let mut failed = false;
    for ((path, buffer), result) in inputs.iter().zip(&buffers).zip(&results) {
        let outcome = result.as_ref().map_err(ToString::to_string);
        failed |= outcome.is_err();
        let report = ClassifyReport::new(path, buffer, outcome);
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_features(
    config: AppConfig,
    corpus: Arc<ReferenceCorpus>,
    input: &Path,
    full: bool,
) -> Result<ExitCode> {
    let analyzer = build_analyzer(config, corpus)?;
    let buffer = read_wav(input)?;
    let features = analyzer
        .extract_features(&buffer)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    let report = FeaturesReport {
        file: input.display().to_string(),
        length: features.len(),
        mel_bands: features.mel_bands(),
        active_frames: features.active_frames(),
        descriptor: features.descriptor(),
        cough_detection: analyzer.detect_cough(&features),
        values: full.then(|| features.values()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_corpus(corpus: &ReferenceCorpus, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(corpus.all())?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<24} {:<14} {:>12}", "id", "label", "fingerprints");
    for sample in corpus.all() {
        println!(
            "{:<24} {:<14} {:>12}",
            sample.id,
            sample.label,
            sample.fingerprints.len()
        );
    }
    println!("{} samples, labels: {}", corpus.len(), corpus.labels().join(", "));
    Ok(ExitCode::SUCCESS)
}

/// Read a WAV file into an interleaved float buffer
fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                8 | 16 | 24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / max)
                            .map_err(|err| anyhow!(err))
                    })
                    .collect::<Result<Vec<f32>>>()?,
                other => {
                    return Err(anyhow!(
                        "Unsupported bits per sample {} in {}",
                        other,
                        path.display()
                    ))
                }
            }
        }
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyReport<'a> {
    file: String,
    sample_rate: u32,
    channels: u16,
    duration_secs: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> ClassifyReport<'a> {
    fn new(
        path: &Path,
        buffer: &AudioBuffer,
        outcome: std::result::Result<&'a ClassificationResult, String>,
    ) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            file: path.display().to_string(),
            sample_rate: buffer.sample_rate(),
            channels: buffer.channels(),
            duration_secs: buffer.duration_secs(),
            result,
            error,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeaturesReport<'a> {
    file: String,
    length: usize,
    mel_bands: usize,
    active_frames: usize,
    descriptor: &'a AcousticDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    cough_detection: Option<CoughDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [f32]>,
}
