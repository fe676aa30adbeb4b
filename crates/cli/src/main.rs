mod settings;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::Receiver;

use facemetrics_core::detection::infrastructure::replay_engine::ReplayEngine;
use facemetrics_core::metrics::domain::metric_extractor::MetricExtractor;
use facemetrics_core::metrics::domain::metrics_sink::MetricsSink;
use facemetrics_core::metrics::infrastructure::json_lines_metrics_sink::JsonLinesMetricsSink;
use facemetrics_core::metrics::infrastructure::log_metrics_sink::LogMetricsSink;
use facemetrics_core::pipeline::analyze_video_use_case::AnalyzeVideoUseCase;
use facemetrics_core::pipeline::detection_listener::{ChannelListener, DetectionEvent};
use facemetrics_core::pipeline::detection_worker::{Admission, DetectionWorker, WorkerConfig};
use facemetrics_core::pipeline::metrics_presenter::MetricsPresenter;
use facemetrics_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facemetrics_core::rendering::infrastructure::png_overlay_sink::PngOverlaySink;
use facemetrics_core::shared::constants::{REPLAY_TOLERANCE, VIDEO_EXTENSIONS};
use facemetrics_core::shared::frame_clock::FrameClock;
use facemetrics_core::triggers::domain::event_notifier::EventNotifier;
use facemetrics_core::triggers::domain::event_trigger::{EventTrigger, TriggerConfig};
use facemetrics_core::triggers::infrastructure::log_notifier::LogNotifier;
use facemetrics_core::triggers::infrastructure::webhook_notifier::WebhookNotifier;
use facemetrics_core::video::domain::frame_source::FrameSource;
use facemetrics_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;

use settings::Settings;

const LOG_THROTTLE_FRAMES: usize = 100;

/// Facial metrics and event triggers for recorded videos.
#[derive(Parser)]
#[command(name = "facemetrics")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Recorded detection results (JSON) to replay against the video.
    #[arg(long)]
    recording: PathBuf,

    /// Processing mode: strict (every frame, in order) or live (paced like a camera).
    #[arg(long, default_value = "strict")]
    mode: String,

    /// Write one JSON object per frame to this file instead of logging metrics.
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Save every frame with its landmarks drawn to this directory.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// Metric that drives the event trigger (e.g. smile, joy, brow_furrow).
    #[arg(long)]
    trigger_metric: Option<String>,

    /// Score the trigger metric must exceed.
    #[arg(long)]
    threshold: Option<f32>,

    /// Consecutive active frames to exceed before the trigger fires.
    #[arg(long)]
    sustain: Option<usize>,

    /// Webhook to POST to when the trigger fires.
    #[arg(long)]
    webhook_url: Option<String>,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    apply_overrides(&cli, &mut settings);
    validate(&cli, &settings)?;

    let presenter = build_presenter(&cli, &settings)?;

    if cli.mode == "live" {
        run_live(&cli.input, &cli.recording, &settings, presenter)
    } else {
        run_strict(&cli.input, &cli.recording, &settings, presenter)
    }
}

fn run_strict(
    input: &Path,
    recording: &Path,
    settings: &Settings,
    mut presenter: MetricsPresenter,
) -> Result<(), Box<dyn std::error::Error>> {
    let (listener, events) = ChannelListener::new();
    let config = WorkerConfig {
        epsilon: settings.epsilon,
        queue_capacity: Some(settings.queue_capacity),
        ..WorkerConfig::strict()
    };
    let worker = DetectionWorker::new(
        Box::new(ReplayEngine::from_file(recording)),
        Box::new(listener),
        config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::new(LOG_THROTTLE_FRAMES)));

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rAnalyzing frame {current}/{total}");
        true
    });

    let mut use_case = AnalyzeVideoUseCase::new(
        Box::new(FfmpegFrameSource::new()),
        Arc::new(worker),
        Some(progress),
        None,
    );

    // The use case owns the only handle to the worker, so the event channel
    // closes once the analysis thread returns.
    let input = input.to_path_buf();
    let analysis = thread::spawn(move || use_case.execute(&input).map_err(|e| e.to_string()));

    drain(&events, &mut presenter);
    eprintln!();

    let summary = analysis
        .join()
        .map_err(|_| "Analysis thread panicked")??;
    log::info!(
        "Analyzed {} frames ({} accepted, {} dropped), presented {}",
        summary.frames_read,
        summary.frames_accepted,
        summary.frames_dropped,
        presenter.presented()
    );
    Ok(())
}

fn run_live(
    input: &Path,
    recording: &Path,
    settings: &Settings,
    mut presenter: MetricsPresenter,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = FfmpegFrameSource::new();
    let info = source.open(input)?;

    // Live timestamps come from the wall clock, so match recordings within
    // half a frame interval.
    let tolerance = if info.fps > 0.0 {
        0.5 / info.fps
    } else {
        REPLAY_TOLERANCE
    };
    let (listener, events) = ChannelListener::new();
    let config = WorkerConfig {
        epsilon: settings.epsilon,
        ..WorkerConfig::live()
    };
    let worker = DetectionWorker::new(
        Box::new(ReplayEngine::from_file(recording).with_tolerance(tolerance)),
        Box::new(listener),
        config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::new(LOG_THROTTLE_FRAMES)));
    worker.start()?;

    log::info!(
        "Playing {} live ({}x{}, {:.2} fps)",
        input.display(),
        info.width,
        info.height,
        info.fps
    );

    let camera = thread::spawn(move || -> Result<usize, String> {
        let result = play(&mut source, &worker);
        source.close();
        let stopped = worker.stop().map_err(|e| e.to_string());
        let accepted = result?;
        stopped?;
        Ok(accepted)
    });

    drain(&events, &mut presenter);

    let accepted = camera.join().map_err(|_| "Camera thread panicked")??;
    log::info!(
        "Submitted {accepted} frames live, presented {}",
        presenter.presented()
    );
    Ok(())
}

/// Submits frames at the pace of their media timestamps, re-stamped with
/// capture time. Returns how many the worker accepted.
fn play(source: &mut dyn FrameSource, worker: &DetectionWorker) -> Result<usize, String> {
    let mut clock = FrameClock::new();
    let started = Instant::now();
    let mut accepted = 0;

    for frame in source.frames() {
        let frame = frame.map_err(|e| e.to_string())?;
        let due = Duration::from_secs_f64(frame.timestamp().max(0.0));
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            thread::sleep(wait);
        }
        let frame = frame.with_timestamp(clock.stamp());
        match worker.process(frame) {
            Ok(Admission::Accepted) => accepted += 1,
            Ok(Admission::Dropped | Admission::Ignored) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(accepted)
}

/// Applies results on the calling thread until the worker goes away.
fn drain(events: &Receiver<DetectionEvent>, presenter: &mut MetricsPresenter) {
    for event in events.iter() {
        presenter.present(&event);
    }
}

fn build_presenter(
    cli: &Cli,
    settings: &Settings,
) -> Result<MetricsPresenter, Box<dyn std::error::Error>> {
    let extractor = MetricExtractor::new()?;
    let metrics: Box<dyn MetricsSink> = match &cli.metrics_out {
        Some(path) => Box::new(JsonLinesMetricsSink::new(
            BufWriter::new(File::create(path)?),
            extractor.catalog(),
        )),
        None => Box::new(LogMetricsSink::new()),
    };

    let metric = settings.trigger_tag()?;
    let notifier: Box<dyn EventNotifier> = match (&settings.webhook_url, &settings.webhook_key) {
        (Some(url), _) => Box::new(WebhookNotifier::new(url.clone())),
        (None, Some(key)) => Box::new(WebhookNotifier::ifttt(&settings.webhook_event, key)),
        (None, None) => Box::new(LogNotifier::new(metric)),
    };
    let trigger = EventTrigger::new(
        TriggerConfig {
            metric,
            threshold: settings.threshold,
            sustain_count: settings.sustain_count,
        },
        notifier,
    );

    let mut presenter = MetricsPresenter::new(extractor, metrics).with_trigger(trigger);
    if let Some(dir) = &cli.overlay_dir {
        presenter = presenter.with_drawing(Box::new(PngOverlaySink::new(dir)?));
    }
    Ok(presenter)
}

fn apply_overrides(cli: &Cli, settings: &mut Settings) {
    if let Some(metric) = &cli.trigger_metric {
        settings.trigger_metric = metric.clone();
    }
    if let Some(threshold) = cli.threshold {
        settings.threshold = threshold;
    }
    if let Some(sustain) = cli.sustain {
        settings.sustain_count = sustain;
    }
    if let Some(url) = &cli.webhook_url {
        settings.webhook_url = Some(url.clone());
    }
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_video(&cli.input) {
        return Err(format!(
            "Unsupported input {}, expected one of: {}",
            cli.input.display(),
            VIDEO_EXTENSIONS.join(", ")
        )
        .into());
    }
    if !cli.recording.exists() {
        return Err(format!("Recording not found: {}", cli.recording.display()).into());
    }
    if cli.mode != "strict" && cli.mode != "live" {
        return Err(format!("Mode must be 'strict' or 'live', got '{}'", cli.mode).into());
    }
    settings.validate()?;
    Ok(())
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("facemetrics").chain(args.iter().copied()))
    }

    #[rstest]
    #[case("clip.mp4", true)]
    #[case("clip.MOV", true)]
    #[case("photo.jpg", false)]
    #[case("no_extension", false)]
    fn test_is_video(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_video(Path::new(name)), expected);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&[
            "clip.mp4",
            "--recording",
            "rec.json",
            "--trigger-metric",
            "joy",
            "--threshold",
            "50",
            "--sustain",
            "2",
            "--webhook-url",
            "http://localhost/hook",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&cli, &mut settings);

        assert_eq!(settings.trigger_metric, "joy");
        assert_eq!(settings.threshold, 50.0);
        assert_eq!(settings.sustain_count, 2);
        assert_eq!(settings.webhook_url.as_deref(), Some("http://localhost/hook"));
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let cli = parse(&["clip.mp4", "--recording", "rec.json"]);
        let mut settings = Settings {
            threshold: 42.0,
            ..Settings::default()
        };
        apply_overrides(&cli, &mut settings);
        assert_eq!(settings.threshold, 42.0);
        assert_eq!(cli.mode, "strict");
    }

    #[test]
    fn test_validate_rejects_unknown_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let video = dir.path().join("clip.mp4");
        let recording = dir.path().join("rec.json");
        std::fs::write(&video, b"").unwrap();
        std::fs::write(&recording, b"[]").unwrap();

        let cli = parse(&[
            video.to_str().unwrap(),
            "--recording",
            recording.to_str().unwrap(),
            "--mode",
            "turbo",
        ]);
        let err = validate(&cli, &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("Mode must be"));
    }

    #[test]
    fn test_validate_rejects_categorical_trigger() {
        let dir = tempfile::TempDir::new().unwrap();
        let video = dir.path().join("clip.mp4");
        let recording = dir.path().join("rec.json");
        std::fs::write(&video, b"").unwrap();
        std::fs::write(&recording, b"[]").unwrap();

        let cli = parse(&[
            video.to_str().unwrap(),
            "--recording",
            recording.to_str().unwrap(),
            "--trigger-metric",
            "glasses",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&cli, &mut settings);
        assert!(validate(&cli, &settings).is_err());
    }
}
