use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Sender;

use framepoll_core::config::detect_config::DetectConfig;
use framepoll_core::config::watch_config::WatchConfig;
use framepoll_core::detection::domain::export_format::ExportFormat;
use framepoll_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use framepoll_core::detection::infrastructure::video_detection_model::VideoDetectionModel;
use framepoll_core::pipeline::detect_and_export_use_case::DetectAndExportUseCase;
use framepoll_core::pipeline::pipeline_logger::LogPipelineLogger;
use framepoll_core::pipeline::playback_use_case::PlaybackUseCase;
use framepoll_core::reader::infrastructure::channel_cancellation::{channel, ChannelCancellation};
use framepoll_core::shared::crop_window::CropWindow;
use framepoll_core::shared::model_resolver;
use framepoll_core::video::domain::frame_sink::FrameSink;
use framepoll_core::video::domain::video_source::VideoSource;
use framepoll_core::video::infrastructure::ffmpeg_source::FfmpegSource;
use framepoll_core::video::infrastructure::image_file_sink::ImageFileSink;
use framepoll_core::video::infrastructure::image_file_writer::ImageFileWriter;
use framepoll_core::video::infrastructure::log_sink::LogSink;
use framepoll_core::video::infrastructure::scripted_source::ScriptedSource;
use framepoll_core::video::infrastructure::window_sink::WindowSink;

/// Poll video files until their frames are readable, and run object detection on them.
#[derive(Parser)]
#[command(name = "framepoll", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for a video to become readable and play its frames into a sink.
    Watch(WatchArgs),
    /// Detect objects in every frame of a video and optionally export the model.
    Detect(DetectArgs),
}

#[derive(Args)]
struct WatchArgs {
    /// Video file to watch (a label only with --simulate).
    input: PathBuf,

    /// Crop window center column.
    #[arg(long, requires_all = ["crop_y", "crop_width", "crop_height"])]
    crop_x: Option<u32>,

    /// Crop window center row.
    #[arg(long, requires = "crop_x")]
    crop_y: Option<u32>,

    /// Crop window width in pixels.
    #[arg(long, requires = "crop_x")]
    crop_width: Option<u32>,

    /// Crop window height in pixels.
    #[arg(long, requires = "crop_x")]
    crop_height: Option<u32>,

    /// Keep only this color channel (0-2).
    #[arg(long)]
    channel: Option<u8>,

    /// Write shown frames as PNG files here instead of opening a window.
    #[arg(long, conflicts_with = "headless")]
    output_dir: Option<PathBuf>,

    /// Log the shape of each frame instead of opening a window.
    #[arg(long)]
    headless: bool,

    /// Wait between polls of a source that is not ready [default: 1000].
    #[arg(long)]
    retry_interval_ms: Option<u64>,

    /// Give up after this many attempts to open or read a frame [default: 10].
    #[arg(long, conflicts_with = "unbounded")]
    max_retries: Option<u32>,

    /// Poll forever at a fixed interval.
    #[arg(long)]
    unbounded: bool,

    /// Wait of the per-frame cancellation check [default: 10].
    #[arg(long)]
    cancel_poll_ms: Option<u64>,

    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play a scripted in-memory source, e.g. "frames=120,size=64x48,stall=10:3".
    #[arg(long)]
    simulate: Option<String>,
}

#[derive(Args)]
struct DetectArgs {
    /// Video file to analyse.
    input: PathBuf,

    /// Model file path or cached model name [default: yolov8n.onnx].
    #[arg(long)]
    model: Option<String>,

    /// URL to download the model from if it is not found locally.
    #[arg(long)]
    model_url: Option<String>,

    /// Directory for annotated frames and the exported model [default: detections].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0) [default: 0.25].
    #[arg(long)]
    confidence: Option<f64>,

    /// Export the model after detection (onnx, torchscript, openvino, coreml, tflite, engine).
    #[arg(long)]
    export: Option<ExportFormat>,

    /// Give up after this many attempts to open or read a frame [default: 10].
    #[arg(long)]
    max_retries: Option<u32>,

    /// JSON config file; flags override its values.
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
    match Cli::parse().command {
        Command::Watch(args) => run_watch(args),
        Command::Detect(args) => run_detect(args),
    }
}

fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = watch_config(&args)?;
    let settings = config.to_settings()?;

    let source: Box<dyn VideoSource> = match &args.simulate {
        Some(script) => Box::new(script.parse::<ScriptedSource>()?),
        None => Box::new(FfmpegSource::new()),
    };
    let (cancel_tx, cancellation) = install_cancellation()?;
    let sink: Box<dyn FrameSink> = match &config.output_dir {
        Some(dir) => Box::new(ImageFileSink::new(dir, Box::new(ImageFileWriter::new()))),
        None if args.headless => Box::new(LogSink::new()),
        None => Box::new(WindowSink::new(
            format!("framepoll - {}", args.input.display()),
            cancel_tx,
        )),
    };

    let mut use_case = PlaybackUseCase::new(
        sink,
        Box::new(cancellation),
        Box::new(LogPipelineLogger::playback()),
        settings,
    );
    let report = use_case.execute(source, &args.input)?;
    log::info!(
        "Stopped ({}): {} frames shown, {} not-ready waits, last position {}",
        report.stop_reason,
        report.decoded,
        report.not_ready,
        report.last_position
    );
    Ok(())
}

fn run_detect(args: DetectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = detect_config(&args)?;
    config.validate()?;

    log::info!("Resolving model: {}", config.model);
    let model_path = model_resolver::resolve(
        &config.model,
        config.model_url.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    let detector = OnnxYoloDetector::new(&model_path, config.confidence)?;
    let model = VideoDetectionModel::new(
        Box::new(detector),
        model_path,
        Box::new(|| Box::new(FfmpegSource::new()) as Box<dyn VideoSource>),
        config.open_retry.to_policy(),
        config.read_retry.to_policy(),
    );

    let mut use_case = DetectAndExportUseCase::new(
        Box::new(model),
        Box::new(ImageFileWriter::new()),
        Box::new(LogPipelineLogger::detection()),
    );
    let summary = use_case.execute(&args.input, &config.output_dir, config.export)?;
    log::info!(
        "{} annotated frames, {} detections written to {}",
        summary.saved.len(),
        summary.total_boxes,
        config.output_dir.display()
    );
    if let Some(path) = summary.exported {
        println!("{}", path.display());
    }
    Ok(())
}

/// Loads the config file if given, then applies explicit flags on top.
fn watch_config(args: &WatchArgs) -> Result<WatchConfig, Box<dyn std::error::Error>> {
    let mut config = load_or_default(args.config.as_deref(), WatchConfig::load)?;

    if let (Some(x), Some(y), Some(w), Some(h)) =
        (args.crop_x, args.crop_y, args.crop_width, args.crop_height)
    {
        config.crop = Some(CropWindow::new(x, y, w, h));
    }
    if args.channel.is_some() {
        config.channel = args.channel;
    }
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir.clone();
    }
    if let Some(ms) = args.cancel_poll_ms {
        config.cancel_poll_ms = ms;
    }
    for retry in [&mut config.open_retry, &mut config.read_retry] {
        if let Some(ms) = args.retry_interval_ms {
            retry.interval_ms = ms;
            retry.max_interval_ms = retry.max_interval_ms.max(ms);
        }
        if let Some(n) = args.max_retries {
            retry.max_attempts = Some(n);
        }
        if args.unbounded {
            retry.max_attempts = None;
        }
    }
    Ok(config)
}

fn detect_config(args: &DetectArgs) -> Result<DetectConfig, Box<dyn std::error::Error>> {
    let mut config = load_or_default(args.config.as_deref(), DetectConfig::load)?;

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if args.model_url.is_some() {
        config.model_url = args.model_url.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    if args.export.is_some() {
        config.export = args.export;
    }
    if let Some(n) = args.max_retries {
        config.open_retry.max_attempts = Some(n);
        config.read_retry.max_attempts = Some(n);
    }
    Ok(config)
}

fn load_or_default<T, E>(
    path: Option<&Path>,
    load: impl FnOnce(&Path) -> Result<T, E>,
) -> Result<T, E>
where
    T: Default,
{
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            load(path)
        }
        None => Ok(T::default()),
    }
}

/// Cancellation fed by Ctrl-C and by a `q` or Esc line on stdin. The
/// returned sender lets a window sink request cancellation too.
fn install_cancellation() -> Result<(Sender<()>, ChannelCancellation), Box<dyn std::error::Error>> {
    let (tx, cancellation) = channel();

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(());
    })?;

    let stdin_tx = tx.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") || line.contains('\u{1b}') {
                let _ = stdin_tx.send(());
                break;
            }
        }
    });

    log::info!("Press Ctrl-C, or enter 'q', to stop");
    Ok((tx, cancellation))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
