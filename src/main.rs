use clap::{Parser, ValueEnum};
use pinch_brightness::brightness::{
    sysfs::BACKLIGHT_CLASS_DIR, BrightnessControl, BrightnessService, MemoryBrightness,
    SysfsBacklight,
};
use pinch_brightness::common::{Clock, MonotonicClock};
use pinch_brightness::config::Configuration;
use pinch_brightness::coordinator::CoordinatorBuilder;
use pinch_brightness::error::{AppError, ConfigError};
use pinch_brightness::intake::{FrameReader, JsonLinesReader, SnapshotFileReader};
use pinch_brightness::landmark::DebugSnapshotWriter;
use pinch_brightness::pipeline::ProcessingPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON detections
    Json,
    /// A fingertip snapshot file rewritten by another process
    Snapshot,
}

/// Toggle display brightness with a thumb/index pinch.
#[derive(Debug, Parser)]
#[command(name = "pinch-brightness", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detector input, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    #[arg(short, long, value_enum, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// Backlight device directory, e.g. /sys/class/backlight/intel_backlight
    #[arg(long)]
    backlight: Option<PathBuf>,

    /// Log brightness changes instead of applying them
    #[arg(long)]
    dry_run: bool,

    /// Rewrite this file with the fingertip block on every frame
    #[arg(long)]
    debug_snapshot: Option<PathBuf>,

    /// Thumb/index distance in pixels below which the pinch engages
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum hold in milliseconds for a pinch to count
    #[arg(long)]
    min_hold_ms: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, configuration: &mut Configuration) {
        if let Some(dir) = &self.backlight {
            configuration.brightness.backlight_dir = Some(dir.clone());
        }
        if self.dry_run {
            configuration.brightness.dry_run = true;
        }
        if let Some(path) = &self.debug_snapshot {
            configuration.debug_snapshot_path = Some(path.clone());
        }
        if let Some(threshold) = self.threshold {
            configuration.gesture.engage_threshold_px = threshold;
        }
        if let Some(min_hold_ms) = self.min_hold_ms {
            configuration.gesture.min_hold_ms = min_hold_ms;
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn build_reader(
    cli: &Cli,
    configuration: &Configuration,
) -> Result<Box<dyn FrameReader>, AppError> {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    match cli.format {
        InputFormat::Json if cli.input == "-" => Ok(Box::new(
            JsonLinesReader::new(BufReader::new(tokio::io::stdin()), clock)
                .with_min_confidence(configuration.detector.min_confidence),
        )),
        InputFormat::Json => {
            let file = tokio::fs::File::open(&cli.input).await?;
            Ok(Box::new(
                JsonLinesReader::new(BufReader::new(file), clock)
                    .with_min_confidence(configuration.detector.min_confidence),
            ))
        }
        InputFormat::Snapshot if cli.input == "-" => Err(ConfigError::InvalidValue {
            field: "input".to_string(),
            message: "snapshot input needs a file path".to_string(),
        }
        .into()),
        InputFormat::Snapshot => Ok(Box::new(
            SnapshotFileReader::new(&cli.input, clock)
                .with_poll_interval(configuration.source.poll_interval()),
        )),
    }
}

fn build_control(configuration: &Configuration) -> Result<Box<dyn BrightnessControl>, AppError> {
    let settings = &configuration.brightness;
    let control: Box<dyn BrightnessControl> = if settings.dry_run {
        Box::new(MemoryBrightness::default())
    } else if let Some(dir) = &settings.backlight_dir {
        Box::new(SysfsBacklight::open(dir)?)
    } else {
        Box::new(SysfsBacklight::discover(BACKLIGHT_CLASS_DIR)?)
    };
    info!("Using brightness control {}", control.name());
    Ok(control)
}

async fn build_pipeline(configuration: &Configuration) -> Result<ProcessingPipeline, AppError> {
    let dispatcher = BrightnessService::new(build_control(configuration)?)
        .into_dispatcher(configuration.brightness.dispatch_timeout());
    let mut builder = ProcessingPipeline::builder()
        .pinch_config(configuration.gesture.pinch_config())
        .cursor_mapper(configuration.cursor)
        .dispatcher(dispatcher);
    if let Some(path) = &configuration.debug_snapshot_path {
        builder = builder.debug_writer(DebugSnapshotWriter::create(path).await?);
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut configuration = Configuration::load(cli.config.as_deref())?;
    cli.apply(&mut configuration);
    configuration.validate()?;
    tracing::debug!("Configuration: {:?}", configuration);

    let reader = build_reader(&cli, &configuration).await?;
    let pipeline = build_pipeline(&configuration).await?;
    let coordinator = CoordinatorBuilder::new(configuration)
        .reader(reader)
        .pipeline(pipeline)
        .build()?;

    let cancel_token = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            cancel_token.cancel();
        }
    });

    let stats = coordinator.wait().await?;
    info!("Done: {}", stats);
    // Machine-readable summary on stdout; logs go to stderr.
    match serde_json::to_string(&stats) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize run summary: {}", e),
    }
    Ok(())
}
