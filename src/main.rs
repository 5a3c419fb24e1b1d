use clap::{Args, Parser, Subcommand};
use fen_capture::camera::{CameraManager, FileCamera};
use fen_capture::config::{self, CaptureConfig};
use fen_capture::crop::{CropAction, RustCropEngine};
use fen_capture::driver::{self, CaptureHandle, LoopClosed};
use fen_capture::error::{ErrorInfo, ErrorKind};
use fen_capture::machine::{CaptureMachine, CaptureSnapshot, Effect, Event, Intent, Phase};
use fen_capture::output;
use fen_capture::submit::HttpPredictionClient;
use fen_capture::types::NormalizedImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crop adjustments applied after capture, in this order: rotate, zoom,
/// shift, flip.
#[derive(Args, Clone, Debug, Default)]
struct Adjustments {
    /// Rotate by quarter turns (positive = clockwise)
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<i32>,

    /// Zoom ratio (positive zooms in, negative zooms out)
    #[arg(long, allow_hyphen_values = true)]
    zoom: Option<f64>,

    /// Drag by DX,DY pixels
    #[arg(long, value_name = "DX,DY", value_parser = parse_shift, allow_hyphen_values = true)]
    shift: Option<(f64, f64)>,

    /// Mirror horizontally
    #[arg(long)]
    flip_h: bool,

    /// Mirror vertically
    #[arg(long)]
    flip_v: bool,
}

impl Adjustments {
    fn actions(&self) -> Vec<CropAction> {
        let mut actions = Vec::new();
        if let Some(turns) = self.rotate {
            actions.push(CropAction::Rotate(turns));
        }
        if let Some(ratio) = self.zoom {
            actions.push(CropAction::Zoom(ratio));
        }
        if let Some((dx, dy)) = self.shift {
            actions.push(CropAction::Move { dx, dy });
        }
        if self.flip_h || self.flip_v {
            actions.push(CropAction::Flip {
                horizontal: self.flip_h,
                vertical: self.flip_v,
            });
        }
        actions
    }
}

fn parse_shift(s: &str) -> Result<(f64, f64), String> {
    let (dx, dy) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got {s:?}"))?;
    let dx = dx.trim().parse::<f64>().map_err(|e| format!("DX: {e}"))?;
    let dy = dy.trim().parse::<f64>().map_err(|e| format!("DY: {e}"))?;
    Ok((dx, dy))
}

#[derive(Parser)]
#[command(name = "fen-capture")]
#[command(about = "Photograph a chessboard and read back its position as FEN")]
#[command(long_about = "\
Photograph a chessboard and read back its position as FEN

A photo file stands in for the camera. It goes through the same lifecycle as
a live capture:

  camera → capture → crop (square, 512×512 JPEG) → submit → FEN

Crop adjustments are applied after capture, in order:
  --rotate, --zoom, --shift, --flip-h / --flip-v

Configuration is read from fen-capture.toml in the working directory, or from
--config. Run 'fen-capture gen-config' to generate a documented file.

Log verbosity follows RUST_LOG (default: fen_capture=info).")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for fen_capture
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize the position in a board photo
    Predict {
        /// Photo of the board
        photo: PathBuf,

        /// Override the prediction endpoint
        #[arg(long)]
        endpoint: Option<String>,

        #[command(flatten)]
        adjust: Adjustments,
    },
    /// Crop a board photo to the upload image without submitting it
    Crop {
        /// Photo of the board
        photo: PathBuf,

        /// Where to write the JPEG
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        adjust: Adjustments,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Load and validate the config, then print the resolved values
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig => {
            let config = load_config(cli.config.as_deref())?;
            output::print_config(&config);
            println!("==> Config is valid");
        }
        Command::Crop {
            photo,
            output: path,
            adjust,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut machine = build_machine(&config, &photo);
            let result = crop_offline(&mut machine, &adjust.actions()).await;
            let image = match result {
                Ok(image) => {
                    machine.teardown();
                    image
                }
                Err(info) => {
                    output::print_failure(&info, &machine.snapshot());
                    machine.teardown();
                    std::process::exit(1);
                }
            };
            std::fs::write(&path, image.bytes())?;
            output::print_crop_output(&image, &path);
        }
        Command::Predict {
            photo,
            endpoint,
            adjust,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let endpoint = match endpoint {
                Some(raw) => config::parse_endpoint(&raw)?,
                None => config.service.endpoint_url()?,
            };
            info!(%endpoint, photo = %photo.display(), "predicting");

            let machine = build_machine(&config, &photo);
            let client = HttpPredictionClient::new(endpoint);
            let mut handle = driver::spawn(machine, Arc::new(client));

            let last = predict(&mut handle, &adjust.actions()).await?;
            while let Some(note) = handle.try_notification() {
                output::print_notification(&note);
            }
            output::print_state(&last);
            handle.shutdown().await;

            if last.phase() != Phase::Completed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fen_capture=debug"
    } else {
        "fen_capture=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load the config at `path`, or `fen-capture.toml` when none is given.
/// An explicitly named file must exist.
fn load_config(path: Option<&Path>) -> Result<CaptureConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) if !path.exists() => {
            return Err(format!("config file {} not found", path.display()).into());
        }
        Some(path) => config::load_config(path)?,
        None => config::load_config(Path::new(config::DEFAULT_CONFIG_FILE))?,
    };
    Ok(config)
}

fn build_machine(config: &CaptureConfig, photo: &Path) -> CaptureMachine {
    let camera = CameraManager::new(Arc::new(FileCamera::new(photo)), config.camera.facing);
    CaptureMachine::new(camera, Arc::new(RustCropEngine::new()))
        .with_crop_options(config.crop.clone())
        .with_output(config.output_spec())
}

/// Walk the loop from `Idle` to a terminal state.
async fn predict(
    handle: &mut CaptureHandle,
    actions: &[CropAction],
) -> Result<CaptureSnapshot, LoopClosed> {
    handle.send(Intent::RequestCapture)?;
    let snap = advance(handle, |s| s.resources.camera).await?;
    if snap.phase() == Phase::Failed {
        return Ok(snap);
    }

    handle.send(Intent::CaptureFrame)?;
    let snap = advance(handle, |s| s.phase() == Phase::ImageCaptured).await?;
    if snap.phase() == Phase::Failed {
        return Ok(snap);
    }

    for action in actions {
        handle.send(Intent::Adjust(*action))?;
    }
    handle.send(Intent::Submit)?;
    advance(handle, |s| s.phase() == Phase::Completed).await
}

async fn advance(
    handle: &mut CaptureHandle,
    mut reached: impl FnMut(&CaptureSnapshot) -> bool,
) -> Result<CaptureSnapshot, LoopClosed> {
    handle
        .wait_for(|s| s.phase() == Phase::Failed || reached(s))
        .await
}

/// Drive the machine by hand up to the point where it would submit, and
/// take the image it would have sent.
async fn crop_offline(
    machine: &mut CaptureMachine,
    actions: &[CropAction],
) -> Result<NormalizedImage, ErrorInfo> {
    for effect in machine.handle(Intent::RequestCapture.into()) {
        if let Effect::AcquireCamera { epoch } = effect {
            let result = machine.camera().acquire().await;
            check(machine.handle(Event::CameraAcquired { epoch, result }))?;
        }
    }
    check(machine.handle(Intent::CaptureFrame.into()))?;
    for action in actions {
        machine.handle(Intent::Adjust(*action).into());
    }

    for effect in machine.handle(Intent::Submit.into()) {
        match effect {
            Effect::Submit { image, .. } => return Ok(image),
            Effect::Notify(info) => return Err(info),
            Effect::AcquireCamera { .. } => {}
        }
    }
    Err(ErrorInfo::new(
        ErrorKind::ImageEncodingFailed,
        format!("nothing to crop in state {}", machine.phase()),
    ))
}

fn check(effects: Vec<Effect>) -> Result<(), ErrorInfo> {
    match effects.into_iter().find_map(|e| match e {
        Effect::Notify(info) => Some(info),
        _ => None,
    }) {
        Some(info) => Err(info),
        None => Ok(()),
    }
}
