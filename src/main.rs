//! Custom Camera CLI
//!
//! Command-line driver for the camera screens. Runs the entry screen's
//! system camera flow or a scripted session on the custom camera screen,
//! using mock hardware or (with the `camera` feature) a real webcam.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use custom_camera::{
    capture::{CaptureBackend, FlashMode, MockBackend},
    config::FileConfig,
    orientation::DeviceOrientation,
    photo::CapturedImage,
    screen::{CameraScreen, EntryScreen, ImagePicker, ImageViewer, PickerResult, ScriptedPicker},
};
use image::DynamicImage;
use tracing::{info, warn};

const STEP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "custom-camera", version, about = "Photo capture with a custom camera screen")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take a photo through the system camera picker.
    Native,
    /// Run a scripted session on the custom camera screen.
    Custom(CustomArgs),
}

#[derive(Args)]
struct CustomArgs {
    /// Flash mode to select before shooting.
    #[arg(long, value_enum, default_value_t = FlashArg::Auto)]
    flash: FlashArg,

    /// Device orientation while shooting.
    #[arg(long, value_enum, default_value_t = OrientationArg::Portrait)]
    orientation: OrientationArg,

    /// Switch to the other camera before shooting.
    #[arg(long)]
    switch: bool,

    /// Number of photos to take.
    #[arg(long, default_value_t = 1)]
    shots: u32,

    /// Camera hardware to use.
    #[arg(long, value_enum, default_value_t = BackendArg::Mock)]
    backend: BackendArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlashArg {
    Auto,
    On,
    Off,
}

impl From<FlashArg> for FlashMode {
    fn from(arg: FlashArg) -> Self {
        match arg {
            FlashArg::Auto => FlashMode::Auto,
            FlashArg::On => FlashMode::On,
            FlashArg::Off => FlashMode::Off,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    UpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl From<OrientationArg> for DeviceOrientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => DeviceOrientation::Portrait,
            OrientationArg::UpsideDown => DeviceOrientation::PortraitUpsideDown,
            OrientationArg::LandscapeLeft => DeviceOrientation::LandscapeLeft,
            OrientationArg::LandscapeRight => DeviceOrientation::LandscapeRight,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Simulated phone with back and front cameras.
    Mock,
    /// Webcams found on this machine (requires the `camera` feature).
    Native,
}

/// Viewer printing what it would display.
#[derive(Default)]
struct ConsoleViewer {
    shown: usize,
}

impl ImageViewer for ConsoleViewer {
    fn show(&mut self, image: CapturedImage) {
        self.shown += 1;
        let (width, height) = image.display_dimensions();
        println!(
            "Photo {}x{} ({:?}, EXIF orientation {}) from {:?} at {}",
            width,
            height,
            image.orientation(),
            image.orientation().exif(),
            image.source(),
            image.captured_at().to_rfc3339()
        );
    }

    fn dismiss(&mut self) {
        info!("Viewer dismissed");
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Custom Camera v{}", custom_camera::VERSION);

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let code = match cli.command {
        Command::Native => run_native(),
        Command::Custom(args) => run_custom(config, &args),
    };
    std::process::exit(code);
}

fn run_native() -> i32 {
    info!("This is a demonstration using a simulated system camera");
    let picker = ScriptedPicker::new().then(PickerResult::Picked(DynamicImage::new_rgb8(640, 480)));
    let mut entry = EntryScreen::new(picker, ConsoleViewer::default());

    if let Err(e) = entry.show_native_camera() {
        if let Some(alert) = entry.alert() {
            eprintln!("{}: {}", alert.title, alert.message);
        }
        warn!("Native camera unavailable: {}", e);
        return 1;
    }
    entry.process_pending();
    entry.viewer_done();
    0
}

fn make_backend(arg: BackendArg, config: &FileConfig) -> Result<Arc<dyn CaptureBackend>, String> {
    match arg {
        BackendArg::Mock => Ok(Arc::new(MockBackend::phone())),
        #[cfg(feature = "camera")]
        BackendArg::Native => custom_camera::capture::NativeBackend::discover(config.native.default_device)
            .map(|backend| Arc::new(backend) as Arc<dyn CaptureBackend>)
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "camera"))]
        BackendArg::Native => {
            let _ = config;
            Err("built without the `camera` feature".to_string())
        }
    }
}

/// Handles messages until `done` holds or `timeout` elapses.
fn wait_until<V: ImageViewer, P: ImagePicker>(
    screen: &mut CameraScreen<V, P>,
    timeout: Duration,
    done: impl Fn(&CameraScreen<V, P>) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while !done(&*screen) {
        if Instant::now() >= deadline {
            return false;
        }
        screen.wait_for_message(Duration::from_millis(50));
    }
    true
}

fn run_custom(config: FileConfig, args: &CustomArgs) -> i32 {
    let backend = match make_backend(args.backend, &config) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to open camera backend: {}", e);
            return 1;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut screen = match CameraScreen::new(
        backend,
        config,
        args.orientation.into(),
        ConsoleViewer::default(),
        ScriptedPicker::new(),
    ) {
        Ok(screen) => screen,
        Err(e) => {
            eprintln!("Failed to create camera screen: {}", e);
            return 1;
        }
    };

    screen.appear();
    if !wait_until(&mut screen, STEP_TIMEOUT, |s| s.controls().preview_attached) {
        warn!("Camera did not become ready");
        screen.disappear();
        return 1;
    }

    let flash: FlashMode = args.flash.into();
    if screen.flash_mode() != Some(flash) {
        if screen.controls().flash_button.hidden {
            warn!("Camera has no flash, keeping {:?}", screen.flash_mode());
        } else {
            screen.flash_button_pressed();
            screen.select_flash_mode(flash);
            if !wait_until(&mut screen, STEP_TIMEOUT, |s| s.flash_mode() == Some(flash)) {
                warn!("Flash mode {} was not applied", flash);
            }
        }
    }

    if args.switch {
        if screen.controls().camera_button.hidden {
            warn!("Only one camera available, not switching");
        } else {
            screen.switch_camera_pressed();
            std::thread::sleep(screen.controls().flip_transition);
            screen.flip_transition_finished();
            wait_until(&mut screen, STEP_TIMEOUT, |s| !s.controls().blur_visible);
        }
    }

    for shot in 0..args.shots {
        if !running.load(Ordering::SeqCst) {
            info!("Interrupted");
            break;
        }
        screen.take_photo();
        if !wait_until(&mut screen, STEP_TIMEOUT, |s| s.controls().shutter.enabled) {
            warn!("Shot {} did not complete", shot + 1);
        }
    }

    screen.disappear();
    info!("Done. Photos shown: {}", screen.viewer().shown);
    0
}
