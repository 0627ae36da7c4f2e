use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use photo_watermark::{
    default_output_path, load_canvas, ColorValue, ProcessResult, RawParams, SystemFontResolver,
    WatermarkRequest, Watermarker,
};

#[derive(Parser)]
#[command(
    name = "photo-watermark",
    about = "Overlay text or image watermarks onto photos",
    version,
    after_help = "Examples:\n  \
                  photo-watermark text photo.jpg \"© ACME\" --repeat --angle -30 --opacity 0.3\n  \
                  photo-watermark image photo.jpg logo.png --scale 0.2 --x 20 --y 20"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output file (default: {name}_watermarked.{ext})
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Draw a text watermark
    Text {
        /// Input image file
        input: PathBuf,

        /// Watermark text
        text: String,

        /// Font size in pixels
        #[arg(long, default_value = "50")]
        font_size: f64,

        /// Text color: #RRGGBB, #RGB or rgb(r, g, b)
        #[arg(short, long, default_value = "#FFFFFF")]
        color: String,

        /// Tile the text over the whole image
        #[arg(short, long)]
        repeat: bool,

        /// Horizontal tile spacing (50-500)
        #[arg(long, default_value = "200")]
        spacing_x: f64,

        /// Vertical tile spacing (50-300)
        #[arg(long, default_value = "100")]
        spacing_y: f64,

        /// Font file to try before the system fonts
        #[arg(long)]
        font: Option<PathBuf>,

        #[command(flatten)]
        placement: Placement,
    },
    /// Blend an image watermark
    Image {
        /// Input image file
        input: PathBuf,

        /// Watermark image file
        watermark: PathBuf,

        /// Watermark width as a fraction of the image width (0.01-2.0)
        #[arg(short, long, default_value = "0.2")]
        scale: f64,

        #[command(flatten)]
        placement: Placement,
    },
}

#[derive(Args)]
struct Placement {
    /// Horizontal position of the top-left corner
    #[arg(long, default_value = "50", allow_hyphen_values = true)]
    x: f64,

    /// Vertical position of the top-left corner
    #[arg(long, default_value = "50", allow_hyphen_values = true)]
    y: f64,

    /// Opacity (0.0-1.0)
    #[arg(long, default_value = "0.7")]
    opacity: f64,

    /// Rotation in degrees, counter-clockwise (-180 to 180)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    angle: f64,
}

impl Placement {
    fn raw(&self) -> RawParams {
        RawParams {
            position_x: self.x,
            position_y: self.y,
            opacity: self.opacity,
            angle: self.angle,
            ..RawParams::default()
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        eprintln!("Error: Cannot specify both --verbose and --quiet");
        process::exit(1);
    }
    init_tracing(cli.verbose, cli.quiet);

    let (input, marker, request) = match cli.command {
        Command::Text {
            input,
            text,
            font_size,
            color,
            repeat,
            spacing_x,
            spacing_y,
            font,
            placement,
        } => {
            let hints: Vec<PathBuf> = font.into_iter().collect();
            let marker = Watermarker::with_resolver(&SystemFontResolver::default(), &hints);
            let request = WatermarkRequest {
                kind: "text".to_string(),
                text,
                color: ColorValue::Text(color),
                watermark: None,
                params: RawParams {
                    font_size,
                    repeat,
                    spacing_x,
                    spacing_y,
                    ..placement.raw()
                },
            };
            (input, marker, request)
        }
        Command::Image {
            input,
            watermark,
            scale,
            placement,
        } => {
            let watermark = match load_canvas(&watermark) {
                Ok(img) => img,
                Err(e) => {
                    eprintln!("Error: Failed to load watermark image: {e}");
                    process::exit(1);
                }
            };
            let request = WatermarkRequest {
                kind: "image".to_string(),
                watermark: Some(watermark),
                params: RawParams {
                    scale,
                    ..placement.raw()
                },
                ..WatermarkRequest::default()
            };
            (input, Watermarker::default(), request)
        }
    };

    if !input.exists() {
        eprintln!("Error: Input path does not exist: {}", input.display());
        process::exit(1);
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));

    let result = marker.process_file(&input, &output, &request);
    print_result(&result, &output, cli.quiet);

    if !result.success {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, output: &Path, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!("[OK] {filename} -> {}: {}", output.display(), result.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
