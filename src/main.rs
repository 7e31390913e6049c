use clap::{Parser, Subcommand};
use photo_border::brand::BrandIconResolver;
use photo_border::config::{self, PreviewConfig};
use photo_border::imaging::native::{self, NativeBridge};
use photo_border::imaging::{ExportBridge, ParamChange};
use photo_border::metadata::normalize;
use photo_border::output;
use photo_border::preview::{ExportStatus, NoticeLevel, PreviewController};
use photo_border::types::{Color, Position, Size};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How long the CLI waits for renders and exports to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Composite parameters shared by the commands that render.
#[derive(clap::Args, Clone, Default)]
struct ParamArgs {
    /// Border size in pixels (clamped to the configured range)
    #[arg(long)]
    border_size: Option<u32>,
    /// Border color, #RGB / #RRGGBB / #RRGGBBAA
    #[arg(long)]
    border_color: Option<Color>,
    /// Watermark text color
    #[arg(long)]
    text_color: Option<Color>,
    /// Font family for watermark text
    #[arg(long)]
    font_family: Option<String>,
    /// Font size in pixels (clamped to the configured range)
    #[arg(long)]
    font_size: Option<u32>,
    /// Brand icon size in pixels (clamped to the configured range)
    #[arg(long)]
    icon_size: Option<u32>,
    /// Copyright line drawn in the watermark band
    #[arg(long)]
    copyright: Option<String>,
    /// Copyright line edge within the band: top or bottom
    #[arg(long)]
    copyright_position: Option<Position>,
    /// Watermark band edge: top or bottom
    #[arg(long)]
    watermark_position: Option<Position>,
}

impl ParamArgs {
    fn changes(self) -> Vec<ParamChange> {
        [
            self.border_size.map(ParamChange::BorderSize),
            self.border_color.map(ParamChange::BorderColor),
            self.text_color.map(ParamChange::TextColor),
            self.font_family.map(ParamChange::FontFamily),
            self.font_size.map(ParamChange::FontSize),
            self.icon_size.map(ParamChange::IconSize),
            self.copyright.map(ParamChange::Copyright),
            self.copyright_position.map(ParamChange::CopyrightPosition),
            self.watermark_position.map(ParamChange::WatermarkPosition),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-border")]
#[command(about = "Bordered, watermarked photo previews")]
#[command(long_about = "\
Bordered, watermarked photo previews

Frames a photo with a border and a watermark band showing the camera,
lens, shooting parameters, capture time and the maker's brand icon.

Composite layout (bottom band):

  ┌──────────────────────────┐
  │          border          │
  │  ┌────────────────────┐  │
  │  │       image        │  │
  │  ├────────────────────┤  │
  │  │ Make Model │ F4 |… │  │  ← watermark band (only with metadata)
  │  └────────────────────┘  │
  └──────────────────────────┘

'render' produces the preview (scaled to fit the container), 'export'
writes the composite at full resolution.

Configuration is read from ./config.toml when present, or from --config.
Run 'photo-border gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the preview composite and save it
    Render {
        /// Source image
        image: PathBuf,
        /// Where to save the preview
        #[arg(long, short, default_value = "preview.png")]
        output: PathBuf,
        /// Preview container, WIDTHxHEIGHT (default from config)
        #[arg(long)]
        container: Option<Size>,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Write the full-resolution composite
    Export {
        /// Source image
        image: PathBuf,
        /// Destination; format from extension (jpg, png, tif, webp)
        output: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Print normalized metadata and the resolved brand icon
    Exif {
        /// Source image
        image: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };

    match cli.command {
        Command::Render {
            image,
            output: out,
            container,
            params,
        } => {
            let mut preview = open_preview(&config, params, container);
            preview.load_image(&image)?;
            if !preview.wait_idle(SETTLE_TIMEOUT) {
                return Err("timed out waiting for the preview".into());
            }
            let (Some(surface), Some(layout)) = (preview.surface(), preview.surface_layout())
            else {
                return Err("no preview was rendered".into());
            };
            native::save_raster(surface, &out)?;
            output::print_render_output(layout, &out);
        }
        Command::Export {
            image,
            output: out,
            params,
        } => {
            let mut preview = open_preview(&config, params, None);
            preview.load_image(&image)?;
            if preview.export(Some(out)) != ExportStatus::Started {
                return Err("nothing to export".into());
            }
            if !preview.wait_idle(SETTLE_TIMEOUT) {
                return Err("timed out waiting for the export".into());
            }
            let mut failed = false;
            for notice in preview.take_notices() {
                failed |= notice.level == NoticeLevel::Error;
                println!("{}", output::format_notice(&notice));
            }
            if failed {
                return Err("export failed".into());
            }
        }
        Command::Exif { image } => {
            let raw = NativeBridge::from_config(&config).fetch_metadata(&image)?;
            let display = normalize(&raw);
            let icon = BrandIconResolver::with_entries(&config.icons.brands).resolve(&display.camera_make);
            output::print_metadata(&display, &icon);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// A preview controller over the native bridge with CLI overrides applied.
fn open_preview(config: &PreviewConfig, params: ParamArgs, container: Option<Size>) -> PreviewController {
    let bridge = Arc::new(NativeBridge::from_config(config));
    let mut preview = PreviewController::new(config, bridge);
    if let Some(container) = container {
        preview.resize_container(container);
    }
    for change in params.changes() {
        preview.update(change);
    }
    preview
}

/// Log to stderr. `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
