//! # papertag CLI
//!
//! Command-line interface for rendering e-paper tag payloads.
//!
//! ## Usage
//!
//! ```bash
//! # Render a payload to PNG for a 296x128 red tag
//! papertag render payload.json --width 296 --height 128 --scheme bwr --out tag.png
//!
//! # Check a payload without writing anything
//! papertag render payload.json --dry-run
//!
//! # Plot data comes from a JSON file of { entity: [samples] }
//! papertag render plot.json --series history.json --out plot.png
//!
//! # List fonts the resolver can see
//! papertag fonts --config engine.json
//!
//! # Run the preview server
//! papertag serve --listen 0.0.0.0:8080
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use papertag::{
    PapertagError,
    config::EngineConfig,
    display::{ColorScheme, DisplayConfig},
    render::{DitherMode, Payload, RenderInputs, RenderOptions, Renderer},
    resolve::ImageFetcher,
    server::{ServerConfig, serve},
    transport::{PngFileTransport, deliver},
};

/// papertag - e-paper tag rendering utility
#[derive(Parser, Debug)]
#[command(name = "papertag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (fonts, icons, media directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a payload file to PNG
    Render {
        /// Payload JSON: an element list or a request object
        payload: PathBuf,

        /// Panel width in pixels
        #[arg(long, default_value = "296")]
        width: u32,

        /// Panel height in pixels
        #[arg(long, default_value = "128")]
        height: u32,

        /// Color scheme (mono, bwr, bwy, bwry, grayscale4)
        #[arg(long, default_value = "bwr")]
        scheme: ColorScheme,

        /// Output PNG path
        #[arg(long, default_value = "output.png")]
        out: PathBuf,

        /// Dither mode, overriding the payload (none, fs, ordered, burkes)
        #[arg(long)]
        dither: Option<DitherMode>,

        /// Rotation in degrees, overriding the payload
        #[arg(long)]
        rotate: Option<i32>,

        /// Render and report warnings without writing the PNG
        #[arg(long)]
        dry_run: bool,

        /// Fail on the first element error
        #[arg(long)]
        strict: bool,

        /// Time series JSON for plot elements
        #[arg(long, value_name = "FILE")]
        series: Option<PathBuf>,
    },

    /// List available fonts
    Fonts,

    /// Start the HTTP preview server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Default panel width
        #[arg(long, default_value = "296")]
        width: u32,

        /// Default panel height
        #[arg(long, default_value = "128")]
        height: u32,

        /// Default color scheme
        #[arg(long, default_value = "bwr")]
        scheme: ColorScheme,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, PapertagError> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, PapertagError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn run() -> Result<(), PapertagError> {
    let cli = Cli::parse();
    let engine = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            payload,
            width,
            height,
            scheme,
            out,
            dither,
            rotate,
            dry_run,
            strict,
            series,
        } => {
            let mut request = Payload::from_json(&fs::read_to_string(&payload)?)?;
            if let Some(dither) = dither {
                request.dither = dither;
            }
            if let Some(rotate) = rotate {
                request.rotate = rotate;
            }
            request.dry_run |= dry_run;

            let mut inputs = RenderInputs::default();
            if let Some(path) = series {
                inputs.series = RenderInputs::series_from_json(&fs::read_to_string(path)?)?;
            }
            let fetcher = ImageFetcher::new(&engine)?;
            runtime()?.block_on(fetcher.resolve_into(&request, &mut inputs));

            let renderer = Renderer::from_config(&engine)?;
            let display = DisplayConfig::new(width, height, scheme);
            let options = RenderOptions { strict, now: None };
            let mut transport = PngFileTransport::new(&out);
            let output = deliver(&renderer, &request, &display, &inputs, &options, &mut transport)?;

            for warning in &output.warnings {
                eprintln!("warning: {}", warning);
            }
            if request.dry_run {
                println!(
                    "Dry run: {}x{}, {} warning(s)",
                    output.bitmap.width(),
                    output.bitmap.height(),
                    output.warnings.len()
                );
            } else {
                println!("Saved to {}", out.display());
            }
        }

        Commands::Fonts => {
            let renderer = Renderer::from_config(&engine)?;
            let fonts = renderer.fonts();
            println!("Search directories:");
            for dir in fonts.search_dirs() {
                println!("  {}", dir.display());
            }
            println!("\nAvailable fonts:");
            for name in fonts.available_fonts() {
                println!("  {}", name);
            }
        }

        Commands::Serve {
            listen,
            width,
            height,
            scheme,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                display: DisplayConfig::new(width, height, scheme),
                engine,
            };
            runtime()?.block_on(serve(config))?;
        }
    }

    Ok(())
}
