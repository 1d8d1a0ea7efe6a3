use clap::Parser;
use std::path::PathBuf;
use towebp::config::ConversionOptions;
use towebp::imaging::{Fit, Position, RustBackend};
use towebp::scan::{Candidates, resolve_target};
use towebp::{convert, output};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "towebp")]
#[command(version)]
#[command(about = "Convert PNG, JPEG and WebP images to WebP with slugified names")]
#[command(long_about = "\
Convert PNG, JPEG and WebP images to WebP with slugified names

TARGET is a directory (every png/jpg/jpeg/webp file directly inside it) or a
single image. Each image is written next to its source as <slug><prefix>.webp:

  Photo.PNG            → photo.webp
  Café Déjà-vu!.jpg    → cafe-deja-vu.webp
  IMG_2041 (copy).jpeg → img2041-copy.webp

With --overwrite the WebP data replaces each source file under its original
name, through a temporary <slug><prefix>-temp.webp file.

Resizing follows sharp: give --width and/or --height, and --fit decides how
the aspect ratio is reconciled (cover crops at --position, contain pads).

Note: -h is --height. Use --help for this text.")]
#[command(disable_help_flag = true)]
struct Cli {
    /// Image file or directory to convert
    #[arg(default_value = ".")]
    target: PathBuf,

    /// Target width in pixels
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// How to fit the image into width x height
    #[arg(long, value_enum)]
    fit: Option<Fit>,

    /// Gravity for cropping (cover) and placement (contain)
    #[arg(long, visible_alias = "pos", value_enum)]
    position: Option<Position>,

    /// WebP quality, 1-100
    #[arg(
        short,
        long,
        default_value_t = 80,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    quality: u32,

    /// Appended to the slugified name, before .webp
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Replace source files in place
    #[arg(short, long)]
    overwrite: bool,

    /// Also convert images in subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Convert up to N files in parallel (capped at the number of cores)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    jobs: Option<u64>,

    /// Show what would be converted without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print a JSON report instead of per-file lines
    #[arg(long)]
    json: bool,

    /// Verbose diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    fn options(&self) -> ConversionOptions {
        ConversionOptions {
            target: self.target.clone(),
            width: self.width,
            height: self.height,
            fit: self.fit,
            position: self.position,
            quality: self.quality,
            prefix: self.prefix.clone(),
            overwrite: self.overwrite,
            recursive: self.recursive,
            jobs: self.jobs.map(|n| n as usize),
            dry_run: self.dry_run,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let options = cli.options();
    options.validate()?;
    debug!(?options, "starting");

    let candidates = resolve_target(&options.target, options.recursive)?;
    let root = display_root(&candidates);
    if candidates.is_empty() {
        println!("{}", output::format_no_images(&root));
        return Ok(());
    }
    let files = candidates.into_files();
    let backend = RustBackend::new();

    if options.dry_run {
        let preview = convert::preview_batch(&backend, &files, &options);
        output::print_preview(&preview, &root);
        return Ok(());
    }

    let summary = if cli.json {
        convert::convert_batch(&backend, &files, &options, None)
    } else {
        let (tx, rx) = std::sync::mpsc::channel();
        let printer_root = root.clone();
        let printer = std::thread::spawn(move || {
            for event in rx {
                output::print_convert_event(&event, &printer_root);
            }
        });
        let summary = convert::convert_batch(&backend, &files, &options, Some(tx));
        printer.join().map_err(|_| "output thread panicked")?;
        summary
    };

    if cli.json {
        println!("{}", output::format_json(&summary)?);
    } else {
        output::print_summary(&summary);
    }
    Ok(())
}

/// Directory that report paths are shown relative to.
fn display_root(candidates: &Candidates) -> PathBuf {
    match candidates {
        Candidates::Directory { root, .. } => root.clone(),
        Candidates::File(path) => path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    }
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("towebp=warn"),
        1 => EnvFilter::new("towebp=info"),
        2 => EnvFilter::new("towebp=debug"),
        _ => EnvFilter::new("towebp=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
