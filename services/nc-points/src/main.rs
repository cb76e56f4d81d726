//! nc-points: extract gridded NetCDF measurements into point lists.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use nc_points::{inspect, scan, summary, writer, BatchRunner, NcPointsConfig};
use renderer::{render_result, Palette, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "nc-points")]
#[command(about = "Extract gridded NetCDF measurements into latitude/longitude/value points")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "NC_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse every *.nc file in a directory
    Parse {
        /// Input directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output directory (default: next to each input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also render <stem>_filtered.png
        #[arg(long)]
        render: bool,

        /// Process files in parallel
        #[arg(long)]
        parallel: bool,

        /// Scan subdirectories too
        #[arg(short, long)]
        recursive: bool,

        /// Extraction config YAML (axis names, index mapping)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Palette file (YAML or JSON) for --render
        #[arg(long)]
        palette: Option<PathBuf>,
    },

    /// Render the first result of a JSON artifact to PNG
    Render {
        /// JSON file written by `parse`
        json: PathBuf,

        /// Output PNG (default: <json stem>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long)]
        width: Option<usize>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<usize>,

        /// Palette file (YAML or JSON)
        #[arg(long)]
        palette: Option<PathBuf>,
    },

    /// Summarize the JSON artifacts in a directory
    Inspect {
        /// Directory holding *_filtered.json / *_all.json
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Palette file used for the value distribution
        #[arg(long)]
        palette: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json)?;

    netcdf_parser::silence_hdf5_errors();

    let mut config = NcPointsConfig::from_env();

    match cli.command {
        Commands::Parse {
            dir,
            output,
            render,
            parallel,
            recursive,
            config: config_file,
            palette,
        } => {
            if let Some(path) = config_file {
                config = config.with_extract_file(&path)?;
            }
            if output.is_some() {
                config.output_dir = output;
            }
            if palette.is_some() {
                config.palette_file = palette;
            }
            config.render |= render;
            config.parallel |= parallel;
            config.recursive |= recursive;

            run_parse(&dir, config)
        }
        Commands::Render {
            json,
            output,
            width,
            height,
            palette,
        } => {
            if let Some(w) = width {
                config.render_width = w;
            }
            if let Some(h) = height {
                config.render_height = h;
            }
            if palette.is_some() {
                config.palette_file = palette;
            }
            config.validate()?;

            let output = output.unwrap_or_else(|| json.with_extension("png"));
            run_render(
                &json,
                &output,
                &config.palette()?,
                &config.render_options(),
            )
        }
        Commands::Inspect { dir, palette } => {
            if palette.is_some() {
                config.palette_file = palette;
            }
            let report = inspect(&dir, &config.palette()?)?;
            if let Some(ratio) = report.filter_ratio() {
                info!(filter_ratio = %format!("{:.2}%", ratio), "Inspection complete");
            }
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn run_parse(dir: &Path, config: NcPointsConfig) -> Result<()> {
    let files = scan::find_nc_files(dir, config.recursive)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "No NetCDF files found");
        return Ok(());
    }

    info!(
        dir = %dir.display(),
        count = files.len(),
        files = ?files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "Found NetCDF files"
    );

    let runner = BatchRunner::new(config)?;
    let report = runner.run(&files);
    summary::log_batch_report(&report);

    if report.processed.is_empty() {
        bail!("none of {} files could be parsed", files.len());
    }
    Ok(())
}

fn run_render(json: &Path, output: &Path, palette: &Palette, options: &RenderOptions) -> Result<()> {
    let results = writer::read_results(json)?;
    let Some(result) = results.first() else {
        bail!("{} contains no results", json.display());
    };

    info!(
        file = %json.display(),
        source = %result.file_info.filename,
        points = result.data_points.len(),
        present = result.present_count(),
        "Rendering"
    );

    for bin in palette.histogram(&result.data_points).iter().filter(|b| b.count > 0) {
        info!(bin = %bin.label, count = bin.count, "Value distribution");
    }

    let raster = render_result(result, palette, options)
        .with_context(|| format!("rendering {}", json.display()))?;
    raster.save_png(output)?;

    info!(path = %output.display(), width = raster.width(), height = raster.height(), "Saved image");
    Ok(())
}
