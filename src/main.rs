use anyhow::Context;
use clap::{Parser, ValueEnum};
use morse_prominence::{output, persistence, ElevationGrid, GridGraph, ProminenceCalculator, ProminenceConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Topographic prominence of every peak in an elevation raster.
#[derive(Parser, Debug)]
#[command(name = "morse-prominence", version, about, long_about = None)]
struct Cli {
    /// Elevation raster (.tif/.tiff, .csv, or raw little-endian i16 .bin/.raw/.hgt)
    input: PathBuf,

    /// Raster band to read (1-based; CSV and raw input only have band 1)
    #[arg(short, long, default_value_t = 1)]
    band: usize,

    /// Width of a raw binary raster
    #[arg(long, requires = "height")]
    width: Option<usize>,

    /// Height of a raw binary raster
    #[arg(long, requires = "width")]
    height: Option<usize>,

    /// JSON file with calculation settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_prominence: Option<f64>,

    #[arg(long)]
    min_elevation: Option<f64>,

    /// Report at most this many peaks
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Prominence to report for the highest peak instead of its relief
    #[arg(long)]
    infinity_replacement: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the 4-connected neighbor graph as JSON
    #[arg(long)]
    dump_graph: Option<PathBuf>,

    /// Print both filtrations to stdout
    #[arg(long)]
    print_filtration: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn prominence_config(&self) -> anyhow::Result<ProminenceConfig> {
        let mut config = match &self.config {
            Some(path) => ProminenceConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ProminenceConfig::default(),
        };
        if let Some(p) = self.min_prominence {
            config.min_prominence = p;
        }
        if self.min_elevation.is_some() {
            config.min_elevation = self.min_elevation;
        }
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        if self.infinity_replacement.is_some() {
            config.infinity_replacement = self.infinity_replacement;
        }
        config.validate()?;
        Ok(config)
    }

    fn load_grid(&self) -> anyhow::Result<ElevationGrid> {
        let grid = match (self.width, self.height) {
            (Some(w), Some(h)) => ElevationGrid::check_single_band(self.band)
                .and_then(|()| ElevationGrid::load_binary(&self.input, Some((w, h)))),
            _ => ElevationGrid::load(&self.input, self.band),
        };
        grid.with_context(|| format!("loading {}", self.input.display()))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.prominence_config()?;
    let grid = cli.load_grid()?;

    if cli.dump_graph.is_some() || cli.print_filtration {
        let graph = GridGraph::from_grid(&grid);
        if let Some(path) = &cli.dump_graph {
            info!("Writing graph to {}", path.display());
            let mut writer = BufWriter::new(File::create(path)?);
            output::write_graph(&mut writer, &graph)?;
            writer.flush()?;
        }
        if cli.print_filtration {
            let result = persistence(&graph);
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            output::write_filtration(&mut lock, &result.descending)?;
            output::write_filtration(&mut lock, &result.ascending)?;
        }
    }

    let peaks = ProminenceCalculator::new(&grid).calculate(&config)?;

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    match cli.format {
        Format::Table => output::write_table(&mut writer, &peaks)?,
        Format::Json => output::write_json(&mut writer, &peaks)?,
    }
    writer.flush()?;

    Ok(())
}
