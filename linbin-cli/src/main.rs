mod logging;

use std::io::Read;
use std::path::Path;

use clap::{Parser, Subcommand};
use linbin_common::{Config, NonFinitePolicy, OutputFormat};
use linbin_core::{
    export_csv, export_json, print_summary, read_samples, registry, render_csv, render_text,
    parse_samples, report_json, BinOptions, BinReport, GridSpec, LinearBinner,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "linbin", version, about = "Linear binning of 1-D samples onto an equally spaced grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin samples read from a file or stdin
    Bin {
        /// Sample file (`.json` array or whitespace/comma separated text); `-` or omitted reads stdin
        input: Option<String>,
        /// Lower grid bound, defaults to the smallest finite sample
        #[arg(long, allow_negative_numbers = true)]
        lower: Option<f64>,
        /// Upper grid bound, defaults to the largest finite sample
        #[arg(long, allow_negative_numbers = true)]
        upper: Option<f64>,
        #[arg(long, short = 'm')]
        points: usize,
        /// Clip out-of-range samples onto the end points instead of dropping them
        #[arg(long)]
        no_truncate: bool,
        #[arg(long)]
        non_finite: Option<NonFinitePolicy>,
        #[arg(long)]
        parallel: bool,
        /// Samples per parallel chunk; raised as needed to keep at most 256 partial grids
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        format: Option<OutputFormat>,
        #[arg(long)]
        output: Option<String>,
        /// Print a summary instead of the grid
        #[arg(long, conflicts_with_all = ["format", "output"])]
        summary: bool,
    },
    /// Print grid point locations
    Grid {
        #[arg(long, allow_negative_numbers = true)]
        lower: f64,
        #[arg(long, allow_negative_numbers = true)]
        upper: f64,
        #[arg(long, short = 'm')]
        points: usize,
    },
    /// List registered native routines
    Routines,
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config path
        #[arg(long)]
        init: bool,
    },
}

struct BinArgs {
    input: Option<String>,
    lower: Option<f64>,
    upper: Option<f64>,
    points: usize,
    no_truncate: bool,
    non_finite: Option<NonFinitePolicy>,
    parallel: bool,
    chunk_size: Option<usize>,
    format: Option<OutputFormat>,
    output: Option<String>,
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ignoring config at {}: {e}", Config::config_path().display());
            Config::default()
        }
    };
    logging::init_logging(&config.logging);
    debug!(path = %Config::config_path().display(), "configuration loaded");

    match cli.command {
        Commands::Bin { input, lower, upper, points, no_truncate, non_finite, parallel, chunk_size, format, output, summary } => {
            let args = BinArgs { input, lower, upper, points, no_truncate, non_finite, parallel, chunk_size, format, output, summary };
            run_bin(args, &config)?
        }
        Commands::Grid { lower, upper, points } => run_grid(lower, upper, points, &config)?,
        Commands::Routines => run_routines(),
        Commands::Config { init } => run_config(init, &config)?,
    }
    Ok(())
}

fn load_input(input: Option<&str>) -> anyhow::Result<Vec<f64>> {
    match input {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(parse_samples(&text)?)
        }
        Some(path) => Ok(read_samples(Path::new(path))?),
    }
}

fn sample_range(samples: &[f64]) -> Option<(f64, f64)> {
    samples
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
}

fn run_bin(args: BinArgs, config: &Config) -> anyhow::Result<()> {
    let samples = load_input(args.input.as_deref())?;
    let (lower, upper) = match (args.lower, args.upper) {
        (Some(a), Some(b)) => (a, b),
        (lower, upper) => {
            let Some((lo, hi)) = sample_range(&samples) else {
                anyhow::bail!("no finite samples to derive the grid range from; pass --lower and --upper");
            };
            (lower.unwrap_or(lo), upper.unwrap_or(hi))
        }
    };
    let grid = GridSpec::new(lower, upper, args.points)?;

    let mut options = BinOptions::from(&config.binning);
    if args.no_truncate {
        options.truncate = false;
    }
    if let Some(policy) = args.non_finite {
        options.non_finite = policy;
    }
    if let Some(chunk) = args.chunk_size {
        options.chunk_size = chunk;
    }
    let binner = LinearBinner::new(grid, options);
    let report = if args.parallel {
        binner.bin_parallel(&samples, options.chunk_size)?
    } else {
        binner.bin_auto(&samples)?
    };

    if args.summary {
        print_summary(&report);
        return Ok(());
    }
    let format = args.format.unwrap_or(config.output.format);
    write_report(&report, format, args.output.as_deref(), config.output.precision)
}

fn write_report(report: &BinReport, format: OutputFormat, output: Option<&str>, precision: usize) -> anyhow::Result<()> {
    match (format, output) {
        (OutputFormat::Json, Some(path)) => export_json(Path::new(path), report)?,
        (OutputFormat::Csv, Some(path)) => export_csv(Path::new(path), report)?,
        (OutputFormat::Text, Some(path)) => std::fs::write(path, render_text(report, precision))?,
        (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(&report_json(report))?),
        (OutputFormat::Csv, None) => print!("{}", render_csv(report)),
        (OutputFormat::Text, None) => print!("{}", render_text(report, precision)),
    }
    if let Some(path) = output {
        eprintln!("wrote {path}");
    }
    Ok(())
}

fn run_grid(lower: f64, upper: f64, points: usize, config: &Config) -> anyhow::Result<()> {
    let grid = GridSpec::new(lower, upper, points)?;
    let precision = config.output.precision;
    for (i, p) in grid.points().iter().enumerate() {
        println!("{i:>6} {p:.precision$}");
    }
    Ok(())
}

fn run_routines() {
    println!("{:<12} {:<12} {:<10} {}", "NAME", "SYMBOL", "CONV", "ARITY");
    for spec in registry().specs() {
        let conv = format!("{:?}", spec.convention).to_lowercase();
        println!("{:<12} {:<12} {:<10} {}", spec.name, spec.symbol, conv, spec.arity());
    }
}

fn run_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        let path = Config::default().save()?;
        println!("wrote default config to {}", path.display());
        return Ok(());
    }
    println!("# {}", Config::config_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
