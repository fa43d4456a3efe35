#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ahp_harness::{
    random_index_value, CompareRequest, ComposeRequest, Hierarchy, RandomIndex,
};

#[derive(Parser)]
#[command(name = "ahp", version, about = "Analytic Hierarchy Process CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "log-verbose", action = clap::ArgAction::Count, global = true)]
    log_verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute weights for one comparison set from JSON input
    Compare {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Include input and computed comparisons in the report
        #[arg(long)]
        verbose: bool,
        /// Override the rounding precision from the input
        #[arg(long)]
        precision: Option<u32>,
        /// Override the random index from the input
        #[arg(long, value_enum)]
        random_index: Option<CliRandomIndex>,
        /// Skip the consistency ratio (and its size limit)
        #[arg(long)]
        no_consistency: bool,
    },
    /// Compose a hierarchy of comparison sets from JSON input
    Compose {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        verbose: bool,
        /// Report only this node instead of the whole hierarchy
        #[arg(long)]
        node: Option<String>,
    },
    /// Print the random index for a matrix size
    RandomIndex {
        #[arg(long, value_enum, default_value = "dd")]
        scheme: CliRandomIndex,
        #[arg(long)]
        size: usize,
    },
}

/// CLI-facing random index enum (clap::ValueEnum).
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliRandomIndex {
    Dd,
    Saaty,
}

impl From<CliRandomIndex> for RandomIndex {
    fn from(r: CliRandomIndex) -> Self {
        match r {
            CliRandomIndex::Dd => RandomIndex::Dd,
            CliRandomIndex::Saaty => RandomIndex::Saaty,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_verbose);

    match cli.command {
        Commands::Compare {
            input,
            out,
            verbose,
            precision,
            random_index,
            no_consistency,
        } => {
            let mut request: CompareRequest = read_json(&input)?;
            if let Some(p) = precision {
                request.config.precision = p;
            }
            if let Some(r) = random_index {
                request.config.random_index = r.into();
            }
            if no_consistency {
                request.config.consistency = false;
            }
            let comparison = request.build()?;
            let mut hierarchy = Hierarchy::new();
            let id = hierarchy.insert(comparison);
            let report = hierarchy
                .node(id)
                .map(|n| n.report(verbose))
                .ok_or("comparison was not registered")?;
            info!(name = %report.name, "comparison computed");
            write_json(&out, &report)?;
        }
        Commands::Compose {
            input,
            out,
            verbose,
            node,
        } => {
            let request: ComposeRequest = read_json(&input)?;
            let compose = request.build()?;
            let report = compose.report(node.as_deref(), verbose)?;
            info!(nodes = compose.hierarchy().len(), "hierarchy composed");
            write_json(&out, &report)?;
        }
        Commands::RandomIndex { scheme, size } => {
            let scheme: RandomIndex = scheme.into();
            let value = random_index_value(scheme, size).ok_or_else(|| {
                format!(
                    "no {} random index for size {size} (tabulated for 3..={})",
                    scheme.label(),
                    scheme.max_size()
                )
            })?;
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{value}")?;
        }
    }

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &PathBuf,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}
