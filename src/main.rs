//! delay-meas: reconstruct per-path transaction delays from measurement logs
//!
//! Reads a delay measurement log, splits it into Start/Stop sessions and prints
//! or exports one delay table per observed path.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use delay_meas::output::{stats_table, write_sections, OutputFormat, TextTable};
use delay_meas::parquet::{write_events, write_path_tables};
use delay_meas::{delay_stats, extract_delay, parse_log_file, Config, OpenPolicy, PathTables};

#[derive(Parser)]
#[command(name = "delay-meas")]
#[command(about = "Reconstruct per-path transaction delays from delay measurement logs")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ExtractOpts {
    /// Also publish the delay between each adjacent hop pair
    #[arg(long)]
    all_paths: bool,

    /// A Start inside an open session restarts it instead of being ignored
    #[arg(long)]
    restart_on_start: bool,
}

impl ExtractOpts {
    fn config(&self) -> Config {
        Config {
            all_paths: self.all_paths,
            open_policy: if self.restart_on_start {
                OpenPolicy::Restart
            } else {
                OpenPolicy::KeepFirst
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one delay table per path
    Extract {
        /// Log file to read (plain or .gz)
        log: PathBuf,

        #[command(flatten)]
        opts: ExtractOpts,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write Parquet files and a paths.json manifest to this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the decoded command and measurement streams
    Decode {
        /// Log file to read (plain or .gz)
        log: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write command.parquet and measurement.parquet to this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print delay statistics per path
    Stats {
        /// Log file to read (plain or .gz)
        log: PathBuf,

        #[command(flatten)]
        opts: ExtractOpts,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_extract(
    log: &Path,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let parsed = parse_log_file(log)?;
    let tables = extract_delay(&parsed, config);

    match output {
        Some(dir) => {
            let manifest = write_path_tables(dir, &tables)?;
            eprintln!(
                "Wrote {} path tables ({} rows) to {}",
                manifest.len(),
                tables.row_count(),
                dir.display()
            );
        }
        None => {
            print_sections(format, &path_sections(&tables)?)?;
            eprintln!("\n{} paths, {} rows", tables.len(), tables.row_count());
        }
    }
    Ok(())
}

fn path_sections(tables: &PathTables) -> Result<Vec<(String, TextTable)>> {
    tables
        .iter()
        .map(|table| Ok((table.key(), TextTable::from_batch(&table.to_record_batch()?)?)))
        .collect()
}

fn run_decode(log: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let parsed = parse_log_file(log)?;

    match output {
        Some(dir) => {
            write_events(dir, &parsed)?;
            eprintln!(
                "Wrote {} commands and {} measurements to {}",
                parsed.commands.len(),
                parsed.measurements.len(),
                dir.display()
            );
        }
        None => {
            let sections = vec![
                (
                    "command".to_string(),
                    TextTable::from_batch(&parsed.command_batch()?)?,
                ),
                (
                    "measurement".to_string(),
                    TextTable::from_batch(&parsed.measurement_batch()?)?,
                ),
            ];
            print_sections(format, &sections)?;
            eprintln!(
                "\n{} lines, {} unrecognized, {} blocks failed to decode",
                parsed.stats.lines, parsed.stats.unrecognized, parsed.stats.decode_failures
            );
        }
    }
    Ok(())
}

fn run_stats(log: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let parsed = parse_log_file(log)?;
    let stats = delay_stats(&extract_delay(&parsed, config));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print_sections(format, &[("delay_stats".to_string(), stats_table(&stats))])?,
    }
    Ok(())
}

fn print_sections(format: OutputFormat, sections: &[(String, TextTable)]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_sections(&mut out, format, sections)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            log,
            opts,
            format,
            output_dir,
        } => run_extract(&log, &opts.config(), format, output_dir.as_deref()),
        Commands::Decode {
            log,
            format,
            output_dir,
        } => run_decode(&log, format, output_dir.as_deref()),
        Commands::Stats { log, opts, format } => run_stats(&log, &opts.config(), format),
    }
}
