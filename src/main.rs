use clap::{CommandFactory, Parser};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

use livelive_flowstats::analysis;
use livelive_flowstats::config::AnalysisConfig;
use livelive_flowstats::config_loader::{self, CliOverrides};

/// Flow completion time statistics for SRv6 live-live simulation results
#[derive(Parser, Debug)]
#[command(name = "flowstats", author, version, about, long_about = None)]
struct Args {
    /// Directory containing FlowMonitor result documents
    input_dir: Option<PathBuf>,

    /// Path to an analysis configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for the results document
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Extension of result documents
    #[arg(long)]
    extension: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not print the summary to stdout
    #[arg(long)]
    no_summary: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            workers: self.threads,
            output_dir: self.output.as_ref().map(|p| p.display().to_string()),
            document_extension: self.extension.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let log_level = args.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let Some(input_dir) = args.input_dir.clone() else {
        eprintln!("A path is required.\n");
        Args::command().print_help()?;
        std::process::exit(1);
    };

    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => AnalysisConfig::default(),
    };
    config_loader::apply_overrides(&mut config, &args.overrides())?;

    info!("Input directory: {:?}", input_dir);
    info!("Output directory: {:?}", config.output_dir);

    let report = analysis::aggregate_directory(&input_dir, &config)?;
    let output_path = analysis::write_results(&report.result, Path::new(&config.output_dir))?;

    if !args.no_summary {
        analysis::print_summary(&report);
        println!("Results saved in file: {}", output_path.display());
    }

    Ok(())
}
