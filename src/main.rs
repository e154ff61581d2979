// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Statistical sweep of hybrid and published PRNGs over growing moduli.

pub mod conditioning;
pub mod config;
pub mod error;
pub mod export;
pub mod hprng;
pub mod maps;
pub mod registry;
pub mod rng_testing;
pub mod rngs;
pub mod sequence;
pub mod stats;
pub mod store;
mod strings;
pub mod summary;
pub mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{SeedPolicy, SweepConfig};
use error::Result;
use export::BitEncoding;
use maps::ChaosParams;
use registry::{Algorithm, ChaosSettings};
use sequence::SequenceRequest;

#[derive(Parser, Debug)]
#[command(name = "hprng-sweep", version, about = "Goodness of fit sweep for PRNGs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Test generators over a geometric range of moduli
    Sweep(SweepArgs),

    /// Print rejection rates from stored results
    Summary(SummaryArgs),

    /// Write one generated sample as a bit stream
    Export(ExportArgs),

    /// List registered generators
    List,
}

fn parse_algorithm(s: &str) -> std::result::Result<Algorithm, String> {
    s.parse().map_err(|e: error::Error| e.to_string())
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// First modulus
    #[arg(long, env = "HPRNG_M_INITIAL", default_value_t = 100)]
    m_initial: u64,

    /// Factor between successive moduli
    #[arg(long, env = "HPRNG_M_MULTIPLIER", default_value_t = 10)]
    m_multiplier: u64,

    /// Largest modulus
    #[arg(long, env = "HPRNG_M_LIMIT", default_value_t = 100_000_000_000)]
    m_limit: u64,

    /// Significance level of both tests
    #[arg(long, env = "HPRNG_ALPHA", default_value_t = stats::DEFAULT_ALPHA)]
    alpha: f64,

    /// Sample size per case
    #[arg(short, long, env = "HPRNG_N", default_value_t = 1000)]
    n: usize,

    /// Worst case period as a fraction of the modulus
    #[arg(short = 'w', long, env = "HPRNG_RESEED_FRACTION", default_value_t = sequence::DEFAULT_RESEED_FRACTION)]
    reseed_fraction: f64,

    /// Equal width bins of the chi squared test
    #[arg(long, env = "HPRNG_BINS", default_value_t = stats::DEFAULT_BINS)]
    bins: usize,

    /// Generation calls averaged per timing
    #[arg(long, env = "HPRNG_TIMING_REPETITIONS", default_value_t = 100)]
    timing_repetitions: u32,

    /// Parallel batches, batch i uses a = 5 * 10^i
    #[arg(short, long, env = "HPRNG_BATCHES", default_value_t = 1)]
    batches: u32,

    /// Fixed seed for every case (wall clock seeding when omitted)
    #[arg(long, env = "HPRNG_SEED")]
    seed: Option<u64>,

    /// Directory for stores and reports
    #[arg(short, long, env = "HPRNG_OUTPUT_DIR", default_value = "results")]
    output_dir: PathBuf,

    /// Generator to test (can be repeated)
    #[arg(short, long = "generator", value_parser = parse_algorithm)]
    generators: Vec<Algorithm>,

    /// Test every registered generator
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "generators")]
    all: bool,

    /// Tent map slope of the chaos generators, in (1, 2)
    #[arg(long, env = "HPRNG_TENT_MU", default_value_t = ChaosParams::default().tent_mu)]
    tent_mu: f64,

    /// Logistic map parameter, in (3.57, 4]
    #[arg(long, env = "HPRNG_LOGISTIC_R", default_value_t = ChaosParams::default().logistic_r)]
    logistic_r: f64,

    /// Gauss map steepness of the chaos hybrids
    #[arg(long, env = "HPRNG_GAUSS_ALPHA", default_value_t = ChaosParams::default().gauss_alpha)]
    gauss_alpha: f64,

    /// Gauss map offset of the chaos hybrids, in (-1, 1)
    #[arg(long, allow_negative_numbers = true, env = "HPRNG_GAUSS_BETA", default_value_t = ChaosParams::default().gauss_beta)]
    gauss_beta: f64,

    /// Steepness of the standalone gauss map
    #[arg(long, env = "HPRNG_GAUSS_MAP_ALPHA", default_value_t = ChaosParams::gauss_map().gauss_alpha)]
    gauss_map_alpha: f64,

    /// Offset of the standalone gauss map, in (-1, 1)
    #[arg(long, allow_negative_numbers = true, env = "HPRNG_GAUSS_MAP_BETA", default_value_t = ChaosParams::gauss_map().gauss_beta)]
    gauss_map_beta: f64,

    /// Chebyshev map degree, at least 2
    #[arg(long, env = "HPRNG_CHEBYSHEV_DEGREE", default_value_t = ChaosParams::default().chebyshev_degree)]
    chebyshev_degree: u32,
}

impl SweepArgs {
    fn to_config(&self) -> SweepConfig {
        let algorithms = if self.all {
            Algorithm::all().collect()
        } else if self.generators.is_empty() {
            registry::DEFAULT_SELECTION.to_vec()
        } else {
            self.generators.clone()
        };
        let hybrid = ChaosParams {
            tent_mu: self.tent_mu,
            logistic_r: self.logistic_r,
            gauss_alpha: self.gauss_alpha,
            gauss_beta: self.gauss_beta,
            chebyshev_degree: self.chebyshev_degree,
        };
        let gauss_map = ChaosParams {
            gauss_alpha: self.gauss_map_alpha,
            gauss_beta: self.gauss_map_beta,
            ..hybrid
        };
        SweepConfig {
            m_initial: self.m_initial,
            m_multiplier: self.m_multiplier,
            m_limit: self.m_limit,
            alpha: self.alpha,
            n: self.n,
            reseed_fraction: self.reseed_fraction,
            chi_squared_bins: self.bins,
            timing_repetitions: self.timing_repetitions,
            batches: self.batches,
            seed_policy: self.seed.map_or(SeedPolicy::WallClock, SeedPolicy::Fixed),
            output_dir: self.output_dir.clone(),
            algorithms,
            chaos: ChaosSettings { hybrid, gauss_map },
        }
    }
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Directory holding the batch stores
    #[arg(short, long, env = "HPRNG_OUTPUT_DIR", default_value = "results")]
    dir: PathBuf,

    /// Also print the per modulus table of this generator (can be repeated)
    #[arg(short, long = "generator", value_parser = parse_algorithm)]
    generators: Vec<Algorithm>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ExportFormat {
    /// One ASCII digit per sample
    Ascii,
    /// Eight samples per byte
    Packed,
}

impl From<ExportFormat> for BitEncoding {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Ascii => BitEncoding::AsciiBits,
            ExportFormat::Packed => BitEncoding::Packed,
        }
    }
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Generator to sample
    #[arg(value_parser = parse_algorithm)]
    generator: Algorithm,

    /// Output file
    output: PathBuf,

    #[arg(short, long, default_value_t = 1_000_000)]
    m: u64,

    #[arg(short, long, default_value_t = 1_000_000)]
    n: usize,

    /// Tuning parameter
    #[arg(short, long, default_value_t = 5)]
    a: u64,

    #[arg(short = 'w', long, default_value_t = sequence::DEFAULT_RESEED_FRACTION)]
    reseed_fraction: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short, long, value_enum, default_value_t = ExportFormat::Packed)]
    format: ExportFormat,
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn sweep(args: &SweepArgs) -> Result<()> {
    let config = args.to_config();
    config.validate()?;
    info!(
        generators = config.algorithms.len(),
        batches = config.batches,
        output_dir = %config.output_dir.display(),
        "sweep configured"
    );
    let records = rng_testing::run_batches(&config)?;
    println!("Stored {} records in {}", records, config.output_dir.display());
    Ok(())
}

fn print_summary(args: &SummaryArgs) -> Result<()> {
    let rows = store::load_dir(&args.dir)?;
    info!(rows = rows.len(), dir = %args.dir.display(), "loaded results");
    println!("{}", summary::format_summary(&summary::summarize(&rows)));
    for generator in &args.generators {
        println!("\n{}", summary::format_generator_table(&rows, generator.name()));
    }
    Ok(())
}

fn export_sample(args: &ExportArgs) -> Result<()> {
    let request = SequenceRequest::new(args.m, args.n, args.a)?
        .with_reseed_fraction(args.reseed_fraction)?;
    let written = export::export_generated(
        args.generator,
        &request,
        args.seed,
        args.format.into(),
        &args.output,
    )?;
    println!(
        "Wrote {} to {}",
        utils::format_byte_count(written),
        args.output.display()
    );
    Ok(())
}

fn list_generators() {
    for alg in Algorithm::all() {
        let marker = if registry::DEFAULT_SELECTION.contains(&alg) {
            " (default)"
        } else {
            ""
        };
        println!("{}{}", alg, marker);
    }
}

fn main() -> ExitCode {
    let start = std::time::Instant::now();
    setup_logging();
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Sweep(args) => sweep(args),
        Command::Summary(args) => print_summary(args),
        Command::Export(args) => export_sample(args),
        Command::List => {
            list_generators();
            Ok(())
        }
    };
    if let Command::Sweep(_) = cli.command {
        println!("Full program runtime: {:?}", start.elapsed());
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
