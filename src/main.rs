use std::{process::ExitCode, time::Duration};

use clap::Parser;
use log::{error, info, LevelFilter};

use holesynth::{
    config::{
        Config, IntRange, OraclePolicy, SearchConfig, Strategy, DEFAULT_DEPTH_LIMIT,
        DEFAULT_INITIAL_DEPTH, DEFAULT_INT_RANGE, DEFAULT_ITERATION_BUDGET,
        DEFAULT_ORACLE_TIMEOUT,
    },
    error::ConfigError,
    problems::Problem,
    search::{synthesize, Outcome},
};

/// Fills the holes of a built-in program by enumerating grammar derivations
/// and checking each candidate with z3.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(value_enum)]
    problem: Problem,
    #[arg(long, value_enum, default_value_t = Strategy::LeftToRight)]
    strategy: Strategy,
    /// Maximum number of candidates to check.
    #[arg(long, default_value_t = DEFAULT_ITERATION_BUDGET)]
    budget: usize,
    #[arg(long, default_value_t = DEFAULT_INITIAL_DEPTH)]
    initial_depth: u32,
    #[arg(long, default_value_t = DEFAULT_DEPTH_LIMIT)]
    depth_limit: u32,
    /// Smallest value integer slots take.
    #[arg(long, default_value_t = DEFAULT_INT_RANGE.start, allow_hyphen_values = true)]
    int_min: i64,
    /// One past the largest value integer slots take.
    #[arg(long, default_value_t = DEFAULT_INT_RANGE.end, allow_hyphen_values = true)]
    int_max: i64,
    /// Do not repeat candidates found by a shallower pass.
    #[arg(long)]
    resume: bool,
    /// Solver timeout per candidate, 0 to disable.
    #[arg(long, default_value_t = DEFAULT_ORACLE_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    #[arg(long, value_enum, default_value_t = OraclePolicy::Abort)]
    on_oracle_error: OraclePolicy,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            search: SearchConfig {
                initial_depth: self.initial_depth,
                depth_limit: self.depth_limit,
                strategy: self.strategy,
                int_range: IntRange::new(self.int_min, self.int_max)?,
                resume: self.resume,
            },
            iteration_budget: self.budget,
            oracle_timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            oracle_policy: self.on_oracle_error,
        })
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    colog::default_builder()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .init();

    info!("Started");

    let config = match args.config() {
        Ok(x) => x,
        Err(e) => {
            error!("Bad arguments: {e}");
            return ExitCode::FAILURE;
        },
    };

    let program = match args.problem.build() {
        Ok(x) => x,
        Err(e) => {
            error!("Bad problem definition: {e}");
            return ExitCode::FAILURE;
        },
    };

    let z3_cfg = z3::Config::new();
    let z3 = z3::Context::new(&z3_cfg);

    match synthesize(&z3, &program, &config) {
        Ok(Outcome::Solved { candidate, iterations }) => {
            println!("{candidate}");
            info!("Solved in {iterations} iterations");
            ExitCode::SUCCESS
        },
        Ok(Outcome::Exhausted { reason, iterations }) => {
            println!("no solution found ({reason:?} after {iterations} iterations)");
            ExitCode::FAILURE
        },
        Ok(Outcome::OracleFailed { candidate, error, iterations }) => {
            error!("Oracle failed on {candidate} at iteration {iterations}: {error}");
            ExitCode::FAILURE
        },
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}
