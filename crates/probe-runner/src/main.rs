use clap::Parser;
use probe_runner::{logging, SuiteConfig, SuiteRunner};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs contract conformance suites", long_about = None)]
struct Args {
    /// Suite file path
    #[arg(short, long, default_value = "suite.toml")]
    config: PathBuf,

    /// Overrides logging.level from the suite file
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn run(args: Args) -> anyhow::Result<bool> {
    let suite = SuiteConfig::load(&args.config)?;

    let mut log_cfg = suite.logging.clone();
    if let Some(level) = args.log_level {
        log_cfg.level = level;
    }
    log_cfg.json |= args.json_logs;
    logging::init(&log_cfg)?;

    tracing::info!(
        "Running {} case(s) from {}",
        suite.cases.len(),
        args.config.display()
    );

    let mut runner = SuiteRunner::new(suite.engine.clone())?;
    let report = runner.run(&suite.cases);
    println!("{}", report);

    Ok(report.passed())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
