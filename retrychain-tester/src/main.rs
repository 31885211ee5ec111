mod logic;
mod util;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use colored::Colorize;
use log::info;
use retrychain_engine::{RunConfig, SolverMethod};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{ComparisonRow, ComparisonTester, resolve_seed_inputs};
use util::{load_run_config, split_csv};

#[derive(Debug, Parser)]
#[command(name = "retrychain-tester", version)]
#[command(about = "Cross-checks the analytic retry chain against seeded Monte Carlo runs")]
struct Args {
    /// JSON run configuration; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-attempt success probability, in (0, 1]
    #[arg(long, short = 'p')]
    success_probability: Option<f64>,

    /// Attempt budget per trial
    #[arg(long, short = 'n')]
    max_attempts: Option<u32>,

    /// Monte Carlo trials per seed
    #[arg(long)]
    trials: Option<u64>,

    /// Seeds to run (comma-separated integers, or `random`)
    #[arg(long, default_value = "")]
    seeds: String,

    /// Worker threads per run
    #[arg(long)]
    workers: Option<usize>,

    /// Analytic method: fundamental or closed_form
    #[arg(long)]
    method: Option<SolverMethod>,

    /// Largest accepted gap between analytic and empirical values
    #[arg(long, default_value_t = 0.01)]
    tolerance: f64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    check_tolerance(args.tolerance)?;
    let config = resolve_run_config(&args)?;
    let seed_tokens = split_csv(&args.seeds);
    let seeds = resolve_seed_inputs(&seed_tokens, config.random_seed)?;
    info!(
        "running {} comparison(s) with tolerance {}",
        seeds.len(),
        args.tolerance
    );

    let tester = ComparisonTester::new(args.tolerance, args.verbose);
    let rows = tester
        .run(&config, &seeds)
        .context("comparison run failed")?;

    write_reports(&args, &rows, start_time)?;

    if rows.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎲 Retry Chain Tester".bright_cyan().bold());
    println!("{}", "=====================".cyan());
}

fn check_tolerance(tolerance: f64) -> Result<()> {
    ensure!(
        tolerance.is_finite() && tolerance >= 0.0,
        "--tolerance must be a finite, non-negative number (got {tolerance})"
    );
    Ok(())
}

fn resolve_run_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    if let Some(p) = args.success_probability {
        config.success_probability = p;
    }
    if let Some(n) = args.max_attempts {
        config.max_attempts = n;
    }
    if let Some(trials) = args.trials {
        config.num_trials = trials;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(method) = args.method {
        config.method = method;
    }
    Ok(config)
}

fn write_reports(args: &Args, rows: &[ComparisonRow], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, rows)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, rows)?,
        _ => {
            let duration = start_time.elapsed();
            logic::reports::generate_console_report(&mut output_target, rows, duration)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SeedInfo;

    fn base_args() -> Args {
        Args {
            config: None,
            success_probability: None,
            max_attempts: None,
            trials: Some(2_000),
            seeds: "1337".to_string(),
            workers: None,
            method: None,
            tolerance: 0.05,
            report: "console".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn sample_rows() -> Vec<ComparisonRow> {
        let config = resolve_run_config(&base_args()).unwrap();
        ComparisonTester::new(0.05, false)
            .run(&config, &[SeedInfo::from_numeric(1337)])
            .unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args {
            success_probability: Some(0.25),
            max_attempts: Some(6),
            workers: Some(3),
            method: Some(SolverMethod::ClosedForm),
            ..base_args()
        };
        let config = resolve_run_config(&args).unwrap();
        assert!((config.success_probability - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 6);
        assert_eq!(config.num_trials, 2_000);
        assert_eq!(config.workers, 3);
        assert_eq!(config.method, SolverMethod::ClosedForm);
    }

    #[test]
    fn tolerance_must_be_finite_and_non_negative() {
        assert!(check_tolerance(0.0).is_ok());
        assert!(check_tolerance(0.01).is_ok());
        for bad in [f64::NAN, -0.01, f64::INFINITY] {
            let err = check_tolerance(bad).unwrap_err();
            assert!(err.to_string().contains("--tolerance"), "{bad} accepted");
        }
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join("retrychain-main-config.json");
        std::fs::write(
            &path,
            r#"{"success_probability": 0.3, "max_attempts": 5, "random_seed": 77}"#,
        )
        .unwrap();
        let args = Args {
            config: Some(path),
            max_attempts: Some(2),
            ..base_args()
        };
        let config = resolve_run_config(&args).unwrap();
        assert!((config.success_probability - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.random_seed, Some(77));
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = std::env::temp_dir().join("retrychain-test-report.json");
        let args = Args {
            report: "json".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &sample_rows(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("\"seed\": 1337"));
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let temp = std::env::temp_dir().join("retrychain-report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &sample_rows(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("## Detailed Results"));
    }

    #[test]
    fn write_reports_console_includes_total_time() {
        let temp = std::env::temp_dir().join("retrychain-report.txt");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &sample_rows(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
    }
}
