use colored::Colorize;
use log::debug;
use retrychain_engine::{ChainError, ComparisonReport, RunConfig, run_comparison};
use serde::Serialize;
use std::time::{Duration, Instant};

use super::SeedInfo;

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    #[serde(flatten)]
    pub report: ComparisonReport,
    pub passed: bool,
    pub tolerance: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub struct ComparisonTester {
    tolerance: f64,
    verbose: bool,
}

impl ComparisonTester {
    pub const fn new(tolerance: f64, verbose: bool) -> Self {
        Self { tolerance, verbose }
    }

    /// Run one comparison per seed against `base`.
    ///
    /// # Errors
    ///
    /// Stops at the first engine error; invalid parameters fail every seed
    /// equally so there is nothing to gain from continuing.
    pub fn run(
        &self,
        base: &RunConfig,
        seeds: &[SeedInfo],
    ) -> Result<Vec<ComparisonRow>, ChainError> {
        let mut rows = Vec::with_capacity(seeds.len());

        for info in seeds {
            if self.verbose {
                println!(
                    "🧪 Comparing p={} n={} over {} trials (seed: {})",
                    base.success_probability,
                    base.max_attempts,
                    base.num_trials,
                    info.label().bright_white()
                );
            }

            let config = base.clone().with_seed(info.seed);
            let started = Instant::now();
            let report = run_comparison(&config)?;
            let row = self.evaluate(report, started.elapsed());
            debug!(
                "seed {} finished in {:?} ({} failures)",
                row.report.seed,
                row.duration,
                row.failures.len()
            );
            rows.push(row);
        }

        Ok(rows)
    }

    fn evaluate(&self, report: ComparisonReport, duration: Duration) -> ComparisonRow {
        let failures: Vec<String> = report
            .drifted(self.tolerance)
            .into_iter()
            .map(|(label, delta)| {
                format!(
                    "{label} drifted by {delta:+.6} (tolerance {})",
                    self.tolerance
                )
            })
            .collect();

        ComparisonRow {
            passed: report.within(self.tolerance),
            tolerance: self.tolerance,
            failures,
            duration,
            report,
        }
    }
}

mod duration_serde {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }
}
