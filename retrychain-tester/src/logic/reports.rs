use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ComparisonRow;

pub fn generate_console_report(
    out: &mut dyn Write,
    rows: &[ComparisonRow],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Retry Chain Comparison".bright_cyan().bold())?;
    writeln!(out, "{}", "=========================".cyan())?;

    let total = rows.len();
    let passed = rows.iter().filter(|r| r.passed).count();
    writeln!(out, "Seeds compared: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for row in rows {
        let status = if row.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        let report = &row.report;
        writeln!(
            out,
            "{} seed {} (p={}, n={}, {} trials, {} workers, {})",
            status,
            report.seed.to_string().bold(),
            report.success_probability,
            report.max_attempts,
            report.num_trials,
            report.workers,
            report.method
        )?;
        writeln!(
            out,
            "   {:<22}{:>12}{:>12}{:>12}",
            "", "analytic", "empirical", "delta"
        )?;
        for (label, analytic, empirical, delta) in [
            (
                "P(success)",
                report.analytic_success_probability,
                report.empirical_success_probability,
                report.success_delta(),
            ),
            (
                "P(failure)",
                report.analytic_failure_probability,
                report.empirical_failure_probability,
                report.failure_delta(),
            ),
            (
                "E[attempts]",
                report.analytic_expected_attempts,
                report.empirical_mean_attempts,
                report.mean_attempts_delta(),
            ),
        ] {
            writeln!(
                out,
                "   {label:<22}{analytic:>12.6}{empirical:>12.6}{delta:>+12.6}"
            )?;
        }
        writeln!(
            out,
            "   Successes by attempt: {:?}",
            report.success_by_attempt
        )?;
        if !row.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &row.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, rows: &[ComparisonRow]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(rows)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, rows: &[ComparisonRow]) -> Result<()> {
    writeln!(out, "# Retry Chain Comparison\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    let total = rows.len();
    let passed = rows.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Seeds compared**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}\n", total - passed)?;

    writeln!(out, "## Detailed Results\n")?;
    for row in rows {
        let status = if row.passed { "✅" } else { "❌" };
        let report = &row.report;
        writeln!(out, "### {status} Seed {}\n", report.seed)?;
        writeln!(
            out,
            "- **Parameters**: p = {}, n = {}, {} trials, {} workers, {} method",
            report.success_probability,
            report.max_attempts,
            report.num_trials,
            report.workers,
            report.method
        )?;
        writeln!(out, "- **Tolerance**: {}\n", row.tolerance)?;
        writeln!(out, "| Quantity | Analytic | Empirical | Delta |")?;
        writeln!(out, "|---|---:|---:|---:|")?;
        writeln!(
            out,
            "| P(success) | {:.6} | {:.6} | {:+.6} |",
            report.analytic_success_probability,
            report.empirical_success_probability,
            report.success_delta()
        )?;
        writeln!(
            out,
            "| P(failure) | {:.6} | {:.6} | {:+.6} |",
            report.analytic_failure_probability,
            report.empirical_failure_probability,
            report.failure_delta()
        )?;
        writeln!(
            out,
            "| E[attempts] | {:.6} | {:.6} | {:+.6} |",
            report.analytic_expected_attempts,
            report.empirical_mean_attempts,
            report.mean_attempts_delta()
        )?;
        if !row.failures.is_empty() {
            writeln!(out, "\n- **Failures**:")?;
            for failure in &row.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{ComparisonTester, SeedInfo};
    use retrychain_engine::RunConfig;

    fn sample_rows() -> Vec<ComparisonRow> {
        let config = RunConfig {
            num_trials: 5_000,
            ..RunConfig::default()
        };
        ComparisonTester::new(0.05, false)
            .run(&config, &[SeedInfo::from_numeric(21)])
            .unwrap()
    }

    #[test]
    fn console_report_lists_each_quantity() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &sample_rows(), Duration::from_millis(5)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("P(success)"));
        assert!(text.contains("E[attempts]"));
        assert!(text.contains("seed 21"));
    }

    #[test]
    fn json_report_is_an_array() {
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &sample_rows()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["seed"], 21);
    }

    #[test]
    fn markdown_report_has_table() {
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &sample_rows()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("# Retry Chain Comparison"));
        assert!(text.contains("| P(failure) |"));
    }
}
