//! Console report output
//!
//! Progress lines, per-probe results and the final score summary. This is
//! user-facing output on stdout, separate from the tracing logs.

use colored::{ColoredString, Colorize};
use goodcheck_core::evaluator::{EvaluationObserver, ScoreGroup};
use goodcheck_core::probe::ProbeReport;
use goodcheck_core::{Error, Evaluation, PassResult, ProbeStatus, Strategy, StrategyResult};

const SEPARATOR: &str = "----------------------------------------";

/// Prints evaluation progress as it happens
pub struct ConsoleReporter {
    total_checks: u32,
}

impl ConsoleReporter {
    /// Reporter for passes of `total_checks` probes
    pub fn new(total_checks: u32) -> Self {
        Self { total_checks }
    }
}

impl EvaluationObserver for ConsoleReporter {
    fn strategy_started(&mut self, strategy: &Strategy, total: usize) {
        println!();
        println!("{SEPARATOR}");
        println!(
            "{} {}",
            format!("Strategy {}/{total}:", strategy.index).bold(),
            strategy.text
        );
    }

    fn strategy_aborted(&mut self, _strategy: &Strategy, error: &Error) {
        println!("{} Failed to start shaper: {error}", "✗".red());
    }

    fn pass_completed(&mut self, _strategy: &Strategy, pass: u8, passes: u8, result: &PassResult) {
        println!();
        println!("Pass {pass} of {passes}");
        for report in &result.reports {
            println!("{}", colorize(report.outcome.status, probe_line(report)));
        }
        println!(
            "Pass result: {}/{} ({})",
            result.score(),
            self.total_checks,
            result.summary
        );
    }

    fn strategy_scored(&mut self, result: &StrategyResult) {
        println!(
            "Worst pass: {}/{} ({})",
            result.score, self.total_checks, result.summary
        );
    }
}

/// Print the grouped score summary and the winning strategies
pub fn print_summary(evaluation: &Evaluation) {
    let ranking = evaluation.ranking();

    if !ranking.is_empty() {
        println!();
        println!("{}", "Summary by number of successful checks:".bold());
        for group in ranking.groups() {
            println!("{}", group_line(group));
        }
    }

    if let Some(winners) = ranking.winners() {
        println!();
        println!("{}", "Best strategies (by success count):".green().bold());
        for result in &winners.results {
            println!("* {} -> {}", result.strategy.text, result.summary);
        }
    }

    if !evaluation.aborted.is_empty() {
        println!();
        println!("{}", "Skipped strategies (shaper failed to start):".yellow().bold());
        for aborted in &evaluation.aborted {
            println!("* {} -> {}", aborted.strategy, aborted.error);
        }
    }

    if evaluation.interrupted {
        println!();
        println!("{}", "Evaluation interrupted, results are partial.".yellow());
    }
}

/// Print a non-fatal warning line
pub fn warning(message: &str) {
    println!("{} {message}", "Warning:".yellow().bold());
}

fn probe_line(report: &ProbeReport) -> String {
    let outcome = &report.outcome;
    format!(
        "Test {} ({}) #{}/{} - {} (HTTP {}, bytes {}, IP {}, error {})",
        report.case.id,
        report.case.provider,
        report.attempt,
        report.repeats,
        outcome.status_text,
        outcome.http_code,
        outcome.bytes_downloaded,
        outcome.remote_ip,
        outcome.error_message
    )
}

fn group_line(group: &ScoreGroup) -> String {
    let joined = group
        .results
        .iter()
        .map(|r| format!("{} ({})", r.strategy.text, r.summary))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} successes - Strategies: {joined}", group.score)
}

fn colorize(status: ProbeStatus, line: String) -> ColoredString {
    match status {
        ProbeStatus::Ok => line.green(),
        ProbeStatus::Warn => line.yellow(),
        ProbeStatus::Detected => line.red(),
        ProbeStatus::Fail => line.bright_red(),
    }
}
