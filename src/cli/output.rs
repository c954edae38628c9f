//! Output formatting for CLI

use crate::{
    analysis::TelemetrySummary,
    pipeline::{ExperimentResult, MetricsSummary},
};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:22} {}", format!("{}:", key), value);
}

/// Print an experiment's aggregate outcome
pub fn print_result(result: &ExperimentResult, metrics: Option<&MetricsSummary>) {
    print_kv("Agent", &result.agent.to_string());
    print_kv("Runs", &result.runs.to_string());
    print_kv("Decisions", &result.total_decisions.to_string());
    print_kv("Mean reward", &format!("{:.4}", result.mean_reward));
    print_kv(
        "Off-lane runs",
        &format!("{} / {}", result.terminal_runs, result.runs),
    );
    print_kv(
        "Runs with cheats",
        &format!("{} / {}", result.cheat_runs, result.runs),
    );
    if let Some(metrics) = metrics {
        print_kv("Mean run length", &format!("{:.1}", metrics.mean_decisions));
        print_kv(
            "Driver distracted",
            &format!("{:.1}%", metrics.distraction_rate * 100.0),
        );
    }
}

/// Print telemetry summaries as an aligned table
pub fn print_summary_table(summaries: &[TelemetrySummary]) {
    let width = summaries
        .iter()
        .map(|s| s.scenario.len())
        .max()
        .unwrap_or(8)
        .max(8);
    println!(
        "{:width$}  {:>4}  {:>10}  {:>9}  {:>9}  {:>10}  {:>10}  {:>5}  {:>8}",
        "Scenario", "Runs", "Mean", "Std Dev", "Std Err", "Min", "Max", "Cheat", "Terminal"
    );
    for s in summaries {
        println!(
            "{:width$}  {:>4}  {:>10.4}  {:>9.4}  {:>9.4}  {:>10.4}  {:>10.4}  {:>5}  {:>8}",
            s.scenario,
            s.runs,
            s.mean_reward,
            s.std_dev,
            s.std_error,
            s.min,
            s.max,
            s.cheat_runs,
            s.terminal_runs
        );
    }
}
