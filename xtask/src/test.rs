use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suite {
    Unit,
    Integration,
    Doc,
}

impl Suite {
    fn label(self) -> &'static str {
        match self {
            Self::Unit => "Unit tests",
            Self::Integration => "Integration tests",
            Self::Doc => "Doc tests",
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Unit => &["test", "--lib", "--workspace"],
            // proptest suites and the mock-hardware scenarios live here
            Self::Integration => &["test", "--tests", "-p", "busfault", "-p", "firmware"],
            Self::Doc => &["test", "--doc", "-p", "busfault"],
        }
    }
}

fn selected(unit_only: bool, integration_only: bool) -> Vec<Suite> {
    match (unit_only, integration_only) {
        (true, false) => vec![Suite::Unit],
        (false, true) => vec![Suite::Integration],
        _ => vec![Suite::Unit, Suite::Integration, Suite::Doc],
    }
}

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for suite in selected(unit_only, integration_only) {
        println!("{}", format!("  Running {}...", suite.label().to_lowercase()).cyan());
        let start = Instant::now();

        let output = Command::new("cargo")
            .args(suite.args())
            .output()
            .with_context(|| format!("Failed to run {}", suite.label().to_lowercase()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            eprintln!("{}", format!("  ✗ {} failed", suite.label()).red().bold());
            eprintln!();
            for line in stdout.lines() {
                eprintln!("  {line}");
            }
            anyhow::bail!("{} failed", suite.label());
        }

        println!(
            "{}",
            format!(
                "  ✓ {} passed {} in {:.2}s",
                suite.label(),
                extract_test_summary(&stdout),
                start.elapsed().as_secs_f64()
            )
            .green()
        );
        println!();
    }

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn extract_test_summary(output: &str) -> String {
    // Look for lines like "test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out"
    output
        .lines()
        .find_map(|line| line.split("test result:").nth(1))
        .map_or_else(|| "(summary not available)".to_string(), |s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_taken_from_result_line() {
        let out = "running 3 tests\n\
                   test a ... ok\n\
                   test result: ok. 3 passed; 0 failed; 0 ignored\n";
        assert_eq!(extract_test_summary(out), "ok. 3 passed; 0 failed; 0 ignored");
        assert_eq!(extract_test_summary("nothing"), "(summary not available)");
    }

    #[test]
    fn flags_select_suites() {
        assert_eq!(selected(true, false), [Suite::Unit]);
        assert_eq!(selected(false, true), [Suite::Integration]);
        assert_eq!(selected(false, false).len(), 3);
        assert_eq!(selected(true, true).len(), 3);
    }
}
