use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Crate whose docs are the entry point (report layout, decoder modules).
const INDEX: &str = "target/doc/busfault/index.html";

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let start = Instant::now();

    // busfault is documented with its std feature so the std::error::Error
    // impls show up; firmware's hardware items are not built on the host.
    let mut cmd = Command::new("cargo");
    cmd.args(["doc", "--workspace", "--no-deps", "--features", "busfault/std"]);
    if open {
        cmd.arg("--open");
    }

    let output = cmd.output().context("Failed to build documentation")?;
    if !output.status.success() {
        eprintln!("{}", "✗ Documentation build failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Documentation build failed");
    }

    println!(
        "{}",
        format!("✓ Documentation built in {:.2}s", start.elapsed().as_secs_f64()).green()
    );
    if !open {
        println!("   {}", format!("Open {INDEX} in your browser").dimmed());
    }
    println!();

    Ok(())
}
