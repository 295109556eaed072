use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "pagegraph workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the substrate benchmarks at several concurrency levels
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Concurrency levels to measure
        #[arg(long, value_delimiter = ',', default_values_t = [1usize, 2, 4, 8])]
        concurrency: Vec<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            concurrency,
        } => {
            if !report_only {
                run_benchmarks(quick, &concurrency)?;
            }
            generate_report(&concurrency)?;
        }
    }

    Ok(())
}

fn baseline(concurrency: usize) -> String {
    format!("c{concurrency}")
}

fn run_benchmarks(quick: bool, levels: &[usize]) -> Result<()> {
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", "substrate", "--release"])
        .status()?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    for &concurrency in levels {
        println!("\n>>> Benchmarking with concurrency {concurrency}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("PAGEGRAPH_BENCH_CONCURRENCY", concurrency.to_string())
            .args(["bench", "--bench", "substrate", "--"])
            .arg("--save-baseline")
            .arg(baseline(concurrency));

        if quick {
            cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run bench at concurrency {concurrency}"))?;

        if status.success() {
            println!("Finished concurrency {concurrency} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: Benchmark failed at concurrency {concurrency}");
        }
    }

    Ok(())
}

fn generate_report(levels: &[usize]) -> Result<()> {
    println!("\n>>> Generating Report...");
    let mut results: HashMap<String, HashMap<String, f64>> = HashMap::new();

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }
    collect_results(criterion_dir, criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)?;

    writeln!(file, "# Substrate Scaling Report")?;
    writeln!(file)?;

    let mut workloads: Vec<_> = results.keys().collect();
    workloads.sort();

    write!(file, "| Workload |")?;
    for &c in levels {
        write!(file, " c={c} (ops/s) | vs c={} |", levels[0])?;
    }
    writeln!(file)?;
    write!(file, "|---|")?;
    for _ in levels {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for workload in workloads {
        write!(file, "| {workload} |")?;
        let by_level = &results[workload];
        let first = levels
            .first()
            .and_then(|&c| by_level.get(&baseline(c)))
            .copied()
            .unwrap_or(0.0);

        for &c in levels {
            match by_level.get(&baseline(c)) {
                Some(&ops) => {
                    let rel = if first > 0.0 { ops / first } else { 0.0 };
                    write!(file, " {} | **{rel:.2}x** |", format_ops(ops))?;
                }
                None => write!(file, " N/A | - |")?,
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
}

/// Walks `target/criterion`, whose layout is `<group>/<bench>[/<param>]/<baseline>/estimates.json`.
fn collect_results(root: &Path, dir: &Path, results: &mut HashMap<String, HashMap<String, f64>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(root, &path, results);
            continue;
        }
        if file_name(&path).as_deref() != Some("estimates.json") {
            continue;
        }
        let Some(baseline_dir) = path.parent() else {
            continue;
        };
        let Some(workload_dir) = baseline_dir.parent() else {
            continue;
        };
        let Some(baseline_name) = file_name(baseline_dir) else {
            continue;
        };
        if baseline_name == "report" || baseline_name == "new" || baseline_name == "base" {
            continue;
        }
        let workload_name = workload_dir
            .strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        // Throughput from benchmark.json, if the group declared one.
        let elements = fs::read_to_string(baseline_dir.join("benchmark.json"))
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
            .and_then(|json| json.get("throughput")?.get("Elements")?.as_f64());

        let mean_ns = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
            .and_then(|json| json.get("mean")?.get("point_estimate")?.as_f64());

        if let Some(time_ns) = mean_ns.filter(|&t| t > 0.0) {
            let metric = elements.unwrap_or(1.0) * 1e9 / time_ns;
            results
                .entry(workload_name)
                .or_default()
                .insert(baseline_name, metric);
        }
    }
}
