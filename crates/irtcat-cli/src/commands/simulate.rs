//! The `irtcat simulate` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use irtcat_core::report::SimulationReport;
use irtcat_core::simulate_batch;

use super::{parse_list, resolve_settings, TestOverrides};

pub fn execute(
    item_bank: Option<PathBuf>,
    true_theta: String,
    replications: usize,
    overrides: TestOverrides,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let settings = resolve_settings(item_bank, &overrides, config_path.as_deref())?;

    let thetas: Vec<f64> = parse_list(&true_theta, "true theta")?;
    anyhow::ensure!(!thetas.is_empty(), "at least one true theta is required");
    anyhow::ensure!(replications >= 1, "replications must be at least 1");

    let seed = settings.test.seed.unwrap_or_else(rand::random);

    eprintln!(
        "irtcat v{}: simulating {} abilities x {} replications over {} items (policy {}, seed {seed})",
        env!("CARGO_PKG_VERSION"),
        thetas.len(),
        replications,
        settings.bank.len(),
        settings.test.policy,
    );
    eprintln!();

    let started = Instant::now();
    let runs = simulate_batch(&settings.bank, &settings.test, &thetas, replications, seed)?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let report = SimulationReport::new(&settings.bank, settings.test.clone(), seed, runs, duration_ms);
    print_summary(&report);

    let output = output.unwrap_or(settings.config.output_dir);
    let path = output.join(report.file_name());
    report.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &SimulationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "True θ",
        "N",
        "Mean θ̂",
        "Bias",
        "RMSE",
        "Mean SE",
        "Avg items",
        "SE stop %",
    ]);

    for stats in &report.conditional {
        let se_stops = stats
            .stopping_reasons
            .get(&irtcat_core::StoppingReason::SeThresholdReached)
            .copied()
            .unwrap_or(0);
        table.add_row(vec![
            Cell::new(format!("{:+.2}", stats.true_theta)),
            Cell::new(stats.replications),
            Cell::new(format!("{:+.3}", stats.mean_estimate)),
            Cell::new(format!("{:+.3}", stats.bias)),
            Cell::new(format!("{:.3}", stats.rmse)),
            Cell::new(format!("{:.3}", stats.mean_se)),
            Cell::new(format!("{:.1}", stats.avg_items)),
            Cell::new(format!(
                "{:.1}%",
                se_stops as f64 / stats.replications.max(1) as f64 * 100.0
            )),
        ]);
    }

    println!("{table}");

    let summary = &report.summary;
    let correlation = summary
        .correlation
        .map(|r| format!("{r:.3}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "\nOverall: {} runs, bias {:+.3}, RMSE {:.3}, mean SE {:.3}, avg items {:.1}, r = {correlation} ({} ms)",
        summary.runs, summary.bias, summary.rmse, summary.mean_se, summary.avg_items, report.duration_ms
    );
}
