//! The `irtcat inspect` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use irtcat_core::irt::{item_characteristic_curve, test_information_curve};
use irtcat_core::parser::load_item_bank_path;
use irtcat_core::{information, probability, standard_error, test_information, ItemBank};

/// Abilities at which the curve table is evaluated.
const CURVE_POINTS: [f64; 9] = [-4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0];

pub fn execute(item_bank: PathBuf, theta: f64, curve: bool, item: Option<String>) -> Result<()> {
    let bank = load_item_bank_path(&item_bank)?;

    println!("Item bank: {} ({} items)", item_bank.display(), bank.len());
    print_items(&bank, theta);

    let info = test_information(theta, &bank);
    println!("\nAt theta = {theta:+.2}:");
    println!("  test information = {info:.4}");
    println!("  standard error   = {:.4}", standard_error(theta, &bank));

    if curve {
        print_curve(&bank, item.as_deref())?;
    }

    Ok(())
}

fn print_items(bank: &ItemBank, theta: f64) {
    let mut table = Table::new();
    table.set_header(vec!["Item", "Model", "a", "b", "c", "P(θ)", "I(θ)"]);

    for item in bank {
        table.add_row(vec![
            Cell::new(&item.item_id),
            Cell::new(item.model),
            Cell::new(format!("{:.3}", item.effective_discrimination())),
            Cell::new(format!("{:+.3}", item.difficulty)),
            Cell::new(format!("{:.3}", item.effective_guessing())),
            Cell::new(format!("{:.4}", probability(theta, item))),
            Cell::new(format!("{:.4}", information(theta, item))),
        ]);
    }

    println!("{table}");
}

fn print_curve(bank: &ItemBank, item_id: Option<&str>) -> Result<()> {
    let info = test_information_curve(bank.items(), &CURVE_POINTS);
    let icc = item_id
        .map(|id| {
            bank.get(id)
                .map(|item| item_characteristic_curve(item, &CURVE_POINTS))
                .with_context(|| format!("unknown item id: {id}"))
        })
        .transpose()?;

    let mut table = Table::new();
    let mut header = vec!["θ".to_string(), "Test info".to_string(), "SE".to_string()];
    if let Some(id) = item_id {
        header.push(format!("P(θ) {id}"));
    }
    table.set_header(header);

    for (i, (&theta, &total)) in CURVE_POINTS.iter().zip(&info).enumerate() {
        let se = if total > 0.0 {
            format!("{:.4}", 1.0 / total.sqrt())
        } else {
            "inf".to_string()
        };
        let mut row = vec![
            Cell::new(format!("{theta:+.1}")),
            Cell::new(format!("{total:.4}")),
            Cell::new(se),
        ];
        if let Some(icc) = &icc {
            row.push(Cell::new(format!("{:.4}", icc[i])));
        }
        table.add_row(row);
    }

    println!("\n{table}");
    Ok(())
}
