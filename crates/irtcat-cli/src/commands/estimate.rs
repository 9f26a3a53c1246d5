//! The `irtcat estimate` command.

use std::path::PathBuf;

use anyhow::Result;

use irtcat_core::parser::load_item_bank_path;
use irtcat_core::{estimate_ability_eap, estimate_ability_mle, AbilityEstimate, Response};

use super::parse_list;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    item_bank: PathBuf,
    items: String,
    responses: String,
    method: String,
    initial_theta: f64,
    prior_mean: f64,
    prior_sd: f64,
    json: bool,
) -> Result<()> {
    let bank = load_item_bank_path(&item_bank)?;

    let ids: Vec<String> = parse_list(&items, "item id")?;
    let responses: Vec<Response> = parse_list(&responses, "response")?;
    let administered = bank.resolve(&ids)?;

    let estimate: AbilityEstimate = match method.to_lowercase().as_str() {
        "eap" => estimate_ability_eap(&responses, &administered, prior_mean, prior_sd)?,
        "mle" => estimate_ability_mle(&responses, &administered, initial_theta)?,
        other => anyhow::bail!("unknown estimation method '{other}' (expected eap or mle)"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        println!(
            "{} estimate from {} responses",
            method.to_uppercase(),
            responses.len()
        );
        println!("  theta = {:.4}", estimate.theta);
        println!("  SE    = {:.4}", estimate.standard_error);
    }

    Ok(())
}
