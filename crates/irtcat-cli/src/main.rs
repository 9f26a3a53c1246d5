//! irtcat CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::TestOverrides;

#[derive(Parser)]
#[command(name = "irtcat", version, about = "IRT computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate adaptive tests for examinees of known ability
    Simulate {
        /// Item bank file (.json/.toml) or directory
        #[arg(long)]
        item_bank: Option<PathBuf>,

        /// True abilities to simulate (comma-separated)
        #[arg(long, default_value = "-2,-1,0,1,2", allow_hyphen_values = true)]
        true_theta: String,

        /// Replications per true ability
        #[arg(long, default_value = "50")]
        replications: usize,

        #[command(flatten)]
        overrides: TestOverrides,

        /// Output directory for the JSON report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Estimate ability from a fixed response pattern
    Estimate {
        /// Item bank file (.json/.toml) or directory
        #[arg(long)]
        item_bank: PathBuf,

        /// Administered item ids (comma-separated)
        #[arg(long)]
        items: String,

        /// Responses, 1 = correct, 0 = incorrect (comma-separated)
        #[arg(long)]
        responses: String,

        /// Estimation method: eap or mle
        #[arg(long, default_value = "eap")]
        method: String,

        /// Starting point for MLE
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        initial_theta: f64,

        /// EAP prior mean
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        prior_mean: f64,

        /// EAP prior standard deviation
        #[arg(long, default_value = "1.0")]
        prior_sd: f64,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show item probability and information at an ability level
    Inspect {
        /// Item bank file (.json/.toml) or directory
        #[arg(long)]
        item_bank: PathBuf,

        /// Ability level to evaluate at
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        theta: f64,

        /// Also print the test information curve over [-4, 4]
        #[arg(long)]
        curve: bool,

        /// Add this item's characteristic curve to the curve table
        #[arg(long, requires = "curve")]
        item: Option<String>,
    },

    /// Run a live adaptive test on the console
    Administer {
        /// Item bank file (.json/.toml) or directory
        #[arg(long)]
        item_bank: Option<PathBuf>,

        #[command(flatten)]
        overrides: TestOverrides,

        /// Write the assessment result to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate item bank files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        item_bank: PathBuf,
    },

    /// Create starter config and example item bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("irtcat=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            item_bank,
            true_theta,
            replications,
            overrides,
            output,
            config,
        } => commands::simulate::execute(
            item_bank,
            true_theta,
            replications,
            overrides,
            output,
            config,
        ),
        Commands::Estimate {
            item_bank,
            items,
            responses,
            method,
            initial_theta,
            prior_mean,
            prior_sd,
            json,
        } => commands::estimate::execute(
            item_bank,
            items,
            responses,
            method,
            initial_theta,
            prior_mean,
            prior_sd,
            json,
        ),
        Commands::Inspect {
            item_bank,
            theta,
            curve,
            item,
        } => commands::inspect::execute(item_bank, theta, curve, item),
        Commands::Administer {
            item_bank,
            overrides,
            output,
            config,
        } => commands::administer::execute(item_bank, overrides, output, config),
        Commands::Validate { item_bank } => commands::validate::execute(item_bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
