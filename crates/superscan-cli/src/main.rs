//! SuperScan: scan a storage backend, print its tree, and mirror or sample
//! it onto local disk.

mod cli;
mod run;

use clap::Parser;
use superscan_core::{Config, CoreError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let result = match load_config(&args) {
        Ok(config) => {
            init_tracing(&args, &config);
            run::run(&args, &config).await
        }
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        if is_not_found(&err) {
            eprintln!("\n{}", run::not_found_tips());
        }
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::load_default()?,
    };
    Ok(config)
}

/// `RUST_LOG` wins; otherwise `-v` selects debug, else the configured level.
fn init_tracing(args: &Args, config: &Config) {
    let fallback = if args.verbose {
        "superscan=debug".to_string()
    } else {
        format!("superscan={}", config.general.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<CoreError>().is_some_and(CoreError::is_not_found))
}
