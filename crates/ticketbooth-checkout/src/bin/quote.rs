//! # Price Quote Tool
//!
//! Prices a checkout from a JSON file without opening a session.
//!
//! ## Usage
//! ```bash
//! # Quote a request file
//! cargo run -p ticketbooth-checkout --bin quote -- request.json
//!
//! # Read the request from stdin, with an explicit config file
//! cat request.json | cargo run -p ticketbooth-checkout --bin quote -- --config ./checkout.toml
//! ```
//!
//! Prints the `QuoteResponse` as pretty JSON on stdout. Logging goes to
//! stderr; set `RUST_LOG=debug` for more.

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ticketbooth_checkout::{CachingFeeCalculator, CheckoutConfig, QuoteRequest};
use ticketbooth_core::pricing::CardRateFeeCalculator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ticketbooth=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("Ticketbooth Price Quote");
    println!();
    println!("Usage: quote [OPTIONS] [FILE]");
    println!();
    println!("Reads a JSON quote request from FILE (or stdin) and prints the breakdown.");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut input_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => input_path = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let config = CheckoutConfig::load(config_path).context("loading checkout config")?;
    debug!(?config, "Config loaded");

    let raw = match &input_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading request from stdin")?;
            buf
        }
    };

    let request: QuoteRequest = serde_json::from_str(&raw).context("parsing quote request")?;
    let fees = CachingFeeCalculator::new(
        CardRateFeeCalculator::default(),
        Arc::new(config.build_fee_cache()),
    );

    let response = request.quote(&config, &fees).context("pricing request")?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
