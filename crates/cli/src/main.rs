//! RNS Command Line Interface
//!
//! Hashing helpers, registrar configuration inspection and offline replay of
//! registrar/resolver scenarios against an in-memory deployment.

mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rns_registrar::RegistrarConfig;
use rns_types::{namehash, seal_bid, Address, Amount, LabelHash};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rns-cli")]
#[command(about = "RNS registrar and resolver tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Registrar config file (TOML); `RNS_*` environment variables override it
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: pretty or compact
    #[arg(long, global = true, default_value = "compact")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the namehash node of a dotted name
    Namehash {
        /// Dotted name, e.g. alice.rsk
        name: String,
    },
    /// Print the keccak-256 hash of a single label
    Labelhash { label: String },
    /// Print the commitment of a sealed bid
    Seal {
        #[arg(long)]
        label: String,
        #[arg(long)]
        bidder: Address,
        #[arg(long)]
        value: Amount,
        /// 32-byte salt as hex
        #[arg(long)]
        salt: String,
    },
    /// Print the effective registrar configuration as TOML
    Config,
    /// Replay a JSON scenario script and print the report
    Run {
        /// Path to the script
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Namehash { name } => println!("{}", namehash(&name)),
        Commands::Labelhash { label } => println!("{}", LabelHash::of(&label)),
        Commands::Seal {
            label,
            bidder,
            value,
            salt,
        } => {
            let salt = script::parse_salt(&salt)?;
            println!("{}", seal_bid(&LabelHash::of(&label), &bidder, value, &salt));
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Run { script: path } => {
            let config = load_config(cli.config.as_deref())?;
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            let parsed: script::Script = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse script {}", path.display()))?;

            let report = script::run(&parsed, config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.unexpected > 0 {
                anyhow::bail!("{} step(s) did not behave as expected", report.unexpected);
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Defaults, then the optional TOML file, then `RNS_*` overrides.
fn load_config(path: Option<&Path>) -> Result<RegistrarConfig> {
    let mut config = match path {
        Some(path) => RegistrarConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RegistrarConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("invalid RNS_* environment override")?;
    config.validate().context("invalid registrar config")?;
    info!(?config, "registrar config loaded");
    Ok(config)
}
