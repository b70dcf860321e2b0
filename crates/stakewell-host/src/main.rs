// crates/stakewell-host/src/main.rs
//
// Binary entrypoint for a Stakewell host.
//
// Loads configuration, initializes tracing, deploys the protocol at the
// current wall-clock time, and prints the requested artifacts.

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use stakewell_host::{init_tracing, Protocol, ProtocolConfig};

/// Stakewell host: staking with cooldown plus multi-asset incentives.
#[derive(Parser, Debug)]
#[command(name = "stakewell", version = "0.1.0", about = "Stakewell reward-accrual host")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "stakewell.toml")]
    config: String,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Print the freshly deployed protocol state as JSON.
    #[arg(long)]
    dump_state: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Fall back to defaults when the file is missing; the warning is logged
    // once tracing is up.
    let (config, load_error) = match ProtocolConfig::load(&args.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (ProtocolConfig::default(), Some(e.to_string())),
    };

    init_tracing(&config.log_level);
    match load_error {
        None => tracing::info!("Loaded configuration from {}", args.config),
        Some(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    if args.print_config {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let protocol = Protocol::new(&config, now)?;

    tracing::info!(
        "{} ({}) deployed at {}",
        protocol.staking().name(),
        protocol.staking().symbol(),
        protocol.staking().address()
    );
    tracing::info!(
        "Cooldown {}s, unstake window {}s, staking emissions end at {}",
        protocol.staking().cooldown_seconds(),
        protocol.staking().unstake_window(),
        protocol.staking().distribution_end()
    );
    tracing::info!(
        "Incentives controller {} pays {} from vault {} (premium {}%), emissions end at {}",
        protocol.incentives().address(),
        protocol.incentives().reward_token(),
        protocol.incentives().rewards_vault(),
        protocol.incentives().extra_premium_percent(),
        protocol.incentives().distribution_end()
    );

    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(&protocol.snapshot())?);
    }
    Ok(())
}
