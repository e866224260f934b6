//! UID Gatekeeper
//!
//! Answers access requests from an RFID/NFC reader attached over a serial
//! link. The reader sends one UID per line; the gatekeeper replies
//! `GRANTED` or `DENIED` depending on whether the UID is on the allow-list.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the first tty-like serial port
//! uid-gatekeeper run
//!
//! # Serve on a specific port with a config file
//! uid-gatekeeper -c gatekeeper.toml run -p /dev/ttyACM0
//!
//! # List available serial ports (requires serial feature)
//! uid-gatekeeper ports
//!
//! # Check a UID against the configured allow-list without a reader
//! uid-gatekeeper check 12345ABC
//!
//! # Print the default configuration
//! uid-gatekeeper generate config
//! ```

mod access;
mod config;
mod error;
mod gate;
mod serial;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use config::{DecodePolicy, GatekeeperConfig};

/// UID Gatekeeper
///
/// Serial-link access gatekeeper for RFID/NFC readers
#[derive(Parser)]
#[command(name = "uid-gatekeeper")]
#[command(version)]
#[command(about = "Validates reader UIDs against an allow-list over a serial link")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve access requests from the reader (requires --features serial)
    #[cfg(feature = "serial")]
    Run(RunArgs),

    /// List available serial ports
    #[cfg(feature = "serial")]
    Ports,

    /// Show the decision for a UID without touching the serial port
    Check {
        /// UID as the reader would send it
        uid: String,
    },

    /// Generate configuration files
    #[command(subcommand)]
    Generate(GenerateCommands),
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Serial port path (e.g., /dev/ttyUSB0); auto-detected if omitted
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Seconds without data before the wait window restarts
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Allowed UID (repeatable); replaces the configured allow-list
    #[arg(short, long = "allow")]
    allow: Vec<String>,

    /// Drop lines that are not valid UTF-8 instead of stopping
    #[arg(long)]
    skip_malformed: bool,

    /// Append every decision to this file
    #[arg(long)]
    audit_log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Generate a gatekeeper.toml with the effective settings
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = dispatch(cli) {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        #[cfg(feature = "serial")]
        Commands::Run(args) => handle_run(apply_run_args(config, args)),
        #[cfg(feature = "serial")]
        Commands::Ports => {
            serial::port::print_ports(&config.device_pattern)?;
            Ok(())
        }
        Commands::Check { uid } => handle_check(&config, &uid, cli.verbose),
        Commands::Generate(cmd) => handle_generate(&config, cmd),
    }
}

fn load_config(path: Option<&Path>) -> Result<GatekeeperConfig> {
    match path {
        Some(path) => {
            let config = GatekeeperConfig::load(path)?;
            log::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(GatekeeperConfig::default()),
    }
}

/// Command-line flags take precedence over the config file
fn apply_run_args(mut config: GatekeeperConfig, args: RunArgs) -> GatekeeperConfig {
    if args.port.is_some() {
        config.port = args.port;
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(timeout) = args.timeout {
        config.session_timeout_secs = timeout;
    }
    if !args.allow.is_empty() {
        config.allowed_uids = args.allow;
    }
    if args.skip_malformed {
        config.on_decode_error = DecodePolicy::Skip;
    }
    if args.audit_log.is_some() {
        config.audit_log = args.audit_log;
    }
    config
}

#[cfg(feature = "serial")]
fn handle_run(config: GatekeeperConfig) -> Result<()> {
    use gate::MonotonicClock;
    use serial::{PortConfig, SerialConnection};

    let started = gate::startup(
        &config,
        MonotonicClock::new(),
        serial::port::list_ports,
        |path| {
            SerialConnection::open(
                PortConfig::new(path)
                    .with_baud_rate(config.baud_rate)
                    .with_timeout(config.poll_interval()),
            )
        },
    );

    let (path, mut gatekeeper) = match started {
        Ok(ready) => ready,
        Err(e) => {
            // the error itself is reported once, by main
            if let Some(hint) = startup_hint(&e) {
                eprintln!("{}", hint.yellow());
            }
            return Err(e).context("Gatekeeper startup failed");
        }
    };

    println!(
        "{} Using serial port: {} (baud: {})",
        "[OK]".green().bold(),
        path.white().bold(),
        config.baud_rate
    );
    println!("{}", "--- Gatekeeper Started ---".cyan().bold());

    let outcome = gatekeeper.run();
    print_summary(&gatekeeper.stats());
    // closes the port before the error is reported
    drop(gatekeeper);

    match outcome {
        Ok(never) => match never {},
        Err(e) => Err(e).with_context(|| format!("Gatekeeper on {} stopped", path)),
    }
}

/// Operator hint printed ahead of a startup error
fn startup_hint(err: &error::GateError) -> Option<&'static str> {
    match err {
        error::GateError::NoDeviceFound { .. } => {
            Some("Use -p to specify port manually, or 'uid-gatekeeper ports' to list ports")
        }
        error::GateError::PortOpen { .. } => {
            Some("Check that no other program holds the port and that you are in the 'dialout' group")
        }
        _ => None,
    }
}

#[cfg(feature = "serial")]
fn print_summary(stats: &gate::GateStats) {
    println!("\n{}", "=".repeat(60).dimmed());
    println!("{}", "--- Gatekeeper Summary ---".cyan().bold());
    println!("Granted: {}", stats.granted.to_string().green());
    println!("Denied: {}", stats.denied.to_string().red());
    println!("Timeouts: {}", stats.timeouts);
    if stats.skipped > 0 {
        println!("Malformed lines skipped: {}", stats.skipped.to_string().yellow());
    }
    println!("{}", "=".repeat(60).dimmed());
}

fn handle_check(config: &GatekeeperConfig, uid: &str, verbose: bool) -> Result<()> {
    config.validate()?;
    let allow_list = config.allow_list();

    if verbose {
        println!("Allow-list: {}", allow_list.sorted().join(", ").dimmed());
    }

    let decision = allow_list.decide(uid);
    if decision.is_granted() {
        println!("{} {} -> {}", "[OK]".green().bold(), uid.trim(), decision);
        Ok(())
    } else {
        println!("{} {} -> {}", "[DENIED]".red().bold(), uid.trim(), decision);
        std::process::exit(1);
    }
}

fn handle_generate(config: &GatekeeperConfig, cmd: GenerateCommands) -> Result<()> {
    match cmd {
        GenerateCommands::Config { output } => {
            let text = config.to_toml()?;

            if let Some(path) = output {
                std::fs::write(&path, &text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "{} Configuration written to {}",
                    "[OK]".green().bold(),
                    path.display()
                );
            } else {
                println!("{}", text);
            }
        }
    }

    Ok(())
}
