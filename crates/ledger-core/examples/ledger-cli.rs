//! Oasis Ledger CLI Example
//!
//! This example demonstrates how to use the Oasis Ledger client library
//! with the native USB HID transport on macOS, Linux, and Windows.
//!
//! # Prerequisites
//!
//! - A Ledger device with the Oasis app installed and open
//! - On Linux, udev rules granting access to Ledger devices
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --example ledger-cli -p oasis-ledger-core --features hid -- list
//! cargo run --example ledger-cli -p oasis-ledger-core --features hid -- version
//! cargo run --example ledger-cli -p oasis-ledger-core --features hid -- address --show
//! ```
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list [path]` | List connected devices with their app version and address |
//! | `version` | Show the version of the first supported Oasis app |
//! | `address [path] [--show]` | Get the address for a path, optionally confirming on screen |
//! | `sign <path> <context-hex> <tx-hex>` | Sign a transaction |
//!
//! Paths default to `44/474/0/0/0`; every index is hardened on the wire. A
//! path whose first index is exactly `43` (not `43'`) talks to the Validator
//! app.
//!
//! # Configuration
//!
//! Set `OASIS_LEDGER_CONFIG` to a TOML file to override the minimum app
//! version, the signing chunk size, or the log module name. Set `RUST_LOG`
//! (for example `RUST_LOG=debug`) to see every exchange.

#![expect(unused_crate_dependencies, reason = "needed for CLI example")]

use std::env;
use std::sync::Arc;

use oasis_ledger_core::ledger::{Discovery, HidProvider, TracingObserver};
use oasis_ledger_core::{DerivationPath, LedgerConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "list" => cmd_list(&args[2..]),
        "version" => cmd_version(),
        "address" => cmd_address(&args[2..]),
        "sign" => cmd_sign(&args[2..]),
        "--help" | "-h" | "help" => print_help(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_help();
        }
    }
}

fn print_help() {
    println!(
        r"Oasis Ledger CLI

USAGE:
    ledger-cli <COMMAND>

COMMANDS:
    list [path]                       List connected devices
    version                           Show the Oasis app version
    address [path] [--show]           Get the address for a path
    sign <path> <context-hex> <tx-hex>
                                      Sign a transaction (requires confirmation)
    help                              Show this help message

EXAMPLES:
    cargo run --example ledger-cli --features hid -- list
    cargo run --example ledger-cli --features hid -- address m/44'/474'/0'/0'/1' --show
    cargo run --example ledger-cli --features hid -- sign m/44'/474'/0'/0'/0' 6f61736973 a2
"
    );
}

/// Builds a discovery from the connected devices and the optional config file.
fn discovery() -> Option<Discovery<HidProvider>> {
    let config = match env::var("OASIS_LEDGER_CONFIG") {
        Ok(path) => match LedgerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {path}: {e}");
                return None;
            }
        },
        Err(_) => LedgerConfig::default(),
    };

    let provider = match HidProvider::new() {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to access USB devices: {e}");
            return None;
        }
    };

    let observer = Arc::new(TracingObserver::new(config.log_module.clone()));
    Some(Discovery::with_config(provider, config, observer))
}

/// Parses an optional path argument, falling back to the first account.
fn parse_path(arg: Option<&String>) -> Option<DerivationPath> {
    match arg {
        None => Some(DerivationPath::oasis(0)),
        Some(text) => match text.parse() {
            Ok(path) => Some(path),
            Err(e) => {
                eprintln!("Invalid path {text}: {e}");
                None
            }
        },
    }
}

fn parse_hex(label: &str, text: &str) -> Option<Vec<u8>> {
    match hex::decode(text.strip_prefix("0x").unwrap_or(text)) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            eprintln!("Invalid {label} hex: {e}");
            None
        }
    }
}

fn cmd_list(args: &[String]) {
    let Some(path) = parse_path(args.first()) else {
        return;
    };
    let Some(discovery) = discovery() else {
        return;
    };

    println!("Searching for Ledger devices...\n");

    let candidates = discovery.list_candidates(&path);
    if candidates.is_empty() {
        println!("No Oasis app found.");
        println!("\nMake sure:");
        println!("  - Your Ledger is plugged in and unlocked");
        println!("  - The Oasis app is open");
        return;
    }

    println!("Found {} device(s) for {path}:\n", candidates.len());
    for candidate in &candidates {
        println!("  [{}] {}", candidate.index, candidate.version);
        println!("      Address:    {}", candidate.address);
        println!("      Public Key: {}", hex::encode(candidate.public_key));
    }
}

fn cmd_version() {
    let Some(discovery) = discovery() else {
        return;
    };

    match discovery.find_any() {
        Ok(app) => {
            let version = app.version();
            println!("Oasis app {version}");
            println!("Mode: {}", version.mode);
            if let Err(e) = app.close() {
                eprintln!("Failed to close device: {e}");
            }
        }
        Err(e) => eprintln!("{e}"),
    }
}

fn cmd_address(args: &[String]) {
    let show = args.iter().any(|arg| arg == "--show");
    let path_arg = args.iter().find(|arg| !arg.starts_with("--"));
    let Some(path) = parse_path(path_arg) else {
        return;
    };
    let Some(discovery) = discovery() else {
        return;
    };

    let mut app = match discovery.connect("", &path) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            return;
        }
    };

    if show {
        println!("Confirm the address on your Ledger...\n");
    }
    let result = if show {
        app.show_address(&path)
    } else {
        app.get_address(&path)
    };

    match result {
        Ok(info) => {
            println!("Path:       {path}");
            println!("Address:    {}", info.address);
            println!("Public Key: {}", hex::encode(info.public_key));
        }
        Err(e) => eprintln!("Failed to get address: {e}"),
    }

    if let Err(e) = app.close() {
        eprintln!("Failed to close device: {e}");
    }
}

fn cmd_sign(args: &[String]) {
    if args.len() < 3 {
        eprintln!("Usage: sign <path> <context-hex> <tx-hex>");
        return;
    }

    let Some(path) = parse_path(args.first()) else {
        return;
    };
    let Some(context) = parse_hex("context", &args[1]) else {
        return;
    };
    let Some(transaction) = parse_hex("transaction", &args[2]) else {
        return;
    };
    let Some(discovery) = discovery() else {
        return;
    };

    let mut app = match discovery.connect("", &path) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            return;
        }
    };

    println!("Signing {} byte(s) with {path}", transaction.len());
    println!("Review and approve the transaction on your Ledger...\n");

    match app.sign(&path, &context, &transaction) {
        Ok(signature) => {
            println!("Signature:");
            println!("  {}", hex::encode(&signature));
        }
        Err(e) => eprintln!("Signing failed: {e}"),
    }

    if let Err(e) = app.close() {
        eprintln!("Failed to close device: {e}");
    }
}
