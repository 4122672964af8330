//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path, layered over the default locations
    #[arg(short, long)]
    pub config: Option<String>,

    /// System Bluetooth adapter to use
    #[arg(short, long)]
    pub adapter: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan and print peripherals as they are discovered
    Scan {
        /// Scan duration in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Connect to a peripheral and exchange messages interactively
    Connect {
        /// Peripheral identifier as printed by `scan`
        #[arg(short, long)]
        peripheral: Option<String>,
        /// Service UUID (full, 16-bit or 32-bit form)
        #[arg(short, long)]
        service: Option<String>,
        /// Characteristic written by `send`
        #[arg(short, long)]
        output: Option<String>,
        /// Characteristic delivering inbound messages
        #[arg(short, long)]
        input: Option<String>,
        /// Write without waiting for the peripheral's acknowledgement
        #[arg(long)]
        without_response: bool,
    },
    /// Print the radio state
    State,
    /// Print an example configuration file
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect_arguments() {
        let cli = Cli::parse_from([
            "blelink",
            "-v",
            "connect",
            "--peripheral",
            "AA:BB:CC:DD:EE:01",
            "--service",
            "FFE0",
            "--output",
            "FFE1",
            "--input",
            "FFE2",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Connect {
                peripheral,
                service,
                without_response,
                ..
            } => {
                assert_eq!(peripheral.as_deref(), Some("AA:BB:CC:DD:EE:01"));
                assert_eq!(service.as_deref(), Some("FFE0"));
                assert!(!without_response);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_scan_timeout() {
        let cli = Cli::parse_from(["blelink", "scan", "--timeout", "15"]);
        assert!(matches!(cli.command, Commands::Scan { timeout: Some(15) }));
    }
}
