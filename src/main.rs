//! kafkalink - broker transport diagnostics
//!
//! Opens raw connections to a broker and looks up wire constants.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use kafkalink_client::ConnectionConfig;
use kafkalink_protocol::DEFAULT_PORT;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kafkalink")]
#[command(about = "Transport diagnostics for Kafka 0.8 brokers")]
#[command(version)]
pub struct Cli {
    /// Broker host
    #[arg(long, default_value = "127.0.0.1", env = "KAFKALINK_HOST")]
    host: String,

    /// Broker port
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "KAFKALINK_PORT")]
    port: u16,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    connect_timeout_ms: u64,

    /// Read timeout in milliseconds (blocks indefinitely when unset)
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a connection, report the socket and close it
    Probe,

    /// Send a payload and optionally read a fixed number of bytes back
    Send {
        /// Payload as UTF-8 text (or hex with --hex)
        payload: String,

        /// Decode the payload as hex
        #[arg(long)]
        hex: bool,

        /// Number of response bytes to read
        #[arg(short, long, default_value_t = 0)]
        read: usize,
    },

    /// Describe a broker error code
    ErrorCode {
        /// Numeric error code
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },

    /// List request types and compression attributes
    ApiKeys,
}

impl Cli {
    fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(self.host.clone(), self.port)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        if let Some(ms) = self.read_timeout_ms {
            config = config.with_read_timeout(Duration::from_millis(ms));
        }
        config
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.connection_config();

    match commands::execute(&config, cli.json, cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}
