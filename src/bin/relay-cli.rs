//! Management and demo CLI for the webhook round-trip relay.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::net::TcpListener;

use webhook_relay::client::{RoundTripClient, RoundTripOptions};
use webhook_relay::config::RelayConfig;
use webhook_relay::correlation::CorrelationRegistry;
use webhook_relay::http::HttpServer;
use webhook_relay::lifecycle::Shutdown;
use webhook_relay::transport::TransportSelector;
use webhook_relay::Envelope;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "CLI for the webhook round-trip relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform one round trip: start an ephemeral callback server, send the
    /// payload to the destination, wait for the correlated callback.
    Send {
        /// Destination URL the envelope is POSTed to.
        #[arg(short, long)]
        destination: String,

        /// JSON payload.
        #[arg(short, long, default_value = "{}")]
        payload: String,

        /// Explicit request ID (defaults to a generated UUID).
        #[arg(long)]
        request_id: Option<String>,

        /// Secure overlay credential.
        #[arg(long)]
        secure_key: Option<String>,

        /// Seconds to wait for the callback.
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,

        /// Bind address for the ephemeral callback server.
        #[arg(long, default_value = "127.0.0.1:0")]
        bind: String,
    },
    /// Fire an envelope at a relay's webhook endpoint (the processed result
    /// goes to the callback URL, not to this CLI).
    Webhook {
        /// Relay base URL, e.g. http://localhost:8484
        #[arg(short, long)]
        relay: String,

        /// Callback URL the processed result should be POSTed to.
        #[arg(short, long)]
        callback: String,

        /// JSON payload.
        #[arg(short, long, default_value = "{}")]
        payload: String,

        #[arg(long)]
        request_id: Option<String>,
    },
    /// Print a relay's info line.
    Info {
        /// Relay base URL.
        #[arg(short, long, default_value = "http://localhost:8484")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            destination,
            payload,
            request_id,
            secure_key,
            timeout,
            bind,
        } => {
            let payload: Value = serde_json::from_str(&payload)?;

            let mut config = RelayConfig::default();
            config.listener.bind_address = bind;
            config.destination.url = Some(destination);

            let registry = Arc::new(CorrelationRegistry::new());
            let transport = Arc::new(TransportSelector::new(
                Duration::from_secs(config.timeouts.send_secs),
                None,
            )?);
            let shutdown = Shutdown::new();

            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            let server = HttpServer::new(
                config.clone(),
                registry.clone(),
                None,
                transport.clone(),
                shutdown.clone(),
            );
            let handle = server.handle();
            let client = RoundTripClient::new(
                &config.destination,
                &config.timeouts,
                registry,
                transport,
                handle.clone(),
            );

            let server_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                if let Err(e) = server.run(listener, server_shutdown).await {
                    eprintln!("callback server error: {e}");
                }
            });
            while !handle.is_running() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            let result = client
                .round_trip_post(
                    payload,
                    RoundTripOptions {
                        request_id,
                        secure_key,
                        timeout: Some(Duration::from_secs(timeout)),
                    },
                )
                .await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            shutdown.trigger();
        }
        Commands::Webhook {
            relay,
            callback,
            payload,
            request_id,
        } => {
            let payload: Value = serde_json::from_str(&payload)?;
            let envelope = Envelope {
                url: callback,
                payload,
                request_id,
                secure_key: None,
            };

            let client = reqwest::Client::new();
            let res = client
                .post(format!("{}/webhook", relay.trim_end_matches('/')))
                .json(&envelope)
                .send()
                .await?;

            let status = res.status();
            let body = res.text().await?;
            if status.is_success() {
                println!("{body}");
            } else {
                eprintln!("Error: relay returned status {status}");
                eprintln!("Response: {body}");
            }
        }
        Commands::Info { url } => {
            let res = reqwest::get(url).await?;
            print!("{}", res.text().await?);
        }
    }

    Ok(())
}
