//! Echo round trip against a live WebSocket server.
//!
//! Demonstrates:
//! - Building a client with callbacks
//! - Connecting with automatic retry
//! - Sending text and binary frames
//! - Watching connection state across reconnects
//!
//! Usage:
//!   cargo run --example echo
//!   cargo run --example echo -- wss://echo.websocket.org
//!   cargo run --example echo -- --debug --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use persistent_ws::{Client, ConnectionState, Message};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "ws://127.0.0.1:9001";

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    url: String,
    debug: bool,
    no_wait: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            url: args
                .iter()
                .find(|a| !a.starts_with("--"))
                .cloned()
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "persistent_ws=trace"
    } else {
        "persistent_ws=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Echo: {} ===\n", args.url);

    let client = Client::builder(&args.url)
        .reconnect_delay(Duration::from_secs(1))
        .on_connect(|| println!("[Connect] Connection established"))
        .on_receive(|message: Message| match message.as_text() {
            Some(text) => println!("[Receive] text: {text}"),
            None => println!("[Receive] {}: {:?}", message.frame_type(), message.payload()),
        })
        .build()?;

    // Report every state transition
    let mut states = client.state_receiver();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            println!("[State] {state:?}");
            if state == ConnectionState::Shutdown {
                break;
            }
        }
    });

    println!("[Connect] Dialing (retries until the server is up)...");
    client.connect().await?;

    client.send_text("Hello!!!").await?;
    client.send_binary(vec![0_u8, 159, 255]).await?;

    if args.no_wait {
        tokio::time::sleep(Duration::from_secs(1)).await;
    } else {
        println!("Press Ctrl+C to exit...");
        tokio::signal::ctrl_c().await.ok();
    }

    client.shutdown().await;
    println!("\n[Done] Client shut down");
    Ok(())
}
