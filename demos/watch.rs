//! Watch a notification endpoint.
//!
//! Demonstrates:
//! - Building a client from `REALTIME_*` environment variables
//! - Authenticating with a bearer token
//! - Following status transitions across reconnects
//! - Decoding warehouse notifications
//!
//! Usage:
//!   REALTIME_WS_URL=ws://localhost:8000/ws REALTIME_TOKEN=... cargo run --example watch
//!   cargo run --example watch -- --debug
//!   cargo run --example watch -- alerts

// ============================================================================
// Imports
// ============================================================================

use realtime_notify::{ConnectionManager, Environment, Notification, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const TOKEN_VAR: &str = "REALTIME_TOKEN";
const DEFAULT_PATH: &str = "notifications";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map_or(DEFAULT_PATH, String::as_str);

    init_logging(debug);

    if let Err(e) = run(path).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(path: &str) -> Result<()> {
    let mut builder = ConnectionManager::builder().environment(Environment::from_env()?);
    match std::env::var(TOKEN_VAR) {
        Ok(token) if !token.is_empty() => builder = builder.token(token),
        _ => println!("[Auth] {TOKEN_VAR} not set; connecting without a token"),
    }
    let manager = builder.build()?;

    let mut status = manager.subscribe_status();
    let mut messages = manager.connect(path)?;

    println!("[Watch] Listening on '{path}'. Press Ctrl+C to exit...");

    loop {
        tokio::select! {
            Some(state) = status.recv() => {
                println!("[Status] {state}");
            }

            Some(message) = messages.recv() => match message.notification() {
                Some(Notification::RobotUpdate(update)) => println!(
                    "[Robot] {} battery={:.0}% zone={}",
                    update.robot_id,
                    update.battery_level,
                    update.location.zone.as_deref().unwrap_or("?"),
                ),
                Some(Notification::InventoryAlert(alert)) => println!(
                    "[Alert] {:?} in zone {}: {} product(s)",
                    alert.severity,
                    alert.zone,
                    alert.product_ids.len(),
                ),
                Some(other) => println!("[Message] {other:?}"),
                None => println!("[Message] {message:?}"),
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.disconnect();
    println!("[Watch] Disconnected");
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "realtime_notify=debug"
    } else {
        "realtime_notify=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
