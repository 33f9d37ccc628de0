//! Swap engine demo session
//!
//! Runs one swap end to end against the simulated backend: focus the swap
//! screen, type an amount in a burst, execute the resulting quote and follow
//! the transaction until it reaches a terminal state. Quote, status and
//! notification events are printed as JSON lines.
//!
//! Created: 2026-10-19

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use swap_engine::notify::ToastEvent;
use swap_engine::types::SwapStatusResponse;
use swap_engine::{load_config, QuoteEvent, SimulatedBackend, SwapEngine};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Swap Engine - simulated swap session
#[derive(Parser)]
#[command(name = "swap-engine")]
struct Args {
    /// TOML configuration file (all keys optional)
    #[arg(short, long, env = "SWAP_CONFIG")]
    config: Option<PathBuf>,

    /// Account the session is bound to
    #[arg(short, long, env = "SWAP_ACCOUNT", default_value = "demo-account")]
    account: String,

    #[arg(long, default_value = "SOL")]
    from: String,

    #[arg(long, default_value = "USDC")]
    to: String,

    /// Final amount typed into the form
    #[arg(long, default_value = "100")]
    amount: String,

    /// Slippage tolerance in percent
    #[arg(long, default_value = "0.5")]
    slippage: String,

    /// Status sequence reported by the simulated chain (pending, confirmed, failed)
    #[arg(long, value_delimiter = ',', default_value = "pending,pending,confirmed")]
    statuses: Vec<String>,

    /// Simulated backend latency in milliseconds
    #[arg(long, default_value_t = 120)]
    latency_ms: u64,
}

fn parse_status(raw: &str) -> Result<SwapStatusResponse> {
    match raw.trim().to_lowercase().as_str() {
        "pending" => Ok(SwapStatusResponse::pending()),
        "confirmed" => Ok(SwapStatusResponse::confirmed()),
        "failed" => Ok(SwapStatusResponse::failed("simulated on-chain failure")),
        other => anyhow::bail!("Unknown status '{}'. Expected pending, confirmed or failed", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let statuses = args
        .statuses
        .iter()
        .map(|s| parse_status(s))
        .collect::<Result<Vec<_>>>()?;

    let backend = Arc::new(
        SimulatedBackend::new()
            .with_latency(Duration::from_millis(args.latency_ms))
            .with_price("SOL", Decimal::from(150))
            .with_price("USDC", Decimal::ONE)
            .with_price("BONK", Decimal::from_str("0.00002").context("Invalid BONK price")?)
            .with_balance("SOL", "SOL", Decimal::from(3))
            .with_balance("USDC", "USDC", Decimal::from(250)),
    );
    backend.set_status_template(statuses.into_iter().map(Ok).collect());

    let engine = SwapEngine::new(Arc::clone(&backend), args.account.clone(), &config);
    info!("Session started for {}", args.account);

    let quote_events = engine.quotes().event_stream();
    let toast_events = BroadcastStream::new(engine.notifier().events());
    let printer = tokio::spawn(async move {
        let mut merged = Box::pin(futures::stream::select(
            quote_events.filter_map(|e| async move { e.ok().map(quote_json) }),
            toast_events.filter_map(|e| async move { e.ok().map(toast_json) }),
        ));
        while let Some(line) = merged.next().await {
            println!("{}", line);
        }
    });

    engine.focus();

    // Typed one digit at a time, faster than the debounce delay
    let mut typed = String::new();
    for ch in args.amount.chars() {
        typed.push(ch);
        engine.on_input_change(typed.clone(), args.from.clone(), args.to.clone(), args.slippage.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    tokio::time::sleep(config.quote.debounce() + Duration::from_millis(args.latency_ms * 3)).await;

    let quote = match engine.quotes().current_quote() {
        Some(quote) => quote,
        None => {
            warn!("No quote available, nothing to execute");
            engine.blur();
            printer.abort();
            return Ok(());
        }
    };
    info!(
        "Quote {}: {} {} -> {} {} @ {} (min {}, fee {:?})",
        quote.quote_id,
        quote.from_amount,
        quote.from_token,
        quote.to_amount,
        quote.to_token,
        quote.rate().round_dp(6),
        quote.minimum_received,
        quote.network_fee
    );

    let mut status = engine.poller().status_stream();
    let signature = match engine.execute_swap("demo-pin").await {
        Ok(signature) => signature,
        Err(err) => {
            warn!("Swap not submitted: {}", err);
            engine.blur();
            printer.abort();
            return Ok(());
        }
    };

    while let Some(event) = status.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                warn!("Status stream lagged: {}", err);
                continue;
            }
        };
        if event.signature != signature {
            continue;
        }
        println!(
            "{}",
            json!({ "event": "status", "signature": event.signature, "state": event.state, "detail": event.detail })
        );
        if event.state.is_terminal() {
            break;
        }
    }

    // Let the terminal notification render before leaving
    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.blur();
    printer.abort();

    let stats = engine.prices().stats();
    info!(
        "Session finished: {} quote call(s), {} status check(s), price cache {} hit(s) / {} fetch(es)",
        backend.calls().quotes,
        backend.calls().statuses,
        stats.hits,
        stats.fetches
    );
    Ok(())
}

fn quote_json(event: QuoteEvent) -> String {
    match event {
        QuoteEvent::Updated(quote) => json!({ "event": "quote", "quote": quote }).to_string(),
        QuoteEvent::Error(reason) => json!({ "event": "quote_error", "reason": reason }).to_string(),
        QuoteEvent::PricesUpdated(prices) => json!({ "event": "prices", "prices": prices }).to_string(),
    }
}

fn toast_json(event: ToastEvent) -> String {
    match event {
        ToastEvent::Shown(message) => json!({ "event": "toast", "message": message }).to_string(),
        ToastEvent::Hidden(id) => json!({ "event": "toast_hidden", "id": id }).to_string(),
    }
}
