//! # courier-ping
//!
//! Builds a mediator with a single `Ping` handler and the stock behaviors,
//! fires a batch of concurrent sends through it and logs each reply.

use std::time::Duration;

use clap::Parser;
use courier_dispatch::{
    handler_fn, AmbiguityPolicy, CancellationBehavior, CancellationToken, Mediator, Request,
    TracingBehavior, Validate, ValidationBehavior,
};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "courier-ping")]
#[command(about = "Send ping requests through a courier mediator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Number of concurrent sends
    #[arg(short, long, env = "COURIER_SENDS", default_value_t = 4)]
    sends: u32,

    /// How the mediator treats more than one handler for a request type
    #[arg(long, env = "COURIER_AMBIGUITY", value_enum, default_value_t = AmbiguityPolicy::Reject)]
    ambiguity: AmbiguityPolicy,

    /// Give up on outstanding sends after this many milliseconds
    #[arg(long, env = "COURIER_DEADLINE_MS", default_value_t = 1_000)]
    deadline_ms: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "COURIER_JSON")]
    json: bool,
}

struct Ping {
    seq: u32,
    payload: String,
}

impl Request for Ping {
    type Response = String;
}

impl Validate for Ping {
    fn validate(&self) -> Result<(), String> {
        if self.payload.is_empty() {
            return Err("payload must not be empty".to_string());
        }
        Ok(())
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let mediator = Mediator::builder()
        .ambiguity(cli.ambiguity)
        .universal_behavior(TracingBehavior)
        .universal_behavior(CancellationBehavior)
        .behavior(ValidationBehavior::<Ping>::new())
        .handler(handler_fn(|req: Ping, _cancel| async move {
            Ok(format!("pong #{} ({})", req.seq, req.payload))
        }))
        .build();

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    let deadline_ms = cli.deadline_ms;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(deadline_ms)).await;
        deadline.cancel();
    });

    let mut sends = JoinSet::new();
    for seq in 0..cli.sends {
        let mediator = mediator.clone();
        let cancel = cancel.clone();
        // Every fifth ping is empty to exercise validation.
        let payload = if seq % 5 == 4 { String::new() } else { "hello".to_string() };
        sends.spawn(async move { (seq, mediator.send(Ping { seq, payload }, cancel).await) });
    }

    let mut failures = 0_u32;
    while let Some(joined) = sends.join_next().await {
        let (seq, result) = joined?;
        match result {
            Ok(reply) => info!(seq, %reply, "reply received"),
            Err(err) => {
                failures += 1;
                warn!(seq, error = %err, "send failed");
            }
        }
    }

    info!(sends = cli.sends, failures, cached_routes = mediator.cache().len(), "done");
    Ok(())
}
