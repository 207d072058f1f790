//! Memorize demo
//!
//! Walks through free-function and per-owner memoization and prints the
//! resulting cache statistics as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memorize::{
    memorize_fn, set_global_options, spawn_sweep_task, try_memorize_fn, MemoOptions, MethodMemo,
};

/// A small owner type whose method results depend on its own state.
struct PriceList {
    currency: &'static str,
    rate: f64,
}

impl PriceList {
    fn quote(&self, (cents,): (u64,)) -> String {
        info!(currency = self.currency, cents, "computing quote");
        format!("{:.2} {}", cents as f64 / 100.0 * self.rate, self.currency)
    }
}

fn capitalize((word,): (String,)) -> String {
    info!(%word, "capitalizing");
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load default memo options from environment variables
/// 3. Run free-function, fallible and per-owner examples
/// 4. Sweep once in the background and print statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memorize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env_options = MemoOptions::from_env();
    set_global_options(env_options);
    info!("Global memo options: {:?}", memorize::global_options());

    // Free function with a 3 second lifetime per result
    let capitalized = memorize_fn(capitalize, MemoOptions::new().with_duration(3000));
    for word in ["cat", "dog", "cat"] {
        info!("{} -> {}", word, capitalized.call((word.to_string(),)));
    }

    // Fallible function: only successful parses are cached
    let parse = try_memorize_fn(
        |(text,): (String,)| text.trim().parse::<i64>(),
        MemoOptions::new(),
    );
    let answer = parse
        .try_call((" 42 ".to_string(),))
        .context("parsing a valid number")?;
    info!("parsed {}", answer);
    if let Err(e) = parse.try_call(("forty-two".to_string(),)) {
        info!("parse failed as expected: {}", e);
    }

    // Method memo: each price list keeps its own cache
    let quote = Arc::new(MethodMemo::new(
        PriceList::quote as fn(&PriceList, (u64,)) -> String,
        MemoOptions::new().with_size(8),
    ));
    let usd = Arc::new(PriceList {
        currency: "USD",
        rate: 1.0,
    });
    let eur = Arc::new(PriceList {
        currency: "EUR",
        rate: 0.92,
    });
    for cents in [1999, 1999] {
        info!("{}", quote.call(&usd, (cents,)));
        info!("{}", quote.call(&eur, (cents,)));
    }
    drop(eur);

    let sweeper = spawn_sweep_task(quote.clone(), Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(120)).await;
    sweeper.abort();

    let report = json!({
        "capitalize": capitalized.stats(),
        "parse": parse.stats(),
        "quote": quote.stats(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing stats")?
    );

    Ok(())
}
