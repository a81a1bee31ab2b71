//! Asynchronous Fetch
//!
//! Starts two simulated downloads from a machine and merges their results
//! once both arrive. The gates are resolved from tasks on a `LocalSet`,
//! long after construction returned.
//!
//! Key concepts:
//! - Gates resolved from spawned local tasks
//! - Callback-style `resolve` turning errors into an aborted machine
//! - Lifecycle history of a machine that went idle while waiting
//!
//! Run with: cargo run --example async_fetch

use flowgate::{flow, run_debug, BoxError, Definition, FlowError, Gate};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{self, LocalSet};

async fn fetch(url: &'static str, delay_ms: u64) -> Result<String, BoxError> {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    if url.ends_with("/missing") {
        return Err(format!("404 for {url}").into());
    }
    Ok(format!("<body of {url}>"))
}

fn spawn_fetch(target: Gate<String>, url: &'static str, delay_ms: u64) {
    task::spawn_local(async move {
        target.resolve(fetch(url, delay_ms).await);
    });
}

fn downloads(first: &'static str, second: &'static str) -> Definition {
    Definition::new(["first", "second", "merged"], move |gates| {
        let a = gates.gate::<String>("first")?;
        let b = gates.gate::<String>("second")?;
        let merged = gates.resolver::<String>()?;
        let (start_a, start_b) = (a.clone(), b.clone());

        Ok(vec![
            flow![=> move || {
                spawn_fetch(start_a, first, 20);
                spawn_fetch(start_b, second, 5);
            }],
            flow![&a, &b => move || -> Result<(), FlowError> {
                merged.set(format!("{}\n{}", a.get()?, b.get()?));
                Ok(())
            }],
        ])
    })
}

async fn download(first: &'static str, second: &'static str) {
    let (tx, rx) = oneshot::channel();
    let machine = match run_debug(downloads(first, second), move |result: Result<String, FlowError>| {
        let _ = tx.send(result);
    }) {
        Ok(machine) => machine,
        Err(err) => {
            println!("  invalid definition: {err}");
            return;
        }
    };

    println!("  after construction: {}", machine.lifecycle().name());

    match rx.await {
        Ok(Ok(body)) => println!("  merged:\n{body}"),
        Ok(Err(err)) => println!("  aborted: {err}"),
        Err(_) => println!("  machine dropped without completing"),
    }

    let path: Vec<&str> = machine
        .snapshot()
        .history
        .path()
        .into_iter()
        .map(|state| state.name())
        .collect();
    println!("  lifecycle: {}", path.join(" -> "));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("Async Fetch Example");
    println!("===================\n");

    let local = LocalSet::new();
    local
        .run_until(async {
            println!("Both downloads succeed:");
            download("https://example.test/a", "https://example.test/b").await;

            println!("\nOne download fails:");
            download("https://example.test/a", "https://example.test/missing").await;
        })
        .await;
}
