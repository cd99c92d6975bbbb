//! # Example: Stream Actor
//!
//! An actor inside a dataflow sums a stream of numbers and completes when the
//! stream ends. Lifecycle events are rendered by the built-in `LogWriter`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example stream_actor --features logging
//! ```

use std::{sync::Arc, time::Duration};

use pinflow::{Config, Dataflow, LogWriter, StreamItem, Subscribe};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let df = Dataflow::builder(Config::default())
        .with_subscribers(subs)
        .build()?;

    let mut b = df.node("sum");
    let numbers = b.stream_input::<u64>()?;
    let mut total = 0;
    let sum = b.actor(move |f| {
        match f.take(numbers)? {
            StreamItem::Token(n) => total += n,
            StreamItem::End => f.complete(total),
        }
        Ok(())
    });
    sum.start();

    let port = sum.port(numbers);
    tokio::task::spawn_blocking(move || {
        for n in 1..=10 {
            port.post(n)?;
            std::thread::sleep(Duration::from_millis(10));
        }
        port.close()
    })
    .await??;

    println!("sum = {}", sum.join().await?);
    df.join().await?;

    // Let the subscriber drain before the runtime goes away.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
