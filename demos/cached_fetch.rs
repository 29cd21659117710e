/// Example demonstrating a chunked, cached aggregate fetch
///
/// This example shows how to:
/// 1. Create a CachedRestClient with a persistent disk cache
/// 2. Fetch a minute-bar range too large for one upstream call
/// 3. Inspect cache statistics after the fetch
///
/// Run with:
/// ```bash
/// POLYGON_API_KEY=... cargo run --example cached_fetch
/// ```
///
/// Run it twice: the second run serves every historical window from the
/// cache without touching the network.
use aggcache::{AggregateQuery, CachedRestClient, Timespan};
use anyhow::Context;
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key =
        std::env::var("POLYGON_API_KEY").context("POLYGON_API_KEY must be set")?;

    let client = CachedRestClient::with_disk_cache(api_key, "aggcache_responses.json")?;

    let from = NaiveDate::from_ymd_opt(2020, 6, 4).context("invalid date")?;
    let to = NaiveDate::from_ymd_opt(2020, 6, 20).context("invalid date")?;

    // A 17-day minute-bar range: fetched as three concurrent sub-requests
    // and merged into one response.
    let query = AggregateQuery::new("AAPL", 1, Timespan::Minute, from, to);
    let combined = client.fetch_aggregates(&query).await?;

    println!(
        "{}: {} bars ({} to {}), status {}",
        combined.ticker,
        combined.results.len(),
        from,
        to,
        combined.status
    );

    if let Some(first) = combined.results.first() {
        println!(
            "first bar: t={} o={:?} c={:?}",
            first.timestamp_ms, first.open, first.close
        );
    }

    println!("cache: {}", client.cache_stats().await);

    Ok(())
}
