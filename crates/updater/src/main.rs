use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use ohlc_updater::providers::FallbackFetcher;
use ohlc_updater::store::CandleStore;
use ohlc_updater::update::UpdateFlow;

/// Appends the latest hourly BTC/USDT candles to a CSV table, polling
/// Bybit, OKX and CryptoCompare with failover. Meant to be invoked
/// hourly by an external scheduler.
#[derive(Parser, Debug)]
#[command(name = "ohlc-updater", version)]
struct Args {
    /// Path of the candle table CSV (must already exist)
    #[arg(long, default_value = "BTC_OHLC_1h_gmt8_updated.csv")]
    file: PathBuf,

    /// Number of recent candles to request; the overlap lets corrected
    /// values land on already-stored hours
    #[arg(long, default_value_t = 100)]
    limit: u32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    info!("==================================================");
    info!("Starting BTC OHLC data update");
    info!("==================================================");

    let flow = UpdateFlow::new(
        CandleStore::new(args.file),
        FallbackFetcher::with_default_providers(),
        args.limit,
    );

    match flow.execute().await {
        Ok(_) => {
            info!("✓ Data update completed successfully");
        }
        Err(e) => {
            error!("❌ Data update failed: {e}");
            std::process::exit(1);
        }
    }
}
