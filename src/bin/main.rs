//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Demo entry point for the limit order book matching engine. It starts an engine worker
// from the environment configuration and replays a few scenarios against it, logging the
// resulting fills and book depth.
//--------------------------------------------------------------------------------------------------
// cargo run --bin lob-matching -- --scenario all
// cargo run --bin lob-matching -- --scenario sweep --json
// LOB_CROSS_LIMIT_ORDERS=true cargo run --bin lob-matching -- --scenario ladder
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lob_matching::{
    quantity_to_decimal, ticks_to_decimal, DepthSnapshot, EngineClient, EngineConfig, EngineWorker,
    Match, Side,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Rest a ladder of bids and asks
    Ladder,
    /// Sweep two ask levels with a market bid
    Sweep,
    /// Cancel from the middle of a level
    Cancel,
    /// Run every scenario in turn
    All,
}

/// CLI options for the application
#[derive(Parser, Debug)]
#[command(name = "lob-matching", about = "Limit order book matching engine demo")]
struct Opt {
    /// Scenario to replay
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Print depth snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Number of levels per side in depth output
    #[arg(long, default_value_t = 10)]
    levels: usize,
}

struct Demo {
    client: EngineClient,
    config: EngineConfig,
    json: bool,
    levels: usize,
}

impl Demo {
    fn log_matches(&self, matches: &[Match]) {
        for fill in matches {
            info!(
                "fill {} bid {} / ask {}: {} @ {}",
                fill.id,
                fill.bid_order_id,
                fill.ask_order_id,
                quantity_to_decimal(fill.size_filled, self.config.size_scale),
                ticks_to_decimal(fill.price, self.config.price_scale),
            );
        }
    }

    fn log_depth(&self, depth: &DepthSnapshot) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(depth)?);
            return Ok(());
        }
        for level in depth.asks.iter().rev() {
            info!(
                "  ASK {:>10} | {:>8} ({} orders)",
                ticks_to_decimal(level.price, self.config.price_scale),
                quantity_to_decimal(level.volume, self.config.size_scale),
                level.order_count
            );
        }
        for level in &depth.bids {
            info!(
                "  BID {:>10} | {:>8} ({} orders)",
                ticks_to_decimal(level.price, self.config.price_scale),
                quantity_to_decimal(level.volume, self.config.size_scale),
                level.order_count
            );
        }
        Ok(())
    }

    async fn show_depth(&self) -> anyhow::Result<()> {
        let depth = self.client.get_depth(self.levels).await?;
        self.log_depth(&depth)
    }

    async fn ladder(&self) -> anyhow::Result<()> {
        info!("scenario: ladder");
        for (price, size) in [(9_900, 4), (9_950, 2), (10_000, 1)] {
            self.client.place_limit_order(Side::Bid, size, price).await?;
        }
        for (price, size) in [(10_050, 3), (10_100, 5)] {
            self.client.place_limit_order(Side::Ask, size, price).await?;
        }
        self.show_depth().await
    }

    async fn sweep(&self) -> anyhow::Result<()> {
        info!("scenario: sweep");
        self.client.place_limit_order(Side::Ask, 5, 10_200).await?;
        self.client.place_limit_order(Side::Ask, 5, 10_300).await?;

        match self.client.place_market_order(Side::Bid, 1_000).await {
            Ok(_) => info!("oversized market order unexpectedly executed"),
            Err(err) => info!("oversized market order rejected: {}", err),
        }

        let matches = self.client.place_market_order(Side::Bid, 7).await?;
        self.log_matches(&matches);
        self.show_depth().await
    }

    async fn cancel(&self) -> anyhow::Result<()> {
        info!("scenario: cancel");
        let mut ids = Vec::new();
        for size in [5, 8, 10] {
            ids.push(self.client.place_limit_order(Side::Bid, size, 9_800).await?.order_id);
        }
        let canceled = self.client.cancel_order(ids[1]).await?;
        info!("canceled {} {}", canceled.id, canceled);
        self.client.place_limit_order(Side::Bid, 5, 9_800).await?;

        if let Err(err) = self.client.cancel_order(ids[1]).await {
            info!("second cancel rejected: {}", err);
        }
        self.show_depth().await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    let config = EngineConfig::from_env();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        instrument_id = %config.instrument_id,
        cross_limit_orders = config.cross_limit_orders,
        "starting matching engine"
    );

    let (client, handle) = EngineWorker::from_config(&config).start();
    let demo = Demo {
        client,
        config,
        json: opt.json,
        levels: opt.levels,
    };

    if matches!(opt.scenario, Scenario::Ladder | Scenario::All) {
        demo.ladder().await?;
    }
    if matches!(opt.scenario, Scenario::Sweep | Scenario::All) {
        demo.sweep().await?;
    }
    if matches!(opt.scenario, Scenario::Cancel | Scenario::All) {
        demo.cancel().await?;
    }

    demo.client.shutdown().await?;
    let engine = tokio::task::spawn_blocking(move || handle.join())
        .await?
        .map_err(|_| anyhow::anyhow!("engine worker panicked"))?;
    info!(
        resting_orders = engine.order_book().resting_order_count(),
        "matching engine stopped"
    );
    Ok(())
}
