//! copycast: a demo copy-trading platform backend.
//!
//! A mock trade feed replays synthetic trades from seeded trader profiles;
//! the engine fans each trade out across user portfolios, sizing and
//! executing copy trades against an in-memory ledger.

mod app;
mod config;
mod engine;
mod error;
mod feed;
mod models;
mod quotes;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::app::App;
use crate::config::{EngineConfig, FeedConfig};
use crate::engine::EngineEvent;
use crate::feed::seed_profiles;
use crate::models::{CopySettings, MarketQuote, PositionSizeType, Trade, TradeSide, UserId};
use crate::quotes::{HttpQuoteSource, QuoteSource, StaticQuoteSource, SyntheticQuoteSource};

/// Demo copy-trading platform CLI.
#[derive(Parser)]
#[command(name = "copycast")]
#[command(about = "Run a simulated copy-trading platform backend", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live simulation: mock feed into the copy engine
    Run {
        /// Starting cash for each demo portfolio
        #[arg(short, long, default_value = "100000")]
        balance: f64,

        /// Number of demo user portfolios
        #[arg(short, long, default_value = "1")]
        users: u64,

        /// Simulation speed-up (1 = trader cadences in real time)
        #[arg(short, long, default_value = "60")]
        time_scale: f64,

        /// API key for a GLOBAL_QUOTE-style endpoint; synthetic prices when unset
        #[arg(long, env = "COPYCAST_QUOTE_API_KEY")]
        quote_api_key: Option<String>,

        /// Quote endpoint base URL
        #[arg(
            long,
            env = "COPYCAST_QUOTE_URL",
            default_value = "https://www.alphavantage.co"
        )]
        quote_url: String,
    },

    /// Replay a fixed trade script through the engine and print the result
    Demo,

    /// List the seeded trader profiles
    Traders,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            balance,
            users,
            time_scale,
            quote_api_key,
            quote_url,
        } => {
            let source: Arc<dyn QuoteSource> = match quote_api_key {
                Some(key) => {
                    info!(url = %quote_url, "Using HTTP quote source");
                    Arc::new(HttpQuoteSource::new(quote_url, key)?)
                }
                None => {
                    info!("No quote API key configured, using synthetic prices");
                    Arc::new(SyntheticQuoteSource)
                }
            };

            let engine_config = EngineConfig {
                initial_balance: Decimal::try_from(balance)?,
                ..Default::default()
            };
            let feed_config = FeedConfig {
                time_scale,
                ..Default::default()
            };

            let app = App::new(engine_config, source);

            // Seed demo users: everyone follows the value trader and copies
            // the momentum trader, mirroring the platform's default session.
            for user_id in 1..=users {
                app.create_user(user_id).await;
                app.follow(user_id, 1).await?;
                app.set_copy_settings(user_id, 3, CopySettings::default())
                    .await?;
            }

            println!("\n=== copycast simulation ===");
            println!("Users:       {users}");
            println!("Balance:     ${balance}");
            println!("Time scale:  {time_scale}x");
            println!("\nPress Ctrl+C to stop.\n");

            spawn_event_printer(app.subscribe());

            app.run(feed_config).await?;

            // Refresh holdings at last-known prices before the summary
            app.mark_to_market().await;

            // Final portfolio summary per user
            for user_id in 1..=users {
                if let Ok(portfolio) = app.portfolio(user_id).await {
                    print_portfolio(&portfolio);
                }
            }
        }

        Commands::Demo => {
            run_demo().await?;
        }

        Commands::Traders => {
            let profiles = seed_profiles();

            println!(
                "\n{:<4} {:<18} {:<10} {:<7} {:>6} {:>7} {:>7} {:>10}",
                "ID", "NAME", "STYLE", "RISK", "WIN%", "30D%", "SHARPE", "FOLLOWERS"
            );
            println!("{}", "-".repeat(78));

            for profile in profiles {
                println!(
                    "{:<4} {:<18} {:<10} {:<7} {:>6} {:>7} {:>7} {:>10}",
                    profile.id,
                    profile.name,
                    profile.style.as_str(),
                    profile.risk_level.as_str(),
                    profile.win_rate,
                    profile.return_30d,
                    profile.sharpe_ratio,
                    profile.followers
                );
            }
        }

        Commands::Config => {
            let engine = EngineConfig::default();
            let feed = FeedConfig::default();
            let settings = CopySettings::default();

            println!("\n=== Engine Configuration ===\n");
            println!("Initial Balance:   ${}", engine.initial_balance);
            println!("Quote TTL:         {}s", engine.quote_ttl.as_secs());
            println!("Event Capacity:    {}", engine.event_capacity);

            println!("\n=== Feed Configuration ===\n");
            println!("Time Scale:        {}x", feed.time_scale);
            println!("Quote Interval:    {}s", feed.quote_interval.as_secs());
            println!("Channel Capacity:  {}", feed.channel_capacity);

            println!("\n=== Default Copy Settings ===\n");
            println!("Enabled:           {}", settings.enabled);
            println!("Sizing:            {:?}", settings.position_size_type);
            println!("Position Size:     ${}", settings.position_size);
            println!("Max Position Size: ${}", settings.max_position_size);
        }
    }

    Ok(())
}

/// Print copy fills and follow changes as they happen.
fn spawn_event_printer(mut events: tokio::sync::broadcast::Receiver<EngineEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EngineEvent::CopyTradeExecuted { user_id, trade }) => {
                    println!(
                        "[copy] user {} {} {} x{} @ ${} (P&L ${})",
                        user_id,
                        trade.side.as_str(),
                        trade.symbol,
                        trade.quantity,
                        trade.price.round_dp(2),
                        trade.profit_loss.round_dp(2)
                    );
                }
                Ok(EngineEvent::Trade(trade)) => {
                    println!(
                        "[feed] trader {} {} {} x{} @ ${}",
                        trade.trader_id,
                        trade.side.as_str(),
                        trade.symbol,
                        trade.quantity,
                        trade.price.round_dp(2)
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Event printer lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Scripted deterministic session exercising every engine operation.
async fn run_demo() -> Result<()> {
    const USER: UserId = 101;

    let app = App::new(
        EngineConfig::default(),
        Arc::new(StaticQuoteSource::from_base_table()),
    );

    println!("\n=== copycast demo session ===\n");

    app.create_user(USER).await;
    println!("Created user {USER} with $100000");

    app.follow(USER, 1).await?;
    println!("Following trader 1 (no copy settings yet)");

    app.set_copy_settings(
        USER,
        3,
        CopySettings {
            position_size_type: PositionSizeType::Fixed,
            position_size: dec!(2000),
            max_position_size: dec!(10000),
            ..Default::default()
        },
    )
    .await?;
    println!("Copying trader 3: fixed $2000 per trade, $10000 cap");

    // Trader 3 buys; the $2000 budget copies 11 shares at $180
    app.inject_trade(Trade::new(3, "AAPL", TradeSide::Buy, 20, dec!(180)))
        .await;
    // Trader 1 trades too, but has no copy settings
    app.inject_trade(Trade::new(1, "MSFT", TradeSide::Buy, 10, dec!(390)))
        .await;

    // The market moves before trader 3 takes profit
    app.inject_quote(MarketQuote::of("AAPL", dec!(195))).await;
    app.inject_trade(Trade::new(3, "AAPL", TradeSide::Sell, 20, dec!(195)))
        .await;

    // Unfollow: later trades from trader 3 are ignored
    app.unfollow(USER, 3).await?;
    app.inject_trade(Trade::new(3, "AAPL", TradeSide::Buy, 20, dec!(195)))
        .await;

    // A trade the user places directly, outside any copy relationship
    let manual = app
        .execute_manual_trade(USER, Trade::new(0, "NVDA", TradeSide::Buy, 2, dec!(900)))
        .await?;
    println!(
        "Manual buy filled: {} x{} @ ${}",
        manual.symbol, manual.quantity, manual.price
    );

    let portfolio = app.portfolio(USER).await?;
    print_portfolio(&portfolio);

    Ok(())
}

fn print_portfolio(portfolio: &crate::models::Portfolio) {
    println!("\n=== Portfolio: user {} ===", portfolio.user_id);
    println!("Cash Balance:   ${}", portfolio.cash_balance.round_dp(2));
    println!("Holdings Value: ${}", portfolio.holdings_value().round_dp(2));
    println!("Total Value:    ${}", portfolio.total_value().round_dp(2));
    println!("Realized P&L:   ${}", portfolio.realized_pnl.round_dp(2));
    println!("Unrealized P&L: ${}", portfolio.unrealized_pnl().round_dp(2));

    if !portfolio.holdings.is_empty() {
        println!(
            "\n{:<8} {:>8} {:>10} {:>10} {:>12} {:>8}",
            "SYMBOL", "QTY", "AVG", "LAST", "UNREAL P&L", "ALLOC%"
        );
        println!("{}", "-".repeat(62));

        let mut holdings: Vec<_> = portfolio.holdings.values().collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        for holding in holdings {
            println!(
                "{:<8} {:>8} {:>10} {:>10} {:>12} {:>8}",
                holding.symbol,
                holding.quantity,
                holding.average_price.round_dp(2),
                holding.current_price.round_dp(2),
                holding.unrealized_pnl.round_dp(2),
                holding.allocation_percent.round_dp(2)
            );
        }
    }

    if !portfolio.history.is_empty() {
        println!("\n--- History (newest first) ---");
        for trade in portfolio.history.iter().take(10) {
            println!(
                "  {} {} x{} @ ${} (P&L ${})",
                trade.side.as_str(),
                trade.symbol,
                trade.quantity,
                trade.price.round_dp(2),
                trade.profit_loss.round_dp(2)
            );
        }
    }
}
