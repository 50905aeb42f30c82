//! CLI Command Handlers
//!
//! Argument definitions and handlers for every market-mood command. Each
//! handler queries the engine and renders the result as pretty JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::application::MarketEngine;
use crate::ports::provider::Interval;

/// market-mood - Crypto market data and composite mood index
#[derive(Parser, Debug)]
#[command(
    name = "market-mood",
    version = env!("CARGO_PKG_VERSION"),
    about = "Crypto market data and composite mood index",
    long_about = "market-mood fans out to price, DeFi, sentiment, wallet and chain providers, \
                  caches their answers and blends them into a 0-100 mood index."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Spot prices for one or more symbols
    Price(PriceCmd),

    /// Candle history for a symbol
    Ohlcv(OhlcvCmd),

    /// Composite mood index for a token
    Mood(MoodCmd),

    /// Wallet holdings and recent activity
    Wallet(WalletCmd),

    /// Open DeFi positions of a wallet
    Positions(WalletCmd),

    /// Largest holders of an ERC-20 token
    Holders(HoldersCmd),

    /// Fear & Greed index window
    FearGreed(FearGreedCmd),

    /// Total DeFi TVL and top protocols
    Defi,

    /// Detail for one DeFi protocol
    Protocol(ProtocolCmd),

    /// Top DEXs by 24h volume
    Dex,

    /// Best yield pools
    Yields(YieldsCmd),

    /// Largest stablecoins by circulation
    Stables,

    /// Protocol fees and top earners
    Fees,

    /// Token price by coin id (e.g., coingecko:ethereum)
    TokenPrice(TokenPriceCmd),

    /// Top gainers and losers
    Movers,

    /// Native ETH balance
    Balance(BalanceCmd),

    /// Latest transactions of an account
    Txs(AccountListCmd),

    /// Latest ERC-20 transfers of an account
    Transfers(AccountListCmd),

    /// Top holders of a token per Etherscan
    TopHolders(TopHoldersCmd),

    /// Ethereum gas oracle
    Gas,
}

/// Spot prices
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Symbols (e.g., BTC ETH SOL)
    #[arg(value_name = "SYMBOL", required = true)]
    pub symbols: Vec<String>,
}

/// Candle history
#[derive(Parser, Debug)]
pub struct OhlcvCmd {
    /// Symbol (e.g., BTC)
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Candle interval (e.g., 1h, 4h, 1d)
    #[arg(short, long, value_name = "INTERVAL", default_value = "1d")]
    pub interval: Interval,

    /// Number of candles
    #[arg(short, long, value_name = "N", default_value = "30")]
    pub limit: u32,
}

/// Mood index
#[derive(Parser, Debug)]
pub struct MoodCmd {
    /// Token symbol (e.g., BTC)
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

/// Wallet snapshot
#[derive(Parser, Debug)]
pub struct WalletCmd {
    /// Wallet address (0x...)
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Chain name
    #[arg(long, value_name = "CHAIN", default_value = "eth")]
    pub chain: String,
}

/// Fear & Greed window
#[derive(Parser, Debug)]
pub struct FearGreedCmd {
    /// Number of days
    #[arg(short, long, value_name = "DAYS", default_value = "7")]
    pub limit: u32,
}

/// Protocol detail
#[derive(Parser, Debug)]
pub struct ProtocolCmd {
    /// Protocol slug (e.g., aave, uniswap)
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

/// Yield pools
#[derive(Parser, Debug)]
pub struct YieldsCmd {
    /// Minimum pool TVL in USD
    #[arg(long, value_name = "USD", default_value = "1000000")]
    pub min_tvl: f64,

    /// Number of pools
    #[arg(short, long, value_name = "N", default_value = "10")]
    pub limit: usize,
}

/// ETH balance
#[derive(Parser, Debug)]
pub struct BalanceCmd {
    /// Wallet address (0x...)
    #[arg(value_name = "ADDRESS")]
    pub address: String,
}

/// Token holders
#[derive(Parser, Debug)]
pub struct HoldersCmd {
    /// Token contract address (0x...)
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Chain name
    #[arg(long, value_name = "CHAIN", default_value = "eth")]
    pub chain: String,

    /// Number of holders
    #[arg(short, long, value_name = "N", default_value = "20")]
    pub limit: u32,
}

/// Coin id price
#[derive(Parser, Debug)]
pub struct TokenPriceCmd {
    /// Coin id, `coingecko:<id>` or `<chain>:<address>`
    #[arg(value_name = "COIN_ID")]
    pub coin_id: String,
}

/// Account history
#[derive(Parser, Debug)]
pub struct AccountListCmd {
    /// Account address (0x...)
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Number of entries
    #[arg(short, long, value_name = "N", default_value = "20")]
    pub limit: u32,
}

/// Etherscan top holders
#[derive(Parser, Debug)]
pub struct TopHoldersCmd {
    /// Token contract address (0x...)
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

/// Run one command against the engine and render its output
pub async fn execute(command: Command, engine: &MarketEngine) -> Result<String> {
    match command {
        Command::Price(cmd) => match cmd.symbols.as_slice() {
            [symbol] => render(&engine.get_price(symbol).await),
            symbols => render(&engine.get_prices_multi(symbols).await),
        },
        Command::Ohlcv(cmd) => render(&engine.get_ohlcv(&cmd.symbol, cmd.interval, cmd.limit).await),
        Command::Mood(cmd) => render(&engine.get_composite_index(&cmd.token).await),
        Command::Wallet(cmd) => render(&engine.get_wallet_snapshot(&cmd.address, &cmd.chain).await),
        Command::Positions(cmd) => {
            render(&engine.get_wallet_defi_positions(&cmd.address, &cmd.chain).await)
        }
        Command::Holders(cmd) => {
            render(&engine.get_token_holders(&cmd.token, &cmd.chain, cmd.limit).await)
        }
        Command::FearGreed(cmd) => render(&engine.get_fear_greed(cmd.limit).await),
        Command::Defi => render(&engine.get_defi_overview().await),
        Command::Protocol(cmd) => render(&engine.get_protocol(&cmd.slug).await),
        Command::Dex => render(&engine.get_dex_volumes().await),
        Command::Yields(cmd) => render(&engine.get_top_yields(cmd.min_tvl, cmd.limit).await),
        Command::Stables => render(&engine.get_stablecoins().await),
        Command::Fees => render(&engine.get_protocol_revenues().await),
        Command::TokenPrice(cmd) => render(&engine.get_token_price_llama(&cmd.coin_id).await),
        Command::Movers => render(&engine.get_market_movers().await),
        Command::Balance(cmd) => render(&engine.get_eth_balance(&cmd.address).await),
        Command::Txs(cmd) => render(&engine.get_eth_transactions(&cmd.address, cmd.limit).await),
        Command::Transfers(cmd) => render(&engine.get_token_transfers(&cmd.address, cmd.limit).await),
        Command::TopHolders(cmd) => render(&engine.get_top_token_holders(&cmd.token).await),
        Command::Gas => render(&engine.get_gas_oracle().await),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render output")
}
