//! CLI Adapter
//!
//! Command-line interface for market-mood.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    execute, AccountListCmd, BalanceCmd, CliApp, Command, FearGreedCmd, HoldersCmd, MoodCmd,
    OhlcvCmd, PriceCmd, ProtocolCmd, TokenPriceCmd, TopHoldersCmd, WalletCmd, YieldsCmd,
};
