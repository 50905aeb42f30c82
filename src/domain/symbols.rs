//! Symbol Alias Tables
//!
//! Maps user-facing tickers to provider identifiers. Lookup is
//! case-insensitive; symbols absent from a table fall back to a
//! synthesized identifier rather than failing.

/// Ticker -> Binance USDT pair
const BINANCE_PAIRS: &[(&str, &str)] = &[
    ("BTC", "BTCUSDT"),
    ("ETH", "ETHUSDT"),
    ("SOL", "SOLUSDT"),
    ("BNB", "BNBUSDT"),
    ("AVAX", "AVAXUSDT"),
    ("ARB", "ARBUSDT"),
    ("OP", "OPUSDT"),
    ("MATIC", "MATICUSDT"),
    ("LINK", "LINKUSDT"),
    ("UNI", "UNIUSDT"),
    ("AAVE", "AAVEUSDT"),
    ("DOT", "DOTUSDT"),
];

/// Ticker -> CoinGecko coin id
const COINGECKO_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("AVAX", "avalanche-2"),
    ("DOT", "polkadot"),
    ("MATIC", "matic-network"),
    ("LINK", "chainlink"),
    ("ARB", "arbitrum"),
    ("OP", "optimism"),
    ("UNI", "uniswap"),
    ("AAVE", "aave"),
    ("MKR", "maker"),
    ("LDO", "lido-dao"),
    ("CRV", "curve-dao-token"),
    ("DOGE", "dogecoin"),
    ("USDT", "tether"),
    ("USDC", "usd-coin"),
    ("DAI", "dai"),
];

/// Canonical form of a user-supplied symbol
pub fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

fn lookup(table: &[(&str, &'static str)], symbol: &str) -> Option<&'static str> {
    let wanted = symbol.trim();
    table
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(wanted))
        .map(|(_, id)| *id)
}

/// Binance trading pair for a ticker, `{SYMBOL}USDT` when unknown
pub fn binance_pair(symbol: &str) -> String {
    lookup(BINANCE_PAIRS, symbol)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}USDT", normalize(symbol)))
}

/// CoinGecko id for a ticker
///
/// Unknown tickers are lower-cased, which also lets callers pass a coin id
/// such as `bitcoin` straight through.
pub fn coingecko_id(symbol: &str) -> String {
    lookup(COINGECKO_IDS, symbol)
        .map(str::to_string)
        .unwrap_or_else(|| symbol.trim().to_ascii_lowercase())
}
