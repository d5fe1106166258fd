//! Ledger constants. All monetary values are in drops (1 TARN = 10^6 drops).

/// Drops per whole TARN.
pub const COIN: u64 = 1_000_000;

/// Number of decimal places in the coin-string representation served by nodes.
pub const COIN_DECIMALS: u32 = 6;

/// Transaction format version emitted by this tooling.
pub const TX_VERSION: u64 = 1;
