//! Balance aggregation over node-reported unspent outputs.
//!
//! A [`Balance`] is a derived value recomputed on every query; it is never
//! persisted. The node partitions outputs into head (confirmed) and
//! incoming (unconfirmed) sets, and callers aggregate each partition
//! separately.

use tarn_core::constants::COIN;
use tarn_core::error::OutputError;
use tarn_core::types::UnspentOutput;

use crate::error::WalletError;

/// Aggregate (coins, hours) over a set of outputs for one address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    /// Total coin value in drops.
    pub coins: u64,
    /// Total accrued hours.
    pub hours: u64,
}

impl Balance {
    /// The zero balance.
    pub const ZERO: Self = Self { coins: 0, hours: 0 };

    /// Coin total in whole TARN (display helper, not for arithmetic).
    pub fn coins_tarn(&self) -> f64 {
        self.coins as f64 / COIN as f64
    }

    /// Whether both coins and hours are zero.
    pub fn is_zero(&self) -> bool {
        self.coins == 0 && self.hours == 0
    }
}

/// Sum coin and hour values over a set of unspent outputs.
///
/// Safe to call on an empty set (returns the zero balance). Fails with
/// `InvalidOutputData` when a coin string cannot be parsed or a sum
/// overflows. The result is independent of output order.
pub fn aggregate(outputs: &[UnspentOutput]) -> Result<Balance, WalletError> {
    let mut coins: u64 = 0;
    let mut hours: u64 = 0;

    for output in outputs {
        coins = coins
            .checked_add(output.drops()?)
            .ok_or(OutputError::BalanceOverflow)?;
        hours = hours
            .checked_add(output.hours)
            .ok_or(OutputError::BalanceOverflow)?;
    }

    Ok(Balance { coins, hours })
}
