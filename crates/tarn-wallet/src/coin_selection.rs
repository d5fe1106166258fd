//! Deterministic largest-first coin selection.
//!
//! Outputs are sorted by coin value descending, ties broken by output id
//! ascending, and consumed greedily until the target is covered. The
//! selection depends only on the output set, never on query order, so the
//! same funds always produce the same transaction shape.

use tarn_core::types::{Hash256, UnspentOutput};

use crate::error::WalletError;

/// An unspent output parsed into its spendable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendableOutput {
    /// Output id.
    pub id: Hash256,
    /// Pubkey hash of the owning address (for signing key lookup).
    pub pubkey_hash: Hash256,
    /// Coin value in drops.
    pub coins: u64,
    /// Accrued hours.
    pub hours: u64,
}

impl SpendableOutput {
    /// Parse a node-reported output. Fails with `InvalidOutputData` when
    /// the id, owner address, or coin string cannot be interpreted.
    pub fn from_readable(output: &UnspentOutput) -> Result<Self, WalletError> {
        Ok(Self {
            id: output.id()?,
            pubkey_hash: output.owner()?.pubkey_hash(),
            coins: output.drops()?,
            hours: output.hours,
        })
    }

    /// Parse a whole query result.
    pub fn parse_all(outputs: &[UnspentOutput]) -> Result<Vec<Self>, WalletError> {
        outputs.iter().map(Self::from_readable).collect()
    }
}

/// Result of coin selection: which outputs to spend and the change owed
/// back to the source.
#[derive(Debug, Clone)]
pub struct CoinSelection {
    /// Selected outputs, in spend order.
    pub selected: Vec<SpendableOutput>,
    /// Total coin value of the selected outputs in drops.
    pub total_coins: u64,
    /// Total hours carried by the selected outputs.
    pub total_hours: u64,
    /// Leftover coins returned to the source (total_coins - target).
    pub change: u64,
}

/// Largest-first coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select outputs to cover a target amount in drops.
    ///
    /// Change is `total - target` and therefore never negative. Fails with
    /// `InsufficientFunds` when the available total falls short of the
    /// target.
    pub fn select(
        outputs: &[SpendableOutput],
        target: u64,
    ) -> Result<CoinSelection, WalletError> {
        if outputs.is_empty() {
            return Err(WalletError::NoSpendableOutputs);
        }
        if target == 0 {
            return Err(WalletError::InvalidAmount("target must be non-zero".into()));
        }

        let mut ordered: Vec<SpendableOutput> = outputs.to_vec();
        ordered.sort_by(|a, b| b.coins.cmp(&a.coins).then(a.id.cmp(&b.id)));

        let mut selected = Vec::new();
        let mut total_coins: u64 = 0;
        let mut total_hours: u64 = 0;

        for output in ordered {
            total_coins = total_coins.saturating_add(output.coins);
            total_hours = total_hours.saturating_add(output.hours);
            selected.push(output);

            if total_coins >= target {
                return Ok(CoinSelection {
                    selected,
                    total_coins,
                    total_hours,
                    change: total_coins - target,
                });
            }
        }

        Err(WalletError::InsufficientFunds {
            have: total_coins,
            need: target,
        })
    }
}
