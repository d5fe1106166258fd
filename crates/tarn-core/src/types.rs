//! Core ledger types: transactions and unspent outputs.
//!
//! All monetary values are in drops (1 TARN = 10^6 drops). Nodes serve
//! coin amounts as decimal strings with up to six fractional digits;
//! [`parse_drops`] converts that form into integer drops.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::constants::{COIN, COIN_DECIMALS};
use crate::error::{OutputError, TransactionError};

/// A 32-byte hash value.
///
/// Used for transaction ids, unspent-output ids, and pubkey hashes,
/// all computed with BLAKE3.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A transaction input, consuming one unspent output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxInput {
    /// Id of the unspent output being consumed.
    pub spent_output: Hash256,
    /// Ed25519 signature (64 bytes). Empty until signed.
    pub signature: Vec<u8>,
    /// Ed25519 public key (32 bytes). Empty until signed.
    pub public_key: Vec<u8>,
}

/// A transaction output, creating a new spendable output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOutput {
    /// Coin value in drops.
    pub coins: u64,
    /// Accrued hours allocated to this output.
    pub hours: u64,
    /// BLAKE3 hash of the recipient's Ed25519 public key.
    pub pubkey_hash: Hash256,
}

/// A transaction transferring coins and hours between addresses.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u64,
    /// Inputs consuming previous outputs.
    pub inputs: Vec<TxInput>,
    /// New outputs created by this transaction.
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Compute the transaction id (BLAKE3 hash of the canonical encoding).
    ///
    /// Uses bincode with standard config for deterministic serialization.
    pub fn txid(&self) -> Result<Hash256, TransactionError> {
        let encoded = self.to_bytes()?;
        Ok(Hash256(blake3::hash(&encoded).into()))
    }

    /// Canonical bincode encoding, as injected over RPC.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Sum of all output coin values. Fails on overflow.
    pub fn total_output_coins(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.coins))
            .ok_or(TransactionError::ValueOverflow)
    }

    /// Sum of all output hours. Fails on overflow.
    pub fn total_output_hours(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.hours))
            .ok_or(TransactionError::ValueOverflow)
    }
}

/// An unspent output in the readable form served by nodes.
///
/// Coin values arrive as decimal strings ("0.100000"); hours as plain
/// integers. The node partitions outputs into head (confirmed) and
/// incoming (unconfirmed) sets at query time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Output id as a 64-character hex string.
    pub hash: String,
    /// Owning address in Bech32m form.
    pub address: String,
    /// Coin value as a decimal string with up to 6 fractional digits.
    pub coins: String,
    /// Accrued hours.
    pub hours: u64,
}

impl UnspentOutput {
    /// Parse the coin string into drops.
    pub fn drops(&self) -> Result<u64, OutputError> {
        parse_drops(&self.coins)
    }

    /// Parse the output id.
    pub fn id(&self) -> Result<Hash256, OutputError> {
        Hash256::from_hex(&self.hash).ok_or_else(|| OutputError::InvalidId(self.hash.clone()))
    }

    /// Decode the owning address.
    pub fn owner(&self) -> Result<Address, OutputError> {
        Address::decode(&self.address)
            .map_err(|e| OutputError::InvalidOwner(format!("{}: {e}", self.address)))
    }
}

/// Parse a decimal coin string into drops.
///
/// Accepts an unsigned decimal with at most [`COIN_DECIMALS`] fractional
/// digits. Rejects empty strings, signs, non-digit characters, excess
/// precision, and values that overflow u64.
pub fn parse_drops(s: &str) -> Result<u64, OutputError> {
    let invalid = |reason: &str| OutputError::InvalidCoins {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("empty"));
    }
    if s.starts_with('-') {
        return Err(invalid("negative"));
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("non-digit character"));
    }
    if frac.len() > COIN_DECIMALS as usize {
        return Err(invalid("more than 6 decimal places"));
    }

    let whole_drops = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .ok()
            .and_then(|w| w.checked_mul(COIN))
            .ok_or_else(|| invalid("overflow"))?
    };

    // At most 6 digits, so the scaled value always fits.
    let frac_drops = if frac.is_empty() {
        0
    } else {
        let scale = 10u64.pow(COIN_DECIMALS - frac.len() as u32);
        frac.parse::<u64>().expect("digits only") * scale
    };

    whole_drops
        .checked_add(frac_drops)
        .ok_or_else(|| invalid("overflow"))
}

/// Format drops as the decimal coin string served by nodes.
pub fn format_drops(drops: u64) -> String {
    format!("{}.{:06}", drops / COIN, drops % COIN)
}
