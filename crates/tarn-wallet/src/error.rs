//! Wallet error types.

use tarn_core::error::{CryptoError, OutputError, TransactionError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The seed phrase cannot be used to derive key material.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Available outputs do not cover the requested amount.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Available coin total in drops.
        have: u64,
        /// Requested coin total in drops.
        need: u64,
    },

    /// No unspent outputs available for spending.
    #[error("no spendable outputs")]
    NoSpendableOutputs,

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A node-reported output could not be interpreted.
    #[error("invalid output data: {0}")]
    InvalidOutputData(#[from] OutputError),

    /// Required signing key not found in the keychain.
    #[error("signing key not found: {0}")]
    KeyNotFound(String),

    /// Transaction build error.
    #[error("build error: {0}")]
    BuildError(String),

    /// Cryptographic failure while signing or verifying.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Transaction encoding failure.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Encryption failure.
    #[error("encryption: {0}")]
    Encryption(String),

    /// Wrong password for wallet file.
    #[error("invalid password")]
    InvalidPassword,

    /// Wallet file is corrupted or has an unsupported format.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization error.
    #[error("serialization: {0}")]
    Serialization(String),

    /// Invalid BIP-39 mnemonic phrase.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_funds() {
        let e = WalletError::InsufficientFunds {
            have: 50_000,
            need: 100_000,
        };
        assert_eq!(e.to_string(), "insufficient funds: have 50000, need 100000");
    }

    #[test]
    fn from_output_error() {
        let e: WalletError = OutputError::BalanceOverflow.into();
        assert_eq!(
            e,
            WalletError::InvalidOutputData(OutputError::BalanceOverflow)
        );
    }

    #[test]
    fn from_crypto_error() {
        let e: WalletError = CryptoError::InvalidPublicKey.into();
        assert_eq!(e, WalletError::Crypto(CryptoError::InvalidPublicKey));
    }
}
