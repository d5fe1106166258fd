//! # tarn-wallet — deterministic wallet and transaction construction.
//!
//! Provides deterministic key derivation from a seed phrase, balance
//! aggregation over node-reported unspent outputs, largest-first coin
//! selection, transaction building and signing, and encrypted wallet file
//! persistence.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`keys`] — Seed, KeyChain, BLAKE3-based key derivation
//! - [`mnemonic`] — BIP-39 seed backup
//! - [`balance`] — (coins, hours) aggregation over unspent outputs
//! - [`coin_selection`] — deterministic largest-first selection
//! - [`builder`] — transaction builder with signing
//! - [`encryption`] — AES-256-GCM wallet file encryption
//! - [`wallet`] — high-level wallet composition and file persistence

pub mod balance;
pub mod builder;
pub mod coin_selection;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod wallet;

pub use balance::{aggregate, Balance};
pub use builder::{Recipient, TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{CoinSelection, CoinSelector, SpendableOutput};
pub use error::WalletError;
pub use keys::{derive_addresses, KeyChain, KeyChainData, Seed};
pub use mnemonic::{mnemonic_to_seed, seed_to_mnemonic};
pub use wallet::Wallet;
