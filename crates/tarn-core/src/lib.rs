//! # tarn-core
//! Foundation types for the Tarn ledger: transactions, unspent outputs,
//! addresses, and the Ed25519/BLAKE3 crypto they rely on.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod types;
