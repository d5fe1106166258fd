//! # tarn-client — Node RPC boundary.
//!
//! Defines the [`NodeClient`] trait consumed by the rest of the tooling and
//! an HTTP JSON-RPC implementation backed by jsonrpsee. Components take an
//! explicit client instance, so tests substitute a fake by implementing the
//! trait.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpNodeClient, NodeClient};
pub use error::ClientError;
pub use types::{NodeStatus, OutputsResult, TransactionStatus};
