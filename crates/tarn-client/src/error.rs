//! Node client error types.

use thiserror::Error;

/// Errors crossing the node RPC boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The node could not be reached or did not answer.
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    /// The node rejected an address in an outputs query.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The node refused to accept an injected transaction
    /// (double-spend, malformed encoding, failed signature check).
    #[error("transaction rejected by node: {0}")]
    RejectedByNode(String),

    /// The node does not know the queried transaction id.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    /// The transaction could not be encoded for injection.
    #[error("transaction encoding failed: {0}")]
    Encoding(String),

    /// The node answered with something this client cannot interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
