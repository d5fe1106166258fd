//! JSON result types for the node RPC surface.

use serde::{Deserialize, Serialize};
use tarn_core::types::UnspentOutput;

/// Result of `get_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Height of the current head block.
    pub block_num: u64,
    /// Hash of the current head block as hex.
    pub last_block_hash: String,
}

/// Result of `get_outputs`: unspent outputs for a set of addresses,
/// partitioned by confirmation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputsResult {
    /// Outputs included in a settled block.
    pub head_outputs: Vec<UnspentOutput>,
    /// Outputs only visible in the pending pool.
    pub incoming_outputs: Vec<UnspentOutput>,
}

/// Result of `get_transaction`: confirmation state of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    /// Whether the transaction is included in a settled block.
    pub confirmed: bool,
    /// Sequence number of the including block (0 while unconfirmed).
    pub block_seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_json() {
        let status: NodeStatus = serde_json::from_str(
            r#"{"block_num": 1042, "last_block_hash": "00ab"}"#,
        )
        .unwrap();
        assert_eq!(status.block_num, 1042);
        assert_eq!(status.last_block_hash, "00ab");
    }

    #[test]
    fn outputs_from_json() {
        let outputs: OutputsResult = serde_json::from_str(
            r#"{
                "head_outputs": [
                    {"hash": "aa", "address": "ttarn1x", "coins": "0.200000", "hours": 3}
                ],
                "incoming_outputs": []
            }"#,
        )
        .unwrap();
        assert_eq!(outputs.head_outputs.len(), 1);
        assert_eq!(outputs.head_outputs[0].coins, "0.200000");
        assert!(outputs.incoming_outputs.is_empty());
    }

    #[test]
    fn transaction_status_from_json() {
        let pending: TransactionStatus =
            serde_json::from_str(r#"{"confirmed": false, "block_seq": 0}"#).unwrap();
        assert!(!pending.confirmed);

        let confirmed: TransactionStatus =
            serde_json::from_str(r#"{"confirmed": true, "block_seq": 77}"#).unwrap();
        assert!(confirmed.confirmed);
        assert_eq!(confirmed.block_seq, 77);
    }
}
