//! The [`NodeClient`] trait and its jsonrpsee HTTP implementation.

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::client::Error as RpcError;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tracing::debug;

use tarn_core::types::Transaction;

use crate::error::ClientError;
use crate::types::{NodeStatus, OutputsResult, TransactionStatus};

/// The node RPC surface consumed by the transaction lifecycle.
///
/// An instance is passed explicitly into every component that needs one;
/// tests substitute a scripted fake.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Current head block height.
    async fn get_status(&self) -> Result<NodeStatus, ClientError>;

    /// Unspent outputs for a set of addresses, partitioned into
    /// confirmed (head) and unconfirmed (incoming) sets.
    async fn get_unspent_outputs(
        &self,
        addresses: &[String],
    ) -> Result<OutputsResult, ClientError>;

    /// Submit a signed transaction to the network. Returns the assigned
    /// transaction id.
    async fn inject_transaction(&self, tx: &Transaction) -> Result<String, ClientError>;

    /// Confirmation state of a previously injected transaction.
    async fn get_transaction(&self, txid: &str) -> Result<TransactionStatus, ClientError>;
}

/// JSON-RPC HTTP client for a Tarn node.
#[derive(Debug)]
pub struct HttpNodeClient {
    client: HttpClient,
    endpoint: String,
}

impl HttpNodeClient {
    /// Build a client for the given HTTP endpoint.
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let client = HttpClientBuilder::default()
            .build(endpoint)
            .map_err(|e| ClientError::NodeUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Map a jsonrpsee error: RPC-level call errors go through `on_call`,
/// everything else (transport, timeout, parse) means the node is
/// effectively unreachable.
fn map_rpc_error(err: RpcError, on_call: impl FnOnce(String) -> ClientError) -> ClientError {
    match err {
        RpcError::Call(e) => on_call(e.message().to_string()),
        other => ClientError::NodeUnavailable(other.to_string()),
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get_status(&self) -> Result<NodeStatus, ClientError> {
        self.client
            .request("get_status", ArrayParams::new())
            .await
            .map_err(|e| map_rpc_error(e, ClientError::NodeUnavailable))
    }

    async fn get_unspent_outputs(
        &self,
        addresses: &[String],
    ) -> Result<OutputsResult, ClientError> {
        let mut params = ArrayParams::new();
        params
            .insert(addresses)
            .expect("string list serializes as params");

        debug!(count = addresses.len(), "querying unspent outputs");
        self.client
            .request("get_outputs", params)
            .await
            .map_err(|e| map_rpc_error(e, ClientError::InvalidAddress))
    }

    async fn inject_transaction(&self, tx: &Transaction) -> Result<String, ClientError> {
        let tx_bytes = tx
            .to_bytes()
            .map_err(|e| ClientError::Encoding(e.to_string()))?;
        let tx_hex = hex::encode(&tx_bytes);

        let mut params = ArrayParams::new();
        params.insert(tx_hex).expect("hex string serializes as param");

        debug!(bytes = tx_bytes.len(), "injecting transaction");
        self.client
            .request("inject_transaction", params)
            .await
            .map_err(|e| map_rpc_error(e, ClientError::RejectedByNode))
    }

    async fn get_transaction(&self, txid: &str) -> Result<TransactionStatus, ClientError> {
        let mut params = ArrayParams::new();
        params
            .insert(txid)
            .expect("txid string serializes as param");

        self.client
            .request("get_transaction", params)
            .await
            .map_err(|e| {
                map_rpc_error(e, |msg| {
                    ClientError::UnknownTransaction(format!("{txid}: {msg}"))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::types::ErrorObject;

    #[test]
    fn call_errors_map_to_domain_error() {
        let err = RpcError::Call(ErrorObject::owned(-32602, "no such transaction", None::<()>));
        let mapped = map_rpc_error(err, |msg| ClientError::UnknownTransaction(msg));
        assert_eq!(
            mapped,
            ClientError::UnknownTransaction("no such transaction".into())
        );
    }

    #[test]
    fn transport_errors_map_to_unavailable() {
        let err = RpcError::RequestTimeout;
        let mapped = map_rpc_error(err, ClientError::RejectedByNode);
        assert!(matches!(mapped, ClientError::NodeUnavailable(_)));
    }

    #[test]
    fn bad_endpoint_is_unavailable() {
        let err = HttpNodeClient::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::NodeUnavailable(_)));
    }

    #[test]
    fn endpoint_is_kept() {
        let client = HttpNodeClient::new("http://127.0.0.1:18332").unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:18332");
    }
}
