//! Lifecycle tests for the confirmation monitor against a scripted fake
//! node. Runs under paused tokio time, so sleep cadence and elapsed
//! measurements are exact.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tarn_client::{ClientError, NodeClient, NodeStatus, OutputsResult, TransactionStatus};
use tarn_core::types::{Hash256, Transaction, TxInput, TxOutput, UnspentOutput};
use tarn_monitor::{ConfirmationMonitor, MonitorConfig, MonitorError};

const SUBMIT_BLOCK: u64 = 1042;
const TXID: &str = "fa11ab1e";

/// Scripted node: injection result, a queue of per-poll transaction
/// statuses (empty queue means "still pending"), and a fixed outputs
/// answer for every address.
struct FakeNode {
    inject_result: Result<String, ClientError>,
    tx_statuses: Mutex<VecDeque<Result<TransactionStatus, ClientError>>>,
    outputs: OutputsResult,
    inject_calls: AtomicU32,
    status_calls: AtomicU32,
    tx_calls: AtomicU32,
    outputs_calls: AtomicU32,
}

impl FakeNode {
    fn new() -> Self {
        let head = UnspentOutput {
            hash: "11".repeat(32),
            address: "ttarn1source".to_string(),
            coins: "1.000000".to_string(),
            hours: 5,
        };
        Self {
            inject_result: Ok(TXID.to_string()),
            tx_statuses: Mutex::new(VecDeque::new()),
            outputs: OutputsResult {
                head_outputs: vec![head],
                incoming_outputs: vec![],
            },
            inject_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            tx_calls: AtomicU32::new(0),
            outputs_calls: AtomicU32::new(0),
        }
    }

    fn push_pending(&self, n: usize) {
        let mut queue = self.tx_statuses.lock().unwrap();
        for _ in 0..n {
            queue.push_back(Ok(TransactionStatus {
                confirmed: false,
                block_seq: 0,
            }));
        }
    }

    fn push_confirmed(&self, block_seq: u64) {
        self.tx_statuses.lock().unwrap().push_back(Ok(TransactionStatus {
            confirmed: true,
            block_seq,
        }));
    }

    fn push_error(&self, err: ClientError) {
        self.tx_statuses.lock().unwrap().push_back(Err(err));
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn get_status(&self) -> Result<NodeStatus, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(NodeStatus {
            block_num: SUBMIT_BLOCK,
            last_block_hash: "00".repeat(32),
        })
    }

    async fn get_unspent_outputs(
        &self,
        _addresses: &[String],
    ) -> Result<OutputsResult, ClientError> {
        self.outputs_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.clone())
    }

    async fn inject_transaction(&self, _tx: &Transaction) -> Result<String, ClientError> {
        self.inject_calls.fetch_add(1, Ordering::SeqCst);
        self.inject_result.clone()
    }

    async fn get_transaction(&self, _txid: &str) -> Result<TransactionStatus, ClientError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        match self.tx_statuses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(TransactionStatus {
                confirmed: false,
                block_seq: 0,
            }),
        }
    }
}

fn sample_tx() -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxInput {
            spent_output: Hash256([0x11; 32]),
            signature: vec![0; 64],
            public_key: vec![0; 32],
        }],
        outputs: vec![TxOutput {
            coins: 100_000,
            hours: 0,
            pubkey_hash: Hash256([0x22; 32]),
        }],
    }
}

fn config(timeout: Option<Duration>) -> MonitorConfig {
    MonitorConfig {
        poll_interval: Duration::from_secs(1),
        timeout,
    }
}

#[tokio::test(start_paused = true)]
async fn confirms_after_four_polls() {
    let node = FakeNode::new();
    node.push_pending(3);
    node.push_confirmed(SUBMIT_BLOCK + 4);

    let monitor = ConfirmationMonitor::new(&node, config(Some(Duration::from_secs(600))));
    let record = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap();

    assert_eq!(record.txid, TXID);
    assert_eq!(record.polls, 4);
    assert_eq!(record.submit_block, SUBMIT_BLOCK);
    assert_eq!(record.confirm_block, SUBMIT_BLOCK + 4);
    assert_eq!(record.blocks_elapsed(), 4);
    // Paused time: exactly one poll interval per cycle.
    assert_eq!(record.elapsed, Duration::from_secs(4));

    assert_eq!(node.inject_calls.load(Ordering::SeqCst), 1);
    assert_eq!(node.status_calls.load(Ordering::SeqCst), 1);
    assert_eq!(node.tx_calls.load(Ordering::SeqCst), 4);
    // Source and destination balances sampled every cycle.
    assert_eq!(node.outputs_calls.load(Ordering::SeqCst), 8);
}

#[tokio::test(start_paused = true)]
async fn times_out_while_pending() {
    let node = FakeNode::new();
    // Queue stays empty: every poll reports pending.

    let monitor = ConfirmationMonitor::new(&node, config(Some(Duration::from_secs(3))));
    let err = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap_err();

    match err {
        MonitorError::Timeout { txid, waited, polls } => {
            assert_eq!(txid, TXID);
            assert_eq!(waited, Duration::from_secs(3));
            assert_eq!(polls, 2);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn unbounded_wait_confirms_past_default_horizon() {
    let node = FakeNode::new();
    node.push_pending(700);
    node.push_confirmed(SUBMIT_BLOCK + 1);

    let monitor = ConfirmationMonitor::new(&node, config(None));
    let record = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap();
    assert_eq!(record.polls, 701);
}

#[tokio::test(start_paused = true)]
async fn rejected_injection_is_fatal() {
    let mut node = FakeNode::new();
    node.inject_result = Err(ClientError::RejectedByNode("double spend".into()));

    let monitor = ConfirmationMonitor::new(&node, config(None));
    let err = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MonitorError::Inject(ClientError::RejectedByNode(_))
    ));
    // Nothing reached the network; no baseline, no polling.
    assert_eq!(node.status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(node.tx_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_surfaces_with_txid() {
    let node = FakeNode::new();
    node.push_pending(1);
    node.push_error(ClientError::NodeUnavailable("connection reset".into()));

    let monitor = ConfirmationMonitor::new(&node, config(None));
    let err = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap_err();

    match err {
        MonitorError::PostInject { txid, source } => {
            assert_eq!(txid, TXID);
            assert!(matches!(source, ClientError::NodeUnavailable(_)));
        }
        other => panic!("expected PostInject, got {other:?}"),
    }
    assert_eq!(node.tx_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn confirmation_is_terminal() {
    let node = FakeNode::new();
    node.push_pending(1);
    node.push_confirmed(SUBMIT_BLOCK + 2);
    // A later, different answer must never be observed.
    node.push_confirmed(SUBMIT_BLOCK + 99);

    let monitor = ConfirmationMonitor::new(&node, config(None));
    let record = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap();

    assert_eq!(record.confirm_block, SUBMIT_BLOCK + 2);
    assert_eq!(node.tx_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn invalid_balance_data_is_fatal() {
    let mut node = FakeNode::new();
    node.outputs.head_outputs[0].coins = "bogus".to_string();
    node.push_confirmed(SUBMIT_BLOCK + 1);

    let monitor = ConfirmationMonitor::new(&node, config(None));
    let err = monitor
        .submit_and_await(&sample_tx(), "ttarn1source", "ttarn1dest")
        .await
        .unwrap_err();

    match err {
        MonitorError::Balance { txid, address, .. } => {
            assert_eq!(txid, TXID);
            assert_eq!(address, "ttarn1source");
        }
        other => panic!("expected Balance, got {other:?}"),
    }
}
