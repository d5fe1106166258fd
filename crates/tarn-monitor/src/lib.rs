//! # tarn-monitor — transaction submission and confirmation monitoring.
//!
//! Drives one transaction through its lifecycle: inject it into the
//! network, record the baseline block height and timestamp, then poll the
//! node until the transaction is included in a settled block, reporting
//! source and destination balances each cycle.
//!
//! The wait is bounded: an explicit timeout in [`MonitorConfig`] turns a
//! stuck confirmation into [`MonitorError::Timeout`] instead of an
//! unbounded loop, and the only suspension point is an async sleep, so a
//! caller can also cancel by dropping or racing the returned future.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tarn_client::{ClientError, NodeClient};
use tarn_core::types::Transaction;
use tarn_wallet::balance::aggregate;
use tarn_wallet::WalletError;

/// Confirmation monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Cadence of the confirmation poll loop.
    pub poll_interval: Duration,
    /// Upper bound on the confirmation wait. `None` polls until the caller
    /// cancels the future.
    pub timeout: Option<Duration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Lifecycle state of a monitored transaction.
///
/// Transitions are strictly forward: Built → Injected → Pending →
/// {Confirmed, TimedOut}. The terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Signed but not yet submitted.
    Built,
    /// Accepted by the node and assigned a transaction id.
    Injected,
    /// Visible in the unconfirmed pool, awaiting a block.
    Pending,
    /// Included in a settled block.
    Confirmed,
    /// The configured deadline elapsed while still pending.
    TimedOut,
}

impl TxState {
    /// Whether this state ends the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed | TxState::TimedOut)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: TxState) -> bool {
        matches!(
            (self, next),
            (TxState::Built, TxState::Injected)
                | (TxState::Injected, TxState::Pending)
                | (TxState::Pending, TxState::Confirmed)
                | (TxState::Pending, TxState::TimedOut)
        )
    }
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxState::Built => "built",
            TxState::Injected => "injected",
            TxState::Pending => "pending",
            TxState::Confirmed => "confirmed",
            TxState::TimedOut => "timed-out",
        };
        f.write_str(s)
    }
}

/// Observation of one confirmed transaction. Created once per monitored
/// transaction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ConfirmationRecord {
    /// Transaction id assigned at injection.
    pub txid: String,
    /// Wall-clock time of submission.
    pub submitted_at: DateTime<Utc>,
    /// Wall-clock time confirmation was observed.
    pub confirmed_at: DateTime<Utc>,
    /// Head block height at submission (the baseline).
    pub submit_block: u64,
    /// Sequence number of the block that included the transaction.
    pub confirm_block: u64,
    /// Wall time from submission to observed confirmation.
    pub elapsed: Duration,
    /// Number of status polls performed.
    pub polls: u32,
}

impl ConfirmationRecord {
    /// Number of blocks produced between submission and confirmation.
    pub fn blocks_elapsed(&self) -> u64 {
        self.confirm_block.saturating_sub(self.submit_block)
    }
}

/// Errors from the confirmation monitor.
///
/// Variants other than [`MonitorError::Inject`] mean the transaction was
/// already injected and still exists on the network even though
/// monitoring stopped.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Injection failed; nothing reached the network.
    #[error("transaction injection failed: {0}")]
    Inject(#[source] ClientError),

    /// A node query failed after the transaction was injected.
    #[error("monitoring failed after injection of {txid}: {source}")]
    PostInject {
        txid: String,
        #[source]
        source: ClientError,
    },

    /// A balance trace could not interpret node-reported outputs.
    #[error("balance aggregation failed for {address} after injection of {txid}: {source}")]
    Balance {
        txid: String,
        address: String,
        #[source]
        source: WalletError,
    },

    /// The configured deadline elapsed with the transaction still pending.
    #[error("transaction {txid} not confirmed within {waited:?} ({polls} polls)")]
    Timeout {
        txid: String,
        waited: Duration,
        polls: u32,
    },
}

/// Submits a transaction and watches it until confirmation.
pub struct ConfirmationMonitor<'a, C> {
    client: &'a C,
    config: MonitorConfig,
}

impl<'a, C: NodeClient> ConfirmationMonitor<'a, C> {
    /// Create a monitor over an explicit node client.
    pub fn new(client: &'a C, config: MonitorConfig) -> Self {
        Self { client, config }
    }

    /// Submit `tx` and poll until it confirms, times out, or a node query
    /// fails.
    ///
    /// `source` and `dest` are the addresses whose balances are sampled
    /// and logged each poll cycle; the sampling is observational and does
    /// not influence the state machine.
    pub async fn submit_and_await(
        &self,
        tx: &Transaction,
        source: &str,
        dest: &str,
    ) -> Result<ConfirmationRecord, MonitorError> {
        let txid = self
            .client
            .inject_transaction(tx)
            .await
            .map_err(MonitorError::Inject)?;

        // Baseline: block height and timestamps right after injection.
        let status = self
            .client
            .get_status()
            .await
            .map_err(|e| MonitorError::PostInject {
                txid: txid.clone(),
                source: e,
            })?;
        let submit_block = status.block_num;
        let submitted_at = Utc::now();
        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);

        info!(
            %txid,
            submit_block,
            state = %TxState::Injected,
            "transaction injected, awaiting confirmation"
        );

        let mut polls: u32 = 0;
        loop {
            let sleep_for = match deadline {
                Some(d) => self.config.poll_interval.min(d.duration_since(Instant::now())),
                None => self.config.poll_interval,
            };
            tokio::time::sleep(sleep_for).await;

            if let Some(d) = deadline {
                if Instant::now() >= d {
                    let waited = started.elapsed();
                    warn!(%txid, ?waited, polls, state = %TxState::TimedOut, "confirmation wait timed out");
                    return Err(MonitorError::Timeout { txid, waited, polls });
                }
            }

            polls += 1;
            let tx_status = self
                .client
                .get_transaction(&txid)
                .await
                .map_err(|e| MonitorError::PostInject {
                    txid: txid.clone(),
                    source: e,
                })?;

            self.trace_balance(&txid, source).await?;
            self.trace_balance(&txid, dest).await?;

            if tx_status.confirmed {
                let elapsed = started.elapsed();
                let record = ConfirmationRecord {
                    txid,
                    submitted_at,
                    confirmed_at: Utc::now(),
                    submit_block,
                    confirm_block: tx_status.block_seq,
                    elapsed,
                    polls,
                };
                info!(
                    txid = %record.txid,
                    confirm_block = record.confirm_block,
                    blocks_elapsed = record.blocks_elapsed(),
                    elapsed_secs = record.elapsed.as_secs_f64(),
                    polls = record.polls,
                    state = %TxState::Confirmed,
                    "transaction confirmed"
                );
                return Ok(record);
            }

            debug!(%txid, polls, state = %TxState::Pending, "still pending");
        }
    }

    /// Sample and log the confirmed/unconfirmed balance of one address.
    async fn trace_balance(&self, txid: &str, address: &str) -> Result<(), MonitorError> {
        let outputs = self
            .client
            .get_unspent_outputs(&[address.to_string()])
            .await
            .map_err(|e| MonitorError::PostInject {
                txid: txid.to_string(),
                source: e,
            })?;

        let balance_err = |source| MonitorError::Balance {
            txid: txid.to_string(),
            address: address.to_string(),
            source,
        };
        let confirmed = aggregate(&outputs.head_outputs).map_err(balance_err)?;
        let unconfirmed = aggregate(&outputs.incoming_outputs).map_err(balance_err)?;

        info!(
            address,
            confirmed_coins = confirmed.coins,
            confirmed_hours = confirmed.hours,
            unconfirmed_coins = unconfirmed.coins,
            unconfirmed_hours = unconfirmed.hours,
            "balance"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn states_advance_strictly_forward() {
        use TxState::*;
        assert!(Built.can_advance_to(Injected));
        assert!(Injected.can_advance_to(Pending));
        assert!(Pending.can_advance_to(Confirmed));
        assert!(Pending.can_advance_to(TimedOut));

        // No reversals and no skips out of terminal states.
        assert!(!Injected.can_advance_to(Built));
        assert!(!Pending.can_advance_to(Injected));
        assert!(!Confirmed.can_advance_to(Pending));
        assert!(!TimedOut.can_advance_to(Pending));
        assert!(!Confirmed.can_advance_to(TimedOut));
    }

    #[test]
    fn terminal_states() {
        assert!(TxState::Confirmed.is_terminal());
        assert!(TxState::TimedOut.is_terminal());
        assert!(!TxState::Pending.is_terminal());
        assert!(!TxState::Built.is_terminal());
    }

    #[test]
    fn blocks_elapsed_never_negative() {
        let mut record = ConfirmationRecord {
            txid: "ab".into(),
            submitted_at: Utc::now(),
            confirmed_at: Utc::now(),
            submit_block: 100,
            confirm_block: 104,
            elapsed: Duration::from_secs(4),
            polls: 4,
        };
        assert_eq!(record.blocks_elapsed(), 4);

        // A node reporting a lower block never underflows.
        record.confirm_block = 99;
        assert_eq!(record.blocks_elapsed(), 0);
    }

    #[test]
    fn state_display() {
        assert_eq!(TxState::Pending.to_string(), "pending");
        assert_eq!(TxState::TimedOut.to_string(), "timed-out");
    }
}
