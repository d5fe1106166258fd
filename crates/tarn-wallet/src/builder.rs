//! Transaction builder with coin selection and signing.
//!
//! Construction happens in two steps:
//! 1. Add recipients (address + drops) and build an unsigned transaction
//!    (performs coin selection and computes change).
//! 2. Sign all inputs with the wallet's keychain.
//!
//! Destinations receive only coins; every hour carried by the selected
//! inputs rides the change output back to the source address, so a change
//! output is emitted whenever there are leftover coins or hours.

use tarn_core::address::Address;
use tarn_core::constants::TX_VERSION;
use tarn_core::crypto::sign_transaction_input;
use tarn_core::types::{Hash256, Transaction, TxInput, TxOutput};

use crate::coin_selection::{CoinSelection, CoinSelector, SpendableOutput};
use crate::error::WalletError;
use crate::keys::KeyChain;

/// A transaction recipient: address and coin amount in drops.
#[derive(Debug, Clone)]
pub struct Recipient {
    /// Destination address.
    pub address: Address,
    /// Amount in drops.
    pub coins: u64,
}

/// An unsigned transaction ready for signing.
#[derive(Debug)]
pub struct UnsignedTransaction {
    /// The transaction with empty signatures.
    pub tx: Transaction,
    /// The coin selection result used to build this transaction.
    pub selection: CoinSelection,
    /// Pubkey hashes for each input (for signing key lookup).
    pub input_pubkey_hashes: Vec<Hash256>,
}

/// Builder for constructing and signing transactions.
///
/// # Example
/// ```ignore
/// let mut builder = TransactionBuilder::new();
/// builder.add_recipient(dest, 100_000);
/// let unsigned = builder.build(&spendable, &source)?;
/// let signed = TransactionBuilder::sign(unsigned, &keychain)?;
/// ```
pub struct TransactionBuilder {
    recipients: Vec<Recipient>,
}

impl TransactionBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            recipients: Vec::new(),
        }
    }

    /// Add a recipient to the transaction.
    pub fn add_recipient(&mut self, address: Address, coins: u64) -> &mut Self {
        self.recipients.push(Recipient { address, coins });
        self
    }

    /// Build an unsigned transaction by selecting coins and constructing
    /// outputs.
    ///
    /// `change_address` receives leftover coins and all input hours; for
    /// the lifecycle probe this is the source address itself.
    pub fn build(
        &self,
        spendable: &[SpendableOutput],
        change_address: &Address,
    ) -> Result<UnsignedTransaction, WalletError> {
        if self.recipients.is_empty() {
            return Err(WalletError::BuildError("no recipients".into()));
        }

        let mut total_send: u64 = 0;
        for r in &self.recipients {
            if r.coins == 0 {
                return Err(WalletError::InvalidAmount(
                    "recipient amount is zero".into(),
                ));
            }
            total_send = total_send
                .checked_add(r.coins)
                .ok_or_else(|| WalletError::InvalidAmount("total amount overflow".into()))?;
        }

        let selection = CoinSelector::select(spendable, total_send)?;

        let mut inputs = Vec::with_capacity(selection.selected.len());
        let mut input_pubkey_hashes = Vec::with_capacity(selection.selected.len());
        for output in &selection.selected {
            inputs.push(TxInput {
                spent_output: output.id,
                signature: vec![],
                public_key: vec![],
            });
            input_pubkey_hashes.push(output.pubkey_hash);
        }

        let mut outputs = Vec::with_capacity(self.recipients.len() + 1);
        for r in &self.recipients {
            outputs.push(TxOutput {
                coins: r.coins,
                hours: 0,
                pubkey_hash: r.address.pubkey_hash(),
            });
        }

        if selection.change > 0 || selection.total_hours > 0 {
            outputs.push(TxOutput {
                coins: selection.change,
                hours: selection.total_hours,
                pubkey_hash: change_address.pubkey_hash(),
            });
        }

        let tx = Transaction {
            version: TX_VERSION,
            inputs,
            outputs,
        };

        Ok(UnsignedTransaction {
            tx,
            selection,
            input_pubkey_hashes,
        })
    }

    /// Sign all inputs of an unsigned transaction using the keychain.
    ///
    /// Looks up each input's signing key by pubkey hash. Fails when a
    /// required key is not present in the keychain.
    pub fn sign(
        unsigned: UnsignedTransaction,
        keychain: &KeyChain,
    ) -> Result<Transaction, WalletError> {
        let mut tx = unsigned.tx;

        for (i, pkh) in unsigned.input_pubkey_hashes.iter().enumerate() {
            let kp = keychain
                .keypair_for_pubkey_hash(pkh)
                .ok_or_else(|| WalletError::KeyNotFound(format!("pubkey hash {pkh}")))?;
            sign_transaction_input(&mut tx, i, kp)?;
        }

        Ok(tx)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
