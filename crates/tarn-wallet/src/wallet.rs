//! Wallet composition and encrypted file persistence.
//!
//! A [`Wallet`] wraps a deterministic keychain. The on-disk format keeps an
//! unencrypted JSON header carrying the magic bytes, format version, and
//! the required `filename` and `type` metadata fields, followed by the
//! AES-256-GCM encrypted keychain data.

use std::path::Path;

use tarn_core::address::{Address, Network};

use crate::encryption;
use crate::error::WalletError;
use crate::keys::{KeyChain, KeyChainData, Seed};

/// Magic bytes identifying a Tarn wallet file.
pub const WALLET_MAGIC: &str = "TAWL";

/// Current wallet file format version.
pub const WALLET_VERSION: u32 = 1;

/// Wallet type recorded in the file metadata. Only deterministic
/// seed-derived wallets exist in this tooling.
pub const WALLET_TYPE_DETERMINISTIC: &str = "deterministic";

/// Wallet file header serialized as JSON.
///
/// `filename` and `wallet_type` are required metadata fields; loaders
/// reject files whose type they do not understand.
#[derive(serde::Serialize, serde::Deserialize)]
struct WalletFileHeader {
    magic: String,
    version: u32,
    filename: String,
    #[serde(rename = "type")]
    wallet_type: String,
}

/// Deterministic wallet over a seed-derived keychain.
pub struct Wallet {
    keychain: KeyChain,
}

impl Wallet {
    /// Create a wallet from an existing seed.
    pub fn from_seed(seed: Seed, network: Network) -> Self {
        Self {
            keychain: KeyChain::new(seed, network),
        }
    }

    /// Create a wallet from a seed phrase (mnemonic, hex, or passphrase).
    pub fn from_phrase(phrase: &str, network: Network) -> Result<Self, WalletError> {
        Ok(Self::from_seed(Seed::from_phrase(phrase)?, network))
    }

    /// The primary spending address (derivation index 0).
    pub fn primary_address(&mut self) -> Address {
        self.keychain.address_at(0)
    }

    /// The ordered address sequence for indices `0..count`.
    pub fn addresses(&mut self, count: u32) -> Vec<Address> {
        self.keychain.addresses(count)
    }

    /// The network this wallet is configured for.
    pub fn network(&self) -> Network {
        self.keychain.network()
    }

    /// Access the keychain (for signing operations).
    pub fn keychain(&self) -> &KeyChain {
        &self.keychain
    }

    /// Access the keychain mutably (for address derivation).
    pub fn keychain_mut(&mut self) -> &mut KeyChain {
        &mut self.keychain
    }

    /// Save the wallet to an encrypted file.
    ///
    /// # File format
    /// ```text
    /// header_len (4 bytes LE) || header_json || encrypted_payload
    /// ```
    pub fn save_to_file(&self, path: &Path, password: &[u8]) -> Result<(), WalletError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| WalletError::IoError("wallet path has no file name".into()))?;

        let header = WalletFileHeader {
            magic: WALLET_MAGIC.to_string(),
            version: WALLET_VERSION,
            filename,
            wallet_type: WALLET_TYPE_DETERMINISTIC.to_string(),
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|e| WalletError::Serialization(e.to_string()))?;

        let kc_data = KeyChainData::from_keychain(&self.keychain);
        let payload_json =
            serde_json::to_vec(&kc_data).map_err(|e| WalletError::Serialization(e.to_string()))?;

        let encrypted = encryption::encrypt(&payload_json, password)?;

        let header_len = header_json.len() as u32;
        let mut file_data = Vec::with_capacity(4 + header_json.len() + encrypted.len());
        file_data.extend_from_slice(&header_len.to_le_bytes());
        file_data.extend_from_slice(&header_json);
        file_data.extend_from_slice(&encrypted);

        std::fs::write(path, &file_data).map_err(|e| WalletError::IoError(e.to_string()))
    }

    /// Load a wallet from an encrypted file.
    pub fn load_from_file(path: &Path, password: &[u8]) -> Result<Self, WalletError> {
        let file_data = std::fs::read(path).map_err(|e| WalletError::IoError(e.to_string()))?;

        if file_data.len() < 4 {
            return Err(WalletError::CorruptedFile("file too short".into()));
        }

        let header_len = u32::from_le_bytes(file_data[..4].try_into().unwrap()) as usize;
        if file_data.len() < 4 + header_len {
            return Err(WalletError::CorruptedFile("header truncated".into()));
        }

        let header: WalletFileHeader = serde_json::from_slice(&file_data[4..4 + header_len])
            .map_err(|e| WalletError::CorruptedFile(format!("invalid header: {e}")))?;

        if header.magic != WALLET_MAGIC {
            return Err(WalletError::CorruptedFile("invalid magic bytes".into()));
        }
        if header.version != WALLET_VERSION {
            return Err(WalletError::CorruptedFile(format!(
                "unsupported version: {}",
                header.version
            )));
        }
        if header.wallet_type != WALLET_TYPE_DETERMINISTIC {
            return Err(WalletError::CorruptedFile(format!(
                "unsupported wallet type: {}",
                header.wallet_type
            )));
        }

        let encrypted = &file_data[4 + header_len..];
        let payload_json = encryption::decrypt(encrypted, password)?;

        let kc_data: KeyChainData = serde_json::from_slice(&payload_json)
            .map_err(|e| WalletError::CorruptedFile(format!("invalid payload: {e}")))?;

        Ok(Self {
            keychain: kc_data.to_keychain(),
        })
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.keychain.network())
            .field("derived", &self.keychain.derived_count())
            .finish()
    }
}
