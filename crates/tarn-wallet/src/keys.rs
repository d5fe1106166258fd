//! Seed management and deterministic key derivation.
//!
//! Uses BLAKE3 keyed derivation to produce Ed25519 keypairs from a 32-byte
//! master seed. Seeds are obtained from a user-supplied phrase: a BIP-39
//! mnemonic, a hex string, or an arbitrary passphrase hashed through the
//! same KDF.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use tarn_core::address::{Address, Network};
use tarn_core::crypto::KeyPair;
use tarn_core::types::Hash256;

use crate::error::WalletError;
use crate::mnemonic::mnemonic_to_seed;

/// BLAKE3 KDF context for child key derivation.
const KDF_CONTEXT: &str = "tarn-wallet-key-derivation-v1";

/// BLAKE3 KDF context for turning an arbitrary passphrase into a seed.
const PHRASE_CONTEXT: &str = "tarn-wallet-seed-from-phrase-v1";

/// A 32-byte master seed for deterministic key derivation.
///
/// Secret material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 32],
}

impl Seed {
    /// Generate a random seed from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a seed from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Derive a seed from a user-supplied phrase.
    ///
    /// Accepts, in order of preference:
    /// - a multi-word BIP-39 mnemonic (24 words),
    /// - a 64-character hex string,
    /// - any other non-empty string, hashed through the BLAKE3 KDF.
    ///
    /// An empty phrase cannot derive key material and is rejected.
    pub fn from_phrase(phrase: &str) -> Result<Self, WalletError> {
        let trimmed = phrase.trim();
        if trimmed.is_empty() {
            return Err(WalletError::InvalidSeed("empty seed phrase".into()));
        }

        if trimmed.split_whitespace().count() > 1 {
            return mnemonic_to_seed(trimmed);
        }

        if trimmed.len() == 64 {
            if let Ok(bytes) = hex::decode(trimmed) {
                let arr: [u8; 32] = bytes.try_into().expect("64 hex chars is 32 bytes");
                return Ok(Self::from_bytes(arr));
            }
        }

        Ok(Self::from_bytes(blake3::derive_key(
            PHRASE_CONTEXT,
            trimmed.as_bytes(),
        )))
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Deterministic key derivation chain from a master seed.
///
/// Derives child Ed25519 keypairs using BLAKE3's keyed derivation function.
/// Each child index produces a unique, deterministic keypair that can be
/// recovered from the seed alone.
pub struct KeyChain {
    seed: Seed,
    network: Network,
    /// One past the highest derived index.
    derived: u32,
    /// Cache of derived keypairs by index.
    keypairs: HashMap<u32, KeyPair>,
    /// Reverse lookup: pubkey_hash -> derivation index.
    pubkey_hash_to_index: HashMap<Hash256, u32>,
}

impl KeyChain {
    /// Create a new keychain from a seed and network.
    pub fn new(seed: Seed, network: Network) -> Self {
        Self {
            seed,
            network,
            derived: 0,
            keypairs: HashMap::new(),
            pubkey_hash_to_index: HashMap::new(),
        }
    }

    /// Derive the keypair for a specific child index.
    pub fn derive_keypair(&mut self, index: u32) -> &KeyPair {
        if !self.keypairs.contains_key(&index) {
            let kp = derive_child_keypair(&self.seed, index);
            let pkh = kp.public_key().pubkey_hash();
            self.pubkey_hash_to_index.insert(pkh, index);
            self.keypairs.insert(index, kp);
            self.derived = self.derived.max(index.saturating_add(1));
        }
        &self.keypairs[&index]
    }

    /// Get the address for a specific derivation index.
    pub fn address_at(&mut self, index: u32) -> Address {
        let kp = self.derive_keypair(index);
        Address::from_public_key(&kp.public_key(), self.network)
    }

    /// Derive the ordered address sequence for indices `0..count`.
    pub fn addresses(&mut self, count: u32) -> Vec<Address> {
        (0..count).map(|i| self.address_at(i)).collect()
    }

    /// Look up the keypair that owns a given pubkey hash.
    ///
    /// Returns `None` if no derived key matches the hash.
    pub fn keypair_for_pubkey_hash(&self, hash: &Hash256) -> Option<&KeyPair> {
        self.pubkey_hash_to_index
            .get(hash)
            .and_then(|idx| self.keypairs.get(idx))
    }

    /// Restore the keychain state by deriving all keys up to index `n`.
    pub fn restore_to_index(&mut self, n: u32) {
        for i in 0..n {
            self.derive_keypair(i);
        }
    }

    /// The network this keychain is configured for.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Number of derived child keys.
    pub fn derived_count(&self) -> u32 {
        self.derived
    }

    /// Access the seed (for wallet file serialization).
    pub(crate) fn seed(&self) -> &Seed {
        &self.seed
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("network", &self.network)
            .field("derived", &self.derived)
            .finish()
    }
}

/// Serializable form of keychain state for wallet file persistence.
#[derive(Serialize, Deserialize, Clone)]
pub struct KeyChainData {
    /// Master seed bytes.
    pub seed: [u8; 32],
    /// Network identifier.
    pub network: Network,
    /// Number of derived child keys.
    pub derived: u32,
}

impl KeyChainData {
    /// Capture keychain state for serialization.
    pub fn from_keychain(keychain: &KeyChain) -> Self {
        Self {
            seed: *keychain.seed().as_bytes(),
            network: keychain.network(),
            derived: keychain.derived_count(),
        }
    }

    /// Restore a keychain from serialized data.
    pub fn to_keychain(&self) -> KeyChain {
        let seed = Seed::from_bytes(self.seed);
        let mut keychain = KeyChain::new(seed, self.network);
        keychain.restore_to_index(self.derived);
        keychain
    }
}

/// Derive a child keypair from a seed and index using BLAKE3 KDF.
fn derive_child_keypair(seed: &Seed, index: u32) -> KeyPair {
    let mut ikm = Vec::with_capacity(36);
    ikm.extend_from_slice(seed.as_bytes());
    ikm.extend_from_slice(&index.to_le_bytes());
    let derived = blake3::derive_key(KDF_CONTEXT, &ikm);
    KeyPair::from_secret_bytes(derived)
}

/// Derive the ordered deterministic address sequence for a seed phrase.
///
/// Index 0 of the result is the primary spending address used throughout
/// the transaction lifecycle.
pub fn derive_addresses(
    phrase: &str,
    count: u32,
    network: Network,
) -> Result<Vec<Address>, WalletError> {
    if count == 0 {
        return Err(WalletError::InvalidAmount(
            "address count must be non-zero".into(),
        ));
    }
    let seed = Seed::from_phrase(phrase)?;
    let mut chain = KeyChain::new(seed, network);
    Ok(chain.addresses(count))
}
