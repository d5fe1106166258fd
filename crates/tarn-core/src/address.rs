//! Address encoding for the Tarn network.
//!
//! Addresses use Bech32m encoding (BIP-350) with human-readable prefixes:
//! - Mainnet: `tarn1...`
//! - Testnet: `ttarn1...`
//!
//! Each address encodes a version byte (currently 0) and a 32-byte BLAKE3
//! pubkey hash.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::PublicKey;
use crate::error::AddressError;
use crate::types::Hash256;

/// Bech32m checksum constant (BIP-350).
const BECH32M_CONST: u32 = 0x2bc830a3;

/// Bech32 character set for encoding 5-bit values.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Current address version.
pub const ADDRESS_VERSION: u8 = 0;

/// Network identifier determining the address prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Mainnet (addresses start with `tarn1`).
    Mainnet,
    /// Testnet (addresses start with `ttarn1`).
    Testnet,
}

impl Network {
    /// Human-readable prefix for this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "tarn",
            Network::Testnet => "ttarn",
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            "tarn" => Ok(Network::Mainnet),
            "ttarn" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(hrp.to_string())),
        }
    }
}

/// A Tarn network address encoding a pubkey hash with Bech32m.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    version: u8,
    pubkey_hash: Hash256,
}

impl Address {
    /// Create an address from a pubkey hash and network.
    pub fn from_pubkey_hash(pubkey_hash: Hash256, network: Network) -> Self {
        Self {
            network,
            version: ADDRESS_VERSION,
            pubkey_hash,
        }
    }

    /// Create an address from a public key and network.
    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        Self::from_pubkey_hash(public_key.pubkey_hash(), network)
    }

    /// The BLAKE3 pubkey hash encoded in this address.
    pub fn pubkey_hash(&self) -> Hash256 {
        self.pubkey_hash
    }

    /// The network this address belongs to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Encode this address as a Bech32m string.
    pub fn encode(&self) -> String {
        let hrp = self.network.hrp();
        let data_5bit = convert_bits(self.pubkey_hash.as_bytes(), 8, 5, true)
            .expect("32-byte hash always converts to 5-bit");

        let mut payload = Vec::with_capacity(1 + data_5bit.len());
        payload.push(self.version);
        payload.extend_from_slice(&data_5bit);

        let checksum = bech32m_checksum(hrp, &payload);

        let mut out = String::with_capacity(hrp.len() + 1 + payload.len() + 6);
        out.push_str(hrp);
        out.push('1');
        for &v in payload.iter().chain(&checksum) {
            out.push(CHARSET[v as usize] as char);
        }
        out
    }

    /// Decode a Bech32m address string.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        // Bech32 spec: all alpha chars must be the same case.
        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(AddressError::MixedCase);
        }

        let s = s.to_ascii_lowercase();
        let sep = s.rfind('1').ok_or(AddressError::MissingSeparator)?;
        if sep == 0 {
            return Err(AddressError::InvalidHrp);
        }
        // At least version char + 6 checksum chars after the separator.
        if sep + 8 > s.len() {
            return Err(AddressError::InvalidLength);
        }

        let hrp = &s[..sep];
        let mut data = Vec::with_capacity(s.len() - sep - 1);
        for c in s[sep + 1..].chars() {
            let pos = CHARSET
                .iter()
                .position(|&ch| ch as char == c)
                .ok_or(AddressError::InvalidCharacter(c))?;
            data.push(pos as u8);
        }

        if !bech32m_verify(hrp, &data) {
            return Err(AddressError::InvalidChecksum);
        }

        let payload = &data[..data.len() - 6];
        let version = payload[0];
        if version != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(version));
        }

        let hash_bytes =
            convert_bits(&payload[1..], 5, 8, false).ok_or(AddressError::InvalidPadding)?;
        let hash: [u8; 32] = hash_bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength)?;

        Ok(Self {
            network: Network::from_hrp(hrp)?,
            version,
            pubkey_hash: Hash256(hash),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

// --- Bech32m internals ---

/// Compute the Bech32m polymod over a sequence of 5-bit values.
fn bech32m_polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

/// Expand the HRP for checksum computation.
fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut ret = Vec::with_capacity(hrp.len() * 2 + 1);
    ret.extend(hrp.bytes().map(|c| c >> 5));
    ret.push(0);
    ret.extend(hrp.bytes().map(|c| c & 31));
    ret
}

/// Create the 6-value Bech32m checksum for the given HRP and data.
fn bech32m_checksum(hrp: &str, data: &[u8]) -> [u8; 6] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; 6]);
    let polymod = bech32m_polymod(&values) ^ BECH32M_CONST;
    std::array::from_fn(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
}

/// Verify the Bech32m checksum over data that includes the checksum chars.
fn bech32m_verify(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    bech32m_polymod(&values) == BECH32M_CONST
}

/// Convert between bit widths (e.g. 8-bit bytes to 5-bit Bech32 groups).
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::new();
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hash() -> Hash256 {
        Hash256([0xAA; 32])
    }

    #[test]
    fn network_hrps() {
        assert_eq!(Network::Mainnet.hrp(), "tarn");
        assert_eq!(Network::Testnet.hrp(), "ttarn");
        assert_eq!(Network::from_hrp("tarn").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_hrp("ttarn").unwrap(), Network::Testnet);
        assert!(matches!(
            Network::from_hrp("bitcoin").unwrap_err(),
            AddressError::UnknownNetwork(_)
        ));
    }

    #[test]
    fn encode_prefixes() {
        let mainnet = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let testnet = Address::from_pubkey_hash(sample_hash(), Network::Testnet);
        assert!(mainnet.encode().starts_with("tarn1"));
        assert!(testnet.encode().starts_with("ttarn1"));
        assert_ne!(mainnet.encode(), testnet.encode());
    }

    #[test]
    fn encode_deterministic_lowercase() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let encoded = addr.encode();
        assert_eq!(encoded, addr.encode());
        assert_eq!(encoded, encoded.to_ascii_lowercase());
    }

    #[test]
    fn decode_roundtrip() {
        for network in [Network::Mainnet, Network::Testnet] {
            let original = Address::from_pubkey_hash(sample_hash(), network);
            let decoded = Address::decode(&original.encode()).unwrap();
            assert_eq!(original, decoded);
        }
    }

    #[test]
    fn decode_uppercase_valid() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let decoded = Address::decode(&addr.encode().to_ascii_uppercase()).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn decode_mixed_case_fails() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let mut encoded = addr.encode();
        let upper = encoded.pop().unwrap().to_ascii_uppercase();
        encoded.push(upper);
        assert_eq!(Address::decode(&encoded).unwrap_err(), AddressError::MixedCase);
    }

    #[test]
    fn decode_corrupted_checksum_fails() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let mut encoded = addr.encode();
        let last = encoded.pop().unwrap();
        encoded.push(if last == 'q' { 'p' } else { 'q' });
        assert_eq!(
            Address::decode(&encoded).unwrap_err(),
            AddressError::InvalidChecksum
        );
    }

    #[test]
    fn decode_invalid_character() {
        // 'b', 'i', 'o' are not in the Bech32 charset.
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let encoded = addr.encode();
        let bad = format!("{}b{}", &encoded[..6], &encoded[7..]);
        assert!(matches!(
            Address::decode(&bad).unwrap_err(),
            AddressError::InvalidCharacter('b')
        ));
    }

    #[test]
    fn decode_malformed_strings() {
        assert_eq!(
            Address::decode("tarnnoseparator").unwrap_err(),
            AddressError::MissingSeparator
        );
        assert_eq!(
            Address::decode("1qqqqqqqqqq").unwrap_err(),
            AddressError::InvalidHrp
        );
        assert_eq!(
            Address::decode("tarn1qqqq").unwrap_err(),
            AddressError::InvalidLength
        );
    }

    #[test]
    fn serde_roundtrip() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Testnet);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.encode()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn from_str_parses() {
        let addr = Address::from_pubkey_hash(sample_hash(), Network::Mainnet);
        let parsed: Address = addr.encode().parse().unwrap();
        assert_eq!(addr, parsed);
    }
}
