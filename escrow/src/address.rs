//! # Addresses
//!
//! Vaults and coins are identified by content-derived 20-byte addresses:
//! `BLAKE3(kind || name || creator || nonce)` truncated to 20 bytes. The
//! nonce is a fresh UUID per creation, so two products with identical
//! display names still get distinct addresses — the derivation exists to
//! bind an address to what created it, not to deduplicate.
//!
//! Participant addresses (investors, insurees) arrive from outside as
//! hex strings and round-trip through [`Address::from_hex`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Errors from parsing a textual address.
#[derive(Debug, Error)]
pub enum AddressParseError {
    /// The hex payload was malformed.
    #[error("invalid hex in address: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded payload was not exactly [`ADDRESS_LENGTH`] bytes.
    #[error("invalid address length: expected {ADDRESS_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
}

/// What kind of entity an address identifies.
///
/// The discriminant is the first byte of the derivation preimage, so a
/// vault and a coin derived from the same inputs can never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    /// A money vault.
    Vault,
    /// A receipt coin on the investor side.
    InvestorCoin,
    /// A receipt coin on the insuree side.
    InsureeCoin,
}

impl AddressKind {
    /// Single-byte domain-separation tag used in address derivation.
    pub fn discriminant(&self) -> u8 {
        match self {
            AddressKind::Vault => 0x01,
            AddressKind::InvestorCoin => 0x02,
            AddressKind::InsureeCoin => 0x03,
        }
    }
}

/// A 20-byte entity address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns the `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressParseError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressParseError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives a fresh address for a newly created entity.
    ///
    /// The preimage is `kind_tag || 0x00 || name || 0x00 || creator ||
    /// 0x00 || nonce`; the separator bytes prevent ambiguity when one
    /// field's suffix matches another field's prefix. The BLAKE3 digest
    /// is truncated to 20 bytes.
    pub fn derive(kind: AddressKind, name: &str, creator: &Address, nonce: &Uuid) -> Self {
        let mut preimage = Vec::with_capacity(name.len() + ADDRESS_LENGTH + 20);
        preimage.push(kind.discriminant());
        preimage.push(0x00);
        preimage.extend_from_slice(name.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(creator.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(nonce.as_bytes());

        let digest = blake3::hash(&preimage);
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&digest.as_bytes()[..ADDRESS_LENGTH]);
        Self(arr)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Serialize as a hex string so addresses are readable on the wire and
// usable as JSON map keys.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
