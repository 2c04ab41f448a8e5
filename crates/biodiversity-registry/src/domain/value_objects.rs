//! # Value Objects
//!
//! Immutable domain primitives for the biodiversity registry.
//! These types represent concepts that are defined by their value, not identity.

use crate::errors::RegistryError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte platform-level account/token address.
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address, used as the "no verifier" marker.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Creates an address whose last eight bytes hold `value` (big-endian).
    ///
    /// Mirrors how platform entity numbers map onto long-zero addresses.
    #[must_use]
    pub const fn from_low_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Full `0x`-prefixed hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned when parsing an address from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// Not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes).ok_or(AddressParseError::InvalidLength(bytes.len()))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// Key identifying a land parcel's record (the parcel token's address).
pub type ParcelId = Address;

// =============================================================================
// BIODIVERSITY SCORE
// =============================================================================

/// A biodiversity score in the closed range `0..=100`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct BiodiversityScore(u8);

impl BiodiversityScore {
    /// Highest accepted score.
    pub const MAX: u64 = 100;

    /// The zero score, also the "never registered" sentinel in
    /// source-compatible existence checks.
    pub const ZERO: Self = Self(0);

    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidScore`] if `raw > 100`.
    pub fn new(raw: u64) -> Result<Self, RegistryError> {
        u8::try_from(raw)
            .ok()
            .filter(|v| u64::from(*v) <= Self::MAX)
            .map(Self)
            .ok_or(RegistryError::InvalidScore {
                score: raw,
                max: Self::MAX,
            })
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns true for the zero score.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for BiodiversityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BiodiversityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for BiodiversityScore {
    type Error = RegistryError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<BiodiversityScore> for u64 {
    fn from(score: BiodiversityScore) -> Self {
        u64::from(score.0)
    }
}

// =============================================================================
// RESPONSE CODE
// =============================================================================

/// Numeric outcome reported by the external token-ledger service.
///
/// Values match the service's published response-code table. Only
/// [`ResponseCode::SUCCESS`] means the operation took effect.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCode(pub i64);

impl ResponseCode {
    /// The transaction is malformed or the call could not be completed.
    pub const INVALID_TRANSACTION: Self = Self(7);
    /// The paying account cannot cover the operation's fees.
    pub const INSUFFICIENT_ACCOUNT_BALANCE: Self = Self(15);
    /// The operation took effect.
    pub const SUCCESS: Self = Self(22);
    /// The account has not been associated with the token.
    pub const TOKEN_NOT_ASSOCIATED_TO_ACCOUNT: Self = Self(173);
    /// The sending account holds fewer token units than requested.
    pub const INSUFFICIENT_TOKEN_BALANCE: Self = Self(174);
    /// The account is already associated with the token.
    pub const TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT: Self = Self(194);

    /// Returns true only for `SUCCESS`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Symbolic name for known codes.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            7 => Some("INVALID_TRANSACTION"),
            15 => Some("INSUFFICIENT_ACCOUNT_BALANCE"),
            22 => Some("SUCCESS"),
            173 => Some("TOKEN_NOT_ASSOCIATED_TO_ACCOUNT"),
            174 => Some("INSUFFICIENT_TOKEN_BALANCE"),
            194 => Some("TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT"),
            _ => None,
        }
    }
}

impl fmt::Debug for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "UNKNOWN ({})", self.0),
        }
    }
}

impl From<i64> for ResponseCode {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

// =============================================================================
// BYTES (Variable length)
// =============================================================================

/// Variable-length byte array (calldata, call results).
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 8 {
            write!(f, "0x{}", hex::encode(&self.0))
        } else {
            write!(f, "0x{}..({} bytes)", hex::encode(&self.0[..4]), self.0.len())
        }
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
