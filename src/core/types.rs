//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Address`] - 20-byte account address (EIP-55 checksummed display)
//! - [`GoalId`] - 32-byte goal identifier
//! - [`Nonce`] - Per-owner goal counter
//! - [`Wei`] - Stake amount in wei
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use akuntabel::core::types::{Address, GoalId, Nonce, Wei};
//!
//! // Valid constructions
//! let owner = Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
//! let nonce = Nonce::parse("0").unwrap();
//! let stake = Wei::parse_ether("0.01").unwrap();
//! assert_eq!(stake.as_u128(), 10_000_000_000_000_000);
//!
//! // Invalid constructions fail at creation time
//! assert!(Address::parse("0x1234").is_err());
//! assert!(Nonce::parse("-1").is_err());
//! assert!(GoalId::parse("not-a-hash").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::identity::keccak256;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid goal id: {0}")]
    InvalidGoalId(String),

    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    #[error("nonce cannot be negative: {0}")]
    NegativeNonce(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Strip the mandatory `0x` prefix from hex input.
fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// A 20-byte account address.
///
/// Parsing accepts `0x`-prefixed hex in all-lowercase or all-uppercase form.
/// Mixed-case input is treated as EIP-55 checksummed and must match the
/// checksum exactly. Display always uses the checksummed form.
///
/// # Example
///
/// ```
/// use akuntabel::core::types::Address;
///
/// let addr = Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
/// assert_eq!(addr.to_string(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
///
/// // Wrong checksum
/// assert!(Address::parse("0xF39fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address. The contract reports it as the owner of unknown goals.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse an address from `0x`-prefixed hex text.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAddress` if the prefix is missing, the
    /// length is not 40 hex digits, a digit is not hex, or a mixed-case
    /// address fails its EIP-55 checksum.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let body = strip_hex_prefix(s)
            .ok_or_else(|| TypeError::InvalidAddress(format!("'{}' is missing the 0x prefix", s)))?;

        if body.len() != 40 {
            return Err(TypeError::InvalidAddress(format!(
                "'{}' must have 40 hex digits, found {}",
                s,
                body.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| TypeError::InvalidAddress(format!("'{}': {}", s, e)))?;
        let address = Self(bytes);

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *body {
            return Err(TypeError::InvalidAddress(format!(
                "'{}' has an invalid checksum",
                s
            )));
        }

        Ok(address)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Render the address in EIP-55 checksummed form.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_checksum()
    }
}

/// A 32-byte goal identifier.
///
/// Displayed as `0x` followed by 64 lowercase hex digits, which is also the
/// form used in goal links (`/goals/<id>`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GoalId([u8; 32]);

impl GoalId {
    /// Create a goal id from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a goal id from `0x`-prefixed hex text (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidGoalId` unless the input is `0x` followed by
    /// exactly 64 hex digits.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let body = strip_hex_prefix(s)
            .ok_or_else(|| TypeError::InvalidGoalId(format!("'{}' is missing the 0x prefix", s)))?;

        if body.len() != 64 {
            return Err(TypeError::InvalidGoalId(format!(
                "'{}' must have 64 hex digits, found {}",
                s,
                body.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| TypeError::InvalidGoalId(format!("'{}': {}", s, e)))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the id as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GoalId({})", self.to_hex())
    }
}

impl FromStr for GoalId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for GoalId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GoalId> for String {
    fn from(value: GoalId) -> Self {
        value.to_hex()
    }
}

/// Per-owner goal counter.
///
/// The first goal created by an address has nonce 0. The counter is owned
/// by the contract; the client only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(u64);

impl Nonce {
    /// Create a nonce from a count.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Parse a nonce from decimal text.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::NegativeNonce` for negative input and
    /// `TypeError::InvalidNonce` for anything else that is not a `u64`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(TypeError::NegativeNonce(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidNonce(format!("'{}': {}", s, e)))
    }

    /// Get the numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The nonce before this one, if any.
    pub fn prev(&self) -> Option<Nonce> {
        self.0.checked_sub(1).map(Self)
    }

    /// Encode as a 32-byte big-endian unsigned integer.
    pub fn to_be_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nonce {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<i64> for Nonce {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| TypeError::NegativeNonce(value.to_string()))
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Number of wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Decimal places of ether.
const ETHER_DECIMALS: usize = 18;

/// A stake amount in wei.
///
/// `u128` covers every realistic stake; amounts above it are rejected when
/// decoded from the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    /// Zero wei.
    pub const ZERO: Wei = Wei(0);

    /// Create an amount from wei.
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Get the amount in wei.
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Check whether the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal ether amount such as `"0.01"` or `"2"`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAmount` for empty or negative input, more
    /// than 18 fractional digits, non-digit characters, or overflow.
    pub fn parse_ether(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeError::InvalidAmount("amount is empty".into()));
        }
        if s.starts_with('-') {
            return Err(TypeError::InvalidAmount(format!("'{}' is negative", s)));
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(TypeError::InvalidAmount(format!("'{}' has no digits", s)));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(TypeError::InvalidAmount(format!(
                "'{}' is not a decimal number",
                s
            )));
        }
        if frac_part.len() > ETHER_DECIMALS {
            return Err(TypeError::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                s, ETHER_DECIMALS
            )));
        }

        let overflow = || TypeError::InvalidAmount(format!("'{}' is too large", s));

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac_part, width = ETHER_DECIMALS);
            padded.parse().map_err(|_| overflow())?
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(overflow)
    }

    /// Format the amount as decimal ether with trailing zeros trimmed.
    pub fn format_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = ETHER_DECIMALS);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_ether())
    }
}
