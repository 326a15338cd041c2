//! contract::abi
//!
//! Solidity ABI encoding and decoding.
//!
//! # Scope
//!
//! Covers the types the goal contract interface uses: `address`, `uint256`,
//! `bool`, `bytes32`, `string`, dynamic arrays, and tuples. Encoding follows
//! the standard head/tail layout: static values inline, dynamic values as an
//! offset in the head pointing into the tail.
//!
//! Decoding is bounds-checked throughout; malformed return data produces an
//! [`AbiError`] rather than a panic.
//!
//! # Example
//!
//! ```
//! use akuntabel::contract::abi::{decode, encode, ParamType, Token};
//!
//! let data = encode(&[Token::uint(7), Token::String("hello".into())]);
//! let tokens = decode(&[ParamType::Uint, ParamType::String], &data).unwrap();
//! assert_eq!(tokens[1], Token::String("hello".into()));
//! ```

use thiserror::Error;

use crate::core::identity::keccak256;
use crate::core::types::Address;

/// A 32-byte ABI word.
pub type Word = [u8; 32];

/// Errors from ABI decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("data too short: need {needed} bytes at offset {offset}, have {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("invalid {kind}: {detail}")]
    InvalidValue { kind: &'static str, detail: String },

    #[error("integer does not fit in {0} bits")]
    Overflow(u32),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },
}

/// Type of an ABI parameter, used to drive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bool,
    FixedBytes32,
    String,
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Array(_) => true,
            ParamType::Tuple(fields) => fields.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            ParamType::Tuple(fields) if !self.is_dynamic() => {
                fields.iter().map(ParamType::head_size).sum()
            }
            _ => 32,
        }
    }
}

/// An ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(Word),
    Bool(bool),
    FixedBytes32([u8; 32]),
    String(String),
    Array(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    /// A `uint256` token from a `u128`.
    pub fn uint(value: u128) -> Token {
        Token::Uint(uint_word(value))
    }

    fn kind(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "uint256",
            Token::Bool(_) => "bool",
            Token::FixedBytes32(_) => "bytes32",
            Token::String(_) => "string",
            Token::Array(_) => "array",
            Token::Tuple(_) => "tuple",
        }
    }

    fn is_dynamic(&self) -> bool {
        match self {
            Token::String(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            Token::Tuple(items) if !self.is_dynamic() => items.iter().map(Token::head_size).sum(),
            _ => 32,
        }
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T, AbiError> {
        Err(AbiError::UnexpectedToken {
            expected,
            found: self.kind(),
        })
    }

    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Token::Address(a) => Ok(a),
            other => other.unexpected("address"),
        }
    }

    pub fn into_u128(self) -> Result<u128, AbiError> {
        match self {
            Token::Uint(w) => word_to_u128(&w),
            other => other.unexpected("uint256"),
        }
    }

    pub fn into_u64(self) -> Result<u64, AbiError> {
        match self {
            Token::Uint(w) => word_to_u64(&w),
            other => other.unexpected("uint256"),
        }
    }

    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Token::Bool(b) => Ok(b),
            other => other.unexpected("bool"),
        }
    }

    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Token::String(s) => Ok(s),
            other => other.unexpected("string"),
        }
    }

    pub fn into_array(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Token::Array(items) => Ok(items),
            other => other.unexpected("array"),
        }
    }

    pub fn into_tuple(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Token::Tuple(items) => Ok(items),
            other => other.unexpected("tuple"),
        }
    }
}

/// The 4-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// The topic-0 hash for a canonical event signature.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// Big-endian word holding `value`.
pub fn uint_word(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Read a word as `u128`.
pub fn word_to_u128(word: &Word) -> Result<u128, AbiError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(128));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(buf))
}

/// Read a word as `u64`.
pub fn word_to_u64(word: &Word) -> Result<u64, AbiError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(64));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(buf))
}

/// Read a word as an address (upper 12 bytes must be zero).
pub fn word_to_address(word: &Word) -> Result<Address, AbiError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidValue {
            kind: "address",
            detail: format!("dirty upper bytes in 0x{}", hex::encode(word)),
        });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}

/// Word holding a left-padded address.
pub fn address_word(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Encode a call: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Encode a sequence of tokens as an ABI tuple.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(a) => address_word(a).to_vec(),
        Token::Uint(w) | Token::FixedBytes32(w) => w.to_vec(),
        Token::Bool(b) => uint_word(u128::from(*b)).to_vec(),
        Token::String(s) => {
            let bytes = s.as_bytes();
            let mut out = uint_word(bytes.len() as u128).to_vec();
            out.extend_from_slice(bytes);
            let padded = bytes.len().div_ceil(32) * 32;
            out.resize(32 + padded, 0);
            out
        }
        Token::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

/// Decode ABI data as a tuple of `types`.
///
/// # Errors
///
/// Returns an [`AbiError`] if the data is truncated, an offset points
/// outside the data, or a value is not valid for its type.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_params(types, data, 0)
}

fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut out = Vec::with_capacity(types.len());
    let mut cursor = base;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let pos = base.checked_add(offset).ok_or(AbiError::Overflow(64))?;
            out.push(decode_dynamic(ty, data, pos)?);
        } else {
            out.push(decode_static(ty, data, cursor)?);
        }
        cursor += ty.head_size();
    }

    Ok(out)
}

fn decode_dynamic(ty: &ParamType, data: &[u8], pos: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::String => {
            let len = read_usize(data, pos)?;
            let bytes = slice(data, pos + 32, len)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|e| AbiError::InvalidValue {
                    kind: "string",
                    detail: e.to_string(),
                })
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, pos)?;
            // Every element needs at least one head word.
            if len > data.len() / 32 {
                return Err(AbiError::OutOfBounds {
                    offset: pos + 32,
                    needed: len.saturating_mul(32),
                    len: data.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            decode_params(&types, data, pos + 32).map(Token::Array)
        }
        ParamType::Tuple(fields) => decode_params(fields, data, pos).map(Token::Tuple),
        _ => decode_static(ty, data, pos),
    }
}

fn decode_static(ty: &ParamType, data: &[u8], pos: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => word_to_address(&read_word(data, pos)?).map(Token::Address),
        ParamType::Uint => read_word(data, pos).map(Token::Uint),
        ParamType::FixedBytes32 => read_word(data, pos).map(Token::FixedBytes32),
        ParamType::Bool => {
            let word = read_word(data, pos)?;
            match word_to_u64(&word) {
                Ok(0) => Ok(Token::Bool(false)),
                Ok(1) => Ok(Token::Bool(true)),
                _ => Err(AbiError::InvalidValue {
                    kind: "bool",
                    detail: format!("0x{}", hex::encode(word)),
                }),
            }
        }
        ParamType::Tuple(fields) => decode_params(fields, data, pos).map(Token::Tuple),
        ParamType::String | ParamType::Array(_) => decode_dynamic(ty, data, pos),
    }
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed: len,
            len: data.len(),
        })
}

/// Read the 32-byte word at `offset`.
pub fn read_word(data: &[u8], offset: usize) -> Result<Word, AbiError> {
    let mut word = [0u8; 32];
    word.copy_from_slice(slice(data, offset, 32)?);
    Ok(word)
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = word_to_u64(&read_word(data, offset)?)?;
    usize::try_from(value).map_err(|_| AbiError::Overflow(usize::BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn known_selectors() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(
            hex::encode(selector("getGoalDetails(bytes32)")),
            "3dc9c083"
        );
        assert_eq!(hex::encode(selector("userGoalNonce(address)")), "17c1746e");
    }

    #[test]
    fn static_encoding_is_inline() {
        let a = addr("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        let data = encode(&[Token::Address(a), Token::uint(5), Token::Bool(true)]);
        assert_eq!(data.len(), 96);
        assert_eq!(&data[12..32], a.as_bytes());
        assert_eq!(data[63], 5);
        assert_eq!(data[95], 1);
    }

    #[test]
    fn string_layout() {
        let data = encode(&[Token::String("hi".into())]);
        // offset, length, padded bytes
        assert_eq!(data.len(), 96);
        assert_eq!(data[31], 0x20);
        assert_eq!(data[63], 2);
        assert_eq!(&data[64..66], b"hi");
        assert!(data[66..].iter().all(|b| *b == 0));
    }

    #[test]
    fn empty_string_has_no_body() {
        let data = encode(&[Token::String(String::new())]);
        assert_eq!(data.len(), 64);
    }

    #[test]
    fn string_array_layout() {
        // string[] = ["a", "b"]: offsets are relative to the element heads.
        let data = encode(&[Token::Array(vec![
            Token::String("a".into()),
            Token::String("b".into()),
        ])]);
        assert_eq!(word_to_u64(&read_word(&data, 0).unwrap()).unwrap(), 0x20);
        assert_eq!(word_to_u64(&read_word(&data, 32).unwrap()).unwrap(), 2);
        assert_eq!(word_to_u64(&read_word(&data, 64).unwrap()).unwrap(), 0x40);
        assert_eq!(word_to_u64(&read_word(&data, 96).unwrap()).unwrap(), 0x80);
        assert_eq!(data[160], b'a');
    }

    #[test]
    fn nested_dynamic_values_decode() {
        let tokens = vec![
            Token::String("Run every day".into()),
            Token::Array(vec![
                Token::Address(addr("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")),
                Token::Address(addr("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc")),
            ]),
            Token::Array(vec![
                Token::String("Week 1".into()),
                Token::String("A much longer milestone description that spans two words".into()),
            ]),
            Token::uint(2),
        ];
        let types = [
            ParamType::String,
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::String)),
            ParamType::Uint,
        ];
        assert_eq!(decode(&types, &encode(&tokens)).unwrap(), tokens);
    }

    #[test]
    fn tuple_wrapped_in_offset() {
        let inner = vec![Token::uint(1), Token::String("x".into())];
        let data = encode(&[Token::Tuple(inner.clone())]);
        assert_eq!(word_to_u64(&read_word(&data, 0).unwrap()).unwrap(), 0x20);
        let types = [ParamType::Tuple(vec![ParamType::Uint, ParamType::String])];
        assert_eq!(decode(&types, &data).unwrap(), vec![Token::Tuple(inner)]);
    }

    #[test]
    fn truncated_data_rejected() {
        let data = encode(&[Token::String("hello".into())]);
        let err = decode(&[ParamType::String], &data[..70]).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { .. }));
        assert!(decode(&[ParamType::Uint], &[0u8; 31]).is_err());
    }

    #[test]
    fn huge_array_length_rejected() {
        let mut data = uint_word(0x20).to_vec();
        data.extend_from_slice(&uint_word(1_000_000));
        let err = decode(&[ParamType::Array(Box::new(ParamType::Bool))], &data).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { .. }));
    }

    #[test]
    fn invalid_bool_and_address_rejected() {
        assert!(decode(&[ParamType::Bool], &uint_word(2)).is_err());
        assert!(decode(&[ParamType::Address], &[0xffu8; 32]).is_err());
    }

    #[test]
    fn word_conversions() {
        assert_eq!(word_to_u128(&uint_word(u128::MAX)).unwrap(), u128::MAX);
        assert_eq!(word_to_u64(&uint_word(u128::from(u64::MAX) + 1)), Err(AbiError::Overflow(64)));
        let mut big = [0u8; 32];
        big[0] = 1;
        assert_eq!(word_to_u128(&big), Err(AbiError::Overflow(128)));
    }

    #[test]
    fn token_accessors_check_kind() {
        assert_eq!(Token::uint(3).into_u64().unwrap(), 3);
        assert_eq!(
            Token::Bool(true).into_string(),
            Err(AbiError::UnexpectedToken {
                expected: "string",
                found: "bool"
            })
        );
    }
}
