//! # Calling Convention
//!
//! Binary encoding shared with the token-ledger service: a 4-byte operation
//! selector (first four bytes of the Keccak-256 of the signature) followed by
//! 32-byte positional argument words. Results carry the response code as a
//! signed integer in the first word.
//!
//! Pure functions only.

use crate::domain::entities::TokenOperation;
use crate::domain::value_objects::{Address, Bytes, ResponseCode};
use crate::errors::AbiError;
use sha3::{Digest, Keccak256};

/// Size of one argument word.
pub const WORD_SIZE: usize = 32;

/// Size of an operation selector.
pub const SELECTOR_SIZE: usize = 4;

/// Signature of the association operation.
pub const ASSOCIATE_TOKEN_SIGNATURE: &str = "associateToken(address,address)";

/// Signature of the transfer operation.
pub const TRANSFER_TOKEN_SIGNATURE: &str = "transferToken(address,address,address,int64)";

/// Computes the selector for a canonical operation signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; SELECTOR_SIZE] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; SELECTOR_SIZE];
    out.copy_from_slice(&hash[..SELECTOR_SIZE]);
    out
}

/// Selector for `associateToken(address,address)`.
#[must_use]
pub fn associate_selector() -> [u8; SELECTOR_SIZE] {
    selector(ASSOCIATE_TOKEN_SIGNATURE)
}

/// Selector for `transferToken(address,address,address,int64)`.
#[must_use]
pub fn transfer_selector() -> [u8; SELECTOR_SIZE] {
    selector(TRANSFER_TOKEN_SIGNATURE)
}

// =============================================================================
// WORDS
// =============================================================================

/// Left-pads an address into a word.
#[must_use]
pub fn encode_address(address: Address) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Sign-extends an integer into a word (two's complement).
#[must_use]
pub fn encode_i64(value: i64) -> [u8; WORD_SIZE] {
    let fill = if value < 0 { 0xFF } else { 0x00 };
    let mut word = [fill; WORD_SIZE];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Reads an address word, rejecting non-zero padding.
///
/// # Errors
///
/// [`AbiError::DirtyAddress`] if any of the 12 high bytes is set.
pub fn decode_address(word: &[u8; WORD_SIZE], position: usize) -> Result<Address, AbiError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyAddress(position));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::new(bytes))
}

/// Reads a signed word that must fit in `i64`.
///
/// # Errors
///
/// [`AbiError::IntegerOutOfRange`] if the high 24 bytes are not a pure sign
/// extension of the low 8.
pub fn decode_i64(word: &[u8; WORD_SIZE], position: usize) -> Result<i64, AbiError> {
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    let value = i64::from_be_bytes(low);
    let fill = if value < 0 { 0xFF } else { 0x00 };
    if word[..24].iter().any(|b| *b != fill) {
        return Err(AbiError::IntegerOutOfRange(position));
    }
    Ok(value)
}

fn word_at(data: &[u8], position: usize) -> Result<[u8; WORD_SIZE], AbiError> {
    let start = position * WORD_SIZE;
    let end = start + WORD_SIZE;
    let slice = data.get(start..end).ok_or(AbiError::TooShort {
        expected: end,
        actual: data.len(),
    })?;
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(slice);
    Ok(word)
}

// =============================================================================
// CALLS
// =============================================================================

/// Encodes an operation as calldata.
#[must_use]
pub fn encode_call(operation: &TokenOperation) -> Bytes {
    let (sel, words): ([u8; SELECTOR_SIZE], Vec<[u8; WORD_SIZE]>) = match *operation {
        TokenOperation::Associate { account, token } => (
            associate_selector(),
            vec![encode_address(account), encode_address(token)],
        ),
        TokenOperation::Transfer {
            token,
            from,
            to,
            amount,
        } => (
            transfer_selector(),
            vec![
                encode_address(token),
                encode_address(from),
                encode_address(to),
                encode_i64(amount),
            ],
        ),
    };

    let mut data = Vec::with_capacity(SELECTOR_SIZE + words.len() * WORD_SIZE);
    data.extend_from_slice(&sel);
    for word in &words {
        data.extend_from_slice(word);
    }
    Bytes::from(data)
}

/// Decodes calldata back into an operation.
///
/// Used by the in-memory ledger to interpret incoming calls.
///
/// # Errors
///
/// Fails on short input, unknown selectors, or malformed words.
pub fn decode_call(input: &[u8]) -> Result<TokenOperation, AbiError> {
    if input.len() < SELECTOR_SIZE {
        return Err(AbiError::TooShort {
            expected: SELECTOR_SIZE,
            actual: input.len(),
        });
    }
    let mut sel = [0u8; SELECTOR_SIZE];
    sel.copy_from_slice(&input[..SELECTOR_SIZE]);
    let args = &input[SELECTOR_SIZE..];

    if sel == associate_selector() {
        Ok(TokenOperation::Associate {
            account: decode_address(&word_at(args, 0)?, 0)?,
            token: decode_address(&word_at(args, 1)?, 1)?,
        })
    } else if sel == transfer_selector() {
        Ok(TokenOperation::Transfer {
            token: decode_address(&word_at(args, 0)?, 0)?,
            from: decode_address(&word_at(args, 1)?, 1)?,
            to: decode_address(&word_at(args, 2)?, 2)?,
            amount: decode_i64(&word_at(args, 3)?, 3)?,
        })
    } else {
        Err(AbiError::UnknownSelector(sel))
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Encodes a response code as a one-word result.
#[must_use]
pub fn encode_response_code(code: ResponseCode) -> Bytes {
    Bytes::from(encode_i64(code.0).to_vec())
}

/// Decodes the response code from the first result word.
///
/// Trailing words are ignored.
///
/// # Errors
///
/// Fails if the result is shorter than one word or the code does not fit
/// in `i64`.
pub fn decode_response_code(output: &[u8]) -> Result<ResponseCode, AbiError> {
    let word = word_at(output, 0)?;
    decode_i64(&word, 0).map(ResponseCode)
}

// =============================================================================
// TESTS
// =============================================================================
