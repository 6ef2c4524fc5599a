// src/blockchain/abi.rs

//! Hand-rolled call encoding for the handful of contract functions the
//! gateway touches.

use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::keccak256;

use crate::providers::ProviderError;

pub fn selector(signature: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(signature.as_bytes())[0..4]);
    sel
}

pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    Bytes::from(out)
}

/// Decodes return data, failing with the function signature in the message.
pub fn decode_output(
    signature: &str,
    types: &[ParamType],
    data: &[u8],
) -> Result<Vec<Token>, ProviderError> {
    if data.is_empty() {
        return Err(ProviderError::decode(
            "rpc",
            format!("{} returned no data (is the contract address right?)", signature),
        ));
    }
    decode(types, data)
        .map_err(|e| ProviderError::decode("rpc", format!("{}: {}", signature, e)))
}

fn unexpected(expected: &str, token: &Token) -> ProviderError {
    ProviderError::decode("rpc", format!("expected {}, got {:?}", expected, token))
}

pub fn take_string(token: Token) -> Result<String, ProviderError> {
    match token {
        Token::String(s) => Ok(s),
        other => Err(unexpected("string", &other)),
    }
}

pub fn take_uint(token: Token) -> Result<U256, ProviderError> {
    match token {
        Token::Uint(n) => Ok(n),
        other => Err(unexpected("uint", &other)),
    }
}

pub fn take_address(token: Token) -> Result<Address, ProviderError> {
    match token {
        Token::Address(a) => Ok(a),
        other => Err(unexpected("address", &other)),
    }
}

pub fn take_bool(token: Token) -> Result<bool, ProviderError> {
    match token {
        Token::Bool(b) => Ok(b),
        other => Err(unexpected("bool", &other)),
    }
}

pub fn take_array(token: Token) -> Result<Vec<Token>, ProviderError> {
    match token {
        Token::Array(items) => Ok(items),
        other => Err(unexpected("array", &other)),
    }
}

pub fn take_tuple(token: Token) -> Result<Vec<Token>, ProviderError> {
    match token {
        Token::Tuple(items) => Ok(items),
        other => Err(unexpected("tuple", &other)),
    }
}

/// Pops the next token off a decoded output list.
pub fn next_token(tokens: &mut std::vec::IntoIter<Token>) -> Result<Token, ProviderError> {
    tokens
        .next()
        .ok_or_else(|| ProviderError::decode("rpc", "return data has fewer values than expected"))
}
