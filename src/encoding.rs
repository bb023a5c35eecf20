//! Attribute encoding.
//!
//! Raw attribute values are first encoded to a decimal string using the
//! legacy rule: 32-bit integers stay as they are, anything else becomes
//! the SHA-256 digest of its UTF-8 bytes read as a big-endian integer.
//! The decimal string is then mapped into the signature field.

use crate::error::Error;
use crate::knox::Knox;
use crate::utils::get_num_scalar;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use num_bigint::{BigInt, BigUint};
use sha2::{Digest, Sha256};

/// Separates hashed attribute values from every other scalar in the crate
const ENCODED_VALUE_DST: &[u8] = b"ANONCREDS_PS_ENCODED_ATTRIBUTE_VALUE:1_0_0";

/// Encode a raw attribute value to its decimal form
pub fn encode_credential_attribute(raw: &str) -> String {
    if let Ok(i) = raw.parse::<i32>() {
        i.to_string()
    } else {
        let digest = Sha256::digest(raw.as_bytes());
        BigUint::from_bytes_be(digest.as_slice()).to_str_radix(10)
    }
}

/// Check that `encoded` is an optional minus sign followed by decimal digits
pub fn is_valid_encoding(encoded: &str) -> bool {
    let digits = encoded.strip_prefix('-').unwrap_or(encoded);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Map an encoded attribute value to the field element that gets signed.
///
/// Values that fit an `i64` keep their ordering so they can be used in
/// range proofs. Anything larger is hashed to the field in its canonical
/// decimal form, so it never lands on the image of an `i64`.
pub fn encoded_to_scalar(encoded: &str) -> CredxResult<Scalar> {
    if !is_valid_encoding(encoded) {
        return Err(Error::EncodingError(format!(
            "'{}' is not a decimal integer",
            encoded
        )));
    }
    if let Ok(v) = encoded.parse::<i64>() {
        return Ok(get_num_scalar(v));
    }
    let value = BigInt::parse_bytes(encoded.as_bytes(), 10)
        .ok_or_else(|| Error::EncodingError(format!("'{}' is not a decimal integer", encoded)))?;
    Ok(Knox::hash_to_scalar(
        ENCODED_VALUE_DST,
        value.to_str_radix(10).as_bytes(),
    ))
}

/// The integer value of an encoded attribute used in a predicate
pub fn encoded_to_i64(encoded: &str) -> CredxResult<i64> {
    encoded.parse::<i64>().map_err(|_| {
        Error::EncodingError(format!(
            "'{}' is not a 64-bit integer and cannot be used in a predicate",
            encoded
        ))
    })
}
