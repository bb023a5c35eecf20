use crate::error::Error;
use crate::knox::ecc_group::ScalarOps;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// An 80-bit random value carried as a decimal string.
///
/// Offers, requests and presentation requests each carry a fresh nonce
/// that binds the answer to that specific exchange.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nonce(String);

impl Nonce {
    const BYTES: usize = 10;

    /// Create a new random nonce
    pub fn new() -> Self {
        Self::from_rng(rand::thread_rng())
    }

    /// Create a new nonce from the supplied random source
    pub fn from_rng(mut rng: impl RngCore + CryptoRng) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        rng.fill_bytes(&mut bytes);
        Self(BigUint::from_bytes_be(&bytes).to_str_radix(10))
    }

    /// Validate a nonce received as a decimal string
    pub fn from_dec<S: Into<String>>(value: S) -> CredxResult<Self> {
        let value = value.into();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "nonce '{}' is not a decimal integer",
                value
            )));
        }
        Ok(Self(value))
    }

    /// The decimal text of this nonce
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The field element used when this nonce binds a proof
    pub fn as_scalar(&self) -> Scalar {
        Scalar::from_hash(self.0.as_bytes())
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Nonce {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_dec(value)
    }
}

impl From<Nonce> for String {
    fn from(n: Nonce) -> Self {
        n.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;

    #[test]
    fn random_nonces_are_decimal() {
        let nonce = Nonce::new();
        assert!(Nonce::from_dec(nonce.as_str()).is_ok());
        assert_ne!(nonce, Nonce::new());
    }

    #[test]
    fn seeded_nonces_repeat() {
        let a = Nonce::from_rng(ChaChaRng::from_seed([7u8; 32]));
        let b = Nonce::from_rng(ChaChaRng::from_seed([7u8; 32]));
        assert_eq!(a, b);
        assert_eq!(a.as_scalar(), b.as_scalar());
    }

    #[test]
    fn rejects_non_decimal() {
        assert!(Nonce::from_dec("12a").is_err());
        assert!(Nonce::from_dec("").is_err());
        assert!(serde_json::from_str::<Nonce>("\"-1\"").is_err());
        let n: Nonce = serde_json::from_str("\"1234567890\"").unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"1234567890\"");
    }
}
