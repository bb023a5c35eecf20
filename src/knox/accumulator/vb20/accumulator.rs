use super::{hash_to_g1, key::SecretKey, Knox, SALT};
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::{group::GroupEncoding, Field};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// An element in the accumulator
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Element(pub Scalar);

impl From<Scalar> for Element {
    fn from(s: Scalar) -> Self {
        Self(s)
    }
}

impl Element {
    /// Construct an element by hashing the specified bytes
    pub fn hash(d: &[u8]) -> Self {
        Self(Knox::hash_to_scalar(SALT, d))
    }

    /// Construct a random element
    pub fn random(rng: impl RngCore + CryptoRng) -> Self {
        Self(Scalar::random(rng))
    }

    /// Return the byte representation
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }
}

/// A coefficient for updating witnesses
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Coefficient(pub G1Projective);

/// Represents a Universal Bilinear Accumulator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Accumulator(pub G1Projective);

impl Default for Accumulator {
    fn default() -> Self {
        Self(G1Projective::GENERATOR)
    }
}

impl Accumulator {
    /// The number of bytes in an accumulator
    pub const BYTES: usize = 48;

    /// Create a new random accumulator where the set elements are not known
    pub fn random(mut rng: impl RngCore + CryptoRng) -> Self {
        let mut buffer = [0u8; 32];
        rng.fill_bytes(&mut buffer);
        Self(hash_to_g1(buffer))
    }

    /// Initialize a new accumulator prefilled with entries
    /// Each member is assumed to be hashed
    pub fn with_elements(key: &SecretKey, m: &[Element]) -> Self {
        let y = key.batch_additions(m);
        Self(G1Projective::GENERATOR * y.0)
    }

    /// Add a value to the accumulator
    pub fn add_assign(&mut self, key: &SecretKey, value: Element) {
        self.0 *= key.0 + value.0;
    }

    /// Remove a value from the accumulator and return
    /// a new accumulator without `value`
    pub fn remove(&self, key: &SecretKey, value: Element) -> CredxResult<Self> {
        let v = key.batch_deletions(&[value])?;
        Ok(Self(self.0 * v.0))
    }

    /// Performs a batch addition and deletion as described on page 11, section 5 in
    /// <https://eprint.iacr.org/2020/777.pdf>
    ///
    /// Returns the coefficients holders need to update their witnesses.
    pub fn update_assign(
        &mut self,
        key: &SecretKey,
        additions: &[Element],
        deletions: &[Element],
    ) -> CredxResult<Vec<Coefficient>> {
        let mut a = key.batch_additions(additions);
        let d = key.batch_deletions(deletions)?;

        a.0 *= d.0;
        let coefficients = key
            .create_coefficients(additions, deletions)?
            .iter()
            .map(|c| Coefficient(self.0 * c.0))
            .collect();
        self.0 *= a.0;
        Ok(coefficients)
    }

    /// Convert accumulator to bytes
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut d = [0u8; Self::BYTES];
        d.copy_from_slice(self.0.to_bytes().as_ref());
        d
    }
}
