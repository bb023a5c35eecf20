use super::{accumulator::Element, Polynomial};
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{G2Projective, Scalar};
use core::fmt;
use elliptic_curve::{group::GroupEncoding, Field};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Represents \alpha (secret key) on page 6 in
/// <https://eprint.iacr.org/2020/777.pdf>
#[derive(Clone, Eq, PartialEq, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
pub struct SecretKey(pub(crate) Scalar);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey {{ .. }}")
    }
}

impl SecretKey {
    /// Create a new secret key
    pub fn new(rng: impl RngCore + CryptoRng) -> Self {
        Self(Scalar::random(rng))
    }

    /// Compute the batch add elements value
    pub fn batch_additions(&self, additions: &[Element]) -> Element {
        Element(
            additions
                .iter()
                .map(|v| v.0 + self.0)
                .fold(Scalar::ONE, |a, y| a * y),
        )
    }

    /// Compute the batch remove elements value
    pub fn batch_deletions(&self, deletions: &[Element]) -> CredxResult<Element> {
        Option::<Scalar>::from(self.batch_additions(deletions).0.invert())
            .map(Element)
            .ok_or(Error::InvalidAccumulator("no inverse exists"))
    }

    /// Create the Batch Polynomial coefficients
    pub fn create_coefficients(
        &self,
        additions: &[Element],
        deletions: &[Element],
    ) -> CredxResult<Vec<Element>> {
        let one = Scalar::ONE;
        let m1 = -one;

        // vD(x) = ∑^{m}_{s=1}{ ∏ 1..s {yD_i + alpha}^-1 ∏ 1 ..s-1 {yD_j - x}
        let mut v_d = Polynomial::with_capacity(deletions.len());
        for s in 0..deletions.len() {
            let c = self.batch_deletions(&deletions[0..s + 1])?.0;
            let mut poly = Polynomial::with_capacity(deletions.len());
            poly.push(one);
            for j in deletions.iter().take(s) {
                poly *= &[j.0, m1][..];
            }
            poly *= c;
            v_d += poly;
        }

        // vD(x) * ∏ 1..n (yA_i + alpha)
        v_d *= self.batch_additions(additions).0;

        // vA(x) = ∑^n_{s=1}{ ∏ 1..s-1 {yA_i + alpha} ∏ s+1..n {yA_j - x} }
        let mut v_a = Polynomial::with_capacity(additions.len());
        for s in 0..additions.len() {
            let c = self.batch_additions(&additions[0..s]).0;
            let mut poly = Polynomial::with_capacity(additions.len());
            poly.push(one);
            for j in additions.iter().skip(s + 1) {
                poly *= &[j.0, m1][..];
            }
            poly *= c;
            v_a += poly;
        }
        v_a -= v_d;

        Ok(v_a.0.into_iter().map(Element).collect())
    }
}

/// Represents \overline{Q} = \overline{P}*\alpha (public key) on page 6 in
/// <https://eprint.iacr.org/2020/777.pdf>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublicKey(pub G2Projective);

impl PublicKey {
    const BYTES: usize = 96;

    /// Return the byte representation for this public key
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut d = [0u8; Self::BYTES];
        d.copy_from_slice(self.0.to_bytes().as_ref());
        d
    }
}

impl From<&SecretKey> for PublicKey {
    fn from(sk: &SecretKey) -> Self {
        Self(G2Projective::GENERATOR * sk.0)
    }
}
