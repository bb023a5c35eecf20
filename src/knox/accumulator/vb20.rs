//! A positive dynamic accumulator with batch witness updates and
//! zero-knowledge membership proofs as described in
//! <https://eprint.iacr.org/2020/777>

mod accumulator;
mod key;
mod proof;
mod witness;

pub use accumulator::*;
pub use key::*;
pub use proof::*;
pub use witness::*;

use super::super::Knox;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::Field;

/// Salt used for hashing values into the accumulator
/// Giuseppe Vitto, Alex Biryukov = VB
/// Accumulator = ACC
const SALT: &[u8] = b"VB-ACC-HASH-SALT-";

fn hash_to_g1<I: AsRef<[u8]>>(data: I) -> G1Projective {
    const DST: &[u8] = b"BLS12381G1_XOF:SHAKE256_SSWU_RO_VB_ACCUMULATOR:1_0_0";
    Knox::hash_to_g1(DST, data.as_ref())
}

/// dA(x) and dD(x)
fn dad(values: &[Element], y: Scalar) -> Scalar {
    values
        .iter()
        .map(|v| v.0 - y)
        .fold(Scalar::ONE, |a, y| a * y)
}

/// A Polynomial for Points
pub struct PolynomialG1(pub Vec<G1Projective>);

impl PolynomialG1 {
    /// Initialize this polynomial with the expected capacity
    pub fn with_capacity(size: usize) -> Self {
        Self(Vec::with_capacity(size))
    }

    /// Return the result of evaluating the polynomial with the specified point
    pub fn evaluate(&self, x: Scalar) -> Option<G1Projective> {
        let (first, rest) = self.0.split_first()?;
        let mut p = x;
        let mut res = *first;
        for c in rest {
            res += *c * p;
            p *= x;
        }
        Some(res)
    }
}

impl core::ops::AddAssign for PolynomialG1 {
    fn add_assign(&mut self, rhs: Self) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), G1Projective::IDENTITY);
        }
        for (l, r) in self.0.iter_mut().zip(rhs.0.iter()) {
            *l += *r;
        }
    }
}

impl core::ops::MulAssign<Scalar> for PolynomialG1 {
    fn mul_assign(&mut self, rhs: Scalar) {
        for c in self.0.iter_mut() {
            *c *= rhs;
        }
    }
}

/// A Polynomial for scalars
#[derive(Default)]
pub struct Polynomial(pub Vec<Scalar>);

impl Polynomial {
    /// Initialize this polynomial with the expected capacity
    pub fn with_capacity(size: usize) -> Self {
        Self(Vec::with_capacity(size))
    }

    /// Add the scalar to the end of the polynomial
    pub fn push(&mut self, value: Scalar) {
        self.0.push(value);
    }
}

impl core::ops::AddAssign for Polynomial {
    fn add_assign(&mut self, rhs: Self) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), Scalar::ZERO);
        }
        for (l, r) in self.0.iter_mut().zip(rhs.0.iter()) {
            *l += r;
        }
    }
}

impl core::ops::SubAssign for Polynomial {
    fn sub_assign(&mut self, rhs: Self) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), Scalar::ZERO);
        }
        for (l, r) in self.0.iter_mut().zip(rhs.0.iter()) {
            *l -= r;
        }
    }
}

impl core::ops::MulAssign<&[Scalar]> for Polynomial {
    fn mul_assign(&mut self, rhs: &[Scalar]) {
        if self.0.is_empty() || rhs.is_empty() {
            self.0.clear();
            return;
        }
        // M + N - 1
        let mut product = vec![Scalar::ZERO; self.0.len() + rhs.len() - 1];
        for (i, l) in self.0.iter().enumerate() {
            for (j, r) in rhs.iter().enumerate() {
                product[i + j] += *l * r;
            }
        }
        self.0 = product;
    }
}

impl core::ops::MulAssign<Scalar> for Polynomial {
    fn mul_assign(&mut self, rhs: Scalar) {
        for c in self.0.iter_mut() {
            *c *= rhs;
        }
    }
}
