use super::{
    accumulator::{Accumulator, Coefficient, Element},
    dad,
    key::{PublicKey, SecretKey},
    PolynomialG1,
};
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{
    multi_miller_loop, G1Projective, G2Prepared, G2Projective, MillerLoopResult, Scalar,
};
use elliptic_curve::{
    group::{Curve, Group, GroupEncoding},
    Field,
};
use serde::{Deserialize, Serialize};

/// A membership witness that can be used for membership proof generation
/// as described in section 4 in
/// <https://eprint.iacr.org/2020/777>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MembershipWitness(pub G1Projective);

impl MembershipWitness {
    const BYTES: usize = 48;

    /// Compute the witness using a prehashed element
    pub fn new(element: Element, accumulator: Accumulator, secret_key: &SecretKey) -> CredxResult<Self> {
        Ok(Self(accumulator.remove(secret_key, element)?.0))
    }

    /// Verify this is a valid witness as per section 4 in
    /// <https://eprint.iacr.org/2020/777>
    pub fn verify(&self, y: Element, pubkey: PublicKey, accumulator: Accumulator) -> bool {
        let p = G2Projective::GENERATOR * y.0 + pubkey.0;

        // e(C, yP~ + Q~) == e(V, P~)
        multi_miller_loop(&[
            (&self.0.to_affine(), &G2Prepared::from(p.to_affine())),
            (
                &accumulator.0.to_affine(),
                &G2Prepared::from(-G2Projective::GENERATOR.to_affine()),
            ),
        ])
        .final_exponentiation()
        .is_identity()
        .unwrap_u8()
            == 1
    }

    /// Apply the specified delta to this witness
    pub fn apply_delta_assign(&mut self, delta: Delta) {
        // C * dA(x) / dD(x)
        self.0 *= delta.d;
        // C + 1 / dD *〈Υy,Ω〉
        self.0 += delta.p;
    }

    /// Batch update this witness
    pub fn batch_update_assign(
        &mut self,
        y: Element,
        additions: &[Element],
        deletions: &[Element],
        coefficients: &[Coefficient],
    ) -> CredxResult<()> {
        let delta = evaluate_delta(y, additions, deletions, coefficients)?;
        self.apply_delta_assign(delta);
        Ok(())
    }

    /// Fold an ordered chain of batch updates into this witness
    pub fn multi_batch_update_assign<A, D, C>(
        &mut self,
        y: Element,
        deltas: &[(A, D, C)],
    ) -> CredxResult<()>
    where
        A: AsRef<[Element]>,
        D: AsRef<[Element]>,
        C: AsRef<[Coefficient]>,
    {
        let delta = evaluate_deltas(y, deltas)?;
        self.apply_delta_assign(delta);
        Ok(())
    }

    /// Return the byte sequence for this witness
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut res = [0u8; Self::BYTES];
        res.copy_from_slice(self.0.to_bytes().as_ref());
        res
    }
}

/// A compressed delta after evaluating the polynomials w.r.t an element
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    d: Scalar,
    p: G1Projective,
}

/// Compress the deltas for the specified element and return the single delta.
///
/// Fails with [`Error::CredentialRevoked`] when `y` is one of the deletions.
pub fn evaluate_deltas<A, D, C>(y: Element, deltas: &[(A, D, C)]) -> CredxResult<Delta>
where
    A: AsRef<[Element]>,
    D: AsRef<[Element]>,
    C: AsRef<[Coefficient]>,
{
    let one = Scalar::ONE;

    // dA(x) =  ∏ 1..n (yA_i - x)
    let mut aa = Vec::with_capacity(deltas.len());
    // dD(x) = ∏ 1..m (yD_i - x)
    let mut dd = Vec::with_capacity(deltas.len());

    let mut acc_a = one;
    let mut acc_d = one;

    for (adds, dels, _) in deltas {
        let ta = dad(adds.as_ref(), y.0);
        let td = dad(dels.as_ref(), y.0);

        acc_a *= ta;
        acc_d *= td;

        aa.push(ta);
        dd.push(td);
    }

    let acc_d: Scalar = Option::from(acc_d.invert()).ok_or(Error::CredentialRevoked)?;

    //〈Υy,Ω〉
    let mut poly = PolynomialG1::with_capacity(deltas.len());

    // Ωi->j+1 = ∑ 1..t (dAt * dDt-1) · Ω
    for (i, (_, _, coefficients)) in deltas.iter().enumerate() {
        let ddh = dd.iter().take(i).fold(one, |a, h| a * h);
        let dak = aa.iter().skip(i + 1).fold(one, |a, k| a * k);

        let mut pp = PolynomialG1(coefficients.as_ref().iter().map(|c| c.0).collect());
        pp *= dak * ddh;
        poly += pp;
    }

    acc_a *= acc_d;

    // An empty chain leaves the witness untouched
    let p = poly.evaluate(y.0).unwrap_or(G1Projective::IDENTITY) * acc_d;
    Ok(Delta { d: acc_a, p })
}

/// Computes the compressed delta needed to update a witness
pub fn evaluate_delta<A, D, C>(
    y: Element,
    additions: A,
    deletions: D,
    coefficients: C,
) -> CredxResult<Delta>
where
    A: AsRef<[Element]>,
    D: AsRef<[Element]>,
    C: AsRef<[Coefficient]>,
{
    evaluate_deltas(y, &[(additions, deletions, coefficients)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(count: u32) -> Vec<Element> {
        (0..count).map(|i| Element::hash(&i.to_be_bytes())).collect()
    }

    #[test]
    fn batch_update_keeps_witness_valid() {
        let key = SecretKey::new(rand_core::OsRng);
        let pk = PublicKey::from(&key);
        let elems = elements(10);
        let y = elems[4];
        let mut acc = Accumulator::with_elements(&key, &elems[..6]);
        let mut wit = MembershipWitness::new(y, acc, &key).unwrap();
        assert!(wit.verify(y, pk, acc));

        let coefficients = acc.update_assign(&key, &elems[6..], &elems[..2]).unwrap();
        assert!(!wit.verify(y, pk, acc));
        wit.batch_update_assign(y, &elems[6..], &elems[..2], &coefficients)
            .unwrap();
        assert!(wit.verify(y, pk, acc));
    }

    #[test]
    fn multi_batch_update_matches_sequential() {
        let key = SecretKey::new(rand_core::OsRng);
        let pk = PublicKey::from(&key);
        let elems = elements(12);
        let y = elems[0];
        let mut acc = Accumulator::with_elements(&key, &elems[..4]);
        let start = MembershipWitness::new(y, acc, &key).unwrap();

        let mut chain = Vec::new();
        let c1 = acc.update_assign(&key, &elems[4..7], &elems[1..2]).unwrap();
        chain.push((elems[4..7].to_vec(), elems[1..2].to_vec(), c1));
        let c2 = acc.update_assign(&key, &elems[7..9], &elems[2..4]).unwrap();
        chain.push((elems[7..9].to_vec(), elems[2..4].to_vec(), c2));

        let mut wit = start;
        wit.multi_batch_update_assign(y, chain.as_slice()).unwrap();
        assert!(wit.verify(y, pk, acc));
    }

    #[test]
    fn witness_for_element_added_later() {
        let key = SecretKey::new(rand_core::OsRng);
        let pk = PublicKey::from(&key);
        let elems = elements(4);
        let y = elems[3];
        let mut acc = Accumulator::default();
        // Any starting witness works once y is part of the additions
        let mut wit = MembershipWitness(G1Projective::GENERATOR);
        let coefficients = acc.update_assign(&key, &elems, &[]).unwrap();
        wit.batch_update_assign(y, &elems, &[], &coefficients).unwrap();
        assert!(wit.verify(y, pk, acc));
    }

    #[test]
    fn deleted_element_cannot_update() {
        let key = SecretKey::new(rand_core::OsRng);
        let elems = elements(3);
        let mut acc = Accumulator::with_elements(&key, &elems);
        let mut wit = MembershipWitness::new(elems[0], acc, &key).unwrap();
        let coefficients = acc.update_assign(&key, &[], &elems[..1]).unwrap();
        let res = wit.batch_update_assign(elems[0], &[], &elems[..1], &coefficients);
        assert_eq!(res, Err(Error::CredentialRevoked));
    }
}
