use super::PublicKey;
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{
    multi_miller_loop, G1Projective, G2Affine, G2Prepared, G2Projective, MillerLoopResult,
    PrimeCurveAffine, Scalar,
};
use elliptic_curve::{
    group::{Curve, Group},
    Field,
};
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The actual proof that is sent from prover to verifier.
///
/// `proof` holds the responses for `t`, `m'` and then every
/// hidden message in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PokSignatureProof {
    pub(crate) sigma_1: G1Projective,
    pub(crate) sigma_2: G1Projective,
    pub(crate) commitment: G2Projective,
    pub(crate) proof: Vec<Scalar>,
}

impl PokSignatureProof {
    /// Store the proof as a sequence of bytes
    /// Each point is compressed to big-endian format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(48 * 2 + 96 + 32 * self.proof.len());
        buffer.extend_from_slice(&self.sigma_1.to_affine().to_compressed());
        buffer.extend_from_slice(&self.sigma_2.to_affine().to_compressed());
        buffer.extend_from_slice(&self.commitment.to_affine().to_compressed());

        for m in &self.proof {
            buffer.extend_from_slice(m.to_be_bytes().as_ref());
        }
        buffer
    }

    /// Convert the committed values to bytes for the fiat-shamir challenge
    pub fn add_challenge_contribution(
        &self,
        public_key: &PublicKey,
        rvl_msgs: &[(usize, Scalar)],
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> CredxResult<()> {
        transcript.append_message(
            b"sigma_1",
            self.sigma_1.to_affine().to_compressed().as_ref(),
        );
        transcript.append_message(
            b"sigma_2",
            self.sigma_2.to_affine().to_compressed().as_ref(),
        );
        transcript.append_message(
            b"random commitment",
            self.commitment.to_affine().to_compressed().as_ref(),
        );

        let known = rvl_msgs.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>();
        let mut points = Vec::with_capacity(public_key.y.len() + 3);
        points.push(G2Projective::GENERATOR);
        points.push(public_key.w);
        for (i, y) in public_key.y.iter().enumerate() {
            if !known.contains(&i) {
                points.push(*y);
            }
        }
        if points.len() != self.proof.len() {
            return Err(Error::InvalidProofData);
        }
        points.push(self.commitment);

        let mut scalars = self.proof.clone();
        scalars.push(-challenge);
        let commitment = G2Projective::sum_of_products(points.as_ref(), scalars.as_ref());
        transcript.append_message(
            b"blind commitment",
            commitment.to_affine().to_compressed().as_ref(),
        );
        Ok(())
    }

    /// Validate the proof, only checks the signature proof
    /// the selective disclosure proof is checked by verifying
    /// self.challenge == computed_challenge
    pub fn verify(&self, rvl_msgs: &[(usize, Scalar)], public_key: &PublicKey) -> bool {
        if (self.sigma_1.is_identity() | self.sigma_2.is_identity()).unwrap_u8() == 1 {
            return false;
        }
        if public_key.y.len() < rvl_msgs.len() {
            return false;
        }
        if public_key.is_invalid().unwrap_u8() == 1u8 {
            return false;
        }

        let mut points = Vec::with_capacity(rvl_msgs.len() + 2);
        let mut scalars = Vec::with_capacity(rvl_msgs.len() + 2);

        for (idx, msg) in rvl_msgs {
            match public_key.y.get(*idx) {
                Some(y) => points.push(*y),
                None => return false,
            }
            scalars.push(*msg);
        }
        points.push(public_key.x);
        scalars.push(Scalar::ONE);
        points.push(self.commitment);
        scalars.push(Scalar::ONE);

        let j = G2Projective::sum_of_products(points.as_ref(), scalars.as_ref());

        multi_miller_loop(&[
            (&self.sigma_1.to_affine(), &G2Prepared::from(j.to_affine())),
            (
                &self.sigma_2.to_affine(),
                &G2Prepared::from(-G2Affine::generator()),
            ),
        ])
        .final_exponentiation()
        .is_identity()
        .unwrap_u8()
            == 1
    }

    /// Return the Schnorr proofs for all hidden messages keyed by message index
    pub fn get_hidden_message_proofs(
        &self,
        public_key: &PublicKey,
        rvl_msgs: &[(usize, Scalar)],
    ) -> CredxResult<BTreeMap<usize, Scalar>> {
        if public_key.y.len() < rvl_msgs.len() {
            return Err(Error::InvalidProofData);
        }
        let known = rvl_msgs.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>();
        let mut hidden = BTreeMap::new();
        let mut ordinal = 0;
        for i in 0..public_key.y.len() {
            if known.contains(&i) {
                continue;
            }
            let response = self
                .proof
                .get(2 + ordinal)
                .ok_or(Error::InvalidProofData)?;
            hidden.insert(i, *response);
            ordinal += 1;
        }

        Ok(hidden)
    }
}
