use super::SecretKey;
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::group::Curve;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use subtle::ConstantTimeEq;

/// Contains the data used for computing a blind signature and verifying
/// proof of hidden messages from a prover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSignatureContext {
    /// The blinded signature commitment
    pub commitment: G1Projective,
    /// The challenge hash for the Fiat-Shamir heuristic
    pub challenge: Scalar,
    /// The proofs for the hidden messages followed by the blinding factor
    pub proofs: Vec<Scalar>,
}

impl BlindSignatureContext {
    pub(crate) const TRANSCRIPT_LABEL: &'static [u8] = b"new blind signature";

    /// Store the context as a sequence of bytes
    /// Each point is compressed to big-endian format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(48 + 32 * (self.proofs.len() + 1));
        buffer.extend_from_slice(self.commitment.to_affine().to_compressed().as_ref());
        buffer.extend_from_slice(&self.challenge.to_be_bytes());
        for p in &self.proofs {
            buffer.extend_from_slice(&p.to_be_bytes());
        }
        buffer
    }

    /// Assumes the proof of hidden messages
    /// If other proofs were included, those will need to be verified another way
    pub fn verify(
        &self,
        known_messages: &[usize],
        sk: &SecretKey,
        nonce: Scalar,
    ) -> CredxResult<bool> {
        let mut known = BTreeSet::new();
        for idx in known_messages {
            if *idx >= sk.y.len() {
                return Err(Error::InvalidSignatureProofData);
            }
            known.insert(*idx);
        }
        let mut points = Vec::with_capacity(sk.y.len() + 2);
        for (i, y) in sk.y.iter().enumerate() {
            if !known.contains(&i) {
                points.push(G1Projective::GENERATOR * y);
            }
        }
        points.push(G1Projective::GENERATOR);
        if points.len() != self.proofs.len() {
            return Ok(false);
        }
        points.push(self.commitment);

        let mut scalars = self.proofs.clone();
        scalars.push(-self.challenge);

        let commitment = G1Projective::sum_of_products(points.as_ref(), scalars.as_ref());
        let challenge = Self::compute_challenge(commitment, self.commitment, nonce);

        Ok(self.challenge.ct_eq(&challenge).unwrap_u8() == 1)
    }

    pub(crate) fn compute_challenge(
        random_commitment: G1Projective,
        blind_commitment: G1Projective,
        nonce: Scalar,
    ) -> Scalar {
        let mut transcript = Transcript::new(Self::TRANSCRIPT_LABEL);
        transcript.append_message(
            b"random commitment",
            random_commitment.to_affine().to_compressed().as_ref(),
        );
        transcript.append_message(
            b"blind commitment",
            blind_commitment.to_affine().to_compressed().as_ref(),
        );
        transcript.append_message(b"nonce", nonce.to_be_bytes().as_ref());
        let mut res = [0u8; 64];
        transcript.challenge_bytes(b"blind signature context challenge", &mut res);
        Scalar::from_bytes_wide(&res)
    }
}
