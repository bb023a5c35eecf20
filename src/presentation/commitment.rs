use super::PresentationBuilder;
use crate::knox::Knox;
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::{group::Curve, Field};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

const GENERATOR_DST: &[u8] = b"BLS12381G1_XOF:SHAKE-256_SSWU_RO_ANONCREDS_PS_PREDICATE:1_0_0";

/// The Pedersen generators `(g, h)` used for predicate commitments
pub(crate) fn commitment_generators() -> (G1Projective, G1Projective) {
    (
        Knox::hash_to_g1(GENERATOR_DST, b"message generator"),
        Knox::hash_to_g1(GENERATOR_DST, b"blinder generator"),
    )
}

/// A commitment builder
pub(crate) struct CommitmentBuilder {
    referent: String,
    pub(crate) commitment: G1Projective,
    pub(crate) message_generator: G1Projective,
    pub(crate) blinder_generator: G1Projective,
    message: Scalar,
    pub(crate) b: Scalar,
    r: Scalar,
}

impl PresentationBuilder for CommitmentBuilder {
    type Proof = CommitmentProof;

    fn gen_proof(self, challenge: Scalar) -> CredxResult<CommitmentProof> {
        let message_proof = self.b + challenge * self.message;
        let blinder_proof = self.r + challenge * self.b;
        Ok(CommitmentProof {
            commitment: self.commitment,
            message_proof,
            blinder_proof,
        })
    }
}

impl CommitmentBuilder {
    /// Commit to `message` with blinder `b`.
    ///
    /// When `message` is hidden in the signature proof, `b` must be the
    /// blinder used there so the two responses are equal.
    pub fn commit(
        referent: &str,
        message: Scalar,
        b: Scalar,
        mut rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> Self {
        let (message_generator, blinder_generator) = commitment_generators();
        let r = Scalar::random(&mut rng);

        let commitment = message_generator * message + blinder_generator * b;
        let blind_commitment = message_generator * b + blinder_generator * r;

        add_commitment_contribution(referent, commitment, blind_commitment, transcript);
        Self {
            referent: referent.to_string(),
            commitment,
            message_generator,
            blinder_generator,
            message,
            b,
            r,
        }
    }

    /// The predicate referent
    pub fn referent(&self) -> &str {
        &self.referent
    }
}

pub(crate) fn add_commitment_contribution(
    referent: &str,
    commitment: G1Projective,
    blind_commitment: G1Projective,
    transcript: &mut Transcript,
) {
    transcript.append_message(b"", referent.as_bytes());
    transcript.append_message(
        b"commitment",
        commitment.to_affine().to_compressed().as_slice(),
    );
    transcript.append_message(
        b"blind commitment",
        blind_commitment.to_affine().to_compressed().as_slice(),
    );
}

/// A Pedersen commitment to an attribute with Schnorr responses
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentProof {
    /// The commitment
    pub commitment: G1Projective,
    /// The schnorr message proof
    pub message_proof: Scalar,
    /// The schnorr blinder proof
    pub blinder_proof: Scalar,
}

impl CommitmentProof {
    /// Recompute the blind commitment from the responses
    pub(crate) fn blind_commitment(&self, challenge: Scalar) -> G1Projective {
        let (g, h) = commitment_generators();
        self.commitment * -challenge + g * self.message_proof + h * self.blinder_proof
    }

    /// Whether the commitment opens to a disclosed `message`
    pub(crate) fn opens_to(&self, message: Scalar, challenge: Scalar) -> bool {
        let (g, h) = commitment_generators();
        let b = self.message_proof - challenge * message;
        self.commitment == g * message + h * b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn responses_reconstruct_blind_commitment() {
        let message = Scalar::from(42u64);
        let b = Scalar::random(OsRng);
        let mut transcript = Transcript::new(b"test");
        let builder = CommitmentBuilder::commit("pred", message, b, OsRng, &mut transcript);
        let r = builder.r;
        let challenge = Scalar::random(OsRng);
        let proof = builder.gen_proof(challenge).unwrap();

        let (g, h) = commitment_generators();
        assert_eq!(proof.blind_commitment(challenge), g * b + h * r);
        assert!(proof.opens_to(message, challenge));
        assert!(!proof.opens_to(Scalar::from(43u64), challenge));
    }
}
