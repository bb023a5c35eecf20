use super::PresentationBuilder;
use crate::knox::accumulator::vb20::{
    Accumulator, MembershipProof, MembershipProofCommitting, MembershipWitness, ProofParams,
    PublicKey,
};
use crate::knox::short_group_sig_core::ProofMessage;
use crate::nonce::Nonce;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// The accumulator parameters bound to a presentation nonce
pub(crate) fn proof_params(public_key: PublicKey, nonce: &Nonce) -> ProofParams {
    ProofParams::new(public_key, Some(nonce.as_str().as_bytes()))
}

pub(crate) fn add_accumulator_contribution(
    params: &ProofParams,
    accum: Accumulator,
    transcript: &mut Transcript,
) {
    params.add_to_transcript(transcript);
    transcript.append_message(b"accumulator", &accum.to_bytes());
}

pub(crate) struct RevocationProofBuilder {
    committing: MembershipProofCommitting,
}

impl PresentationBuilder for RevocationProofBuilder {
    type Proof = RevocationProof;

    fn gen_proof(self, challenge: Scalar) -> CredxResult<RevocationProof> {
        Ok(RevocationProof {
            proof: self.committing.gen_proof(challenge),
        })
    }
}

impl RevocationProofBuilder {
    /// Commit to membership of the hidden revocation element.
    ///
    /// `message` must carry the blinder the signature proof uses for the
    /// same element.
    pub fn commit(
        public_key: PublicKey,
        nonce: &Nonce,
        accum: Accumulator,
        witness: MembershipWitness,
        message: ProofMessage,
        rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> CredxResult<Self> {
        let params = proof_params(public_key, nonce);
        let committing = MembershipProofCommitting::new(message, witness, params, public_key, rng)?;
        add_accumulator_contribution(&params, accum, transcript);
        committing.get_bytes_for_challenge(transcript);
        Ok(Self { committing })
    }
}

/// Proof that the credential's revocation element is in the accumulator
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevocationProof {
    /// The membership proof
    pub proof: MembershipProof,
}
