use crate::error::Error;
use crate::knox::accumulator::vb20::{Accumulator, ProofParams, PublicKey};
use crate::nonce::Nonce;
use crate::presentation::{add_accumulator_contribution, proof_params, RevocationProof};
use crate::verifier::ProofVerifier;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

pub(crate) struct RevocationVerifier<'a> {
    accumulator_proof: &'a RevocationProof,
    accumulator: Accumulator,
    public_key: PublicKey,
    params: ProofParams,
    message_proof: Scalar,
}

impl<'a> RevocationVerifier<'a> {
    /// `message_proof` is the signature proof response for the revocation element
    pub fn new(
        accumulator_proof: &'a RevocationProof,
        accumulator: Accumulator,
        public_key: PublicKey,
        nonce: &Nonce,
        message_proof: Scalar,
    ) -> Self {
        Self {
            accumulator_proof,
            accumulator,
            public_key,
            params: proof_params(public_key, nonce),
            message_proof,
        }
    }
}

impl ProofVerifier for RevocationVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> CredxResult<()> {
        add_accumulator_contribution(&self.params, self.accumulator, transcript);
        let finalized = self.accumulator_proof.proof.finalize(
            self.accumulator,
            self.params,
            self.public_key,
            challenge,
        );
        finalized.get_bytes_for_challenge(transcript);
        Ok(())
    }

    fn verify(&self, _challenge: Scalar) -> CredxResult<()> {
        if self.accumulator_proof.proof.s_y() == self.message_proof {
            Ok(())
        } else {
            Err(Error::InvalidProofData)
        }
    }
}
