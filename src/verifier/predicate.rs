use crate::error::Error;
use crate::presentation::{
    add_commitment_contribution, commitment_generators, PredicateProof, RangeBound,
};
use crate::verifier::ProofVerifier;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

/// How the committed attribute is tied to the signature proof
#[derive(Copy, Clone, Debug)]
pub(crate) enum AttributeLink {
    /// The attribute is disclosed, the commitment must open to it
    Disclosed(Scalar),
    /// The attribute is hidden, the responses must be equal
    Hidden(Scalar),
}

/// Checks one predicate: the commitment, its link to the signature and the range proof
pub(crate) struct PredicateVerifier<'a> {
    pub(crate) proof: &'a PredicateProof,
    pub(crate) bound: RangeBound,
    pub(crate) link: AttributeLink,
}

impl ProofVerifier for PredicateVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> CredxResult<()> {
        let (g, _) = commitment_generators();
        let commitment = &self.proof.commitment;
        add_commitment_contribution(
            &self.proof.referent,
            commitment.commitment,
            commitment.blind_commitment(challenge),
            transcript,
        );
        self.bound.add_challenge_contribution(
            &self.proof.referent,
            commitment.commitment,
            g,
            transcript,
        );
        Ok(())
    }

    fn verify(&self, challenge: Scalar) -> CredxResult<()> {
        let commitment = &self.proof.commitment;
        let linked = match self.link {
            AttributeLink::Disclosed(message) => commitment.opens_to(message, challenge),
            AttributeLink::Hidden(message_proof) => commitment.message_proof == message_proof,
        };
        if !linked {
            return Err(Error::InvalidProofData);
        }
        self.proof.range.verify(
            &self.proof.referent,
            self.bound,
            commitment.commitment,
            challenge,
        )
    }
}
