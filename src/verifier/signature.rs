use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::presentation::{add_disclosed_messages_contribution, SignatureProof};
use crate::verifier::ProofVerifier;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use std::collections::BTreeMap;

pub(crate) struct SignatureVerifier<'a> {
    cred_def: &'a CredentialDefinition,
    signature_proof: &'a SignatureProof,
    disclosed_messages: Vec<(usize, Scalar)>,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(cred_def: &'a CredentialDefinition, signature_proof: &'a SignatureProof) -> Self {
        Self {
            cred_def,
            signature_proof,
            disclosed_messages: signature_proof.revealed(),
        }
    }

    /// The Schnorr responses of the hidden messages keyed by signature index
    pub fn hidden_message_proofs(&self) -> CredxResult<BTreeMap<usize, Scalar>> {
        self.signature_proof
            .pok
            .get_hidden_message_proofs(&self.cred_def.public_key, &self.disclosed_messages)
    }
}

impl ProofVerifier for SignatureVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> CredxResult<()> {
        add_disclosed_messages_contribution(
            self.cred_def,
            &self.signature_proof.disclosed_messages,
            transcript,
        )?;
        self.signature_proof.pok.add_challenge_contribution(
            &self.cred_def.public_key,
            &self.disclosed_messages,
            challenge,
            transcript,
        )
    }

    fn verify(&self, _challenge: Scalar) -> CredxResult<()> {
        if self
            .signature_proof
            .pok
            .verify(&self.disclosed_messages, &self.cred_def.public_key)
        {
            Ok(())
        } else {
            Err(Error::InvalidSignatureProofData)
        }
    }
}
