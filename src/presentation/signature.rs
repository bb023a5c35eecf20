use super::PresentationBuilder;
use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::knox::ps::{PokSignature, PokSignatureProof, Signature};
use crate::knox::short_group_sig_core::ProofMessage;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Builds the signature proof of knowledge for one credential
pub(crate) struct SignatureBuilder {
    disclosed_messages: BTreeMap<usize, Scalar>,
    pok_sig: PokSignature,
}

impl PresentationBuilder for SignatureBuilder {
    type Proof = SignatureProof;

    fn gen_proof(self, challenge: Scalar) -> CredxResult<SignatureProof> {
        Ok(SignatureProof {
            disclosed_messages: self.disclosed_messages,
            pok: self.pok_sig.generate_proof(challenge)?,
        })
    }
}

impl SignatureBuilder {
    /// Commit to the hidden messages and add the disclosed ones to the transcript
    pub fn commit(
        cred_def: &CredentialDefinition,
        signature: &Signature,
        messages: &[ProofMessage],
        rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> CredxResult<Self> {
        let pok_sig = PokSignature::commit(signature, &cred_def.public_key, messages, rng)
            .map_err(|_| Error::InvalidSignatureProofData)?;
        let disclosed_messages = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_revealed())
            .map(|(i, m)| (i, m.get_message()))
            .collect::<BTreeMap<usize, Scalar>>();
        add_disclosed_messages_contribution(cred_def, &disclosed_messages, transcript)?;
        pok_sig.add_proof_contribution(transcript);
        Ok(Self {
            disclosed_messages,
            pok_sig,
        })
    }
}

/// Append the disclosed messages with their attribute labels
pub(crate) fn add_disclosed_messages_contribution(
    cred_def: &CredentialDefinition,
    disclosed_messages: &BTreeMap<usize, Scalar>,
    transcript: &mut Transcript,
) -> CredxResult<()> {
    transcript.append_u64(
        b"disclosed messages length",
        disclosed_messages.len() as u64,
    );
    for (i, m) in disclosed_messages {
        let label = cred_def.attr_name(*i).ok_or_else(|| {
            Error::InvalidPresentationData(format!("message {} cannot be disclosed", i))
        })?;
        transcript.append_u64(b"disclosed message index", *i as u64);
        transcript.append_message(b"disclosed message label", label.as_bytes());
        transcript.append_message(b"disclosed message value", &m.to_be_bytes());
    }
    Ok(())
}

/// A signature proof that can be presented
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureProof {
    /// The disclosed message scalars
    pub disclosed_messages: BTreeMap<usize, Scalar>,
    /// The proof
    pub pok: PokSignatureProof,
}

impl SignatureProof {
    /// The disclosed messages as index and value pairs
    pub fn revealed(&self) -> Vec<(usize, Scalar)> {
        self.disclosed_messages
            .iter()
            .map(|(i, m)| (*i, *m))
            .collect()
    }
}
