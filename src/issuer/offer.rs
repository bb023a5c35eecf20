use super::{CredentialDefinition, KeyCorrectnessProof};
use crate::nonce::Nonce;
use log::debug;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// An issuer's offer to issue a credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialOffer {
    /// The schema of the offered credential
    pub schema_id: String,
    /// The credential definition that will sign it
    pub cred_def_id: String,
    /// Proof that the credential definition key is well formed
    pub key_correctness_proof: KeyCorrectnessProof,
    /// Binds the credential request to this offer
    pub nonce: Nonce,
}

/// Create an offer for `cred_def` with a fresh nonce
pub fn create_credential_offer(
    cred_def: &CredentialDefinition,
    key_correctness_proof: &KeyCorrectnessProof,
    rng: impl RngCore + CryptoRng,
) -> CredentialOffer {
    let offer = CredentialOffer {
        schema_id: cred_def.schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        key_correctness_proof: key_correctness_proof.clone(),
        nonce: Nonce::from_rng(rng),
    };
    debug!("Created credential offer for {}", offer.cred_def_id);
    offer
}
