use super::LinkSecret;
use crate::error::Error;
use crate::issuer::{CredentialDefinition, CredentialOffer};
use crate::knox::ps::{BlindSignatureContext, Prover};
use crate::nonce::Nonce;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use core::fmt;
use log::debug;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The holder's answer to a credential offer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// Holder chosen entropy, or a DID for the holder
    pub entropy: String,
    /// The credential definition the offer named
    pub cred_def_id: String,
    /// The blinded link secret and its proof of knowledge
    pub blinded_ms: BlindSignatureContext,
    /// Fresh nonce the issuer must echo back
    pub nonce: Nonce,
}

/// What the holder keeps to process the issued credential
#[derive(Clone, PartialEq, Eq, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequestMetadata {
    /// The blinding factor of the link secret commitment
    pub link_secret_blinding: Scalar,
    /// The nonce sent in the request
    #[zeroize(skip)]
    pub nonce: Nonce,
    /// Which link secret the request used
    pub link_secret_name: String,
}

impl fmt::Debug for CredentialRequestMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequestMetadata")
            .field("nonce", &self.nonce)
            .field("link_secret_name", &self.link_secret_name)
            .finish_non_exhaustive()
    }
}

/// Create a credential request for an offer.
///
/// Checks the offer's key correctness proof and commits to the link
/// secret in a proof bound to the offer nonce.
pub fn create_credential_request(
    entropy: Option<&str>,
    cred_def: &CredentialDefinition,
    link_secret: &LinkSecret,
    link_secret_name: &str,
    offer: &CredentialOffer,
    mut rng: impl RngCore + CryptoRng,
) -> CredxResult<(CredentialRequest, CredentialRequestMetadata)> {
    if offer.cred_def_id != cred_def.id {
        return Err(Error::ProtocolSequencing(format!(
            "offer is for '{}' but the credential definition is '{}'",
            offer.cred_def_id, cred_def.id
        )));
    }
    offer.key_correctness_proof.verify(cred_def)?;

    let (blinded_ms, link_secret_blinding) = Prover::new_blind_signature_context(
        &[(0, link_secret.as_scalar())],
        &cred_def.public_key,
        offer.nonce.as_scalar(),
        &mut rng,
    )?;
    let nonce = Nonce::from_rng(&mut rng);
    let entropy = entropy
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    debug!("Created credential request for {}", cred_def.id);
    Ok((
        CredentialRequest {
            entropy,
            cred_def_id: cred_def.id.clone(),
            blinded_ms,
            nonce: nonce.clone(),
        },
        CredentialRequestMetadata {
            link_secret_blinding,
            nonce,
            link_secret_name: link_secret_name.to_string(),
        },
    ))
}
