use super::{CredentialDefinition, CredentialDefinitionPrivate, CredentialOffer};
use crate::credential::{known_messages, CredentialValues, IssuedCredential};
use crate::error::Error;
use crate::knox::ps;
use crate::prover::CredentialRequest;
use crate::revocation::{
    RevocationRegistry, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
    RevocationRegistryDelta,
};
use crate::CredxResult;
use log::{debug, warn};
use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeSet;

/// The registry a new credential is entered into
#[derive(Copy, Clone, Debug)]
pub struct CredentialRevocationConfig<'a> {
    /// The registry definition
    pub reg_def: &'a RevocationRegistryDefinition,
    /// The accumulator secret key
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    /// The current registry state
    pub registry: &'a RevocationRegistry,
    /// Use this index instead of the next free one
    pub index: Option<u32>,
}

/// Sign the values of a credential request.
///
/// When revocation is configured the credential takes a registry index
/// and the updated registry is returned with the delta to publish.
pub fn create_credential(
    cred_def: &CredentialDefinition,
    cred_def_private: &CredentialDefinitionPrivate,
    offer: &CredentialOffer,
    request: &CredentialRequest,
    values: CredentialValues,
    revocation: Option<CredentialRevocationConfig<'_>>,
    rng: impl RngCore + CryptoRng,
) -> CredxResult<(
    IssuedCredential,
    Option<(RevocationRegistry, RevocationRegistryDelta)>,
)> {
    if request.cred_def_id != offer.cred_def_id || offer.cred_def_id != cred_def.id {
        return Err(Error::ProtocolSequencing(format!(
            "request for '{}' does not match the offer for '{}'",
            request.cred_def_id, offer.cred_def_id
        )));
    }

    let known_indices = (1..cred_def.message_count()).collect::<Vec<_>>();
    if !request.blinded_ms.verify(
        &known_indices,
        &cred_def_private.secret_key,
        offer.nonce.as_scalar(),
    )? {
        warn!("Credential request for {} has an invalid blinding proof", cred_def.id);
        return Err(Error::RequestProofInvalid);
    }

    let (revocation_index, registry_update) = match (cred_def.support_revocation, revocation) {
        (true, Some(config)) => {
            if config.reg_def.cred_def_id != cred_def.id {
                return Err(Error::InvalidInput(format!(
                    "revocation registry '{}' belongs to another credential definition",
                    config.reg_def.id
                )));
            }
            let index = match config.index {
                Some(i) => i,
                None => config.registry.next_free_index()?,
            };
            let issued = BTreeSet::from([index]);
            let (registry, delta) = config.registry.update(
                config.reg_def,
                config.reg_def_private,
                &issued,
                &BTreeSet::new(),
            )?;
            (
                Some((config.reg_def.id.as_str(), index)),
                Some((registry, delta)),
            )
        }
        (true, None) => {
            return Err(Error::InvalidInput(
                "credential definition requires a revocation registry".to_string(),
            ))
        }
        (false, Some(_)) => {
            return Err(Error::InvalidInput(
                "credential definition does not support revocation".to_string(),
            ))
        }
        (false, None) => (None, None),
    };

    let msgs = known_messages(&values, cred_def, revocation_index)?;
    let signature = ps::Issuer::blind_sign(
        &request.blinded_ms,
        &cred_def_private.secret_key,
        &msgs,
        offer.nonce.as_scalar(),
        rng,
    )
    .map_err(|e| match e {
        Error::InvalidSignatureProofData => Error::RequestProofInvalid,
        e => e,
    })?;

    let credential = IssuedCredential {
        schema_id: cred_def.schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        rev_reg_id: revocation_index.map(|(id, _)| id.to_string()),
        values,
        signature,
        rev_reg_index: revocation_index.map(|(_, i)| i),
        nonce: request.nonce.clone(),
    };
    debug!(
        "Issued credential for {} at revocation index {:?}",
        cred_def.id, credential.rev_reg_index
    );
    Ok((credential, registry_update))
}
