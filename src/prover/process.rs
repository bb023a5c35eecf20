use super::{CredentialRequestMetadata, LinkSecret};
use crate::credential::{Credential, IssuedCredential};
use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::CredxResult;
use log::{debug, warn};

/// Unblind an issued credential and check its signature
pub fn process_credential(
    issued: &IssuedCredential,
    metadata: &CredentialRequestMetadata,
    link_secret: &LinkSecret,
    cred_def: &CredentialDefinition,
) -> CredxResult<Credential> {
    if issued.nonce != metadata.nonce {
        return Err(Error::ProtocolSequencing(
            "credential does not answer this request".to_string(),
        ));
    }
    if issued.cred_def_id != cred_def.id {
        return Err(Error::ProtocolSequencing(format!(
            "credential was signed by '{}' not '{}'",
            issued.cred_def_id, cred_def.id
        )));
    }

    let credential = Credential {
        schema_id: issued.schema_id.clone(),
        cred_def_id: issued.cred_def_id.clone(),
        rev_reg_id: issued.rev_reg_id.clone(),
        values: issued.values.clone(),
        signature: issued.signature.to_unblinded(metadata.link_secret_blinding),
        rev_reg_index: issued.rev_reg_index,
    };
    if !credential.verify(link_secret, cred_def) {
        warn!("Issued credential for {} does not verify", cred_def.id);
        return Err(Error::SignatureInvalid);
    }
    debug!("Processed credential for {}", cred_def.id);
    Ok(credential)
}
