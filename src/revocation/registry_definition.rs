use super::{
    index_element, index_elements, RevocationRegistry, RevocationRegistryDelta, TailsWriter,
    TAILS_ENTRY_SIZE, TAILS_TAG,
};
use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::knox::accumulator::vb20::{self, Accumulator, Element, MembershipWitness};
use crate::CredxResult;
use log::debug;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// The accumulator type recorded in registry identifiers
pub const REGISTRY_TYPE: &str = "VB20_ACCUM";

/// How indices enter the accumulator
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuanceType {
    /// Every index is accumulated when the registry is created
    #[default]
    #[serde(rename = "ISSUANCE_BY_DEFAULT")]
    IssuanceByDefault,
    /// An index is accumulated when a credential is issued for it
    #[serde(rename = "ISSUANCE_ON_DEMAND")]
    IssuanceOnDemand,
}

/// Options for a new revocation registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryConfig {
    /// Distinguishes several registries for one credential definition
    pub tag: String,
    /// How indices enter the accumulator
    pub issuance_type: IssuanceType,
    /// The registry capacity
    pub max_cred_num: u32,
}

/// The public parameters of a revocation registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    /// The unique identifier
    pub id: String,
    /// The credential definition whose credentials use this registry
    pub cred_def_id: String,
    /// The registry owner
    pub issuer_id: String,
    /// The registry tag
    pub tag: String,
    /// How indices enter the accumulator
    pub issuance_type: IssuanceType,
    /// The registry capacity
    pub max_cred_num: u32,
    /// The accumulator verification key
    pub public_key: vb20::PublicKey,
    /// Hex SHA-256 of the tails blob
    pub tails_hash: String,
    /// Where holders can fetch the tails blob
    pub tails_location: String,
}

/// The accumulator secret key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionPrivate {
    /// The accumulator trapdoor
    pub secret_key: vb20::SecretKey,
}

impl RevocationRegistryDefinition {
    /// The accumulator element for `index`
    pub fn element(&self, index: u32) -> CredxResult<Element> {
        self.check_index(index)?;
        Ok(index_element(&self.id, index))
    }

    pub(crate) fn check_index(&self, index: u32) -> CredxResult<()> {
        if index == 0 || index > self.max_cred_num {
            Err(Error::InvalidRevocationIndex(index))
        } else {
            Ok(())
        }
    }
}

/// The legacy revocation registry identifier
pub fn rev_reg_def_id(issuer_id: &str, cred_def_id: &str, tag: &str) -> String {
    format!("{}:4:{}:{}:{}", issuer_id, cred_def_id, REGISTRY_TYPE, tag)
}

/// Create a revocation registry for `cred_def`.
///
/// The tails blob is streamed into `tails_writer`. Returns the
/// definition, its private key, the initial registry and the delta that
/// holders start from.
pub fn create_revocation_registry_def(
    cred_def: &CredentialDefinition,
    issuer_id: &str,
    config: &RevocationRegistryConfig,
    tails_location: &str,
    tails_writer: &mut impl TailsWriter,
    rng: impl RngCore + CryptoRng,
) -> CredxResult<(
    RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate,
    RevocationRegistry,
    RevocationRegistryDelta,
)> {
    if !cred_def.support_revocation {
        return Err(Error::InvalidInput(format!(
            "credential definition '{}' does not support revocation",
            cred_def.id
        )));
    }
    if config.max_cred_num == 0 {
        return Err(Error::InvalidInput(
            "registry capacity must be at least one".to_string(),
        ));
    }

    let id = rev_reg_def_id(issuer_id, &cred_def.id, &config.tag);
    let secret_key = vb20::SecretKey::new(rng);
    let public_key = vb20::PublicKey::from(&secret_key);

    let all = (1..=config.max_cred_num).collect::<BTreeSet<u32>>();
    let accum = match config.issuance_type {
        IssuanceType::IssuanceByDefault => Accumulator::with_elements(
            &secret_key,
            &index_elements(&id, &all),
        ),
        IssuanceType::IssuanceOnDemand => Accumulator::default(),
    };

    let mut hasher = Sha256::new();
    tails_writer.write(&TAILS_TAG)?;
    hasher.update(TAILS_TAG);
    for index in &all {
        let witness = MembershipWitness::new(index_element(&id, *index), accum, &secret_key)?;
        let bytes = witness.to_bytes();
        debug_assert_eq!(bytes.len(), TAILS_ENTRY_SIZE);
        tails_writer.write(&bytes)?;
        hasher.update(bytes);
    }
    let tails_hash = hex::encode(hasher.finalize());

    let definition = RevocationRegistryDefinition {
        id: id.clone(),
        cred_def_id: cred_def.id.clone(),
        issuer_id: issuer_id.to_string(),
        tag: config.tag.clone(),
        issuance_type: config.issuance_type,
        max_cred_num: config.max_cred_num,
        public_key,
        tails_hash,
        tails_location: tails_location.to_string(),
    };
    let registry = RevocationRegistry::new(&definition, accum);
    let delta = RevocationRegistryDelta::initial(&registry);
    debug!(
        "Created revocation registry {} with capacity {}",
        definition.id, definition.max_cred_num
    );
    Ok((
        definition,
        RevocationRegistryDefinitionPrivate { secret_key },
        registry,
        delta,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::Error;
    use crate::issuer::{create_credential_definition, CredentialDefinitionConfig};
    use crate::schema::Schema;
    use rand_core::OsRng;

    fn cred_def(support_revocation: bool) -> crate::issuer::CredentialDefinition {
        let schema = Schema::new("issuer", "badge", "1.0", ["level"]).unwrap();
        create_credential_definition(
            &schema,
            "issuer",
            "tag",
            CredentialDefinitionConfig { support_revocation },
            OsRng,
        )
        .unwrap()
        .0
    }

    #[test]
    fn tails_witnesses_verify() {
        let cred_def = cred_def(true);
        let config = RevocationRegistryConfig {
            tag: "r1".to_string(),
            issuance_type: IssuanceType::IssuanceByDefault,
            max_cred_num: 4,
        };
        let mut tails = TailsBuffer::new();
        let (def, _, registry, delta) =
            create_revocation_registry_def(&cred_def, "issuer", &config, "mem", &mut tails, OsRng)
                .unwrap();
        assert_eq!(def.id, format!("issuer:4:{}:VB20_ACCUM:r1", cred_def.id));
        assert_eq!(tails.as_bytes().len(), 2 + 4 * 48);
        assert_eq!(tails.hash().unwrap(), def.tails_hash);
        assert_eq!(delta.from_epoch, 0);
        assert_eq!(delta.to_epoch, 0);

        for index in 1..=4 {
            let bytes = tails.read(48, tails_offset(index).unwrap()).unwrap();
            let witness = decode_witness(&bytes).unwrap();
            assert!(witness.verify(def.element(index).unwrap(), def.public_key, registry.accum));
        }
        assert_eq!(def.element(5), Err(Error::InvalidRevocationIndex(5)));
    }

    #[test]
    fn requires_revocation_support() {
        let config = RevocationRegistryConfig {
            tag: "r1".to_string(),
            issuance_type: IssuanceType::IssuanceOnDemand,
            max_cred_num: 4,
        };
        let res = create_revocation_registry_def(
            &cred_def(false),
            "issuer",
            &config,
            "mem",
            &mut TailsBuffer::new(),
            OsRng,
        );
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }
}
