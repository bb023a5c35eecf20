use super::KeyCorrectnessProof;
use crate::knox::ps;
use crate::schema::{attr_common_view, Schema};
use crate::CredxResult;
use log::debug;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// The signature type recorded in credential definition identifiers
pub const SIGNATURE_TYPE: &str = "PS";

/// Options for a new credential definition
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinitionConfig {
    /// Reserve a signed message for a revocation registry index
    pub support_revocation: bool,
}

/// The public half of a credential definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    /// The unique identifier
    pub id: String,
    /// The schema this definition signs
    pub schema_id: String,
    /// The issuer that owns the signing key
    pub issuer_id: String,
    /// Distinguishes several definitions for one schema
    pub tag: String,
    /// Whether credentials carry a revocation index
    pub support_revocation: bool,
    /// The schema attribute names in signing order, common view
    pub attr_names: Vec<String>,
    /// The verification key
    pub public_key: ps::PublicKey,
}

impl CredentialDefinition {
    /// The number of signed messages per credential
    pub fn message_count(&self) -> usize {
        self.attr_names.len() + 1 + usize::from(self.support_revocation)
    }

    /// The signature index of an attribute
    pub fn attr_index(&self, name: &str) -> Option<usize> {
        let target = attr_common_view(name);
        self.attr_names
            .iter()
            .position(|a| *a == target)
            .map(|i| i + 1)
    }

    /// The attribute name at a signature index
    pub fn attr_name(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.attr_names.get(i))
            .map(String::as_str)
    }

    /// The signature index of the revocation element
    pub fn revocation_index(&self) -> Option<usize> {
        self.support_revocation.then(|| self.attr_names.len() + 1)
    }

    /// True when the definition was created for `schema`
    pub fn matches_schema(&self, schema: &Schema) -> bool {
        self.schema_id == schema.id && self.attr_names.iter().cloned().eq(schema.common_names())
    }
}

/// The signing half of a credential definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinitionPrivate {
    /// The signing key
    pub secret_key: ps::SecretKey,
}

/// The legacy credential definition identifier
pub fn cred_def_id(issuer_id: &str, schema_id: &str, tag: &str) -> String {
    format!("{}:3:{}:{}:{}", issuer_id, SIGNATURE_TYPE, schema_id, tag)
}

/// Create a credential definition for `schema` and the proof that its
/// public key was derived from the private key
pub fn create_credential_definition(
    schema: &Schema,
    issuer_id: &str,
    tag: &str,
    config: CredentialDefinitionConfig,
    mut rng: impl RngCore + CryptoRng,
) -> CredxResult<(
    CredentialDefinition,
    CredentialDefinitionPrivate,
    KeyCorrectnessProof,
)> {
    let attr_names = schema.common_names().collect::<Vec<_>>();
    let count = attr_names.len() + 1 + usize::from(config.support_revocation);
    let (public_key, secret_key) = ps::Issuer::new_keys(count, &mut rng)?;

    let cred_def = CredentialDefinition {
        id: cred_def_id(issuer_id, &schema.id, tag),
        schema_id: schema.id.clone(),
        issuer_id: issuer_id.to_string(),
        tag: tag.to_string(),
        support_revocation: config.support_revocation,
        attr_names,
        public_key,
    };
    let cred_def_private = CredentialDefinitionPrivate { secret_key };
    let proof = KeyCorrectnessProof::new(&cred_def, &cred_def_private, &mut rng)?;
    debug!(
        "Created credential definition {} with {} messages",
        cred_def.id,
        cred_def.message_count()
    );
    Ok((cred_def, cred_def_private, proof))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;

    fn schema() -> Schema {
        Schema::new("did:example:issuer", "gvt", "1.0", ["Name", "age", "sex"]).unwrap()
    }

    #[test]
    fn layout_without_revocation() {
        let (cred_def, _, _) = create_credential_definition(
            &schema(),
            "did:example:issuer",
            "default",
            CredentialDefinitionConfig::default(),
            ChaChaRng::from_seed([1u8; 32]),
        )
        .unwrap();
        assert_eq!(
            cred_def.id,
            "did:example:issuer:3:PS:did:example:issuer:2:gvt:1.0:default"
        );
        assert_eq!(cred_def.message_count(), 4);
        assert_eq!(cred_def.public_key.y.len(), 4);
        assert_eq!(cred_def.attr_index("name"), Some(1));
        assert_eq!(cred_def.attr_name(3), Some("sex"));
        assert_eq!(cred_def.attr_name(0), None);
        assert_eq!(cred_def.revocation_index(), None);
        assert!(cred_def.matches_schema(&schema()));
    }

    #[test]
    fn layout_with_revocation() {
        let (cred_def, private, proof) = create_credential_definition(
            &schema(),
            "did:example:issuer",
            "default",
            CredentialDefinitionConfig {
                support_revocation: true,
            },
            ChaChaRng::from_seed([2u8; 32]),
        )
        .unwrap();
        assert_eq!(cred_def.message_count(), 5);
        assert_eq!(cred_def.revocation_index(), Some(4));
        assert_eq!(private.secret_key.message_count(), 5);
        assert!(proof.verify(&cred_def).is_ok());
    }

    #[test]
    fn private_key_is_redacted() {
        let (_, private, _) = create_credential_definition(
            &schema(),
            "i",
            "t",
            CredentialDefinitionConfig::default(),
            rand_core::OsRng,
        )
        .unwrap();
        let text = format!("{:?}", private);
        assert!(text.contains("messages: 4"));
    }
}
