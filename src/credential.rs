use crate::encoding::{encode_credential_attribute, encoded_to_scalar, is_valid_encoding};
use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::knox::ps::{BlindSignature, Signature};
use crate::nonce::Nonce;
use crate::prover::LinkSecret;
use crate::revocation::index_element;
use crate::schema::attr_common_view;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw attribute value and its encoded form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// The value as the issuer received it
    pub raw: String,
    /// The decimal encoding that gets signed
    pub encoded: String,
}

impl AttributeValue {
    /// The signed field element for this value
    pub fn to_scalar(&self) -> CredxResult<Scalar> {
        encoded_to_scalar(&self.encoded)
    }
}

/// Attribute values keyed by the common view of their names
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialValues(pub BTreeMap<String, AttributeValue>);

impl CredentialValues {
    /// Create an empty set of values
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value encoded with [`encode_credential_attribute`]
    pub fn add_raw<N, R>(&mut self, name: N, raw: R) -> CredxResult<()>
    where
        N: AsRef<str>,
        R: Into<String>,
    {
        let raw = raw.into();
        let encoded = encode_credential_attribute(&raw);
        self.insert(name.as_ref(), raw, encoded)
    }

    /// Add a value whose encoding was chosen by the caller
    pub fn add_encoded<N, R, E>(&mut self, name: N, raw: R, encoded: E) -> CredxResult<()>
    where
        N: AsRef<str>,
        R: Into<String>,
        E: Into<String>,
    {
        let encoded = encoded.into();
        if !is_valid_encoding(&encoded) {
            return Err(Error::EncodingError(format!(
                "encoded value for '{}' is not a decimal integer",
                name.as_ref()
            )));
        }
        self.insert(name.as_ref(), raw.into(), encoded)
    }

    fn insert(&mut self, name: &str, raw: String, encoded: String) -> CredxResult<()> {
        let key = attr_common_view(name);
        if key.is_empty() {
            return Err(Error::InvalidInput("attribute name is empty".to_string()));
        }
        self.0.insert(key, AttributeValue { raw, encoded });
        Ok(())
    }

    /// Look up a value by attribute name
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(&attr_common_view(name))
    }

    /// The number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The credential as it leaves the issuer.
///
/// The signature still covers the blinded link secret and must be
/// processed by the holder before use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    /// The schema the values follow
    pub schema_id: String,
    /// The credential definition that signed the values
    pub cred_def_id: String,
    /// The revocation registry, if any
    pub rev_reg_id: Option<String>,
    /// The signed values
    pub values: CredentialValues,
    /// The blind signature
    pub signature: BlindSignature,
    /// The index in the revocation registry, if any
    pub rev_reg_index: Option<u32>,
    /// Echo of the nonce from the credential request
    pub nonce: Nonce,
}

/// A processed credential ready to be presented
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// The schema the values follow
    pub schema_id: String,
    /// The credential definition that signed the values
    pub cred_def_id: String,
    /// The revocation registry, if any
    pub rev_reg_id: Option<String>,
    /// The signed values
    pub values: CredentialValues,
    /// The unblinded signature
    pub signature: Signature,
    /// The index in the revocation registry, if any
    pub rev_reg_index: Option<u32>,
}

impl Credential {
    /// Every signed message in signing order
    pub(crate) fn messages(
        &self,
        link_secret: &LinkSecret,
        cred_def: &CredentialDefinition,
    ) -> CredxResult<Vec<Scalar>> {
        signed_messages(
            link_secret.as_scalar(),
            &self.values,
            cred_def,
            self.rev_reg_id.as_deref().zip(self.rev_reg_index),
        )
    }

    /// Check the signature against the credential definition
    pub fn verify(&self, link_secret: &LinkSecret, cred_def: &CredentialDefinition) -> bool {
        match self.messages(link_secret, cred_def) {
            Ok(msgs) => {
                self.signature
                    .verify(&cred_def.public_key, msgs.as_slice())
                    .unwrap_u8()
                    == 1
            }
            Err(_) => false,
        }
    }
}

/// The message vector `[link secret, attributes.., revocation element]`
pub(crate) fn signed_messages(
    link_secret: Scalar,
    values: &CredentialValues,
    cred_def: &CredentialDefinition,
    revocation: Option<(&str, u32)>,
) -> CredxResult<Vec<Scalar>> {
    let mut msgs = Vec::with_capacity(cred_def.message_count());
    msgs.push(link_secret);
    msgs.extend(known_messages(values, cred_def, revocation)?.into_iter().map(|(_, m)| m));
    Ok(msgs)
}

/// The messages the issuer knows, keyed by signature index
pub(crate) fn known_messages(
    values: &CredentialValues,
    cred_def: &CredentialDefinition,
    revocation: Option<(&str, u32)>,
) -> CredxResult<Vec<(usize, Scalar)>> {
    if values.len() != cred_def.attr_names.len() {
        return Err(Error::InvalidInput(format!(
            "expected {} attribute values, found {}",
            cred_def.attr_names.len(),
            values.len()
        )));
    }
    let mut msgs = Vec::with_capacity(cred_def.message_count());
    for (i, name) in cred_def.attr_names.iter().enumerate() {
        let value = values
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("missing value for '{}'", name)))?;
        msgs.push((i + 1, value.to_scalar()?));
    }
    match (cred_def.revocation_index(), revocation) {
        (Some(idx), Some((rev_reg_id, index))) => {
            msgs.push((idx, index_element(rev_reg_id, index).0));
        }
        (None, None) => {}
        (Some(_), None) => {
            return Err(Error::InvalidInput(
                "credential definition requires a revocation index".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(Error::InvalidInput(
                "credential definition does not support revocation".to_string(),
            ))
        }
    }
    Ok(msgs)
}
