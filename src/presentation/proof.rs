use super::{CommitmentProof, RangeProof, RevocationProof, SignatureProof};
use blsful::inner_types::Scalar;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A holder's answer to a presentation request
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// The zero-knowledge proofs
    pub proof: PresentationProof,
    /// How each referent was answered
    pub requested_proof: RequestedProof,
    /// The sources of each sub-proof, in sub-proof order
    pub identifiers: Vec<Identifier>,
}

/// The proofs over all credentials, sharing one challenge
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationProof {
    /// One entry per credential used
    pub sub_proofs: Vec<SubProof>,
    /// The Fiat-Shamir challenge
    pub challenge: Scalar,
}

/// The proofs about a single credential
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProof {
    /// Knowledge of the signature with selective disclosure
    pub signature: SignatureProof,
    /// The predicates proven about hidden attributes
    pub predicates: Vec<PredicateProof>,
    /// Proof that the credential index is in the accumulator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revocation: Option<RevocationProof>,
}

/// A predicate over one attribute: a commitment to it linked to the
/// signature proof and a range proof on the commitment
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateProof {
    /// The predicate referent
    pub referent: String,
    /// The attribute commitment
    pub commitment: CommitmentProof,
    /// The bulletproof on the shifted commitment
    pub range: RangeProof,
}

/// Where a sub-proof's credential came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    /// The schema identifier
    pub schema_id: String,
    /// The credential definition identifier
    pub cred_def_id: String,
    /// The revocation registry used for the non-revocation proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
    /// The registry timestamp of the non-revocation proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Identifier {
    pub(crate) fn add_challenge_contribution(&self, transcript: &mut Transcript) {
        transcript.append_message(b"schema id", self.schema_id.as_bytes());
        transcript.append_message(b"cred def id", self.cred_def_id.as_bytes());
        transcript.append_message(
            b"rev reg id",
            self.rev_reg_id.as_deref().unwrap_or_default().as_bytes(),
        );
        match self.timestamp {
            Some(ts) => transcript.append_u64(b"timestamp", ts),
            None => transcript.append_message(b"timestamp", &[]),
        }
    }
}

/// How each requested referent was answered
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedProof {
    /// Revealed single attributes
    pub revealed_attrs: BTreeMap<String, RevealedAttributeInfo>,
    /// Revealed attribute groups
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroupInfo>,
    /// Values the holder asserts without a credential
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub self_attested_attrs: BTreeMap<String, String>,
    /// Attributes proven but not revealed
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    /// Predicates proven
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

/// A revealed attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedAttributeInfo {
    /// The sub-proof that discloses it
    pub sub_proof_index: u32,
    /// The raw value
    pub raw: String,
    /// The encoded value that was signed
    pub encoded: String,
}

/// A revealed attribute group
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedAttributeGroupInfo {
    /// The sub-proof that discloses the group
    pub sub_proof_index: u32,
    /// The values keyed by requested name
    pub values: BTreeMap<String, RevealedAttributeValue>,
}

/// A raw value and its encoding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeValue {
    /// The raw value
    pub raw: String,
    /// The encoded value that was signed
    pub encoded: String,
}

/// Points a referent at a sub-proof
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProofReferent {
    /// The sub-proof index
    pub sub_proof_index: u32,
}

impl RequestedProof {
    /// The sub-proof each credential-backed referent points at
    pub(crate) fn sub_proof_indices(&self) -> impl Iterator<Item = (&String, u32)> {
        self.revealed_attrs
            .iter()
            .map(|(r, a)| (r, a.sub_proof_index))
            .chain(
                self.revealed_attr_groups
                    .iter()
                    .map(|(r, g)| (r, g.sub_proof_index)),
            )
            .chain(
                self.unrevealed_attrs
                    .iter()
                    .map(|(r, s)| (r, s.sub_proof_index)),
            )
            .chain(self.predicates.iter().map(|(r, s)| (r, s.sub_proof_index)))
    }
}
