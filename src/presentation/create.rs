use super::*;
use crate::credential::Credential;
use crate::encoding::encoded_to_i64;
use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::knox::short_group_sig_core::{HiddenMessage, ProofMessage};
use crate::prover::LinkSecret;
use crate::revocation::{CredentialRevocationState, RevocationRegistryDefinition};
use crate::schema::Schema;
use elliptic_curve::Field;
use log::debug;
use rand_core::{CryptoRng, RngCore};
use std::collections::{BTreeMap, BTreeSet};

/// Everything committed for one credential before the challenge is known
struct SubProofBuilder {
    signature: SignatureBuilder,
    predicates: Vec<(CommitmentBuilder, RangeBuilder)>,
    non_revocation: Option<RevocationProofBuilder>,
}

impl PresentationBuilder for SubProofBuilder {
    type Proof = SubProof;

    fn gen_proof(self, challenge: Scalar) -> CredxResult<SubProof> {
        let mut predicates = Vec::with_capacity(self.predicates.len());
        for (commitment, range) in self.predicates {
            let referent = commitment.referent().to_string();
            predicates.push(PredicateProof {
                referent,
                commitment: commitment.gen_proof(challenge)?,
                range: range.gen_proof(challenge)?,
            });
        }
        Ok(SubProof {
            signature: self.signature.gen_proof(challenge)?,
            predicates,
            non_revocation: self
                .non_revocation
                .map(|b| b.gen_proof(challenge))
                .transpose()?,
        })
    }
}

/// Answer `request` with the selected credentials.
///
/// Each credential added to `credentials` yields one sub-proof. Every
/// referent of the request must be answered by exactly one credential
/// or, for single attributes, by a self-attested value.
#[allow(clippy::too_many_arguments)]
pub fn create_presentation(
    request: &PresentationRequest,
    credentials: PresentCredentials<'_>,
    self_attested: Option<BTreeMap<String, String>>,
    link_secret: &LinkSecret,
    schemas: &BTreeMap<String, Schema>,
    cred_defs: &BTreeMap<String, CredentialDefinition>,
    rev_reg_defs: &BTreeMap<String, RevocationRegistryDefinition>,
    mut rng: impl RngCore + CryptoRng,
) -> CredxResult<Presentation> {
    debug!("Creating presentation for request '{}'", request.name);
    request.validate()?;
    let self_attested = self_attested.unwrap_or_default();
    check_coverage(request, &credentials, &self_attested)?;

    let mut transcript = Transcript::new(PRESENTATION_LABEL);
    transcript.append_message(b"nonce", request.nonce.as_str().as_bytes());
    transcript.append_message(b"presentation request", &serde_json::to_vec(request)?);
    transcript.append_u64(b"sub proof count", credentials.len() as u64);

    // The link secret shares one blinder so its responses match across sub-proofs
    let link_secret_blinder = Scalar::random(&mut rng);

    let mut identifiers = Vec::with_capacity(credentials.len());
    let mut builders = Vec::with_capacity(credentials.len());
    let mut requested_proof = RequestedProof {
        self_attested_attrs: self_attested,
        ..Default::default()
    };

    for (sub_proof_index, entry) in credentials.entries.iter().enumerate() {
        let cred = entry.cred;
        let schema = schemas.get(&cred.schema_id).ok_or_else(|| {
            Error::InvalidInput(format!("unknown schema '{}'", cred.schema_id))
        })?;
        let cred_def = cred_defs.get(&cred.cred_def_id).ok_or_else(|| {
            Error::InvalidInput(format!("unknown credential definition '{}'", cred.cred_def_id))
        })?;
        if !cred_def.matches_schema(schema) {
            return Err(Error::InvalidInput(format!(
                "credential definition '{}' was not created for schema '{}'",
                cred_def.id, schema.id
            )));
        }
        check_restrictions(request, entry, schema, cred_def)?;
        let sub_proof_index = sub_proof_index as u32;
        let msgs = cred.messages(link_secret, cred_def)?;

        let revealed = revealed_indices(request, entry, cred_def)?;
        let predicates = predicate_bounds(request, entry, cred, cred_def)?;
        let revocation = revocation_context(request, entry, cred_def, rev_reg_defs)?;

        let mut blinders = BTreeMap::new();
        for (_, idx, _, _) in &predicates {
            if !revealed.contains(idx) {
                blinders
                    .entry(*idx)
                    .or_insert_with(|| Scalar::random(&mut rng));
            }
        }
        let revocation_blinder = revocation.as_ref().map(|_| Scalar::random(&mut rng));

        let mut proof_msgs = Vec::with_capacity(msgs.len());
        for (i, m) in msgs.iter().enumerate() {
            let proof_msg = if i == 0 {
                ProofMessage::Hidden(HiddenMessage::ExternalBlinding(*m, link_secret_blinder))
            } else if revealed.contains(&i) {
                ProofMessage::Revealed(*m)
            } else if let Some(b) = blinders.get(&i) {
                ProofMessage::Hidden(HiddenMessage::ExternalBlinding(*m, *b))
            } else if let Some(b) =
                revocation_blinder.filter(|_| cred_def.revocation_index() == Some(i))
            {
                ProofMessage::Hidden(HiddenMessage::ExternalBlinding(*m, b))
            } else {
                ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(*m))
            };
            proof_msgs.push(proof_msg);
        }

        let identifier = Identifier {
            schema_id: cred.schema_id.clone(),
            cred_def_id: cred.cred_def_id.clone(),
            rev_reg_id: cred.rev_reg_id.clone(),
            timestamp: revocation.as_ref().map(|(_, _, ts)| *ts),
        };
        identifier.add_challenge_contribution(&mut transcript);

        let signature = SignatureBuilder::commit(
            cred_def,
            &cred.signature,
            &proof_msgs,
            &mut rng,
            &mut transcript,
        )?;

        let mut predicate_builders = Vec::with_capacity(predicates.len());
        for (referent, idx, bound, value) in predicates {
            let b = match blinders.get(&idx) {
                Some(b) => *b,
                None => Scalar::random(&mut rng),
            };
            let commitment =
                CommitmentBuilder::commit(&referent, msgs[idx], b, &mut rng, &mut transcript);
            let range = RangeBuilder::commit(bound, &commitment, value, &mut transcript)?;
            predicate_builders.push((commitment, range));
            requested_proof
                .predicates
                .insert(referent, SubProofReferent { sub_proof_index });
        }

        let non_revocation = match (revocation, revocation_blinder) {
            (Some((rev_reg_def, state, _)), Some(b)) => {
                let idx = cred_def
                    .revocation_index()
                    .ok_or(Error::General("revocation index missing"))?;
                Some(RevocationProofBuilder::commit(
                    rev_reg_def.public_key,
                    &request.nonce,
                    state.accum,
                    state.witness,
                    ProofMessage::Hidden(HiddenMessage::ExternalBlinding(msgs[idx], b)),
                    &mut rng,
                    &mut transcript,
                )?)
            }
            _ => None,
        };

        fill_attributes(request, entry, sub_proof_index, &mut requested_proof)?;
        identifiers.push(identifier);
        builders.push(SubProofBuilder {
            signature,
            predicates: predicate_builders,
            non_revocation,
        });
    }

    let challenge = challenge_from_transcript(&mut transcript);

    let mut sub_proofs = Vec::with_capacity(builders.len());
    for builder in builders {
        sub_proofs.push(builder.gen_proof(challenge)?);
    }
    debug!(
        "Created presentation for request '{}' with {} sub-proofs",
        request.name,
        sub_proofs.len()
    );
    Ok(Presentation {
        proof: PresentationProof {
            sub_proofs,
            challenge,
        },
        requested_proof,
        identifiers,
    })
}

/// Every referent must be answered exactly once and only by a known referent
fn check_coverage(
    request: &PresentationRequest,
    credentials: &PresentCredentials<'_>,
    self_attested: &BTreeMap<String, String>,
) -> CredxResult<()> {
    let mut answered = BTreeSet::new();

    for entry in &credentials.entries {
        let misplaced = entry
            .requested_attributes
            .iter()
            .map(|(r, _)| r)
            .find(|r| !request.requested_attributes.contains_key(*r))
            .or_else(|| {
                entry
                    .requested_predicates
                    .iter()
                    .find(|r| !request.requested_predicates.contains_key(*r))
            });
        if let Some(referent) = misplaced {
            return Err(Error::InvalidInput(format!(
                "referent '{}' is not requested as used",
                referent
            )));
        }
        for referent in entry.referents() {
            if !answered.insert(referent) {
                return Err(Error::InvalidInput(format!(
                    "referent '{}' is answered more than once",
                    referent
                )));
            }
        }
    }
    for referent in self_attested.keys() {
        match request.requested_attributes.get(referent) {
            Some(info) if !info.is_group() => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "referent '{}' cannot be self-attested",
                    referent
                )))
            }
        }
        if !answered.insert(referent.as_str()) {
            return Err(Error::InvalidInput(format!(
                "referent '{}' is answered more than once",
                referent
            )));
        }
    }
    if let Some(missing) = referents(request)
        .into_iter()
        .find(|r| !answered.contains(r))
    {
        return Err(Error::UnsatisfiedReferent(missing.to_string()));
    }
    Ok(())
}

/// Every referent a credential answers must accept that credential's sources
fn check_restrictions(
    request: &PresentationRequest,
    entry: &PresentCredential<'_>,
    schema: &Schema,
    cred_def: &CredentialDefinition,
) -> CredxResult<()> {
    let rev_reg_id = entry.cred.rev_reg_id.as_deref();
    for referent in entry.referents() {
        let restrictions = match request.requested_attributes.get(referent) {
            Some(info) => &info.restrictions,
            None => &request.requested_predicates[referent].restrictions,
        };
        if !restrictions_hold(restrictions, schema, cred_def, rev_reg_id) {
            return Err(Error::InvalidInput(format!(
                "credential from '{}' does not meet the restrictions of '{}'",
                cred_def.id, referent
            )));
        }
    }
    Ok(())
}

/// The signature indices revealed by one credential
fn revealed_indices(
    request: &PresentationRequest,
    entry: &PresentCredential<'_>,
    cred_def: &CredentialDefinition,
) -> CredxResult<BTreeSet<usize>> {
    let mut revealed = BTreeSet::new();
    for (referent, reveal) in &entry.requested_attributes {
        let info = &request.requested_attributes[referent];
        if info.is_group() && !reveal {
            return Err(Error::InvalidInput(format!(
                "attribute group '{}' must be revealed",
                referent
            )));
        }
        for name in info.attr_names() {
            let idx = cred_def.attr_index(name).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "credential definition '{}' has no attribute '{}'",
                    cred_def.id, name
                ))
            })?;
            if *reveal {
                revealed.insert(idx);
            }
        }
    }
    Ok(revealed)
}

/// The predicates answered by one credential, ordered by referent
fn predicate_bounds(
    request: &PresentationRequest,
    entry: &PresentCredential<'_>,
    cred: &Credential,
    cred_def: &CredentialDefinition,
) -> CredxResult<Vec<(String, usize, RangeBound, i64)>> {
    let mut predicates = Vec::with_capacity(entry.requested_predicates.len());
    for referent in &entry.requested_predicates {
        let info = &request.requested_predicates[referent];
        let idx = cred_def.attr_index(&info.name).ok_or_else(|| {
            Error::InvalidInput(format!(
                "credential definition '{}' has no attribute '{}'",
                cred_def.id, info.name
            ))
        })?;
        let value = cred
            .values
            .get(&info.name)
            .ok_or_else(|| Error::InvalidInput(format!("missing value for '{}'", info.name)))?;
        let value = encoded_to_i64(&value.encoded)?;
        if !info.p_type.holds(value, info.p_value) {
            return Err(Error::InvalidInput(format!(
                "predicate '{}' does not hold for the credential value",
                referent
            )));
        }
        let bound = RangeBound::from_bounds(info.bounds())?;
        predicates.push((referent.clone(), idx, bound, value));
    }
    Ok(predicates)
}

/// The registry, state and timestamp for a non-revocation proof, if one is needed.
///
/// A proof is built whenever a revocable credential carries a revocation
/// state. A referent with an interval on a revocable credential requires one.
fn revocation_context<'a, 'p>(
    request: &PresentationRequest,
    entry: &PresentCredential<'p>,
    cred_def: &CredentialDefinition,
    rev_reg_defs: &'a BTreeMap<String, RevocationRegistryDefinition>,
) -> CredxResult<Option<(&'a RevocationRegistryDefinition, &'p CredentialRevocationState, u64)>> {
    if !cred_def.support_revocation {
        return Ok(None);
    }
    let needs_interval = entry
        .requested_attributes
        .iter()
        .any(|(r, _)| request.attribute_interval(r).is_some())
        || entry
            .requested_predicates
            .iter()
            .any(|r| request.predicate_interval(r).is_some());
    let state = match entry.rev_state {
        Some(state) => state,
        None if needs_interval => {
            return Err(Error::InvalidInput(format!(
                "credential from '{}' needs a revocation state",
                cred_def.id
            )))
        }
        None => return Ok(None),
    };
    let rev_reg_id = entry.cred.rev_reg_id.as_ref().ok_or_else(|| {
        Error::InvalidInput("revocable credential has no registry".to_string())
    })?;
    if entry.cred.rev_reg_index != Some(state.rev_reg_index) {
        return Err(Error::InvalidInput(format!(
            "revocation state is for index {} of another credential",
            state.rev_reg_index
        )));
    }
    let rev_reg_def = rev_reg_defs.get(rev_reg_id).ok_or_else(|| {
        Error::InvalidInput(format!("unknown revocation registry '{}'", rev_reg_id))
    })?;
    Ok(Some((
        rev_reg_def,
        state,
        entry.timestamp.unwrap_or(state.timestamp),
    )))
}

/// Record how each attribute referent of one credential was answered
fn fill_attributes(
    request: &PresentationRequest,
    entry: &PresentCredential<'_>,
    sub_proof_index: u32,
    requested_proof: &mut RequestedProof,
) -> CredxResult<()> {
    for (referent, reveal) in &entry.requested_attributes {
        let info = &request.requested_attributes[referent];
        if !reveal {
            requested_proof
                .unrevealed_attrs
                .insert(referent.clone(), SubProofReferent { sub_proof_index });
            continue;
        }
        let mut values = BTreeMap::new();
        for name in info.attr_names() {
            let value = entry
                .cred
                .values
                .get(name)
                .ok_or_else(|| Error::InvalidInput(format!("missing value for '{}'", name)))?;
            values.insert(
                name.to_string(),
                RevealedAttributeValue {
                    raw: value.raw.clone(),
                    encoded: value.encoded.clone(),
                },
            );
        }
        if info.is_group() {
            requested_proof.revealed_attr_groups.insert(
                referent.clone(),
                RevealedAttributeGroupInfo {
                    sub_proof_index,
                    values,
                },
            );
        } else if let Some((_, value)) = values.into_iter().next() {
            requested_proof.revealed_attrs.insert(
                referent.clone(),
                RevealedAttributeInfo {
                    sub_proof_index,
                    raw: value.raw,
                    encoded: value.encoded,
                },
            );
        }
    }
    Ok(())
}
