use super::*;
use crate::encoding::{encode_credential_attribute, encoded_to_scalar};
use crate::error::{Error, ErrorKind};
use crate::issuer::CredentialDefinition;
use crate::presentation::{
    challenge_from_transcript, restrictions_hold, NonRevokedInterval, Presentation,
    PresentationRequest, RangeBound, Restriction, SubProof, PRESENTATION_LABEL,
};
use crate::revocation::{RevocationRegistry, RevocationRegistryDefinition};
use crate::schema::Schema;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use subtle::ConstantTimeEq;

/// Check a presentation against the request it answers.
///
/// Returns `Ok(false)` when a proof, restriction, interval or revealed
/// value does not check out and `Err` when the presentation is malformed
/// or refers to a schema, definition or registry that was not supplied.
/// `rev_regs` holds the registry values by registry id and timestamp.
///
/// With `accept_legacy_revocation` only the upper end of a
/// non-revocation interval is enforced and a timestamp on a referent
/// that asked for no interval is tolerated.
pub fn verify_presentation(
    presentation: &Presentation,
    request: &PresentationRequest,
    schemas: &BTreeMap<String, Schema>,
    cred_defs: &BTreeMap<String, CredentialDefinition>,
    rev_reg_defs: &BTreeMap<String, RevocationRegistryDefinition>,
    rev_regs: &BTreeMap<String, BTreeMap<u64, RevocationRegistry>>,
    accept_legacy_revocation: bool,
) -> CredxResult<bool> {
    debug!("Verifying presentation for request '{}'", request.name);
    request.validate()?;
    check_structure(presentation, request)?;

    let mut sources = Vec::with_capacity(presentation.identifiers.len());
    for identifier in &presentation.identifiers {
        let schema = schemas.get(&identifier.schema_id).ok_or_else(|| {
            Error::InvalidInput(format!("unknown schema '{}'", identifier.schema_id))
        })?;
        let cred_def = cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown credential definition '{}'",
                identifier.cred_def_id
            ))
        })?;
        if !cred_def.matches_schema(schema) {
            warn!(
                "Credential definition '{}' does not belong to schema '{}'",
                cred_def.id, schema.id
            );
            return Ok(false);
        }
        sources.push((schema, cred_def));
    }

    if !check_self_attested(presentation, request)
        || !check_revealed_values(presentation, request, &sources)
        || !check_restrictions(presentation, request, &sources)
    {
        return Ok(false);
    }

    let mut accumulators = Vec::with_capacity(sources.len());
    for (i, (_, cred_def)) in sources.iter().enumerate() {
        match registry_for(
            presentation,
            request,
            i,
            cred_def,
            rev_reg_defs,
            rev_regs,
            accept_legacy_revocation,
        )? {
            Some(found) => accumulators.push(found),
            None => return Ok(false),
        }
    }

    match verify_proofs(presentation, request, &sources, &accumulators) {
        Ok(()) => {
            debug!("Presentation for request '{}' verified", request.name);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::ProofInvalid => {
            warn!("Presentation proof rejected: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Every requested referent is answered exactly once, in the right place,
/// by an existing sub-proof
fn check_structure(presentation: &Presentation, request: &PresentationRequest) -> CredxResult<()> {
    let sub_proofs = &presentation.proof.sub_proofs;
    if sub_proofs.len() != presentation.identifiers.len() {
        return Err(Error::InvalidPresentationData(format!(
            "{} sub-proofs but {} identifiers",
            sub_proofs.len(),
            presentation.identifiers.len()
        )));
    }
    let requested_proof = &presentation.requested_proof;

    let mut answered = BTreeSet::new();
    let mut answer = |referent: &str, expected: bool| -> CredxResult<()> {
        if !expected {
            return Err(Error::InvalidPresentationData(format!(
                "referent '{}' is answered in the wrong place",
                referent
            )));
        }
        if !answered.insert(referent.to_string()) {
            return Err(Error::InvalidPresentationData(format!(
                "referent '{}' is answered more than once",
                referent
            )));
        }
        Ok(())
    };
    let single_attribute = |referent: &str| {
        request
            .requested_attributes
            .get(referent)
            .map_or(false, |info| !info.is_group())
    };
    for referent in requested_proof
        .revealed_attrs
        .keys()
        .chain(requested_proof.unrevealed_attrs.keys())
        .chain(requested_proof.self_attested_attrs.keys())
    {
        answer(referent, single_attribute(referent))?;
    }
    for (referent, group) in &requested_proof.revealed_attr_groups {
        let expected = match request.requested_attributes.get(referent) {
            Some(info) if info.is_group() => {
                let names = info.attr_names().into_iter().collect::<BTreeSet<_>>();
                names == group.values.keys().map(String::as_str).collect::<BTreeSet<_>>()
            }
            _ => false,
        };
        answer(referent, expected)?;
    }
    for referent in requested_proof.predicates.keys() {
        answer(referent, request.requested_predicates.contains_key(referent))?;
    }
    if let Some(missing) = crate::presentation::referents(request)
        .into_iter()
        .find(|r| !answered.contains(*r))
    {
        return Err(Error::InvalidPresentationData(format!(
            "referent '{}' is not answered",
            missing
        )));
    }

    for (referent, index) in requested_proof.sub_proof_indices() {
        if index as usize >= sub_proofs.len() {
            return Err(Error::InvalidPresentationData(format!(
                "referent '{}' points at missing sub-proof {}",
                referent, index
            )));
        }
    }

    for (i, sub_proof) in sub_proofs.iter().enumerate() {
        let expected = requested_proof
            .predicates
            .iter()
            .filter(|(_, s)| s.sub_proof_index as usize == i)
            .map(|(r, _)| r.as_str());
        if !sub_proof
            .predicates
            .iter()
            .map(|p| p.referent.as_str())
            .eq(expected)
        {
            return Err(Error::InvalidPresentationData(format!(
                "sub-proof {} carries the wrong predicates",
                i
            )));
        }
    }
    Ok(())
}

/// Self-attested values cannot satisfy a restriction
fn check_self_attested(presentation: &Presentation, request: &PresentationRequest) -> bool {
    for referent in presentation.requested_proof.self_attested_attrs.keys() {
        if !request.requested_attributes[referent]
            .restrictions
            .is_empty()
        {
            warn!("Referent '{}' is restricted but was self-attested", referent);
            return false;
        }
    }
    true
}

/// A raw value must match its encoding and the encoding must be what was signed
fn revealed_value_matches(
    sub_proof: &SubProof,
    cred_def: &CredentialDefinition,
    name: &str,
    raw: &str,
    encoded: &str,
) -> bool {
    // pre-encoded 64-bit integers must be revealed in their canonical decimal text
    let raw_matches = encode_credential_attribute(raw) == encoded
        || encoded
            .parse::<i64>()
            .map_or(false, |e| e.to_string() == raw);
    if !raw_matches {
        warn!("Revealed value for '{}' does not match its encoding", name);
        return false;
    }
    let disclosed = cred_def
        .attr_index(name)
        .and_then(|idx| sub_proof.signature.disclosed_messages.get(&idx));
    match (disclosed, encoded_to_scalar(encoded)) {
        (Some(disclosed), Ok(scalar)) if *disclosed == scalar => true,
        _ => {
            warn!("Revealed value for '{}' was not signed", name);
            false
        }
    }
}

fn check_revealed_values(
    presentation: &Presentation,
    request: &PresentationRequest,
    sources: &[(&Schema, &CredentialDefinition)],
) -> bool {
    let sub_proofs = &presentation.proof.sub_proofs;
    let requested_proof = &presentation.requested_proof;

    for (i, sub_proof) in sub_proofs.iter().enumerate() {
        let (_, cred_def) = sources[i];
        let attr_count = cred_def.attr_names.len();
        if sub_proof
            .signature
            .disclosed_messages
            .keys()
            .any(|idx| *idx == 0 || *idx > attr_count)
        {
            warn!("Sub-proof {} discloses a message that is not an attribute", i);
            return false;
        }
    }

    for (referent, info) in &requested_proof.revealed_attrs {
        let i = info.sub_proof_index as usize;
        let names = request.requested_attributes[referent].attr_names();
        let name = names.first().copied().unwrap_or_default();
        if !revealed_value_matches(&sub_proofs[i], sources[i].1, name, &info.raw, &info.encoded) {
            return false;
        }
    }
    for group in requested_proof.revealed_attr_groups.values() {
        let i = group.sub_proof_index as usize;
        for (name, value) in &group.values {
            if !revealed_value_matches(&sub_proofs[i], sources[i].1, name, &value.raw, &value.encoded)
            {
                return false;
            }
        }
    }
    for (referent, info) in &requested_proof.unrevealed_attrs {
        let cred_def = sources[info.sub_proof_index as usize].1;
        let names = request.requested_attributes[referent].attr_names();
        if names.iter().any(|name| cred_def.attr_index(name).is_none()) {
            warn!("Credential for '{}' has no such attribute", referent);
            return false;
        }
    }
    true
}

fn check_restrictions(
    presentation: &Presentation,
    request: &PresentationRequest,
    sources: &[(&Schema, &CredentialDefinition)],
) -> bool {
    let identifiers = &presentation.identifiers;
    for (referent, index) in presentation.requested_proof.sub_proof_indices() {
        let restrictions: &[Restriction] = match request.requested_attributes.get(referent) {
            Some(info) => &info.restrictions,
            None => match request.requested_predicates.get(referent) {
                Some(info) => &info.restrictions,
                None => continue,
            },
        };
        let index = index as usize;
        let (schema, cred_def) = sources[index];
        if !restrictions_hold(
            restrictions,
            schema,
            cred_def,
            identifiers[index].rev_reg_id.as_deref(),
        ) {
            warn!("Restrictions for referent '{}' are not met", referent);
            return false;
        }
    }
    true
}

/// The non-revocation intervals of the referents a sub-proof answers
fn intervals_for<'r>(
    presentation: &Presentation,
    request: &'r PresentationRequest,
    sub_proof_index: usize,
) -> Vec<&'r NonRevokedInterval> {
    let mut intervals = Vec::new();
    for (referent, index) in presentation.requested_proof.sub_proof_indices() {
        if index as usize != sub_proof_index {
            continue;
        }
        let interval = if request.requested_predicates.contains_key(referent) {
            request.predicate_interval(referent)
        } else {
            request.attribute_interval(referent)
        };
        intervals.extend(interval);
    }
    intervals
}

type AccumulatorSource<'a> = Option<(&'a RevocationRegistryDefinition, &'a RevocationRegistry)>;

/// Find the registry a sub-proof's non-revocation proof was made against.
///
/// The outer `None` means the sub-proof fails the interval checks.
fn registry_for<'a>(
    presentation: &Presentation,
    request: &PresentationRequest,
    sub_proof_index: usize,
    cred_def: &CredentialDefinition,
    rev_reg_defs: &'a BTreeMap<String, RevocationRegistryDefinition>,
    rev_regs: &'a BTreeMap<String, BTreeMap<u64, RevocationRegistry>>,
    legacy: bool,
) -> CredxResult<Option<AccumulatorSource<'a>>> {
    let identifier = &presentation.identifiers[sub_proof_index];
    let sub_proof = &presentation.proof.sub_proofs[sub_proof_index];
    let intervals = intervals_for(presentation, request, sub_proof_index);

    let timestamp = match (identifier.timestamp, sub_proof.non_revocation.is_some()) {
        (None, false) => {
            if cred_def.support_revocation && !intervals.is_empty() {
                warn!("Sub-proof {} is missing a non-revocation proof", sub_proof_index);
                return Ok(None);
            }
            return Ok(Some(None));
        }
        (Some(timestamp), true) => timestamp,
        _ => {
            return Err(Error::InvalidPresentationData(format!(
                "sub-proof {} needs both a timestamp and a non-revocation proof",
                sub_proof_index
            )))
        }
    };
    if !cred_def.support_revocation {
        warn!(
            "Sub-proof {} proves non-revocation for a credential that cannot be revoked",
            sub_proof_index
        );
        return Ok(None);
    }
    if intervals.is_empty() && !legacy {
        warn!(
            "Sub-proof {} carries a timestamp but no interval was requested",
            sub_proof_index
        );
        return Ok(None);
    }
    if let Some(interval) = intervals.iter().find(|i| !i.contains(timestamp, legacy)) {
        warn!(
            "Sub-proof {} timestamp {} is outside {:?}",
            sub_proof_index, timestamp, interval
        );
        return Ok(None);
    }

    let rev_reg_id = identifier.rev_reg_id.as_ref().ok_or_else(|| {
        Error::InvalidPresentationData(format!(
            "sub-proof {} has no revocation registry",
            sub_proof_index
        ))
    })?;
    let rev_reg_def = rev_reg_defs.get(rev_reg_id).ok_or_else(|| {
        Error::InvalidInput(format!("unknown revocation registry '{}'", rev_reg_id))
    })?;
    let registry = rev_regs
        .get(rev_reg_id)
        .and_then(|by_time| by_time.get(&timestamp))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "no value of revocation registry '{}' at {}",
                rev_reg_id, timestamp
            ))
        })?;
    if rev_reg_def.cred_def_id != cred_def.id {
        warn!(
            "Revocation registry '{}' does not belong to '{}'",
            rev_reg_id, cred_def.id
        );
        return Ok(None);
    }
    Ok(Some(Some((rev_reg_def, registry))))
}

/// Rebuild the challenge from every sub-proof, then check each proof
fn verify_proofs(
    presentation: &Presentation,
    request: &PresentationRequest,
    sources: &[(&Schema, &CredentialDefinition)],
    accumulators: &[AccumulatorSource<'_>],
) -> CredxResult<()> {
    let proof = &presentation.proof;
    let challenge = proof.challenge;

    let mut transcript = Transcript::new(PRESENTATION_LABEL);
    transcript.append_message(b"nonce", request.nonce.as_str().as_bytes());
    transcript.append_message(b"presentation request", &serde_json::to_vec(request)?);
    transcript.append_u64(b"sub proof count", proof.sub_proofs.len() as u64);

    let mut verifiers = Vec::<ProofVerifiers>::new();
    let mut link_secret_proof = None;

    for (i, sub_proof) in proof.sub_proofs.iter().enumerate() {
        let (_, cred_def) = sources[i];
        presentation.identifiers[i].add_challenge_contribution(&mut transcript);

        let signature = SignatureVerifier::new(cred_def, &sub_proof.signature);
        signature.add_challenge_contribution(challenge, &mut transcript)?;
        let hidden = signature.hidden_message_proofs()?;
        verifiers.push(signature.into());

        let link_secret = hidden.get(&0).copied().ok_or(Error::InvalidProofData)?;
        match link_secret_proof {
            None => link_secret_proof = Some(link_secret),
            Some(first) if first == link_secret => {}
            Some(_) => {
                warn!("Sub-proof {} uses a different link secret", i);
                return Err(Error::InvalidProofData);
            }
        }

        for predicate in &sub_proof.predicates {
            let info = &request.requested_predicates[&predicate.referent];
            let idx = cred_def
                .attr_index(&info.name)
                .ok_or(Error::InvalidProofData)?;
            let link = match sub_proof.signature.disclosed_messages.get(&idx) {
                Some(m) => AttributeLink::Disclosed(*m),
                None => AttributeLink::Hidden(*hidden.get(&idx).ok_or(Error::InvalidProofData)?),
            };
            let verifier = PredicateVerifier {
                proof: predicate,
                bound: RangeBound::from_bounds(info.bounds())?,
                link,
            };
            verifier.add_challenge_contribution(challenge, &mut transcript)?;
            verifiers.push(verifier.into());
        }

        if let (Some(non_revocation), Some((rev_reg_def, registry))) =
            (&sub_proof.non_revocation, accumulators[i])
        {
            let idx = cred_def
                .revocation_index()
                .ok_or(Error::InvalidProofData)?;
            let verifier = RevocationVerifier::new(
                non_revocation,
                registry.accum,
                rev_reg_def.public_key,
                &request.nonce,
                *hidden.get(&idx).ok_or(Error::InvalidProofData)?,
            );
            verifier.add_challenge_contribution(challenge, &mut transcript)?;
            verifiers.push(verifier.into());
        }
    }

    let computed = challenge_from_transcript(&mut transcript);
    if computed.ct_eq(&challenge).unwrap_u8() != 1 {
        return Err(Error::InvalidProofData);
    }
    for verifier in &verifiers {
        verifier.verify(challenge)?;
    }
    Ok(())
}
