mod util;

use anoncreds_ps::prelude::*;
use maplit::btreemap;
use rand::thread_rng;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use util::*;

fn json_round_trip<T>(value: &T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let json = serde_json::to_string(value).unwrap();
    let parsed: T = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    parsed
}

#[test]
fn documents_survive_json() {
    setup();
    let issuer = TestIssuer::new("membership", &["level", "years"], true).unwrap();
    let mut registry = TestRegistry::new(&issuer, IssuanceType::IssuanceByDefault, 4).unwrap();
    let link_secret = create_link_secret();

    assert_eq!(json_round_trip(&issuer.schema), issuer.schema);
    assert_eq!(json_round_trip(&issuer.cred_def), issuer.cred_def);
    assert_eq!(
        json_round_trip(&issuer.key_correctness_proof),
        issuer.key_correctness_proof
    );
    assert_eq!(json_round_trip(&registry.definition), registry.definition);

    let offer = create_credential_offer(&issuer.cred_def, &issuer.key_correctness_proof, thread_rng());
    let offer = json_round_trip(&offer);
    let (request, metadata) = create_credential_request(
        Some("holder"),
        &issuer.cred_def,
        &link_secret,
        "default",
        &offer,
        thread_rng(),
    )
    .unwrap();
    let request = json_round_trip(&request);
    let metadata = json_round_trip(&metadata);

    let mut values = CredentialValues::new();
    values.add_raw("level", "gold").unwrap();
    values.add_raw("years", "7").unwrap();
    let (issued, update) = create_credential(
        &issuer.cred_def,
        &issuer.cred_def_private,
        &offer,
        &request,
        values,
        Some(registry.config()),
        thread_rng(),
    )
    .unwrap();
    let issued = json_round_trip(&issued);
    let (next, delta) = update.unwrap();
    let delta = json_round_trip(&delta);
    registry.publish(json_round_trip(&next), delta);

    let credential = process_credential(&issued, &metadata, &link_secret, &issuer.cred_def).unwrap();
    let credential = json_round_trip(&credential);
    assert!(credential.verify(&link_secret, &issuer.cred_def));

    let index = credential.rev_reg_index.unwrap();
    let state = json_round_trip(&registry.state(index, 100).unwrap());
    assert!(state.verify(&registry.definition));

    let restored = LinkSecret::from_bytes(&link_secret.to_bytes()).unwrap();
    assert_eq!(restored.to_bytes(), link_secret.to_bytes());
}

#[test]
fn request_uses_predicate_symbols() {
    let mut request = PresentationRequest::new("proof", "1.0");
    request.requested_predicates = btreemap! {
        "adult".to_string() => PredicateInfo::new("age", PredicateType::GE, 18),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["requested_predicates"]["adult"]["p_type"], ">=");
    assert_eq!(json_round_trip(&request), request);

    let parsed: PresentationRequest = serde_json::from_str(
        r#"{
            "nonce": "1234567890",
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1": { "name": "name" },
                "group": { "names": ["name", "age"] }
            },
            "non_revoked": { "to": 200 }
        }"#,
    )
    .unwrap();
    assert!(parsed.validate().is_ok());
    assert!(parsed.requested_attributes["group"].is_group());
    assert_eq!(parsed.attribute_interval("attr1"), Some(&NonRevokedInterval::new(None, Some(200))));
}

#[test]
fn presentation_survives_cbor() {
    setup();
    let issuer = TestIssuer::new("person", &["name", "age"], false).unwrap();
    let link_secret = create_link_secret();
    let (credential, _) = issuer
        .issue(&link_secret, &[("name", "Alice"), ("age", "30")], None)
        .unwrap();

    let mut request = PresentationRequest::new("proof", "1.0");
    request.requested_attributes = btreemap! {
        "name".to_string() => AttributeInfo::name("name"),
    };
    request.requested_predicates = btreemap! {
        "adult".to_string() => PredicateInfo::new("age", PredicateType::GE, 18),
    };
    let mut present = PresentCredentials::new();
    let mut entry = present.add_credential(&credential, None, None);
    entry.add_requested_attribute("name", true);
    entry.add_requested_predicate("adult");
    let presentation = create_presentation(
        &request,
        present,
        None,
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
        &BTreeMap::new(),
        thread_rng(),
    )
    .unwrap();

    let bytes = serde_cbor::to_vec(&presentation).unwrap();
    let decoded: Presentation = serde_cbor::from_slice(&bytes).unwrap();
    let from_json = json_round_trip(&decoded);

    for candidate in [&decoded, &from_json] {
        let res = verify_presentation(
            candidate,
            &request,
            &issuer.schemas(),
            &issuer.cred_defs(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            false,
        );
        assert!(matches!(res, Ok(true)), "{:?}", res);
    }
}
