mod util;

use anoncreds_ps::prelude::*;
use elliptic_curve::Field;
use maplit::btreemap;
use rand::thread_rng;
use std::collections::BTreeMap;
use util::*;

struct Fixture {
    issuer: TestIssuer,
    request: PresentationRequest,
    presentation: Presentation,
}

impl Fixture {
    fn new() -> Self {
        let issuer = TestIssuer::new("person", &["name", "age"], false).unwrap();
        let link_secret = create_link_secret();
        let (credential, _) = issuer
            .issue(&link_secret, &[("name", "Alice"), ("age", "30")], None)
            .unwrap();

        let mut request = PresentationRequest::new("proof", "1.0");
        request.requested_attributes = btreemap! {
            "name".to_string() => AttributeInfo::name("name"),
            "age".to_string() => AttributeInfo::name("age"),
        };
        let mut present = PresentCredentials::new();
        let mut entry = present.add_credential(&credential, None, None);
        entry.add_requested_attribute("name", true);
        entry.add_requested_attribute("age", false);

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
        Self {
            issuer,
            request,
            presentation,
        }
    }

    fn verify_with(
        &self,
        presentation: &Presentation,
        request: &PresentationRequest,
        cred_defs: &BTreeMap<String, CredentialDefinition>,
    ) -> CredxResult<bool> {
        verify_presentation(
            presentation,
            request,
            &self.issuer.schemas(),
            cred_defs,
            &BTreeMap::new(),
            &BTreeMap::new(),
            false,
        )
    }

    fn verify(&self, presentation: &Presentation) -> CredxResult<bool> {
        self.verify_with(presentation, &self.request, &self.issuer.cred_defs())
    }
}

#[test]
fn untouched_presentation_verifies() {
    setup();
    let fixture = Fixture::new();
    let res = fixture.verify(&fixture.presentation);
    assert!(matches!(res, Ok(true)), "{:?}", res);
}

#[test]
fn changed_raw_value_is_rejected() {
    setup();
    let fixture = Fixture::new();
    let mut presentation = fixture.presentation.clone();
    presentation
        .requested_proof
        .revealed_attrs
        .get_mut("name")
        .unwrap()
        .raw = "Mallory".to_string();
    let res = fixture.verify(&presentation);
    assert!(matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn changed_raw_and_encoding_is_rejected() {
    setup();
    let fixture = Fixture::new();
    let mut presentation = fixture.presentation.clone();
    let revealed = presentation
        .requested_proof
        .revealed_attrs
        .get_mut("name")
        .unwrap();
    revealed.raw = "Mallory".to_string();
    revealed.encoded = encode_credential_attribute("Mallory");
    let res = fixture.verify(&presentation);
    assert!(matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn substituted_public_key_is_rejected() {
    setup();
    let fixture = Fixture::new();
    let impostor = TestIssuer::new("person", &["name", "age"], false).unwrap();
    let mut cred_def = fixture.issuer.cred_def.clone();
    cred_def.public_key = impostor.cred_def.public_key.clone();
    let cred_defs = BTreeMap::from([(cred_def.id.clone(), cred_def)]);
    let res = fixture.verify_with(&fixture.presentation, &fixture.request, &cred_defs);
    assert!(matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn presentation_is_bound_to_the_request() {
    setup();
    let fixture = Fixture::new();

    let mut other_nonce = fixture.request.clone();
    other_nonce.nonce = Nonce::new();
    let res = fixture.verify_with(
        &fixture.presentation,
        &other_nonce,
        &fixture.issuer.cred_defs(),
    );
    assert!(matches!(res, Ok(false)), "{:?}", res);

    let mut renamed = fixture.request.clone();
    renamed.name = "another proof".to_string();
    let res = fixture.verify_with(&fixture.presentation, &renamed, &fixture.issuer.cred_defs());
    assert!(matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn challenge_must_match() {
    setup();
    let fixture = Fixture::new();
    let mut presentation = fixture.presentation.clone();
    presentation.proof.challenge += Scalar::ONE;
    let res = fixture.verify(&presentation);
    assert!(matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn identifiers_are_part_of_the_transcript() {
    setup();
    let fixture = Fixture::new();
    let mut presentation = fixture.presentation.clone();
    presentation.identifiers[0].timestamp = Some(1);
    let res = fixture.verify(&presentation);
    assert!(res.is_err() || matches!(res, Ok(false)), "{:?}", res);
}

#[test]
fn unknown_credential_definition_is_an_error() {
    setup();
    let fixture = Fixture::new();
    let res = fixture.verify_with(&fixture.presentation, &fixture.request, &BTreeMap::new());
    assert!(matches!(res, Err(Error::InvalidInput(_))), "{:?}", res);
}

fn reveal_account(values: CredentialValues) -> (TestIssuer, PresentationRequest, Presentation) {
    let issuer = TestIssuer::new("account", &["id", "name"], false).unwrap();
    let link_secret = create_link_secret();
    let (credential, _) = issuer.issue_values(&link_secret, values, None).unwrap();

    let mut request = PresentationRequest::new("proof", "1.0");
    request.requested_attributes = btreemap! {
        "id".to_string() => AttributeInfo::name("id"),
    };
    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None, None)
        .add_requested_attribute("id", true);
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
    (issuer, request, presentation)
}

fn with_revealed_id(presentation: &Presentation, raw: &str, encoded: &str) -> Presentation {
    let mut presentation = presentation.clone();
    let revealed = presentation
        .requested_proof
        .revealed_attrs
        .get_mut("id")
        .unwrap();
    revealed.raw = raw.to_string();
    revealed.encoded = encoded.to_string();
    presentation
}

#[test]
fn large_encoding_cannot_pass_as_small_integer() {
    setup();
    // 30 + 2^63, the offset form of the integer 30
    let large = "9223372036854775838";
    let mut values = CredentialValues::new();
    values.add_encoded("id", large, large).unwrap();
    values.add_raw("name", "Alice").unwrap();

    let issuer = TestIssuer::new("account", &["id", "name"], false).unwrap();
    let link_secret = create_link_secret();
    let (mut credential, _) = issuer
        .issue_values(&link_secret, values.clone(), None)
        .unwrap();
    assert!(credential.verify(&link_secret, &issuer.cred_def));
    credential.values.add_encoded("id", "30", "30").unwrap();
    assert!(!credential.verify(&link_secret, &issuer.cred_def));

    let (issuer, request, presentation) = reveal_account(values);
    for (raw, encoded) in [("30", "30"), (large, "30")] {
        let forged = with_revealed_id(&presentation, raw, encoded);
        let res = verify_presentation(
            &forged,
            &request,
            &issuer.schemas(),
            &issuer.cred_defs(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            false,
        );
        assert!(matches!(res, Ok(false)), "{} {}: {:?}", raw, encoded, res);
    }
}

#[test]
fn pre_encoded_integer_needs_canonical_raw() {
    setup();
    let mut values = CredentialValues::new();
    values.add_encoded("id", "3000000000", "3000000000").unwrap();
    values.add_raw("name", "Alice").unwrap();
    let (issuer, request, presentation) = reveal_account(values);
    let verify = |presentation: &Presentation| {
        verify_presentation(
            presentation,
            &request,
            &issuer.schemas(),
            &issuer.cred_defs(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            false,
        )
    };

    let res = verify(&presentation);
    assert!(matches!(res, Ok(true)), "{:?}", res);

    for raw in ["+3000000000", "03000000000", "3000000000.0", " 3000000000"] {
        let res = verify(&with_revealed_id(&presentation, raw, "3000000000"));
        assert!(matches!(res, Ok(false)), "{}: {:?}", raw, res);
    }
}
