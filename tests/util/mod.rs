#![allow(dead_code)]

use anoncreds_ps::prelude::*;
use rand::thread_rng;
use std::collections::BTreeMap;

pub const ISSUER_ID: &str = "did:sov:NcYxiDXkpYi6ov5FcYDi1e";

pub fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestIssuer {
    pub schema: Schema,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub key_correctness_proof: KeyCorrectnessProof,
}

impl TestIssuer {
    pub fn new(name: &str, attr_names: &[&str], support_revocation: bool) -> CredxResult<Self> {
        let schema = Schema::new(ISSUER_ID, name, "1.0", attr_names.iter().copied())?;
        let (cred_def, cred_def_private, key_correctness_proof) = create_credential_definition(
            &schema,
            ISSUER_ID,
            "default",
            CredentialDefinitionConfig { support_revocation },
            thread_rng(),
        )?;
        Ok(Self {
            schema,
            cred_def,
            cred_def_private,
            key_correctness_proof,
        })
    }

    /// Run offer, request, issue and process for one credential
    pub fn issue(
        &self,
        link_secret: &LinkSecret,
        values: &[(&str, &str)],
        revocation: Option<CredentialRevocationConfig<'_>>,
    ) -> CredxResult<(Credential, Option<(RevocationRegistry, RevocationRegistryDelta)>)> {
        let mut credential_values = CredentialValues::new();
        for (name, raw) in values {
            credential_values.add_raw(name, *raw)?;
        }
        self.issue_values(link_secret, credential_values, revocation)
    }

    /// Like [`TestIssuer::issue`] with values the caller already encoded
    pub fn issue_values(
        &self,
        link_secret: &LinkSecret,
        credential_values: CredentialValues,
        revocation: Option<CredentialRevocationConfig<'_>>,
    ) -> CredxResult<(Credential, Option<(RevocationRegistry, RevocationRegistryDelta)>)> {
        let offer =
            create_credential_offer(&self.cred_def, &self.key_correctness_proof, thread_rng());
        let (request, metadata) = create_credential_request(
            Some("holder"),
            &self.cred_def,
            link_secret,
            "default",
            &offer,
            thread_rng(),
        )?;
        let (issued, update) = create_credential(
            &self.cred_def,
            &self.cred_def_private,
            &offer,
            &request,
            credential_values,
            revocation,
            thread_rng(),
        )?;
        let credential = process_credential(&issued, &metadata, link_secret, &self.cred_def)?;
        Ok((credential, update))
    }

    pub fn schemas(&self) -> BTreeMap<String, Schema> {
        BTreeMap::from([(self.schema.id.clone(), self.schema.clone())])
    }

    pub fn cred_defs(&self) -> BTreeMap<String, CredentialDefinition> {
        BTreeMap::from([(self.cred_def.id.clone(), self.cred_def.clone())])
    }
}

pub struct TestRegistry {
    pub definition: RevocationRegistryDefinition,
    pub private: RevocationRegistryDefinitionPrivate,
    pub registry: RevocationRegistry,
    pub delta: RevocationRegistryDelta,
    pub tails: TailsBuffer,
}

impl TestRegistry {
    pub fn new(
        issuer: &TestIssuer,
        issuance_type: IssuanceType,
        max_cred_num: u32,
    ) -> CredxResult<Self> {
        let config = RevocationRegistryConfig {
            tag: "default".to_string(),
            issuance_type,
            max_cred_num,
        };
        let mut tails = TailsBuffer::new();
        let (definition, private, registry, delta) = create_revocation_registry_def(
            &issuer.cred_def,
            ISSUER_ID,
            &config,
            "memory",
            &mut tails,
            thread_rng(),
        )?;
        Ok(Self {
            definition,
            private,
            registry,
            delta,
            tails,
        })
    }

    pub fn config(&self) -> CredentialRevocationConfig<'_> {
        CredentialRevocationConfig {
            reg_def: &self.definition,
            reg_def_private: &self.private,
            registry: &self.registry,
            index: None,
        }
    }

    /// Record a published update
    pub fn publish(&mut self, registry: RevocationRegistry, delta: RevocationRegistryDelta) {
        self.delta = self.delta.merge(&delta).expect("deltas are published in order");
        self.registry = registry;
    }

    pub fn state(&mut self, index: u32, timestamp: u64) -> CredxResult<CredentialRevocationState> {
        CredentialRevocationState::create(
            &self.definition,
            &self.delta,
            index,
            timestamp,
            &mut self.tails,
        )
    }

    pub fn defs(&self) -> BTreeMap<String, RevocationRegistryDefinition> {
        BTreeMap::from([(self.definition.id.clone(), self.definition.clone())])
    }
}
