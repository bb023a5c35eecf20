use super::{
    RevocationRegistry, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
    RevocationRegistryDelta,
};
use crate::credential::{CredentialValues, IssuedCredential};
use crate::error::Error;
use crate::issuer::{
    create_credential, CredentialDefinition, CredentialDefinitionPrivate, CredentialOffer,
    CredentialRevocationConfig,
};
use crate::prover::CredentialRequest;
use crate::CredxResult;
use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

struct Inner {
    definition: RevocationRegistryDefinition,
    private: RevocationRegistryDefinitionPrivate,
    registry: RevocationRegistry,
}

/// Serializes every mutation of one revocation registry.
///
/// Index allocation and accumulator updates happen under one lock so
/// concurrent issuers never hand out the same index or publish deltas
/// that do not chain.
pub struct RegistryWriter {
    inner: Mutex<Inner>,
}

impl RegistryWriter {
    /// Take ownership of a registry and its keys
    pub fn new(
        definition: RevocationRegistryDefinition,
        private: RevocationRegistryDefinitionPrivate,
        registry: RevocationRegistry,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                definition,
                private,
                registry,
            }),
        }
    }

    fn lock(&self) -> CredxResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::General("registry lock poisoned"))
    }

    /// A snapshot of the current registry
    pub fn registry(&self) -> CredxResult<RevocationRegistry> {
        Ok(self.lock()?.registry.clone())
    }

    /// The registry definition
    pub fn definition(&self) -> CredxResult<RevocationRegistryDefinition> {
        Ok(self.lock()?.definition.clone())
    }

    /// Mark an index as issued, the next free one when `index` is `None`
    pub fn issue_index(&self, index: Option<u32>) -> CredxResult<(u32, RevocationRegistryDelta)> {
        let mut inner = self.lock()?;
        let index = match index {
            Some(i) => i,
            None => inner.registry.next_free_index()?,
        };
        let delta = apply(&mut inner, &BTreeSet::from([index]), &BTreeSet::new())?;
        Ok((index, delta))
    }

    /// Revoke one index
    pub fn revoke(&self, index: u32) -> CredxResult<RevocationRegistryDelta> {
        let mut inner = self.lock()?;
        apply(&mut inner, &BTreeSet::new(), &BTreeSet::from([index]))
    }

    /// Apply a batch of issuances and revocations
    pub fn update(
        &self,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> CredxResult<RevocationRegistryDelta> {
        let mut inner = self.lock()?;
        apply(&mut inner, issued, revoked)
    }

    /// Issue a credential into this registry
    #[allow(clippy::too_many_arguments)]
    pub fn create_credential(
        &self,
        cred_def: &CredentialDefinition,
        cred_def_private: &CredentialDefinitionPrivate,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
        index: Option<u32>,
        rng: impl RngCore + CryptoRng,
    ) -> CredxResult<(IssuedCredential, RevocationRegistryDelta)> {
        let mut inner = self.lock()?;
        let config = CredentialRevocationConfig {
            reg_def: &inner.definition,
            reg_def_private: &inner.private,
            registry: &inner.registry,
            index,
        };
        let (credential, update) = create_credential(
            cred_def,
            cred_def_private,
            offer,
            request,
            values,
            Some(config),
            rng,
        )?;
        let (registry, delta) =
            update.ok_or(Error::General("issuance did not update the registry"))?;
        inner.registry = registry;
        Ok((credential, delta))
    }
}

fn apply(
    inner: &mut Inner,
    issued: &BTreeSet<u32>,
    revoked: &BTreeSet<u32>,
) -> CredxResult<RevocationRegistryDelta> {
    let (registry, delta) = inner
        .registry
        .update(&inner.definition, &inner.private, issued, revoked)?;
    inner.registry = registry;
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::Error;
    use crate::issuer::{create_credential_definition, CredentialDefinitionConfig};
    use crate::schema::Schema;
    use rand_core::OsRng;
    use std::sync::Arc;

    fn writer(max_cred_num: u32) -> (RegistryWriter, RevocationRegistryDelta) {
        let schema = Schema::new("issuer", "badge", "1.0", ["level"]).unwrap();
        let (cred_def, _, _) = create_credential_definition(
            &schema,
            "issuer",
            "tag",
            CredentialDefinitionConfig {
                support_revocation: true,
            },
            OsRng,
        )
        .unwrap();
        let config = RevocationRegistryConfig {
            tag: "r".to_string(),
            issuance_type: IssuanceType::IssuanceOnDemand,
            max_cred_num,
        };
        let (def, private, registry, initial) = create_revocation_registry_def(
            &cred_def,
            "issuer",
            &config,
            "mem",
            &mut TailsBuffer::new(),
            OsRng,
        )
        .unwrap();
        (RegistryWriter::new(def, private, registry), initial)
    }

    #[test]
    fn concurrent_issuance_chains_deltas() {
        let (writer, initial) = writer(8);
        let writer = Arc::new(writer);
        let handles = (0..8)
            .map(|_| {
                let writer = writer.clone();
                std::thread::spawn(move || writer.issue_index(None).unwrap())
            })
            .collect::<Vec<_>>();
        let mut results = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        results.sort_by_key(|(_, delta)| delta.from_epoch);

        let indices = results.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>();
        assert_eq!(indices, (1..=8).collect());

        let mut merged = initial;
        for (_, delta) in &results {
            merged = merged.merge(delta).unwrap();
        }
        let registry = writer.registry().unwrap();
        assert_eq!(merged.accum, registry.accum);
        assert_eq!(registry.epoch, 8);
        assert_eq!(writer.issue_index(None).unwrap_err(), Error::RegistryFull);
    }

    #[test]
    fn concurrent_issue_and_revoke_chain_deltas() {
        const WORKERS: usize = 6;
        let (writer, initial) = writer(WORKERS as u32);
        assert_eq!(initial.to_epoch, 0);
        let writer = Arc::new(writer);
        let handles = (0..WORKERS)
            .map(|n| {
                let writer = writer.clone();
                std::thread::spawn(move || {
                    let (index, issued) = writer.issue_index(None).unwrap();
                    let mut deltas = vec![issued];
                    if n % 2 == 0 {
                        deltas.push(writer.revoke(index).unwrap());
                    }
                    (index, deltas)
                })
            })
            .collect::<Vec<_>>();

        let mut indices = BTreeSet::new();
        let mut revoked = BTreeSet::new();
        let mut deltas = Vec::new();
        for handle in handles {
            let (index, mut produced) = handle.join().unwrap();
            assert!(indices.insert(index), "index {} handed out twice", index);
            if produced.len() == 2 {
                revoked.insert(index);
            }
            deltas.append(&mut produced);
        }
        assert_eq!(indices.len(), WORKERS);
        let calls = deltas.len();
        assert_eq!(calls, WORKERS + WORKERS / 2);
        deltas.sort_by_key(|delta| delta.from_epoch);

        let mut merged = initial;
        for delta in &deltas {
            assert_eq!(merged.to_epoch, delta.from_epoch);
            assert_eq!(delta.to_epoch, delta.from_epoch + 1);
            assert_eq!(merged.accum, delta.prev_accum);
            merged = merged.merge(delta).unwrap();
        }

        let registry = writer.registry().unwrap();
        assert_eq!(registry.epoch, calls as u64);
        assert_eq!(merged.to_epoch, calls as u64);
        assert_eq!(merged.accum, registry.accum);
        assert_eq!(registry.revoked, revoked);
        assert!(revoked.is_subset(&registry.issued));
    }

    #[test]
    fn revoke_through_writer() {
        let (writer, _) = writer(2);
        let (index, _) = writer.issue_index(Some(2)).unwrap();
        assert_eq!(index, 2);
        let delta = writer.revoke(2).unwrap();
        assert_eq!(delta.revoked, BTreeSet::from([2]));
        assert_eq!(writer.revoke(2).unwrap_err(), Error::IndexAlreadyRevoked(2));
        assert_eq!(writer.revoke(1).unwrap_err(), Error::IndexNotIssued(1));
        let delta = writer.update(&BTreeSet::from([1]), &BTreeSet::new()).unwrap();
        assert_eq!(delta.to_epoch, 3);
        assert_eq!(writer.definition().unwrap().max_cred_num, 2);
    }
}
