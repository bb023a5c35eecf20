use super::{decode_witness, tails_offset, RevocationRegistryDefinition, RevocationRegistryDelta};
use super::{TailsReader, TAILS_ENTRY_SIZE};
use crate::error::Error;
use crate::knox::accumulator::vb20::{Accumulator, MembershipWitness};
use crate::CredxResult;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// A holder's membership witness for one registry index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRevocationState {
    /// The witness for the index element
    pub witness: MembershipWitness,
    /// The accumulator the witness is valid for
    pub accum: Accumulator,
    /// The registry epoch of `accum`
    pub epoch: u64,
    /// When the holder last refreshed
    pub timestamp: u64,
    /// The credential's registry index
    pub rev_reg_index: u32,
}

impl CredentialRevocationState {
    /// Build the state for `index` from the tails blob and a delta that
    /// starts at the registry's creation
    pub fn create(
        definition: &RevocationRegistryDefinition,
        delta: &RevocationRegistryDelta,
        index: u32,
        timestamp: u64,
        tails: &mut impl TailsReader,
    ) -> CredxResult<Self> {
        if delta.from_epoch != 0 {
            return Err(Error::DeltaOutOfOrder);
        }
        let element = definition.element(index)?;
        if delta.revoked.contains(&index) {
            return Err(Error::CredentialRevoked);
        }
        let hash = tails.hash()?;
        if hash != definition.tails_hash {
            warn!("Tails hash mismatch for registry {}", definition.id);
            return Err(Error::InvalidTails(format!(
                "expected hash {} but found {}",
                definition.tails_hash, hash
            )));
        }
        let mut witness = decode_witness(&tails.read(TAILS_ENTRY_SIZE, tails_offset(index)?)?)?;
        witness.multi_batch_update_assign(element, &delta.element_updates(&definition.id))?;
        if !witness.verify(element, definition.public_key, delta.accum) {
            return Err(Error::InvalidAccumulator("witness does not match the accumulator"));
        }
        debug!(
            "Created revocation state for {} index {} at epoch {}",
            definition.id, index, delta.to_epoch
        );
        Ok(Self {
            witness,
            accum: delta.accum,
            epoch: delta.to_epoch,
            timestamp,
            rev_reg_index: index,
        })
    }

    /// Fold a delta that starts at this state's epoch
    pub fn refresh(
        &self,
        definition: &RevocationRegistryDefinition,
        delta: &RevocationRegistryDelta,
        timestamp: u64,
    ) -> CredxResult<Self> {
        if delta.from_epoch != self.epoch || delta.prev_accum != self.accum {
            return Err(Error::DeltaOutOfOrder);
        }
        if delta.revoked.contains(&self.rev_reg_index) {
            return Err(Error::CredentialRevoked);
        }
        let element = definition.element(self.rev_reg_index)?;
        let mut witness = self.witness;
        witness.multi_batch_update_assign(element, &delta.element_updates(&definition.id))?;
        if !witness.verify(element, definition.public_key, delta.accum) {
            return Err(Error::InvalidAccumulator("witness does not match the accumulator"));
        }
        Ok(Self {
            witness,
            accum: delta.accum,
            epoch: delta.to_epoch,
            timestamp,
            rev_reg_index: self.rev_reg_index,
        })
    }

    /// Whether the witness is valid for the state's accumulator
    pub fn verify(&self, definition: &RevocationRegistryDefinition) -> bool {
        definition
            .element(self.rev_reg_index)
            .map(|element| self.witness.verify(element, definition.public_key, self.accum))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::Error;
    use crate::issuer::{create_credential_definition, CredentialDefinitionConfig};
    use crate::schema::Schema;
    use rand_core::OsRng;
    use std::collections::BTreeSet;

    struct Setup {
        def: RevocationRegistryDefinition,
        private: RevocationRegistryDefinitionPrivate,
        registry: RevocationRegistry,
        initial: RevocationRegistryDelta,
        tails: TailsBuffer,
    }

    fn setup(issuance_type: IssuanceType) -> Setup {
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
            issuance_type,
            max_cred_num: 4,
        };
        let mut tails = TailsBuffer::new();
        let (def, private, registry, initial) =
            create_revocation_registry_def(&cred_def, "issuer", &config, "mem", &mut tails, OsRng)
                .unwrap();
        Setup {
            def,
            private,
            registry,
            initial,
            tails,
        }
    }

    fn follows_revocations(issuance_type: IssuanceType) {
        let mut s = setup(issuance_type);
        let (reg, d1) = s
            .registry
            .update(&s.def, &s.private, &BTreeSet::from([1, 2]), &BTreeSet::new())
            .unwrap();
        let delta = s.initial.merge(&d1).unwrap();
        let state = CredentialRevocationState::create(&s.def, &delta, 1, 10, &mut s.tails).unwrap();
        assert!(state.verify(&s.def));
        assert_eq!(state.epoch, 1);

        let (reg, d2) = reg.revoke(&s.def, &s.private, 2).unwrap();
        let state = state.refresh(&s.def, &d2, 20).unwrap();
        assert!(state.verify(&s.def));
        assert_eq!(state.accum, reg.accum);

        let (_, d3) = reg.revoke(&s.def, &s.private, 1).unwrap();
        assert_eq!(state.refresh(&s.def, &d3, 30).unwrap_err(), Error::CredentialRevoked);
        assert_eq!(state.refresh(&s.def, &d2, 30).unwrap_err(), Error::DeltaOutOfOrder);

        let all = delta.merge(&d2).unwrap().merge(&d3).unwrap();
        let res = CredentialRevocationState::create(&s.def, &all, 1, 40, &mut s.tails);
        assert_eq!(res.unwrap_err(), Error::CredentialRevoked);
        let unissued = CredentialRevocationState::create(&s.def, &all, 3, 40, &mut s.tails);
        match issuance_type {
            IssuanceType::IssuanceByDefault => assert!(unissued.is_ok(), "{:?}", unissued),
            IssuanceType::IssuanceOnDemand => assert!(unissued.is_err()),
        }
    }

    #[test]
    fn by_default_witness_follows_revocations() {
        follows_revocations(IssuanceType::IssuanceByDefault);
    }

    #[test]
    fn on_demand_witness_follows_revocations() {
        let mut s = setup(IssuanceType::IssuanceOnDemand);
        let (reg, d1) = s
            .registry
            .update(&s.def, &s.private, &BTreeSet::from([1]), &BTreeSet::new())
            .unwrap();
        let (reg, d2) = reg
            .update(&s.def, &s.private, &BTreeSet::from([2]), &BTreeSet::new())
            .unwrap();
        let (reg, d3) = reg.revoke(&s.def, &s.private, 1).unwrap();
        let delta = s.initial.merge(&d1).unwrap().merge(&d2).unwrap().merge(&d3).unwrap();
        let state = CredentialRevocationState::create(&s.def, &delta, 2, 10, &mut s.tails).unwrap();
        assert!(state.verify(&s.def));
        assert_eq!(state.accum, reg.accum);
    }

    #[test]
    fn on_demand_batch_issue_follows_revocations() {
        follows_revocations(IssuanceType::IssuanceOnDemand);
    }

    #[test]
    fn tampered_tails_are_rejected() {
        let s = setup(IssuanceType::IssuanceByDefault);
        let mut bytes = s.tails.as_bytes().to_vec();
        bytes[10] ^= 1;
        let mut tails = TailsBuffer::from_bytes(bytes);
        let res = CredentialRevocationState::create(&s.def, &s.initial, 1, 0, &mut tails);
        assert!(matches!(res, Err(Error::InvalidTails(_))));
    }
}
