use super::{
    index_elements, IssuanceType, RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate, RevocationRegistryDelta,
};
use crate::error::Error;
use crate::knox::accumulator::vb20::{Accumulator, Coefficient};
use crate::CredxResult;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One batch change of the accumulator and the coefficients holders
/// need to follow it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorUpdate {
    /// Indices whose elements were added
    pub additions: Vec<u32>,
    /// Indices whose elements were removed
    pub deletions: Vec<u32>,
    /// The witness update polynomial
    pub coefficients: Vec<Coefficient>,
}

/// The issuer's view of a revocation registry at one epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistry {
    /// The registry definition identifier
    pub rev_reg_def_id: String,
    /// The accumulator value
    pub accum: Accumulator,
    /// Counts published mutations
    pub epoch: u64,
    /// Indices assigned to credentials, including revoked ones
    pub issued: BTreeSet<u32>,
    /// Indices that were revoked
    pub revoked: BTreeSet<u32>,
    /// The registry capacity
    pub max_cred_num: u32,
    /// How indices enter the accumulator
    pub issuance_type: IssuanceType,
}

impl RevocationRegistry {
    /// The registry at epoch zero with no index in use
    pub fn new(definition: &RevocationRegistryDefinition, accum: Accumulator) -> Self {
        Self {
            rev_reg_def_id: definition.id.clone(),
            accum,
            epoch: 0,
            issued: BTreeSet::new(),
            revoked: BTreeSet::new(),
            max_cred_num: definition.max_cred_num,
            issuance_type: definition.issuance_type,
        }
    }

    /// The lowest index that was never used
    pub fn next_free_index(&self) -> CredxResult<u32> {
        (1..=self.max_cred_num)
            .find(|i| !self.issued.contains(i) && !self.revoked.contains(i))
            .ok_or(Error::RegistryFull)
    }

    /// Whether `index` was issued and is not revoked
    pub fn is_active(&self, index: u32) -> bool {
        self.issued.contains(&index) && !self.revoked.contains(&index)
    }

    /// Apply a batch of issuances and revocations.
    ///
    /// Either every index is valid and the whole batch is applied, or the
    /// registry is left as it was. The new registry is returned with the
    /// delta to publish.
    pub fn update(
        &self,
        definition: &RevocationRegistryDefinition,
        private: &RevocationRegistryDefinitionPrivate,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> CredxResult<(Self, RevocationRegistryDelta)> {
        if definition.id != self.rev_reg_def_id {
            return Err(Error::InvalidInput(format!(
                "registry '{}' is not defined by '{}'",
                self.rev_reg_def_id, definition.id
            )));
        }
        if let Some(index) = issued.intersection(revoked).next() {
            return Err(Error::InvalidInput(format!(
                "index {} is both issued and revoked",
                index
            )));
        }
        for &index in issued {
            definition.check_index(index)?;
            if self.revoked.contains(&index) {
                return Err(Error::IndexAlreadyRevoked(index));
            }
            if self.issued.contains(&index) {
                return Err(Error::IndexAlreadyIssued(index));
            }
        }
        for &index in revoked {
            definition.check_index(index)?;
            if self.revoked.contains(&index) {
                return Err(Error::IndexAlreadyRevoked(index));
            }
            if !self.issued.contains(&index) {
                return Err(Error::IndexNotIssued(index));
            }
        }

        let additions = match self.issuance_type {
            IssuanceType::IssuanceOnDemand => issued.iter().copied().collect::<Vec<_>>(),
            IssuanceType::IssuanceByDefault => Vec::new(),
        };
        let deletions = revoked.iter().copied().collect::<Vec<_>>();

        let mut next = self.clone();
        let mut updates = Vec::new();
        if !additions.is_empty() || !deletions.is_empty() {
            let coefficients = next.accum.update_assign(
                &private.secret_key,
                &index_elements(&self.rev_reg_def_id, &additions),
                &index_elements(&self.rev_reg_def_id, &deletions),
            )?;
            updates.push(AccumulatorUpdate {
                additions,
                deletions,
                coefficients,
            });
        }
        next.issued.extend(issued);
        next.revoked.extend(revoked);
        next.epoch += 1;

        debug!(
            "Registry {} moved to epoch {}: {} issued, {} revoked",
            next.rev_reg_def_id,
            next.epoch,
            issued.len(),
            revoked.len()
        );
        let delta = RevocationRegistryDelta {
            prev_accum: self.accum,
            accum: next.accum,
            from_epoch: self.epoch,
            to_epoch: next.epoch,
            issued: issued.clone(),
            revoked: revoked.clone(),
            updates,
        };
        Ok((next, delta))
    }

    /// Revoke a single index
    pub fn revoke(
        &self,
        definition: &RevocationRegistryDefinition,
        private: &RevocationRegistryDefinitionPrivate,
        index: u32,
    ) -> CredxResult<(Self, RevocationRegistryDelta)> {
        self.update(
            definition,
            private,
            &BTreeSet::new(),
            &BTreeSet::from([index]),
        )
    }
}
