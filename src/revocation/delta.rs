use super::{index_elements, AccumulatorUpdate, RevocationRegistry};
use crate::error::Error;
use crate::knox::accumulator::vb20::{Accumulator, Coefficient, Element};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The change between two epochs of a revocation registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDelta {
    /// The accumulator at `from_epoch`
    pub prev_accum: Accumulator,
    /// The accumulator at `to_epoch`
    pub accum: Accumulator,
    /// The first epoch covered
    pub from_epoch: u64,
    /// The epoch reached
    pub to_epoch: u64,
    /// Indices issued in between
    pub issued: BTreeSet<u32>,
    /// Indices revoked in between
    pub revoked: BTreeSet<u32>,
    /// The accumulator updates in the order they were applied
    pub updates: Vec<AccumulatorUpdate>,
}

impl RevocationRegistryDelta {
    /// The empty delta at the registry's current epoch
    pub fn initial(registry: &RevocationRegistry) -> Self {
        Self {
            prev_accum: registry.accum,
            accum: registry.accum,
            from_epoch: registry.epoch,
            to_epoch: registry.epoch,
            issued: registry.issued.clone(),
            revoked: registry.revoked.clone(),
            updates: Vec::new(),
        }
    }

    /// Append `next`, which must start where this delta ends
    pub fn merge(&self, next: &Self) -> CredxResult<Self> {
        if self.to_epoch != next.from_epoch || self.accum != next.prev_accum {
            return Err(Error::DeltaOutOfOrder);
        }
        let mut updates = self.updates.clone();
        updates.extend_from_slice(&next.updates);
        Ok(Self {
            prev_accum: self.prev_accum,
            accum: next.accum,
            from_epoch: self.from_epoch,
            to_epoch: next.to_epoch,
            issued: self.issued.union(&next.issued).copied().collect(),
            revoked: self.revoked.union(&next.revoked).copied().collect(),
            updates,
        })
    }

    /// Whether no epoch is covered
    pub fn is_empty(&self) -> bool {
        self.from_epoch == self.to_epoch
    }

    /// The updates as element batches for witness folding
    pub(crate) fn element_updates(
        &self,
        rev_reg_id: &str,
    ) -> Vec<(Vec<Element>, Vec<Element>, Vec<Coefficient>)> {
        self.updates
            .iter()
            .map(|u| {
                (
                    index_elements(rev_reg_id, &u.additions),
                    index_elements(rev_reg_id, &u.deletions),
                    u.coefficients.clone(),
                )
            })
            .collect()
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

    fn deltas() -> (RevocationRegistryDelta, Vec<RevocationRegistryDelta>) {
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
            max_cred_num: 5,
        };
        let (def, private, reg, initial) = create_revocation_registry_def(
            &cred_def,
            "issuer",
            &config,
            "mem",
            &mut TailsBuffer::new(),
            OsRng,
        )
        .unwrap();
        let (reg, d1) = reg
            .update(&def, &private, &BTreeSet::from([1, 2]), &BTreeSet::new())
            .unwrap();
        let (reg, d2) = reg.revoke(&def, &private, 1).unwrap();
        let (_, d3) = reg
            .update(&def, &private, &BTreeSet::from([3]), &BTreeSet::from([2]))
            .unwrap();
        (initial, vec![d1, d2, d3])
    }

    #[test]
    fn merge_is_associative() {
        let (initial, d) = deltas();
        let left = d[0].merge(&d[1]).unwrap().merge(&d[2]).unwrap();
        let right = d[0].merge(&d[1].merge(&d[2]).unwrap()).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.from_epoch, 0);
        assert_eq!(left.to_epoch, 3);
        assert_eq!(left.issued, BTreeSet::from([1, 2, 3]));
        assert_eq!(left.revoked, BTreeSet::from([1, 2]));
        assert_eq!(left.updates.len(), 3);

        let from_start = initial.merge(&left).unwrap();
        assert_eq!(from_start.accum, left.accum);
        assert!(initial.is_empty());
    }

    #[test]
    fn out_of_order_merge_is_rejected() {
        let (_, d) = deltas();
        assert_eq!(d[1].merge(&d[0]).unwrap_err(), Error::DeltaOutOfOrder);
        assert_eq!(d[0].merge(&d[2]).unwrap_err(), Error::DeltaOutOfOrder);
    }
}
