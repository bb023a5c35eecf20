//! Revocation registries on top of the VB20 accumulator.
//!
//! Every registry index `i` maps to the accumulator element
//! `H(registry id || i)`. A credential is not revoked while its element
//! is in the accumulator. Issuers publish a [`RevocationRegistryDelta`]
//! for each change and holders fold those into their
//! [`CredentialRevocationState`].

mod delta;
mod registry;
mod registry_definition;
mod state;
mod tails;
mod writer;

pub use delta::*;
pub use registry::*;
pub use registry_definition::*;
pub use state::*;
pub use tails::*;
pub use writer::*;

use crate::knox::accumulator::vb20::Element;

/// The accumulator element for a registry index
pub fn index_element(rev_reg_id: &str, index: u32) -> Element {
    let mut data = Vec::with_capacity(rev_reg_id.len() + 4);
    data.extend_from_slice(rev_reg_id.as_bytes());
    data.extend_from_slice(&index.to_be_bytes());
    Element::hash(&data)
}

/// The elements for a list of indices
pub(crate) fn index_elements<'a, I>(rev_reg_id: &str, indices: I) -> Vec<Element>
where
    I: IntoIterator<Item = &'a u32>,
{
    indices
        .into_iter()
        .map(|i| index_element(rev_reg_id, *i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_are_bound_to_the_registry() {
        assert_eq!(index_element("reg", 1), index_element("reg", 1));
        assert_ne!(index_element("reg", 1), index_element("reg", 2));
        assert_ne!(index_element("reg", 1), index_element("other", 1));
        assert_eq!(index_elements("reg", &[1, 2]).len(), 2);
    }
}
