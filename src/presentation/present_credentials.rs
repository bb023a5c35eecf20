use crate::credential::Credential;
use crate::revocation::CredentialRevocationState;
use std::collections::BTreeSet;

/// The credentials a holder uses to answer a presentation request
#[derive(Debug, Default)]
pub struct PresentCredentials<'p> {
    pub(crate) entries: Vec<PresentCredential<'p>>,
}

#[derive(Debug)]
pub(crate) struct PresentCredential<'p> {
    pub cred: &'p Credential,
    pub timestamp: Option<u64>,
    pub rev_state: Option<&'p CredentialRevocationState>,
    pub requested_attributes: BTreeSet<(String, bool)>,
    pub requested_predicates: BTreeSet<String>,
}

impl<'p> PresentCredential<'p> {
    pub fn referents(&self) -> impl Iterator<Item = &str> {
        self.requested_attributes
            .iter()
            .map(|(r, _)| r.as_str())
            .chain(self.requested_predicates.iter().map(String::as_str))
    }
}

impl<'p> PresentCredentials<'p> {
    /// Start an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a credential in the presentation.
    ///
    /// `timestamp` and `rev_state` are needed when a referent answered by
    /// this credential must be shown unrevoked.
    pub fn add_credential(
        &mut self,
        cred: &'p Credential,
        timestamp: Option<u64>,
        rev_state: Option<&'p CredentialRevocationState>,
    ) -> AddCredential<'_, 'p> {
        let index = self.entries.len();
        self.entries.push(PresentCredential {
            cred,
            timestamp,
            rev_state,
            requested_attributes: BTreeSet::new(),
            requested_predicates: BTreeSet::new(),
        });
        AddCredential {
            present: self,
            index,
        }
    }

    /// The number of credentials
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no credential was added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assigns referents to a credential added with
/// [`PresentCredentials::add_credential`]
#[derive(Debug)]
pub struct AddCredential<'a, 'p> {
    present: &'a mut PresentCredentials<'p>,
    index: usize,
}

impl AddCredential<'_, '_> {
    /// Answer an attribute referent, revealing its value or not
    pub fn add_requested_attribute<S: Into<String>>(&mut self, referent: S, revealed: bool) {
        self.present.entries[self.index]
            .requested_attributes
            .insert((referent.into(), revealed));
    }

    /// Answer a predicate referent
    pub fn add_requested_predicate<S: Into<String>>(&mut self, referent: S) {
        self.present.entries[self.index]
            .requested_predicates
            .insert(referent.into());
    }
}
