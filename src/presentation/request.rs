use crate::error::Error;
use crate::issuer::CredentialDefinition;
use crate::nonce::Nonce;
use crate::schema::Schema;
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a verifier asks a holder to prove
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    /// Binds the presentation to this request
    pub nonce: Nonce,
    /// A human readable name
    pub name: String,
    /// The request version
    pub version: String,
    /// Attributes to reveal or prove knowledge of, keyed by referent
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    /// Predicates to prove, keyed by referent
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    /// The interval for referents without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl PresentationRequest {
    /// Create an empty request with a fresh nonce
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            nonce: Nonce::new(),
            name: name.into(),
            version: version.into(),
            requested_attributes: BTreeMap::new(),
            requested_predicates: BTreeMap::new(),
            non_revoked: None,
        }
    }

    /// Check the request is well formed
    pub fn validate(&self) -> CredxResult<()> {
        for (referent, info) in &self.requested_attributes {
            if self.requested_predicates.contains_key(referent) {
                return Err(Error::InvalidInput(format!(
                    "referent '{}' is both an attribute and a predicate",
                    referent
                )));
            }
            match (&info.name, &info.names) {
                (Some(_), None) => {}
                (None, Some(names)) if !names.is_empty() => {}
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "attribute referent '{}' needs exactly one of name or names",
                        referent
                    )))
                }
            }
        }
        for interval in self
            .requested_attributes
            .values()
            .filter_map(|a| a.non_revoked.as_ref())
            .chain(self.requested_predicates.values().filter_map(|p| p.non_revoked.as_ref()))
            .chain(self.non_revoked.as_ref())
        {
            if let (Some(from), Some(to)) = (interval.from, interval.to) {
                if from > to {
                    return Err(Error::InvalidInput(format!(
                        "non-revocation interval {}..{} is empty",
                        from, to
                    )));
                }
            }
        }
        Ok(())
    }

    /// The interval that applies to an attribute referent
    pub fn attribute_interval(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_attributes
            .get(referent)
            .and_then(|a| a.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }

    /// The interval that applies to a predicate referent
    pub fn predicate_interval(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_predicates
            .get(referent)
            .and_then(|p| p.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }
}

/// A requested attribute or attribute group
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    /// A single attribute name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Several attributes revealed together from one credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    /// Acceptable credential sources, any one may match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    /// Overrides the request interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeInfo {
    /// Request one attribute
    pub fn name<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Request an attribute group
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Add an acceptable credential source
    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    /// Require non-revocation in `interval`
    pub fn with_non_revoked(mut self, interval: NonRevokedInterval) -> Self {
        self.non_revoked = Some(interval);
        self
    }

    /// The requested attribute names
    pub fn attr_names(&self) -> Vec<&str> {
        match (&self.name, &self.names) {
            (Some(name), _) => vec![name.as_str()],
            (None, Some(names)) => names.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Whether this requests an attribute group
    pub fn is_group(&self) -> bool {
        self.name.is_none() && self.names.is_some()
    }
}

/// The comparison a predicate makes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateType {
    /// Greater than or equal
    #[serde(rename = ">=")]
    GE,
    /// Greater than
    #[serde(rename = ">")]
    GT,
    /// Less than or equal
    #[serde(rename = "<=")]
    LE,
    /// Less than
    #[serde(rename = "<")]
    LT,
}

impl PredicateType {
    /// Whether `attr` compares to `value` as required
    pub fn holds(&self, attr: i64, value: i32) -> bool {
        let value = i64::from(value);
        match self {
            Self::GE => attr >= value,
            Self::GT => attr > value,
            Self::LE => attr <= value,
            Self::LT => attr < value,
        }
    }
}

/// A requested predicate over a numeric attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateInfo {
    /// The attribute name
    pub name: String,
    /// The comparison
    pub p_type: PredicateType,
    /// The value compared against
    pub p_value: i32,
    /// Acceptable credential sources, any one may match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    /// Overrides the request interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl PredicateInfo {
    /// Create a predicate without restrictions
    pub fn new<S: Into<String>>(name: S, p_type: PredicateType, p_value: i32) -> Self {
        Self {
            name: name.into(),
            p_type,
            p_value,
            restrictions: Vec::new(),
            non_revoked: None,
        }
    }

    /// The inclusive bound the range proof checks, as (lower, upper)
    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        let value = i64::from(self.p_value);
        match self.p_type {
            PredicateType::GE => (Some(value), None),
            PredicateType::GT => (Some(value + 1), None),
            PredicateType::LE => (None, Some(value)),
            PredicateType::LT => (None, Some(value - 1)),
        }
    }
}

/// Timestamps a credential must be shown unrevoked within
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    /// Earliest acceptable timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    /// Latest acceptable timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    /// Create an interval
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    /// Whether `timestamp` lies in the interval.
    ///
    /// In legacy mode only the upper bound is enforced.
    pub fn contains(&self, timestamp: u64, legacy: bool) -> bool {
        let after_from = legacy || self.from.map_or(true, |from| from <= timestamp);
        let before_to = self.to.map_or(true, |to| timestamp <= to);
        after_from && before_to
    }
}

/// Constraints on the credential that answers a referent.
///
/// Every field that is set must match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    /// The schema identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// The schema name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// The schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// The credential definition issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
    /// The credential definition identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
    /// The revocation registry identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
}

impl Restriction {
    /// Whether a credential with these sources satisfies the restriction
    pub fn matches(
        &self,
        schema: &Schema,
        cred_def: &CredentialDefinition,
        rev_reg_id: Option<&str>,
    ) -> bool {
        fn field(expected: &Option<String>, actual: Option<&str>) -> bool {
            expected.as_deref().map_or(true, |e| Some(e) == actual)
        }
        field(&self.schema_id, Some(&schema.id))
            && field(&self.schema_name, Some(&schema.name))
            && field(&self.schema_version, Some(&schema.version))
            && field(&self.issuer_id, Some(&cred_def.issuer_id))
            && field(&self.cred_def_id, Some(&cred_def.id))
            && field(&self.rev_reg_id, rev_reg_id)
    }
}

/// True when `restrictions` is empty or any one of them matches
pub fn restrictions_hold(
    restrictions: &[Restriction],
    schema: &Schema,
    cred_def: &CredentialDefinition,
    rev_reg_id: Option<&str>,
) -> bool {
    restrictions.is_empty()
        || restrictions
            .iter()
            .any(|r| r.matches(schema, cred_def, rev_reg_id))
}

/// Every referent named in the request
pub(crate) fn referents(request: &PresentationRequest) -> BTreeSet<&str> {
    request
        .requested_attributes
        .keys()
        .chain(request.requested_predicates.keys())
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{create_credential_definition, CredentialDefinitionConfig};
    use rand_core::OsRng;

    #[test]
    fn validation() {
        let mut request = PresentationRequest::new("proof", "1.0");
        request
            .requested_attributes
            .insert("attr1".to_string(), AttributeInfo::name("name"));
        assert!(request.validate().is_ok());

        request
            .requested_attributes
            .insert("attr2".to_string(), AttributeInfo::default());
        assert!(matches!(request.validate(), Err(Error::InvalidInput(_))));
        request.requested_attributes.remove("attr2");

        request.requested_predicates.insert(
            "attr1".to_string(),
            PredicateInfo::new("age", PredicateType::GE, 18),
        );
        assert!(matches!(request.validate(), Err(Error::InvalidInput(_))));
        request.requested_predicates.clear();

        request.non_revoked = Some(NonRevokedInterval::new(Some(10), Some(5)));
        assert!(matches!(request.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn local_interval_overrides_global() {
        let mut request = PresentationRequest::new("proof", "1.0");
        request.non_revoked = Some(NonRevokedInterval::new(None, Some(100)));
        request.requested_attributes.insert(
            "local".to_string(),
            AttributeInfo::name("name").with_non_revoked(NonRevokedInterval::new(Some(5), None)),
        );
        request
            .requested_attributes
            .insert("global".to_string(), AttributeInfo::name("name"));
        assert_eq!(request.attribute_interval("local").unwrap().from, Some(5));
        assert_eq!(request.attribute_interval("global").unwrap().to, Some(100));
    }

    #[test]
    fn predicate_bounds() {
        let p = |t, v| PredicateInfo::new("age", t, v);
        assert_eq!(p(PredicateType::GE, 18).bounds(), (Some(18), None));
        assert_eq!(p(PredicateType::GT, 18).bounds(), (Some(19), None));
        assert_eq!(p(PredicateType::LE, 18).bounds(), (None, Some(18)));
        assert_eq!(p(PredicateType::LT, 18).bounds(), (None, Some(17)));
        assert_eq!(p(PredicateType::LT, i32::MIN).bounds(), (None, Some(i32::MIN as i64 - 1)));
        assert!(PredicateType::GE.holds(18, 18));
        assert!(!PredicateType::GT.holds(18, 18));
        assert!(PredicateType::LT.holds(-5, 0));
    }

    #[test]
    fn intervals() {
        let interval = NonRevokedInterval::new(Some(10), Some(20));
        assert!(interval.contains(15, false));
        assert!(!interval.contains(5, false));
        assert!(interval.contains(5, true));
        assert!(!interval.contains(25, true));
    }

    #[test]
    fn restrictions() {
        let schema = Schema::new("issuer", "gvt", "1.0", ["name"]).unwrap();
        let (cred_def, _, _) = create_credential_definition(
            &schema,
            "issuer",
            "tag",
            CredentialDefinitionConfig::default(),
            OsRng,
        )
        .unwrap();
        let by_name = Restriction {
            schema_name: Some("gvt".to_string()),
            ..Default::default()
        };
        let by_issuer = Restriction {
            issuer_id: Some("other".to_string()),
            ..Default::default()
        };
        assert!(restrictions_hold(&[], &schema, &cred_def, None));
        assert!(restrictions_hold(&[by_name.clone()], &schema, &cred_def, None));
        assert!(!restrictions_hold(&[by_issuer.clone()], &schema, &cred_def, None));
        assert!(restrictions_hold(&[by_issuer, by_name], &schema, &cred_def, None));

        let by_registry = Restriction {
            rev_reg_id: Some("reg".to_string()),
            ..Default::default()
        };
        assert!(!by_registry.matches(&schema, &cred_def, None));
        assert!(by_registry.matches(&schema, &cred_def, Some("reg")));
    }

    #[test]
    fn legacy_json_shape() {
        let json = r#"{
            "nonce": "123456",
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {"attr1": {"name": "name", "restrictions": [{"schema_name": "gvt"}]}},
            "requested_predicates": {"pred1": {"name": "age", "p_type": ">=", "p_value": 18}},
            "non_revoked": {"to": 100}
        }"#;
        let request: PresentationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.requested_predicates["pred1"].p_type, PredicateType::GE);
        assert_eq!(request.non_revoked.unwrap().to, Some(100));
        assert_eq!(request.requested_attributes["attr1"].restrictions.len(), 1);
        let again: PresentationRequest =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(again, request);
    }
}
