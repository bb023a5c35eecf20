use crate::error::Error;
use crate::utils::{deserialize_indexset, serialize_indexset};
use crate::CredxResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The attribute name reserved for the holder's link secret
pub const LINK_SECRET_NAME: &str = "master_secret";

/// A credential schema
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The unique identifier for this schema
    pub id: String,
    /// The schema author
    pub issuer_id: String,
    /// Friendly label
    pub name: String,
    /// The schema version
    pub version: String,
    /// The attribute names in signing order
    #[serde(
        serialize_with = "serialize_indexset",
        deserialize_with = "deserialize_indexset"
    )]
    pub attr_names: IndexSet<String>,
}

impl Schema {
    /// Create a new schema
    pub fn new<I, S>(issuer_id: &str, name: &str, version: &str, attr_names: I) -> CredxResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = IndexSet::new();
        let mut seen = IndexSet::new();
        for attr in attr_names {
            let attr = attr.into();
            let common = attr_common_view(&attr);
            if common.is_empty() || common == LINK_SECRET_NAME || !seen.insert(common) {
                return Err(Error::InvalidSchema);
            }
            names.insert(attr);
        }
        if names.is_empty() {
            return Err(Error::InvalidSchema);
        }
        Ok(Self {
            id: schema_id(issuer_id, name, version),
            issuer_id: issuer_id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            attr_names: names,
        })
    }

    /// The number of attributes
    pub fn len(&self) -> usize {
        self.attr_names.len()
    }

    /// True if the schema has no attributes
    pub fn is_empty(&self) -> bool {
        self.attr_names.is_empty()
    }

    /// The signature message index of `name`.
    ///
    /// Index 0 is the link secret so attributes start at 1.
    pub fn attr_index(&self, name: &str) -> Option<usize> {
        let target = attr_common_view(name);
        self.attr_names
            .iter()
            .position(|a| attr_common_view(a) == target)
            .map(|i| i + 1)
    }

    /// The attribute names in their common view
    pub fn common_names(&self) -> impl Iterator<Item = String> + '_ {
        self.attr_names.iter().map(|a| attr_common_view(a))
    }
}

/// The legacy schema identifier
pub fn schema_id(issuer_id: &str, name: &str, version: &str) -> String {
    format!("{}:2:{}:{}", issuer_id, name, version)
}

/// Attribute names compare with spaces removed and lower-cased
pub fn attr_common_view(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create() {
        let schema = Schema::new("did:sov:issuer", "gvt", "1.0", ["name", "Age", "sex"]).unwrap();
        assert_eq!(schema.id, "did:sov:issuer:2:gvt:1.0");
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.attr_index("name"), Some(1));
        assert_eq!(schema.attr_index("age"), Some(2));
        assert_eq!(schema.attr_index(" S E X"), Some(3));
        assert_eq!(schema.attr_index("height"), None);
    }

    #[test]
    fn rejects_bad_names() {
        let empty: [&str; 0] = [];
        assert_eq!(Schema::new("i", "s", "1", empty), Err(Error::InvalidSchema));
        assert_eq!(
            Schema::new("i", "s", "1", ["First Name", "firstname"]),
            Err(Error::InvalidSchema)
        );
        assert_eq!(
            Schema::new("i", "s", "1", ["name", "Master_Secret"]),
            Err(Error::InvalidSchema)
        );
        assert_eq!(Schema::new("i", "s", "1", ["  "]), Err(Error::InvalidSchema));
    }

    #[test]
    fn serde_keeps_order() {
        let schema = Schema::new("i", "s", "1", ["zip", "age", "city"]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
        assert_eq!(back.attr_index("city"), Some(3));
    }
}
