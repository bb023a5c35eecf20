use blsful::inner_types::Scalar;
use indexmap::IndexSet;
use serde::{
    de::{DeserializeOwned, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserializer, Serialize, Serializer,
};
use std::{
    fmt::{self, Formatter},
    hash::Hash,
    marker::PhantomData,
};

pub const TOP_BIT: u64 = i64::MIN as u64;

/// Map a signed integer to a field element preserving its order
pub fn get_num_scalar(num: i64) -> Scalar {
    Scalar::from(zero_center(num))
}

/// Shift a signed integer into the unsigned range so that
/// `a < b` iff `zero_center(a) < zero_center(b)`
pub fn zero_center(num: i64) -> u64 {
    num as u64 ^ TOP_BIT
}

pub fn serialize_indexset<T: Serialize, S: Serializer>(
    set: &IndexSet<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    let mut i = s.serialize_seq(Some(set.len()))?;
    for e in set {
        i.serialize_element(e)?;
    }
    i.end()
}

pub fn deserialize_indexset<'de, T: Eq + Hash + DeserializeOwned, D: Deserializer<'de>>(
    d: D,
) -> Result<IndexSet<T>, D::Error> {
    struct IndexSetVisitor<TT: Eq + DeserializeOwned> {
        _marker: PhantomData<TT>,
    }

    impl<'de, TT: Eq + Hash + DeserializeOwned> Visitor<'de> for IndexSetVisitor<TT> {
        type Value = IndexSet<TT>;

        fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
            write!(formatter, "a sequence")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut set = IndexSet::new();
            while let Some(e) = seq.next_element()? {
                set.insert(e);
            }
            Ok(set)
        }
    }

    d.deserialize_seq(IndexSetVisitor::<T> {
        _marker: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_center_preserves_order() {
        assert_eq!(zero_center(i64::MIN), 0);
        assert_eq!(zero_center(0), TOP_BIT);
        assert_eq!(zero_center(i64::MAX), u64::MAX);
        assert!(zero_center(-1) < zero_center(0));
        assert!(zero_center(17) < zero_center(18));
    }

    #[test]
    fn indexset_keeps_insertion_order() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(
                serialize_with = "serialize_indexset",
                deserialize_with = "deserialize_indexset"
            )]
            names: IndexSet<String>,
        }
        let mut names = IndexSet::new();
        names.insert("zeta".to_string());
        names.insert("alpha".to_string());
        let json = serde_json::to_string(&Wrapper { names }).unwrap();
        assert_eq!(json, r#"{"names":["zeta","alpha"]}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.names.get_index(0).map(String::as_str), Some("zeta"));
    }
}
