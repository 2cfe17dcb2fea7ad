//! Atoms and datums (RFC 7047 section 5.1).

use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    Integer(i64),
    Boolean(bool),
    String(String),
    Uuid(Uuid),
    /// Temporary name of a row inserted earlier in the same batch.
    NamedUuid(String),
}

impl Atom {
    pub fn string(s: impl Into<String>) -> Self {
        Atom::String(s.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Atom::NamedUuid(name.into())
    }

    /// Returns the temporary name if this atom is a forward reference.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Atom::NamedUuid(name) => Some(name),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Atom::Integer(i) => json!(i),
            Atom::Boolean(b) => json!(b),
            Atom::String(s) => json!(s),
            Atom::Uuid(u) => json!(["uuid", u.to_string()]),
            Atom::NamedUuid(n) => json!(["named-uuid", n]),
        }
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::String(s.to_string())
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Atom::String(s)
    }
}

impl From<i64> for Atom {
    fn from(i: i64) -> Self {
        Atom::Integer(i)
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Self {
        Atom::Boolean(b)
    }
}

impl From<Uuid> for Atom {
    fn from(u: Uuid) -> Self {
        Atom::Uuid(u)
    }
}

/// A column value: a scalar, a set or a map.
///
/// Sets and maps are kept ordered so two datums built from the same
/// content compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    Atom(Atom),
    Set(BTreeSet<Atom>),
    Map(BTreeMap<Atom, Atom>),
}

impl Datum {
    /// A set holding zero or one element (an optional column).
    pub fn optional(atom: Option<Atom>) -> Self {
        Datum::Set(atom.into_iter().collect())
    }

    pub fn set<I, A>(items: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
    {
        Datum::Set(items.into_iter().map(Into::into).collect())
    }

    /// A string-to-string map.
    pub fn string_map(map: &BTreeMap<String, String>) -> Self {
        Datum::Map(
            map.iter()
                .map(|(k, v)| (Atom::string(k.as_str()), Atom::string(v.as_str())))
                .collect(),
        )
    }

    /// Collects every temporary name referenced by this datum.
    pub fn named_refs(&self) -> Vec<&str> {
        match self {
            Datum::Atom(a) => a.as_named().into_iter().collect(),
            Datum::Set(s) => s.iter().filter_map(Atom::as_named).collect(),
            Datum::Map(m) => m
                .iter()
                .flat_map(|(k, v)| [k.as_named(), v.as_named()])
                .flatten()
                .collect(),
        }
    }

    /// Encodes the datum; a one-element set is written as the bare atom.
    pub fn to_json(&self) -> Value {
        match self {
            Datum::Atom(a) => a.to_json(),
            Datum::Set(s) if s.len() == 1 => s.iter().next().map(Atom::to_json).unwrap_or(Value::Null),
            Datum::Set(s) => json!(["set", s.iter().map(Atom::to_json).collect::<Vec<_>>()]),
            Datum::Map(m) => json!([
                "map",
                m.iter()
                    .map(|(k, v)| json!([k.to_json(), v.to_json()]))
                    .collect::<Vec<_>>()
            ]),
        }
    }
}

impl From<Atom> for Datum {
    fn from(atom: Atom) -> Self {
        Datum::Atom(atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_atom_json() {
        let u = Uuid::nil();
        assert_eq!(Atom::from(u).to_json(), json!(["uuid", u.to_string()]));
        assert_eq!(Atom::named("Bridge_br0").to_json(), json!(["named-uuid", "Bridge_br0"]));
        assert_eq!(Atom::from(7i64).to_json(), json!(7));
    }

    #[test]
    fn test_set_json() {
        assert_eq!(Datum::set(["secure"]).to_json(), json!("secure"));
        assert_eq!(Datum::optional(None).to_json(), json!(["set", []]));
        assert_eq!(
            Datum::set([1i64, 2i64]).to_json(),
            json!(["set", [1, 2]])
        );
    }

    #[test]
    fn test_map_json() {
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "v".to_string());
        assert_eq!(Datum::string_map(&map).to_json(), json!(["map", [["k", "v"]]]));
    }

    #[test]
    fn test_named_refs() {
        let datum = Datum::set([Atom::named("Port_eth0"), Atom::from(Uuid::nil())]);
        assert_eq!(datum.named_refs(), vec!["Port_eth0"]);

        let mut map = BTreeMap::new();
        map.insert(Atom::Integer(0), Atom::named("QUEUE7131"));
        assert_eq!(Datum::Map(map).named_refs(), vec!["QUEUE7131"]);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        assert_eq!(Datum::set([3i64, 1i64]), Datum::set([1i64, 3i64]));
    }
}
