use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use serde_json::{
    Map,
    Value,
};

use crate::claims::{
    Claim,
    ClaimKind,
};

/// Ordered, name-unique collection of [`Claim`]s.
///
/// Insertion order is kept so that serialization is deterministic; it carries
/// no other meaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimSet {
    claims: Vec<Claim>,
}

impl ClaimSet {
    /// Instantiate an empty [`ClaimSet`]
    #[must_use]
    pub const fn new() -> Self {
        Self { claims: Vec::new() }
    }

    /// Build a [`ClaimSet`] from a decoded claims object, preserving its key order
    #[must_use]
    pub fn from_plain_map(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(name, value)| Claim::new(name, value))
            .collect()
    }

    /// Return the set with `claim` added. A claim with the same name is replaced
    /// in place.
    #[must_use]
    pub fn with(mut self, claim: Claim) -> Self {
        self.insert(claim);
        self
    }

    fn insert(&mut self, claim: Claim) {
        match self.position(claim.name()) {
            Some(idx) => self.claims[idx] = claim,
            None => self.claims.push(claim),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.claims.iter().position(|c| c.name() == name)
    }

    /// Claim of the given kind
    #[must_use]
    pub fn get(&self, kind: &ClaimKind) -> Option<&Claim> {
        self.get_by_name(kind.name())
    }

    /// Claim with the given name
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Claim> {
        self.position(name).map(|idx| &self.claims[idx])
    }

    /// Raw value of the claim of the given kind
    #[must_use]
    pub fn value(&self, kind: &ClaimKind) -> Option<&Value> {
        self.get(kind).map(Claim::value)
    }

    /// Whether a claim of the given kind is present
    #[must_use]
    pub fn has(&self, kind: &ClaimKind) -> bool {
        self.has_name(kind.name())
    }

    /// Whether a claim with the given name is present
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of claims
    #[must_use]
    pub const fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the set holds no claims
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterate claims in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.claims.iter()
    }

    /// Iterate claim names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.claims.iter().map(Claim::name)
    }

    /// Flatten to an ordered mapping of claim name to raw value
    #[must_use]
    pub fn to_plain_map(&self) -> Map<String, Value> {
        self.claims
            .iter()
            .map(|c| (c.name().to_owned(), c.value().clone()))
            .collect()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<T: IntoIterator<Item = Claim>>(iter: T) -> Self {
        let mut set = Self::new();
        for claim in iter {
            set.insert(claim);
        }
        set
    }
}

impl From<Vec<Claim>> for ClaimSet {
    fn from(claims: Vec<Claim>) -> Self {
        claims.into_iter().collect()
    }
}

impl IntoIterator for ClaimSet {
    type Item = Claim;
    type IntoIter = std::vec::IntoIter<Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = &'a Claim;
    type IntoIter = std::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}

impl Serialize for ClaimSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.claims.iter().map(|c| (c.name(), c.value())))
    }
}

impl<'de> Deserialize<'de> for ClaimSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_plain_map)
    }
}
