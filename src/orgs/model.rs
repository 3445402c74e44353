use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Data sets an organization can be reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    ThreeW,
    Iati,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Self::ThreeW => "3W",
            Self::Iati => "IATI",
        }
    }

    /// Exact match against the labels used in `sources`.
    pub(crate) fn from_label(label: &str) -> Option<Self> {
        match label {
            "3W" => Some(Self::ThreeW),
            "IATI" => Some(Self::Iati),
            _ => None,
        }
    }
}

/// Outer key of the canonical partner map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartnerKey {
    All,
    ThreeW,
    Iati,
}

impl PartnerKey {
    pub const ALL: [PartnerKey; 3] = [PartnerKey::All, PartnerKey::ThreeW, PartnerKey::Iati];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ThreeW => "3w",
            Self::Iati => "iati",
        }
    }

    pub(crate) fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.wire_name() == name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceFilter {
    #[default]
    Both,
    Only(Source),
}

impl SourceFilter {
    pub const CHOICES: [SourceFilter; 3] = [
        SourceFilter::Both,
        SourceFilter::Only(Source::ThreeW),
        SourceFilter::Only(Source::Iati),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Both => "Both",
            Self::Only(source) => source.label(),
        }
    }

    pub fn partner_key(self) -> PartnerKey {
        match self {
            Self::Both => PartnerKey::All,
            Self::Only(Source::ThreeW) => PartnerKey::ThreeW,
            Self::Only(Source::Iati) => PartnerKey::Iati,
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceFilterError {
    #[error("unknown source filter {0:?}; expected one of Both, 3W, IATI")]
    UnknownSource(String),
}

impl FromStr for SourceFilter {
    type Err = SourceFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("both") || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::Both);
        }

        if trimmed.eq_ignore_ascii_case("3w") {
            return Ok(Self::Only(Source::ThreeW));
        }
        if trimmed.eq_ignore_ascii_case("iati") {
            return Ok(Self::Only(Source::Iati));
        }

        Err(SourceFilterError::UnknownSource(value.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Regional,
    International,
    Unknown,
    Other(String),
}

impl Scope {
    pub fn parse(value: &str) -> Self {
        match value {
            "local" => Self::Local,
            "regional" => Self::Regional,
            "international" => Self::International,
            "unknown" | "" => Self::Unknown,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Regional => "regional",
            Self::International => "international",
            Self::Unknown => "unknown",
            Self::Other(value) => value.as_str(),
        }
    }
}

/// scope -> partner stub -> weight
pub type ScopedWeights = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partners {
    by_key: BTreeMap<PartnerKey, ScopedWeights>,
}

impl Partners {
    pub(crate) fn from_keyed(by_key: BTreeMap<PartnerKey, ScopedWeights>) -> Self {
        Self { by_key }
    }

    pub(crate) fn from_flat(weights: ScopedWeights) -> Self {
        let by_key = PartnerKey::ALL
            .into_iter()
            .map(|key| (key, weights.clone()))
            .collect();
        Self { by_key }
    }

    #[cfg(test)]
    pub fn scoped(&self, key: PartnerKey) -> Option<&ScopedWeights> {
        self.by_key.get(&key)
    }

    /// Partner stubs and weights for `key`, flattened across scopes.
    pub fn weights(&self, key: PartnerKey) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.by_key
            .get(&key)
            .into_iter()
            .flat_map(|scopes| scopes.values())
            .flat_map(|partners| {
                partners
                    .iter()
                    .map(|(stub, weight)| (stub.as_str(), *weight))
            })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_key
            .values()
            .all(|scopes| scopes.values().all(BTreeMap::is_empty))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Organization {
    pub stub: String,
    pub name: String,
    pub scope: Scope,
    pub skip: bool,
    pub sources: BTreeSet<Source>,
    pub humanitarian: bool,
    pub partners: Partners,
}

impl Organization {
    pub fn participates_in(&self, source: Source) -> bool {
        self.sources.contains(&source)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrgIndex {
    pub orgs: BTreeMap<String, Organization>,
}

impl OrgIndex {
    pub fn len(&self) -> usize {
        self.orgs.len()
    }

    pub fn get(&self, stub: &str) -> Option<&Organization> {
        self.orgs.get(stub)
    }

    pub fn skipped_count(&self) -> usize {
        self.orgs.values().filter(|org| org.skip).count()
    }
}
