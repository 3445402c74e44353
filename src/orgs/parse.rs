use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::model::{OrgIndex, Organization, PartnerKey, Partners, Scope, ScopedWeights, Source};

#[derive(Clone, Debug, Default, Deserialize)]
struct RawInfo {
    #[serde(default)]
    stub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    skip: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct RawOrg {
    #[serde(default)]
    info: RawInfo,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    humanitarian: bool,
    #[serde(default)]
    partners: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PartnersLayout {
    SourceKeyed,
    Flattened,
}

pub(crate) fn parse_org_index(raw: &str) -> Result<OrgIndex> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in organization index")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("organization index must be a JSON object keyed by stub"))?;

    let mut orgs = BTreeMap::new();
    for (key, value) in object {
        let raw_org = RawOrg::deserialize(value)
            .with_context(|| format!("invalid organization record {key:?}"))?;
        let org = normalize_org(key, raw_org)?;
        if org.stub != *key {
            bail!("organization record {key:?} carries stub {:?}", org.stub);
        }
        if orgs.insert(org.stub.clone(), org).is_some() {
            bail!("organization stub {key:?} appears more than once");
        }
    }

    if orgs.is_empty() {
        return Err(anyhow!("organization index contained no organizations"));
    }

    Ok(OrgIndex { orgs })
}

fn normalize_org(key: &str, raw: RawOrg) -> Result<Organization> {
    let stub = raw
        .info
        .stub
        .filter(|stub| !stub.is_empty())
        .unwrap_or_else(|| key.to_owned());

    let mut sources = BTreeSet::new();
    for label in &raw.sources {
        match Source::from_label(label) {
            Some(source) => {
                sources.insert(source);
            }
            None => tracing::debug!(%stub, source = %label, "ignoring unrecognized source"),
        }
    }

    let partners = normalize_partners(&stub, &raw.partners)?;

    Ok(Organization {
        name: raw.info.name.unwrap_or_else(|| stub.clone()),
        scope: Scope::parse(raw.info.scope.as_deref().unwrap_or("unknown")),
        skip: raw.info.skip,
        sources,
        humanitarian: raw.humanitarian,
        partners,
        stub,
    })
}

fn normalize_partners(stub: &str, value: &Value) -> Result<Partners> {
    let outer = match value {
        Value::Null => return Ok(Partners::default()),
        Value::Object(outer) => outer,
        _ => bail!("organization {stub}: partners must be an object"),
    };

    let Some(layout) = detect_layout(stub, outer)? else {
        return Ok(Partners::default());
    };

    match layout {
        PartnersLayout::Flattened => Ok(Partners::from_flat(parse_scoped(stub, value)?)),
        PartnersLayout::SourceKeyed => {
            let mut by_key = BTreeMap::new();
            for (name, scoped) in outer {
                let Some(key) = PartnerKey::from_wire_name(name) else {
                    tracing::warn!(%stub, key = %name, "ignoring unrecognized partner source key");
                    continue;
                };
                by_key.insert(key, parse_scoped(stub, scoped)?);
            }
            Ok(Partners::from_keyed(by_key))
        }
    }
}

/// Looks two levels down: numbers there mean scope -> stub -> weight,
/// objects mean a source layer on top. `None` when no level holds any entry.
fn detect_layout(stub: &str, outer: &Map<String, Value>) -> Result<Option<PartnersLayout>> {
    let mut layout = None;

    for (outer_key, middle) in outer {
        let middle = middle.as_object().ok_or_else(|| {
            anyhow!("organization {stub}: partners entry {outer_key:?} must be an object")
        })?;

        for (middle_key, inner) in middle {
            let found = match inner {
                Value::Number(_) => PartnersLayout::Flattened,
                Value::Object(_) => PartnersLayout::SourceKeyed,
                _ => bail!(
                    "organization {stub}: unrecognized partners layout at {outer_key}.{middle_key}"
                ),
            };

            match layout {
                None => layout = Some(found),
                Some(existing) if existing != found => bail!(
                    "organization {stub}: partners mixes source-keyed and flattened layouts"
                ),
                Some(_) => {}
            }
        }
    }

    Ok(layout)
}

fn parse_scoped(stub: &str, value: &Value) -> Result<ScopedWeights> {
    let scopes = value
        .as_object()
        .ok_or_else(|| anyhow!("organization {stub}: partner scopes must be an object"))?;

    let mut weights = ScopedWeights::new();
    for (scope, partners) in scopes {
        let partners = partners.as_object().ok_or_else(|| {
            anyhow!("organization {stub}: partners for scope {scope:?} must be an object")
        })?;

        let entry = weights.entry(scope.clone()).or_default();
        for (partner, weight) in partners {
            let weight = weight.as_f64().ok_or_else(|| {
                anyhow!("organization {stub}: weight for partner {partner:?} is not a number")
            })?;
            entry.insert(partner.clone(), weight);
        }
    }

    Ok(weights)
}
