use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use super::model::{OrgIndex, Organization, SourceFilter};

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub value: f64,
}

#[derive(Clone, Debug, Default)]
pub struct GraphData<'a> {
    pub nodes: Vec<&'a Organization>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("organization {org} lists partner {partner}, which is missing from the index")]
    MissingPartner { org: String, partner: String },
}

/// Builds the partnership graph for one filter setting.
///
/// Only pairs with `partner.stub > org.stub` are emitted, so a symmetric
/// partner map yields each pair once and never a self-loop. With a specific
/// source, both organizations must *participate* in that source; whether the
/// relationship itself came from it is not checked.
pub fn build(
    index: &OrgIndex,
    source: SourceFilter,
    humanitarian_only: bool,
) -> Result<GraphData<'_>, BuildError> {
    let key = source.partner_key();
    let mut nodes: BTreeMap<&str, &Organization> = BTreeMap::new();
    let mut edges = Vec::new();
    let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();

    for org in index.orgs.values() {
        if org.skip {
            continue;
        }

        for (partner_stub, weight) in org.partners.weights(key) {
            let partner = index
                .get(partner_stub)
                .ok_or_else(|| BuildError::MissingPartner {
                    org: org.stub.clone(),
                    partner: partner_stub.to_owned(),
                })?;

            if partner.stub <= org.stub || partner.skip {
                continue;
            }

            if let SourceFilter::Only(required) = source
                && !(org.participates_in(required) && partner.participates_in(required))
            {
                continue;
            }

            if humanitarian_only && !(org.humanitarian && partner.humanitarian) {
                continue;
            }

            // A partner listed under several scopes keeps its first weight.
            if !seen_pairs.insert((org.stub.as_str(), partner.stub.as_str())) {
                tracing::debug!(org = %org.stub, partner = %partner.stub, "duplicate partnership across scopes");
                continue;
            }

            edges.push(GraphEdge {
                source: org.stub.clone(),
                target: partner.stub.clone(),
                value: weight,
            });
            nodes.insert(org.stub.as_str(), org);
            nodes.insert(partner.stub.as_str(), partner);
        }
    }

    tracing::debug!(
        source = %source,
        humanitarian_only,
        nodes = nodes.len(),
        edges = edges.len(),
        "built partnership graph"
    );

    Ok(GraphData {
        nodes: nodes.into_values().collect(),
        edges,
    })
}
