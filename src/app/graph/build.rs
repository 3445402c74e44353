use crate::orgs::build;

use super::super::{FilterParams, ViewModel};
use super::super::session::RenderSession;

impl ViewModel {
    /// Drops the current session and builds a new one for the current filters.
    pub(in crate::app) fn apply_filters(&mut self) {
        self.session = None;
        self.build_error = None;
        self.search_match_cache = None;
        self.view_transition = None;
        self.fit_requested = false;
        self.filters_dirty = false;
        self.session_revision = self.session_revision.wrapping_add(1);

        let FilterParams {
            source,
            humanitarian_only,
        } = self.filters;

        let graph = match build(&self.index, source, humanitarian_only) {
            Ok(graph) => graph,
            Err(error) => {
                tracing::error!(%source, humanitarian_only, "graph build rejected: {error}");
                self.build_error = Some(error.to_string());
                return;
            }
        };

        if graph.nodes.is_empty() {
            tracing::info!(%source, humanitarian_only, "no partnerships match the filters");
            return;
        }

        match RenderSession::new(&graph, self.session_revision) {
            Ok(session) => {
                tracing::info!(
                    %source,
                    humanitarian_only,
                    nodes = session.nodes.len(),
                    edges = session.edges.len(),
                    "rebuilt partnership graph"
                );
                self.session = Some(session);
            }
            Err(error) => {
                tracing::error!(%source, humanitarian_only, "render session rejected: {error:#}");
                self.build_error = Some(format!("{error:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::orgs::{OrgIndex, SourceFilter, parse_org_index};

    fn index_from(raw: serde_json::Value) -> OrgIndex {
        parse_org_index(&raw.to_string()).unwrap()
    }

    fn linked_index() -> OrgIndex {
        index_from(json!({
            "a": { "sources": ["3W"], "partners": { "all": { "local": { "b": 2 } } } },
            "b": { "sources": ["3W"], "partners": { "all": { "local": { "a": 2 } } } }
        }))
    }

    #[test]
    fn successful_build_creates_a_session() {
        let mut model = ViewModel::new(linked_index(), FilterParams::default());
        model.apply_filters();

        assert!(!model.filters_dirty);
        assert!(model.build_error.is_none());
        let session = model.session.as_ref().unwrap();
        assert_eq!(session.nodes.len(), 2);
        assert_eq!(session.edges.len(), 1);
        assert_eq!(session.revision, model.session_revision);
    }

    #[test]
    fn failed_rebuild_leaves_no_stale_session() {
        let mut model = ViewModel::new(linked_index(), FilterParams::default());
        model.apply_filters();
        assert!(model.session.is_some());

        model.replace_index(index_from(json!({
            "a": { "partners": { "all": { "local": { "ghost": 1 } } } }
        })));
        assert!(model.filters_dirty);
        model.apply_filters();

        assert!(model.session.is_none());
        let error = model.build_error.as_deref().unwrap();
        assert!(error.contains("ghost"), "{error}");
    }

    #[test]
    fn empty_filtered_graph_has_no_session_and_no_error() {
        let mut model = ViewModel::new(
            linked_index(),
            FilterParams {
                source: SourceFilter::Both,
                humanitarian_only: true,
            },
        );
        model.apply_filters();

        assert!(model.session.is_none());
        assert!(model.build_error.is_none());
    }

    #[test]
    fn rebuild_bumps_the_revision_and_clears_view_state() {
        let mut model = ViewModel::new(linked_index(), FilterParams::default());
        model.apply_filters();
        let first = model.session_revision;

        model.fit_requested = true;
        model.filters.source = SourceFilter::Only(crate::orgs::Source::Iati);
        model.apply_filters();

        assert_eq!(model.session_revision, first + 1);
        assert!(!model.fit_requested);
        assert!(model.view_transition.is_none());
        assert!(model.session.is_none());
    }
}
