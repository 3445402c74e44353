use std::collections::BTreeMap;

use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;

struct PartnerRow {
    stub: String,
    name: String,
    value: f64,
    drawn: bool,
}

impl ViewModel {
    /// Partners recorded for `stub` under the active source, drawn ones first.
    fn partner_rows(&self, stub: &str) -> Vec<PartnerRow> {
        let Some(org) = self.index.get(stub) else {
            return Vec::new();
        };

        let drawn_index = self
            .session
            .as_ref()
            .and_then(|session| session.index_by_stub.get(stub).map(|index| (session, *index)));

        let mut weights = BTreeMap::new();
        for (partner, value) in org.partners.weights(self.filters.source.partner_key()) {
            if partner != stub {
                weights.entry(partner).or_insert(value);
            }
        }

        let mut rows = weights
            .into_iter()
            .map(|(partner, value)| {
                let drawn = drawn_index.is_some_and(|(session, index)| {
                    session
                        .index_by_stub
                        .get(partner)
                        .is_some_and(|other| session.is_neighbor(index, *other))
                });
                PartnerRow {
                    stub: partner.to_owned(),
                    name: self
                        .index
                        .get(partner)
                        .map_or_else(|| partner.to_owned(), |org| org.name.clone()),
                    value,
                    drawn,
                }
            })
            .collect::<Vec<_>>();

        rows.sort_by(|a, b| {
            b.drawn
                .cmp(&a.drawn)
                .then_with(|| b.value.total_cmp(&a.value))
                .then_with(|| a.stub.cmp(&b.stub))
        });
        rows
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Organization");
        ui.add_space(6.0);

        let Some(selected) = self.selected.clone() else {
            ui.label("Click a node to inspect the organization.");
            return;
        };

        let Some(org) = self.index.get(&selected) else {
            ui.label("The selected organization is no longer in the index.");
            return;
        };

        ui.label(RichText::new(org.name.as_str()).strong());
        ui.small(org.stub.as_str());
        ui.add_space(6.0);

        ui.label(format!("Scope: {}", org.scope.label()));
        let sources = org
            .sources
            .iter()
            .map(|source| source.label())
            .collect::<Vec<_>>();
        ui.label(format!(
            "Sources: {}",
            if sources.is_empty() {
                "none".to_owned()
            } else {
                sources.join(", ")
            }
        ));
        ui.label(format!(
            "Humanitarian: {}",
            if org.humanitarian { "yes" } else { "no" }
        ));
        if org.skip {
            ui.label("Excluded from the graph (skip).");
        }

        let in_graph = self
            .session
            .as_ref()
            .is_some_and(|session| session.index_by_stub.contains_key(&selected));
        if !in_graph && !org.skip {
            ui.label("Not drawn with the current filters.");
        }

        ui.separator();
        ui.label(
            RichText::new(format!(
                "Partners ({} source)",
                self.filters.source.label()
            ))
            .strong(),
        );

        let rows = self.partner_rows(&selected);
        if rows.is_empty() {
            ui.label("No partners recorded for this source.");
            return;
        }

        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("partner_rows_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, rows.len(), |ui, row_range| {
                for row in &rows[row_range] {
                    let label = format!(
                        "{}  ({})  [{}]",
                        row.name,
                        row.value,
                        if row.drawn { "drawn" } else { "filtered" }
                    );
                    if ui.link(label).on_hover_text(row.stub.as_str()).clicked() {
                        next_selection = Some(row.stub.clone());
                    }
                }
            });

        if let Some(stub) = next_selection {
            self.set_selected(Some(stub));
        }
    }
}
