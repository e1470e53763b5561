use eframe::egui::{self, RichText, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::ConnectionType;
use crate::graph::render::connection_color;

use super::super::GraphView;

const SEARCH_RESULT_ROWS: usize = 8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl GraphView {
    /// Best title matches for the current query, highest score first.
    pub(in crate::app) fn search_matches(&self) -> Vec<usize> {
        let query = self.search.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .data
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, &node.title, query).map(|score| (index, score))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.into_iter().map(|(index, _)| index).collect()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Search");
        ui.add_space(4.0);

        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Title")
                .desired_width(f32::INFINITY),
        );
        let submitted =
            response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));

        let matches = self.search_matches();
        if submitted && let Some(&best) = matches.first() {
            self.focus_node(best);
        }

        if !self.search.trim().is_empty() {
            ui.add_space(4.0);
            if matches.is_empty() {
                ui.label(RichText::new("No matching titles").weak());
            }
            let mut picked = None;
            for &index in matches.iter().take(SEARCH_RESULT_ROWS) {
                let Some(node) = self.data.nodes.get(index) else {
                    continue;
                };
                let label = match node.year {
                    Some(year) => format!("{} ({year})", node.title),
                    None => node.title.clone(),
                };
                if ui.link(label).clicked() {
                    picked = Some(index);
                }
            }
            if let Some(index) = picked {
                self.focus_node(index);
            }
        }

        ui.separator();
        self.draw_legend(ui);
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Connection colors").strong());
        ui.add_space(2.0);
        for kind in ConnectionType::ALL {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                ui.painter().rect_filled(rect, 2.0, connection_color(kind));
                ui.label(kind.label());
            });
        }
        ui.add_space(4.0);
        ui.small("Thicker lines mean more similar items.");
    }
}
