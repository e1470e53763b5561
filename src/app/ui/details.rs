use eframe::egui::{self, RichText, Ui};

use crate::graph::aggregate::group_reasons;
use crate::graph::summarize_node;
use crate::util::format_similarity;

use super::super::GraphView;

impl GraphView {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.label("Click an item in the graph to see why it is connected.");
            return;
        };

        let Some(node) = self.data.nodes.get(selected) else {
            ui.label("Selected item is no longer in the graph.");
            return;
        };

        ui.label(RichText::new(node.title.as_str()).strong());
        let mut facts = vec![node.media_type.label().to_owned()];
        if let Some(year) = node.year {
            facts.push(year.to_string());
        }
        if node.is_center {
            facts.push("center".to_owned());
        }
        ui.label(facts.join(" · "));
        ui.small(node.id.as_str());
        let node_id = node.id.clone();

        let mut recenter = false;
        if !node.is_center && ui.button("Explore from here").clicked() {
            recenter = true;
        }

        let summary = summarize_node(&self.index, selected);
        ui.separator();
        ui.label(RichText::new(format!("Connections ({})", summary.connection_count)).strong());
        for group in &summary.groups {
            ui.small(group.summary_line());
        }

        let mut connections = self.index.connections(selected).to_vec();
        connections.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        ui.separator();
        let mut picked = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for connection in &connections {
                    let Some(other) = self.data.nodes.get(connection.other) else {
                        continue;
                    };
                    ui.horizontal(|ui| {
                        if ui.link(other.title.as_str()).on_hover_text(other.id.as_str()).clicked() {
                            picked = Some(connection.other);
                        }
                        ui.label(RichText::new(format_similarity(connection.similarity)).weak());
                    });
                    for group in group_reasons(&connection.reasons) {
                        ui.small(group.summary_line());
                    }
                    ui.add_space(4.0);
                }
            });

        if let Some(index) = picked {
            self.focus_node(index);
        }
        if recenter {
            self.recenter_on(&node_id);
        }
    }
}
