use std::collections::VecDeque;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui, Vec2};
use tracing::{debug, info, warn};

use crate::graph::{ConnectionIndex, GraphData, InteractionController, LayoutConfig};
use crate::source::{LoadedGraph, LoadingStatus};

use super::super::GraphView;

pub(in crate::app) fn draw_loading(ui: &mut Ui, status: &LoadingStatus) {
    ui.vertical_centered(|ui| {
        ui.add_space(120.0);
        ui.heading(status.message());
        ui.add_space(4.0);
        ui.label(RichText::new(status.phase.label()).weak());
        ui.add_space(8.0);
        match status.progress_fraction() {
            Some(fraction) => {
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .desired_width(280.0)
                        .show_percentage(),
                );
            }
            None => {
                ui.spinner();
            }
        }
        if let Some(detail) = status.detail.as_deref() {
            ui.add_space(6.0);
            ui.small(detail);
        }
    });
}

impl GraphView {
    pub(in crate::app) fn new(
        loaded: LoadedGraph,
        center: Option<&str>,
        layout: LayoutConfig,
        compact: bool,
    ) -> Self {
        let LoadedGraph { data: full, report } = loaded;
        let data = match center {
            Some(id) => full.recentered_on(id).unwrap_or_else(|| {
                warn!(%id, "requested center item is not in the graph, showing everything");
                full.clone()
            }),
            None => full.clone(),
        };
        let index = ConnectionIndex::build(&data);
        let fingerprint = data.fingerprint();

        Self {
            full,
            data,
            index,
            fingerprint,
            report,
            engine: None,
            interaction: InteractionController::new(),
            layout,
            viewport: Vec2::ZERO,
            compact,
            selected: None,
            search: String::new(),
            last_alpha: 0.0,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reloading: Option<&LoadingStatus>,
        reload_requested: &mut bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui, reloading.is_some(), reload_requested));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| match reloading {
            Some(status) => draw_loading(ui, status),
            None => self.draw_graph(ui),
        });
    }

    fn draw_top_bar(&mut self, ui: &mut Ui, is_loading: bool, reload_requested: &mut bool) {
        ui.horizontal(|ui| {
            ui.heading("reelgraph");
            ui.separator();
            if let Some(center) = self.index.center().and_then(|index| self.data.nodes.get(index)) {
                ui.label(format!("center: {}", center.title));
            }
            ui.label(format!("items: {}", self.index.node_count()));
            ui.label(format!("connections: {}", self.index.kept_edges().len()));
            let dropped = self.index.dropped_edges().len();
            if dropped > 0 {
                ui.colored_label(
                    Color32::from_rgb(234, 179, 8),
                    format!("dropped: {dropped}"),
                )
                .on_hover_text("Connections that reference items missing from the graph");
            }
            if self.report.similarities_clamped > 0 {
                ui.label(RichText::new(format!(
                    "{} similarities clamped",
                    self.report.similarities_clamped
                ))
                .weak());
            }

            let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
            if reload_button.clicked() {
                *reload_requested = true;
            }
            let showing_subset = self.data.nodes.len() != self.full.nodes.len();
            if ui
                .add_enabled(showing_subset, egui::Button::new("Show all"))
                .clicked()
            {
                self.set_data(self.full.clone());
            }
            if ui.checkbox(&mut self.compact, "Compact").changed() {
                self.rebuild_layout();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(self.simulation_text());
                if let Some(fps_text) = self.fps_display_text() {
                    ui.label(fps_text);
                }
            });
        });
    }

    /// Replaces the displayed graph. Identical graphs keep their layout; a new
    /// one tears the running simulation down before it is reseeded.
    pub(in crate::app) fn set_data(&mut self, data: GraphData) {
        let fingerprint = data.fingerprint();
        if fingerprint == self.fingerprint {
            debug!("graph unchanged, keeping layout");
            return;
        }

        info!(
            nodes = data.nodes.len(),
            edges = data.edges.len(),
            "showing new graph"
        );
        self.stop_layout();
        self.engine = None;
        self.index = ConnectionIndex::build(&data);
        self.data = data;
        self.fingerprint = fingerprint;
        self.interaction.reset();
        self.selected = None;
    }

    pub(in crate::app) fn stop_layout(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
    }

    fn rebuild_layout(&mut self) {
        self.stop_layout();
        self.engine = None;
        self.interaction.reset();
    }

    /// Shows `id` with only its direct neighbors, taken from the full dataset.
    pub(in crate::app) fn recenter_on(&mut self, id: &str) {
        match self.full.recentered_on(id) {
            Some(next) => self.set_data(next),
            None => warn!(%id, "cannot recenter on an unknown item"),
        }
    }

    /// Selects `node` and pans the view onto it.
    pub(in crate::app) fn focus_node(&mut self, node: usize) {
        self.selected = Some(node);
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        if let Some(sim) = engine.node(node) {
            self.interaction
                .center_on(sim.pos, self.viewport, self.layout.centering_duration_secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{GraphEdge, GraphNode, LayoutEngine, MediaType, RunState};
    use crate::source::ValidationReport;

    fn full_graph() -> GraphData {
        GraphData::new(
            vec![
                GraphNode::new("a", "Alpha", MediaType::Movie).center(),
                GraphNode::new("b", "Beta", MediaType::Movie),
                GraphNode::new("c", "Gamma", MediaType::Series),
                GraphNode::new("d", "Delta", MediaType::Movie),
            ],
            vec![
                GraphEdge::new("a", "b", 0.9, Vec::new()),
                GraphEdge::new("a", "c", 0.6, Vec::new()),
                GraphEdge::new("b", "d", 0.7, Vec::new()),
            ],
        )
    }

    fn running_view() -> GraphView {
        let mut view = GraphView::new(
            LoadedGraph {
                data: full_graph(),
                report: ValidationReport::default(),
            },
            None,
            LayoutConfig::default(),
            false,
        );
        view.viewport = vec2(1000.0, 800.0);
        view.engine = Some(LayoutEngine::new(
            &view.data,
            &view.index,
            view.viewport,
            view.layout,
            false,
        ));
        view
    }

    #[test]
    fn reordered_graph_keeps_the_running_layout() {
        let mut view = running_view();
        let engine = view.engine.as_mut().unwrap();
        for _ in 0..5 {
            engine.tick();
        }

        let mut reordered = view.data.clone();
        reordered.nodes.reverse();
        reordered.edges.reverse();
        view.set_data(reordered);

        let engine = view.engine.as_ref().expect("layout survives an identical graph");
        assert_eq!(engine.ticks(), 5);
        assert_eq!(engine.state(), RunState::Running);
    }

    #[test]
    fn new_graph_tears_down_layout_and_selection() {
        let mut view = running_view();
        let before = view.fingerprint;
        view.selected = Some(1);

        let next = view.full.recentered_on("b").unwrap();
        view.set_data(next);

        assert!(view.engine.is_none());
        assert_eq!(view.selected, None);
        assert_ne!(view.fingerprint, before);
        assert_eq!(view.index.node_count(), view.data.nodes.len());
        assert_eq!(view.index.node_count(), 3);
        assert!(view.index.index_of("c").is_none());
    }

    #[test]
    fn recentering_on_unknown_item_changes_nothing() {
        let mut view = running_view();
        let before = view.fingerprint;

        view.recenter_on("missing");

        assert_eq!(view.fingerprint, before);
        assert!(view.engine.is_some());
    }
}
