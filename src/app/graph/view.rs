use eframe::egui::{Align2, Color32, FontId, Sense, Ui, Vec2};

use crate::graph::{LayoutEngine, RunState, SceneFocus, build_scene};

use super::super::GraphView;
use super::super::render_utils::{draw_background, paint_card, paint_edge, paint_tooltip};
use super::interaction::pointer_inputs;

const RESIZE_TOLERANCE: f32 = 0.5;

impl GraphView {
    /// Seeds the layout once the viewport has a real size, and reflows it
    /// when the viewport changes.
    fn ensure_layout(&mut self, viewport: Vec2) {
        if viewport.x < 1.0 || viewport.y < 1.0 {
            return;
        }
        self.viewport = viewport;

        match self.engine.as_mut() {
            Some(engine) => {
                if (engine.viewport() - viewport).length() > RESIZE_TOLERANCE {
                    engine.reflow(viewport);
                }
            }
            None if !self.data.is_empty() => {
                self.engine = Some(LayoutEngine::new(
                    &self.data,
                    &self.index,
                    viewport,
                    self.layout,
                    self.compact,
                ));
            }
            None => {}
        }
    }

    /// Advances the simulation one tick and the centering pan by `dt`. The
    /// first settle of a run starts the pan onto the center node. Returns
    /// whether another frame is needed.
    pub(in crate::app) fn step_layout(&mut self, dt: f32) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return self.interaction.advance(dt);
        };

        if let Some(report) = engine.tick() {
            self.last_alpha = report.alpha;
            if report.settled
                && let Some(center) = engine.center_position()
            {
                self.interaction
                    .center_on(center, self.viewport, self.layout.centering_duration_secs);
            }
        }

        self.interaction.advance(dt);
        engine.state() == RunState::Running || self.interaction.is_animating()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let view = self.interaction.view();
        draw_background(&painter, rect, view.translate, view.scale);

        if self.data.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No connections to display",
                FontId::proportional(16.0),
                Color32::from_gray(170),
            );
            return;
        }

        self.ensure_layout(rect.size());
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let gesture_active = self.interaction.is_gesture_active();
        for input in pointer_inputs(ui, rect, &response, gesture_active) {
            self.interaction.handle(input, engine);
        }

        let dt = ui.ctx().input(|input| input.stable_dt).clamp(0.0, 0.1);
        if self.step_layout(dt) {
            ui.ctx().request_repaint();
        }
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        let view = self.interaction.view();
        let scene = build_scene(
            &self.data,
            engine,
            view,
            SceneFocus {
                hovered_node: self.interaction.hovered_node(),
                hovered_edge: self.interaction.hovered_edge(),
                selected: self.selected,
            },
        );

        let origin = rect.min.to_vec2();
        for line in &scene.edges {
            paint_edge(&painter, origin, line);
        }
        for card in &scene.cards {
            paint_card(&painter, origin, card, view.scale);
        }

        if self.interaction.dragged_node().is_none()
            && !self.interaction.is_panning()
            && let Some(pointer) = ui.input(|input| input.pointer.hover_pos())
            && rect.contains(pointer)
        {
            paint_tooltip(&painter, pointer, &self.hover_lines());
        }

        let events = self.interaction.drain_events();
        self.apply_graph_events(events);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{GraphData, GraphEdge, GraphNode, LayoutConfig, MediaType};
    use crate::source::{LoadedGraph, ValidationReport};

    fn quick_settling_view() -> GraphView {
        let data = GraphData::new(
            vec![
                GraphNode::new("a", "Alpha", MediaType::Movie).center(),
                GraphNode::new("b", "Beta", MediaType::Movie),
                GraphNode::new("c", "Gamma", MediaType::Series),
            ],
            vec![
                GraphEdge::new("a", "b", 0.8, Vec::new()),
                GraphEdge::new("a", "c", 0.5, Vec::new()),
            ],
        );
        let layout = LayoutConfig {
            alpha_min: 0.5,
            ..LayoutConfig::default()
        };
        GraphView::new(
            LoadedGraph {
                data,
                report: ValidationReport::default(),
            },
            None,
            layout,
            false,
        )
    }

    #[test]
    fn layout_is_seeded_once_the_viewport_has_area() {
        let mut view = quick_settling_view();
        view.ensure_layout(Vec2::ZERO);
        assert!(view.engine.is_none());

        view.ensure_layout(vec2(1000.0, 800.0));
        assert!(view.engine.is_some());
        assert_eq!(view.viewport, vec2(1000.0, 800.0));
    }

    #[test]
    fn settling_pans_onto_the_center_node() {
        let mut view = quick_settling_view();
        view.ensure_layout(vec2(1000.0, 800.0));

        assert!(view.step_layout(0.0), "centering pan keeps frames coming");
        assert!(view.interaction.is_animating());
        let engine = view.engine.as_ref().unwrap();
        assert_eq!(engine.state(), RunState::Idle);
        let center = engine.center_position().unwrap();

        assert!(!view.step_layout(1.0));
        assert!(!view.interaction.is_animating());
        let translate = view.interaction.view().translate;
        let expected = vec2(500.0, 400.0) - center;
        assert!((translate - expected).length() < 1e-3, "{translate:?} vs {expected:?}");
    }

    #[test]
    fn later_steps_do_not_restart_the_pan() {
        let mut view = quick_settling_view();
        view.ensure_layout(vec2(1000.0, 800.0));
        view.step_layout(0.0);
        view.step_layout(1.0);

        view.interaction.view_mut().pan_by(vec2(30.0, 0.0));
        assert!(!view.step_layout(0.016));
        assert!(!view.interaction.is_animating());
    }
}
