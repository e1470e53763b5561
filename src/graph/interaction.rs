use eframe::egui::{Rect, Vec2};

use super::layout::LayoutEngine;

pub const MIN_SCALE: f32 = 0.3;
pub const MAX_SCALE: f32 = 3.0;

const DRAG_THRESHOLD: f32 = 3.0;
const DOUBLE_CLICK_SECS: f64 = 0.35;
const EDGE_HOVER_DISTANCE: f32 = 6.0;

pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// Pan/zoom applied to the whole scene. Screen coordinates here are relative
/// to the top-left corner of the graph viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        self.translate + world * self.scale
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.translate) / self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = clamp_scale(scale);
    }

    /// Zooms while keeping the world point under `anchor` in place.
    pub fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        let world = self.to_world(anchor);
        self.set_scale(self.scale * factor);
        self.translate = anchor - world * self.scale;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Translation that puts `world` at the middle of `viewport` at the
    /// current scale.
    pub fn centering_translate(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        viewport * 0.5 - world * self.scale
    }
}

#[derive(Clone, Copy, Debug)]
struct PanAnimation {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t * 0.5
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    NodeClicked(usize),
    NodeDoubleClicked(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Pressed { pos: Vec2, time: f64 },
    Moved { pos: Vec2 },
    Released { pos: Vec2, time: f64 },
    Scrolled { pos: Vec2, delta: f32 },
    Left,
    /// The button went up somewhere the position is unknown.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Pressed {
        node: usize,
        press: Vec2,
        grab_offset: Vec2,
    },
    Dragging {
        node: usize,
        grab_offset: Vec2,
    },
    Panning {
        last: Vec2,
    },
}

/// Turns pointer input into drags on the layout engine, changes to the view
/// transform, and queued [`GraphEvent`]s for the owner to drain.
#[derive(Debug)]
pub struct InteractionController {
    view: ViewTransform,
    animation: Option<PanAnimation>,
    gesture: Gesture,
    hovered_node: Option<usize>,
    hovered_edge: Option<usize>,
    last_click: Option<(usize, f64)>,
    events: Vec<GraphEvent>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            view: ViewTransform::default(),
            animation: None,
            gesture: Gesture::Idle,
            hovered_node: None,
            hovered_edge: None,
            last_click: None,
            events: Vec::new(),
        }
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        self.animation = None;
        &mut self.view
    }

    pub fn hovered_node(&self) -> Option<usize> {
        self.hovered_node
    }

    pub fn hovered_edge(&self) -> Option<usize> {
        self.hovered_edge
    }

    pub fn dragged_node(&self) -> Option<usize> {
        match self.gesture {
            Gesture::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    /// Whether a press is still waiting for its release.
    pub fn is_gesture_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Forgets gestures, hover and view state; used when a new graph replaces
    /// the old one.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle(&mut self, input: PointerInput, engine: &mut LayoutEngine) {
        match input {
            PointerInput::Pressed { pos, .. } => {
                if let Some(node) = self.node_at(engine, pos) {
                    let node_pos = engine.nodes()[node].pos;
                    self.gesture = Gesture::Pressed {
                        node,
                        press: pos,
                        grab_offset: self.view.to_world(pos) - node_pos,
                    };
                } else {
                    self.animation = None;
                    self.gesture = Gesture::Panning { last: pos };
                }
            }
            PointerInput::Moved { pos } => match self.gesture {
                Gesture::Pressed {
                    node,
                    press,
                    grab_offset,
                } => {
                    if (pos - press).length() >= DRAG_THRESHOLD {
                        self.begin_drag(node, grab_offset, engine);
                        self.drag_to(pos, engine);
                    }
                }
                Gesture::Dragging { .. } => self.drag_to(pos, engine),
                Gesture::Panning { last } => {
                    self.view.pan_by(pos - last);
                    self.gesture = Gesture::Panning { last: pos };
                }
                Gesture::Idle => self.update_hover(engine, pos),
            },
            PointerInput::Released { pos, time } => {
                match self.gesture {
                    Gesture::Pressed { node, .. } => self.register_click(node, time),
                    Gesture::Dragging { .. } => self.end_drag(engine),
                    Gesture::Panning { .. } | Gesture::Idle => {}
                }
                self.gesture = Gesture::Idle;
                self.update_hover(engine, pos);
            }
            PointerInput::Scrolled { pos, delta } => {
                if delta.abs() <= f32::EPSILON {
                    return;
                }
                let factor = (1.0 + (delta * 0.0018)).clamp(0.85, 1.15);
                self.animation = None;
                self.view.zoom_about(pos, factor);
            }
            PointerInput::Left => {
                if self.dragged_node().is_none() {
                    self.hovered_node = None;
                    self.hovered_edge = None;
                }
            }
            PointerInput::Cancelled => {
                self.end_drag(engine);
                self.gesture = Gesture::Idle;
                self.hovered_node = None;
                self.hovered_edge = None;
            }
        }
    }

    /// Pins `node` where it currently is and heats the simulation so its
    /// neighbors react.
    pub fn begin_drag(&mut self, node: usize, grab_offset: Vec2, engine: &mut LayoutEngine) {
        let Some(current) = engine.node(node).map(|sim| sim.pos) else {
            return;
        };

        engine.pin(node, current);
        engine.set_alpha_target(engine.config().drag_alpha_target);
        engine.restart();
        self.gesture = Gesture::Dragging { node, grab_offset };
        self.hovered_node = Some(node);
        self.hovered_edge = None;
    }

    pub fn drag_to(&mut self, pos: Vec2, engine: &mut LayoutEngine) {
        if let Gesture::Dragging { node, grab_offset } = self.gesture {
            engine.pin(node, self.view.to_world(pos) - grab_offset);
        }
    }

    pub fn end_drag(&mut self, engine: &mut LayoutEngine) {
        if let Gesture::Dragging { node, .. } = self.gesture {
            engine.unpin(node);
            engine.set_alpha_target(0.0);
            self.gesture = Gesture::Idle;
        }
    }

    fn register_click(&mut self, node: usize, time: f64) {
        self.events.push(GraphEvent::NodeClicked(node));
        match self.last_click {
            Some((previous, at)) if previous == node && time - at <= DOUBLE_CLICK_SECS => {
                self.events.push(GraphEvent::NodeDoubleClicked(node));
                self.last_click = None;
            }
            _ => self.last_click = Some((node, time)),
        }
    }

    fn update_hover(&mut self, engine: &LayoutEngine, pos: Vec2) {
        self.hovered_node = self.node_at(engine, pos);
        self.hovered_edge = if self.hovered_node.is_some() {
            None
        } else {
            self.edge_at(engine, pos)
        };
    }

    /// Screen-space card rectangle for a simulated node.
    pub fn card_rect(&self, engine: &LayoutEngine, node: usize) -> Option<Rect> {
        engine.node(node).map(|sim| {
            Rect::from_center_size(
                self.view.to_screen(sim.pos).to_pos2(),
                sim.card * self.view.scale,
            )
        })
    }

    /// Topmost card under `pos`. The center card is drawn last, so it wins.
    pub fn node_at(&self, engine: &LayoutEngine, pos: Vec2) -> Option<usize> {
        let point = pos.to_pos2();
        let hit = |index: usize| {
            self.card_rect(engine, index)
                .is_some_and(|rect| rect.contains(point))
        };

        if let Some(center) = engine.center()
            && hit(center)
        {
            return Some(center);
        }

        (0..engine.nodes().len())
            .rev()
            .filter(|&index| Some(index) != engine.center())
            .find(|&index| hit(index))
    }

    /// Closest link within a few pixels of `pos`, as an edge index into the
    /// graph data.
    pub fn edge_at(&self, engine: &LayoutEngine, pos: Vec2) -> Option<usize> {
        let nodes = engine.nodes();
        engine
            .links()
            .iter()
            .filter_map(|link| {
                let start = self.view.to_screen(nodes.get(link.source)?.pos);
                let end = self.view.to_screen(nodes.get(link.target)?.pos);
                let distance = distance_to_segment(pos, start, end);
                (distance <= EDGE_HOVER_DISTANCE).then_some((link.edge, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(edge, _)| edge)
    }

    /// Starts panning (never zooming) so `world` ends up at the middle of
    /// `viewport`.
    pub fn center_on(&mut self, world: Vec2, viewport: Vec2, duration: f32) {
        let to = self.view.centering_translate(world, viewport);
        if duration <= 0.0 {
            self.view.translate = to;
            self.animation = None;
            return;
        }

        self.animation = Some(PanAnimation {
            from: self.view.translate,
            to,
            elapsed: 0.0,
            duration,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Steps the centering animation; returns whether it is still running.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };

        animation.elapsed += dt.max(0.0);
        let progress = animation.elapsed / animation.duration;
        let eased = ease_cubic_in_out(progress);
        self.view.translate = animation.from + (animation.to - animation.from) * eased;

        if progress >= 1.0 {
            self.view.translate = animation.to;
            self.animation = None;
            return false;
        }
        true
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::index::ConnectionIndex;
    use crate::graph::layout::LayoutConfig;
    use crate::graph::types::{GraphData, GraphEdge, GraphNode, MediaType};
    use eframe::egui::vec2;

    fn engine() -> LayoutEngine {
        let data = GraphData::new(
            vec![
                GraphNode::new("a", "Alpha", MediaType::Movie).center(),
                GraphNode::new("b", "Beta", MediaType::Movie),
            ],
            vec![GraphEdge::new("a", "b", 0.7, vec![])],
        );
        let index = ConnectionIndex::build(&data);
        LayoutEngine::new(&data, &index, vec2(1000.0, 600.0), LayoutConfig::default(), false)
    }

    #[test]
    fn scale_is_clamped() {
        let mut view = ViewTransform::default();
        view.set_scale(10.0);
        assert_eq!(view.scale, MAX_SCALE);
        view.set_scale(0.01);
        assert_eq!(view.scale, MIN_SCALE);
        view.set_scale(f32::NAN);
        assert_eq!(view.scale, 1.0);

        for _ in 0..200 {
            view.zoom_about(vec2(50.0, 50.0), 1.15);
        }
        assert_eq!(view.scale, MAX_SCALE);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewTransform {
            translate: vec2(40.0, -20.0),
            scale: 1.0,
        };
        let anchor = vec2(300.0, 200.0);
        let world = view.to_world(anchor);
        view.zoom_about(anchor, 1.1);

        assert!((view.to_screen(world) - anchor).length() < 1e-3);
    }

    #[test]
    fn press_and_release_without_motion_is_a_click() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let center = vec2(500.0, 300.0);

        controller.handle(PointerInput::Pressed { pos: center, time: 1.0 }, &mut engine);
        controller.handle(PointerInput::Moved { pos: center + vec2(1.0, 0.0) }, &mut engine);
        controller.handle(PointerInput::Released { pos: center, time: 1.1 }, &mut engine);

        assert_eq!(controller.drain_events(), vec![GraphEvent::NodeClicked(0)]);
        assert!(engine.nodes()[0].pin.is_none());
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn two_quick_clicks_also_emit_a_double_click() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let center = vec2(500.0, 300.0);

        for time in [1.0, 1.2] {
            controller.handle(PointerInput::Pressed { pos: center, time }, &mut engine);
            controller.handle(PointerInput::Released { pos: center, time }, &mut engine);
        }
        assert_eq!(
            controller.drain_events(),
            vec![
                GraphEvent::NodeClicked(0),
                GraphEvent::NodeClicked(0),
                GraphEvent::NodeDoubleClicked(0),
            ]
        );

        for time in [5.0, 6.0] {
            controller.handle(PointerInput::Pressed { pos: center, time }, &mut engine);
            controller.handle(PointerInput::Released { pos: center, time }, &mut engine);
        }
        assert!(
            !controller
                .drain_events()
                .contains(&GraphEvent::NodeDoubleClicked(0))
        );
    }

    #[test]
    fn drag_pins_follows_and_releases() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let start = engine.nodes()[1].pos;

        controller.begin_drag(1, Vec2::ZERO, &mut engine);
        assert_eq!(engine.nodes()[1].pin, Some(start));
        assert_eq!(engine.alpha_target(), 0.3);

        controller.drag_to(vec2(100.0, 120.0), &mut engine);
        assert_eq!(engine.nodes()[1].pin, Some(vec2(100.0, 120.0)));

        controller.end_drag(&mut engine);
        assert_eq!(engine.nodes()[1].pin, None);
        assert_eq!(engine.alpha_target(), 0.0);
    }

    #[test]
    fn dragging_never_clicks() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let center = vec2(500.0, 300.0);

        controller.handle(PointerInput::Pressed { pos: center, time: 1.0 }, &mut engine);
        controller.handle(PointerInput::Moved { pos: center + vec2(30.0, 10.0) }, &mut engine);
        assert_eq!(controller.dragged_node(), Some(0));
        assert_eq!(engine.nodes()[0].pin, Some(vec2(530.0, 310.0)));

        controller.handle(PointerInput::Released { pos: center, time: 1.1 }, &mut engine);
        assert!(controller.drain_events().is_empty());
        assert_eq!(engine.nodes()[0].pin, None);
    }

    #[test]
    fn dragging_empty_canvas_pans() {
        let mut engine = engine();
        let mut controller = InteractionController::new();

        controller.handle(PointerInput::Pressed { pos: vec2(5.0, 5.0), time: 0.0 }, &mut engine);
        controller.handle(PointerInput::Moved { pos: vec2(25.0, -15.0) }, &mut engine);
        controller.handle(PointerInput::Released { pos: vec2(25.0, -15.0), time: 0.1 }, &mut engine);

        assert_eq!(controller.view().translate, vec2(20.0, -20.0));
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn hover_prefers_cards_then_links() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let a = engine.nodes()[0].pos;
        let b = engine.nodes()[1].pos;

        controller.handle(PointerInput::Moved { pos: a }, &mut engine);
        assert_eq!(controller.hovered_node(), Some(0));
        assert_eq!(controller.hovered_edge(), None);

        let between = a + (b - a) * 0.5;
        controller.handle(PointerInput::Moved { pos: between }, &mut engine);
        assert_eq!(controller.hovered_node(), None);
        assert_eq!(controller.hovered_edge(), Some(0));

        controller.handle(PointerInput::Left, &mut engine);
        assert_eq!(controller.hovered_edge(), None);
    }

    #[test]
    fn centering_pans_without_zooming() {
        let mut controller = InteractionController::new();
        controller.view_mut().set_scale(2.0);
        controller.center_on(vec2(100.0, 50.0), vec2(800.0, 600.0), 0.3);

        assert!(controller.advance(0.1));
        assert!(!controller.advance(0.25));
        let view = controller.view();
        assert_eq!(view.scale, 2.0);
        assert_eq!(view.to_screen(vec2(100.0, 50.0)), vec2(400.0, 300.0));
    }

    #[test]
    fn easing_is_monotonic_between_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_cubic_in_out(0.25) < ease_cubic_in_out(0.75));
    }

    #[test]
    fn cancelled_release_unpins_without_clicking() {
        let mut engine = engine();
        let mut controller = InteractionController::new();
        let center = vec2(500.0, 300.0);

        controller.handle(PointerInput::Pressed { pos: center, time: 1.0 }, &mut engine);
        controller.handle(PointerInput::Moved { pos: center + vec2(40.0, 0.0) }, &mut engine);
        assert!(controller.is_gesture_active());
        assert!(engine.nodes()[0].pin.is_some());

        controller.handle(PointerInput::Cancelled, &mut engine);
        assert!(!controller.is_gesture_active());
        assert_eq!(controller.dragged_node(), None);
        assert_eq!(engine.nodes()[0].pin, None);
        assert_eq!(engine.alpha_target(), 0.0);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn cancelled_pan_stops_following_the_pointer() {
        let mut engine = engine();
        let mut controller = InteractionController::new();

        controller.handle(PointerInput::Pressed { pos: vec2(20.0, 20.0), time: 1.0 }, &mut engine);
        assert!(controller.is_panning());
        controller.handle(PointerInput::Cancelled, &mut engine);
        assert!(!controller.is_panning());

        controller.handle(PointerInput::Moved { pos: vec2(80.0, 90.0) }, &mut engine);
        assert_eq!(controller.view().translate, Vec2::ZERO);
    }
}
