use eframe::egui::{Color32, Rect, Vec2, vec2};

use crate::util::truncate_label;

use super::interaction::ViewTransform;
use super::layout::LayoutEngine;
use super::types::{ConnectionReason, ConnectionType, GraphData, MediaType};

const CENTER_TITLE_BUDGET: usize = 14;
const TITLE_BUDGET: usize = 12;

/// Highest-priority recognized reason type, or `Similarity` when none is.
pub fn resolve_connection_type(reasons: &[ConnectionReason]) -> ConnectionType {
    reasons
        .iter()
        .filter_map(|reason| reason.kind.known())
        .min()
        .unwrap_or(ConnectionType::Similarity)
}

pub fn connection_color(kind: ConnectionType) -> Color32 {
    match kind {
        ConnectionType::Collection => Color32::from_rgb(245, 158, 11),
        ConnectionType::Director => Color32::from_rgb(168, 85, 247),
        ConnectionType::Actor => Color32::from_rgb(59, 130, 246),
        ConnectionType::Network => Color32::from_rgb(236, 72, 153),
        ConnectionType::Studio => Color32::from_rgb(20, 184, 166),
        ConnectionType::Genre => Color32::from_rgb(34, 197, 94),
        ConnectionType::Keyword => Color32::from_rgb(234, 179, 8),
        ConnectionType::Similarity => Color32::from_rgb(148, 163, 184),
    }
}

pub fn edge_width(similarity: f32, hovered: bool) -> f32 {
    if hovered {
        (similarity * 6.0).max(2.0)
    } else {
        (similarity * 4.0).max(1.0)
    }
}

fn edge_opacity(similarity: f32, emphasized: bool) -> f32 {
    if emphasized {
        1.0
    } else {
        0.3 + similarity.clamp(0.0, 1.0) * 0.4
    }
}

pub fn title_budget(is_center: bool) -> usize {
    if is_center {
        CENTER_TITLE_BUDGET
    } else {
        TITLE_BUDGET
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLine {
    pub edge: usize,
    pub start: Vec2,
    pub end: Vec2,
    pub kind: ConnectionType,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub hovered: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeCard {
    pub node: usize,
    /// Whole card in viewport-local screen coordinates.
    pub rect: Rect,
    pub poster: Rect,
    pub is_center: bool,
    pub hovered: bool,
    pub selected: bool,
    pub title: String,
    pub year: Option<String>,
    pub media_type: MediaType,
    pub poster_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub edges: Vec<EdgeLine>,
    pub cards: Vec<NodeCard>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneFocus {
    pub hovered_node: Option<usize>,
    pub hovered_edge: Option<usize>,
    pub selected: Option<usize>,
}

/// Maps the current simulation state to drawable primitives: links first,
/// then cards with the center card last so it sits on top.
pub fn build_scene(
    data: &GraphData,
    engine: &LayoutEngine,
    view: ViewTransform,
    focus: SceneFocus,
) -> Scene {
    let nodes = engine.nodes();

    let edges = engine
        .links()
        .iter()
        .filter_map(|link| {
            let edge = data.edges.get(link.edge)?;
            let start = nodes.get(link.source)?.pos;
            let end = nodes.get(link.target)?.pos;
            let hovered = focus.hovered_edge == Some(link.edge);
            let touches_hovered = focus
                .hovered_node
                .is_some_and(|node| node == link.source || node == link.target);
            let similarity = edge.weight();
            let kind = resolve_connection_type(&edge.reasons);

            Some(EdgeLine {
                edge: link.edge,
                start: view.to_screen(start),
                end: view.to_screen(end),
                kind,
                color: connection_color(kind),
                width: edge_width(similarity, hovered) * view.scale,
                opacity: edge_opacity(similarity, hovered || touches_hovered),
                hovered,
            })
        })
        .collect::<Vec<_>>();

    let mut order = (0..nodes.len())
        .filter(|&index| Some(index) != engine.center())
        .collect::<Vec<_>>();
    order.extend(engine.center().filter(|&index| index < nodes.len()));

    let cards = order
        .into_iter()
        .filter_map(|index| {
            let node = data.nodes.get(index)?;
            let sim = nodes.get(index)?;
            let size = sim.card * view.scale;
            let rect = Rect::from_center_size(view.to_screen(sim.pos).to_pos2(), size);
            let poster = Rect::from_min_size(rect.min, vec2(size.x, size.x * 1.5));

            Some(NodeCard {
                node: index,
                rect,
                poster,
                is_center: sim.is_center,
                hovered: focus.hovered_node == Some(index),
                selected: focus.selected == Some(index),
                title: truncate_label(&node.title, title_budget(sim.is_center)),
                year: node.year.map(|year| year.to_string()),
                media_type: node.media_type,
                poster_url: node.poster_url.clone(),
            })
        })
        .collect::<Vec<_>>();

    Scene { edges, cards }
}
