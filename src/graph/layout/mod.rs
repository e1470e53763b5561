mod forces;
mod quadtree;

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;
use tracing::{debug, info};

use super::index::ConnectionIndex;
use super::types::GraphData;
use forces::{
    accumulate_charge_for_node, accumulate_collision_pairs, apply_centering, apply_links,
};
use quadtree::QuadNode;

pub use forces::SimLink;

const CARD_LABEL_STRIP: f32 = 38.0;

/// Tunables for the force simulation. Every field has a default, so a JSON
/// override only needs the keys it changes.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub initial_alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
    pub charge_strength: f32,
    pub theta: f32,
    pub link_distance_base: f32,
    pub link_distance_span: f32,
    pub link_strength_scale: f32,
    pub center_strength: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub seed_radius_ratio: f32,
    pub settle_energy: f32,
    pub settle_ticks: u32,
    pub reflow_alpha: f32,
    pub centering_duration_secs: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            initial_alpha: 0.4,
            alpha_min: 0.001,
            alpha_decay: 0.02,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            charge_strength: -650.0,
            theta: 0.9,
            link_distance_base: 300.0,
            link_distance_span: 100.0,
            link_strength_scale: 0.4,
            center_strength: 0.05,
            collision_padding: 50.0,
            collision_strength: 1.0,
            seed_radius_ratio: 0.3,
            settle_energy: 0.05,
            settle_ticks: 20,
            reflow_alpha: 0.15,
            centering_duration_secs: 0.3,
        }
    }
}

impl LayoutConfig {
    /// Rest length of a link; more similar pairs sit closer.
    pub fn link_distance(&self, similarity: f32) -> f32 {
        self.link_distance_base - similarity * self.link_distance_span
    }

    pub fn link_strength(&self, similarity: f32) -> f32 {
        similarity * self.link_strength_scale
    }
}

/// Full card size in world units: a 2:3 poster plus the label strip.
pub fn card_size(is_center: bool, compact: bool) -> Vec2 {
    let width = match (is_center, compact) {
        (true, false) => 120.0,
        (false, false) => 90.0,
        (true, true) => 96.0,
        (false, true) => 72.0,
    };
    vec2(width, width * 1.5 + CARD_LABEL_STRIP)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimNode {
    pub pos: Vec2,
    pub velocity: Vec2,
    /// Hard position override while dragged.
    pub pin: Option<Vec2>,
    pub card: Vec2,
    pub collision_radius: f32,
    pub is_center: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Idle,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub alpha: f32,
    pub energy: f32,
    /// True on the one tick where this run first came to rest.
    pub settled: bool,
}

struct ForceScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

/// Owned force simulation for one graph. Construct it per graph, tick it once
/// per frame, and stop it before replacing it.
pub struct LayoutEngine {
    config: LayoutConfig,
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    center: Option<usize>,
    viewport: Vec2,
    alpha: f32,
    alpha_target: f32,
    state: RunState,
    calm_ticks: u32,
    settle_reported: bool,
    ticks: u64,
    scratch: ForceScratch,
}

impl LayoutEngine {
    pub fn new(
        data: &GraphData,
        index: &ConnectionIndex,
        viewport: Vec2,
        config: LayoutConfig,
        compact: bool,
    ) -> Self {
        let center = index.center();
        let nodes = (0..data.nodes.len())
            .map(|node_index| {
                let is_center = Some(node_index) == center;
                let card = card_size(is_center, compact);
                SimNode {
                    pos: Vec2::ZERO,
                    velocity: Vec2::ZERO,
                    pin: None,
                    card,
                    collision_radius: card.x * 0.5 + config.collision_padding,
                    is_center,
                }
            })
            .collect::<Vec<_>>();

        let links = index
            .kept_edges()
            .iter()
            .map(|kept| {
                let similarity = kept.similarity;
                let source_degree = index.degree(kept.source) as f32;
                let target_degree = index.degree(kept.target) as f32;
                SimLink {
                    edge: kept.edge,
                    source: kept.source,
                    target: kept.target,
                    distance: config.link_distance(similarity),
                    strength: config.link_strength(similarity),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect::<Vec<_>>();

        let mut engine = Self {
            config,
            nodes,
            links,
            center,
            viewport,
            alpha: config.initial_alpha,
            alpha_target: 0.0,
            state: RunState::Running,
            calm_ticks: 0,
            settle_reported: false,
            ticks: 0,
            scratch: ForceScratch {
                positions: Vec::new(),
                radii: Vec::new(),
                deltas: Vec::new(),
            },
        };
        engine.seed_positions();

        info!(
            nodes = engine.nodes.len(),
            links = engine.links.len(),
            width = viewport.x,
            height = viewport.y,
            "seeded layout"
        );
        engine
    }

    /// Center node at the viewport midpoint, everything else evenly spaced on
    /// a circle around it.
    fn seed_positions(&mut self) {
        let middle = self.viewport * 0.5;
        let radius = self.viewport.x.min(self.viewport.y).max(0.0) * self.config.seed_radius_ratio;
        let ring_count = self
            .nodes
            .len()
            .saturating_sub(usize::from(self.center.is_some()));

        let mut slot = 0usize;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.velocity = Vec2::ZERO;
            node.pin = None;
            if Some(index) == self.center {
                node.pos = middle;
                continue;
            }

            let angle = (slot as f32 / ring_count as f32) * TAU;
            node.pos = middle + vec2(angle.cos(), angle.sin()) * radius;
            slot += 1;
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&SimNode> {
        self.nodes.get(index)
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn center(&self) -> Option<usize> {
        self.center
    }

    pub fn center_position(&self) -> Option<Vec2> {
        self.center.and_then(|index| self.nodes.get(index)).map(|node| node.pos)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Mean squared speed of the nodes physics still controls.
    pub fn kinetic_energy(&self) -> f32 {
        let (sum, count) = self
            .nodes
            .iter()
            .filter(|node| node.pin.is_none())
            .fold((0.0_f32, 0usize), |(sum, count), node| {
                (sum + node.velocity.length_sq(), count + 1)
            });
        if count == 0 { 0.0 } else { sum / count as f32 }
    }

    pub fn tick(&mut self) -> Option<TickReport> {
        if self.state != RunState::Running {
            return None;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.apply_forces();

        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.pos = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity *= keep;
                    node.pos += node.velocity;
                }
            }
        }
        self.ticks += 1;

        let energy = self.kinetic_energy();
        let held = self.alpha_target > 0.0;
        if !held && energy < self.config.settle_energy {
            self.calm_ticks += 1;
        } else {
            self.calm_ticks = 0;
        }

        let at_rest = self.alpha < self.config.alpha_min || self.calm_ticks >= self.config.settle_ticks;
        let mut settled = false;
        if at_rest && !held {
            self.state = RunState::Idle;
            if !self.settle_reported {
                self.settle_reported = true;
                settled = true;
                info!(ticks = self.ticks, alpha = self.alpha, energy, "layout settled");
            }
        }

        Some(TickReport {
            alpha: self.alpha,
            energy,
            settled,
        })
    }

    fn apply_forces(&mut self) {
        let alpha = self.alpha;
        apply_links(&mut self.nodes, &self.links, alpha);

        let node_count = self.nodes.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.radii.clear();
        scratch.positions.extend(self.nodes.iter().map(|node| node.pos));
        scratch
            .radii
            .extend(self.nodes.iter().map(|node| node.collision_radius));
        scratch.deltas.clear();
        scratch.deltas.resize(node_count, Vec2::ZERO);

        if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii) {
            for (index, delta) in scratch.deltas.iter_mut().enumerate() {
                accumulate_charge_for_node(
                    &tree,
                    index,
                    &scratch.positions,
                    self.config.charge_strength,
                    self.config.theta,
                    alpha,
                    delta,
                );
            }
        }
        for (node, delta) in self.nodes.iter_mut().zip(&scratch.deltas) {
            node.velocity += *delta;
        }

        apply_centering(
            &mut self.nodes,
            self.viewport * 0.5,
            self.config.center_strength,
            alpha,
        );

        scratch.positions.clear();
        scratch
            .positions
            .extend(self.nodes.iter().map(|node| node.pos + node.velocity));
        scratch.deltas.fill(Vec2::ZERO);
        if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii) {
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                &scratch.positions,
                &scratch.radii,
                self.config.collision_strength,
                &mut scratch.deltas,
            );
        }
        for (node, delta) in self.nodes.iter_mut().zip(&scratch.deltas) {
            node.velocity += *delta;
        }
    }

    /// Wakes an idle simulation. A stopped one stays stopped.
    pub fn restart(&mut self) {
        if self.state == RunState::Idle {
            self.state = RunState::Running;
            self.calm_ticks = 0;
        }
    }

    /// Tears the simulation down. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            debug!(ticks = self.ticks, "stopping layout");
            self.state = RunState::Stopped;
        }
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
    }

    pub fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = Some(position);
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = None;
        }
    }

    /// Carries the current layout over to a resized viewport by scaling every
    /// position per axis, then reheats gently. Without a usable previous
    /// viewport this falls back to the circular seed.
    pub fn reflow(&mut self, viewport: Vec2) {
        if self.state == RunState::Stopped {
            return;
        }

        let previous = self.viewport;
        self.viewport = viewport;
        if previous.x <= f32::EPSILON || previous.y <= f32::EPSILON {
            self.seed_positions();
            self.alpha = self.config.initial_alpha;
        } else {
            let scale = vec2(viewport.x / previous.x, viewport.y / previous.y);
            for node in &mut self.nodes {
                node.pos = vec2(node.pos.x * scale.x, node.pos.y * scale.y);
                node.pin = node.pin.map(|pin| vec2(pin.x * scale.x, pin.y * scale.y));
                node.velocity = Vec2::ZERO;
            }
            self.alpha = self.alpha.max(self.config.reflow_alpha);
        }

        self.calm_ticks = 0;
        self.state = RunState::Running;
        debug!(width = viewport.x, height = viewport.y, "reflowed layout");
    }
}

impl Drop for LayoutEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
