use eframe::egui::{Vec2, vec2};

use super::SimNode;
use super::quadtree::QuadNode;

const DISTANCE_MIN_SQ: f32 = 1.0;
const COINCIDENT_SQ: f32 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimLink {
    pub edge: usize,
    pub source: usize,
    pub target: usize,
    pub distance: f32,
    pub strength: f32,
    /// Share of the correction applied to the target; the lower-degree end
    /// moves more.
    pub bias: f32,
}

/// Deterministic stand-in for a random nudge when two points coincide.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) fn apply_links(nodes: &mut [SimNode], links: &[SimLink], alpha: f32) {
    for link in links {
        let (source, target) = (link.source, link.target);
        if source >= nodes.len() || target >= nodes.len() || source == target {
            continue;
        }

        let mut delta = (nodes[target].pos + nodes[target].velocity)
            - (nodes[source].pos + nodes[source].velocity);
        if delta.length_sq() < COINCIDENT_SQ {
            delta = jiggle(source, target);
        }

        let length = delta.length();
        let shift = delta * ((length - link.distance) / length * alpha * link.strength);
        nodes[target].velocity -= shift * link.bias;
        nodes[source].velocity += shift * (1.0 - link.bias);
    }
}

fn charge_between(mut delta: Vec2, weight: f32, alpha: f32, jitter: Vec2) -> Vec2 {
    if delta.length_sq() < COINCIDENT_SQ {
        delta = jitter;
    }

    let mut distance_sq = delta.length_sq();
    if distance_sq < DISTANCE_MIN_SQ {
        distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
    }
    delta * (weight * alpha / distance_sq)
}

/// Many-body velocity change for one point. `delta` points from the point
/// toward the charge, so a negative `strength` pushes it away.
pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    alpha: f32,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *velocity += charge_between(
                positions[other_index] - point,
                strength,
                alpha,
                jiggle(index, other_index),
            );
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let side = node.bounds.side_length();
    let can_approximate =
        !node.bounds.contains(point) && (side * side) < (theta * theta * delta.length_sq());

    if can_approximate {
        *velocity += charge_between(delta, strength * node.mass, alpha, jiggle(index, 0));
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(child, index, positions, strength, theta, alpha, velocity);
    }
}

pub(super) fn apply_centering(nodes: &mut [SimNode], center: Vec2, strength: f32, alpha: f32) {
    for node in nodes {
        node.velocity += (center - node.pos) * (strength * alpha);
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let mut delta = positions[from] - positions[to];
    let reach = radii[from] + radii[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    if distance_sq < COINCIDENT_SQ {
        delta = jiggle(from, to);
    }
    let distance = delta.length();
    let push = delta * ((reach - distance) / distance * strength);

    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let total = from_sq + to_sq;
    let share = if total > 0.0 { to_sq / total } else { 0.5 };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

/// Visits every pair of points whose collision circles can touch, pruning
/// cell pairs that are farther apart than their largest radii allow.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let reach = node_a.max_radius + node_b.max_radius;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, strength, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, strength, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, strength, deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, strength, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.side_length() >= node_b.bounds.side_length()
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, strength, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, strength, deltas);
        }
    }
}
