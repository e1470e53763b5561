use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{ConnectionReason, GraphData};

/// One side of a kept edge, as seen from the node that owns the entry.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeConnection {
    pub other: usize,
    pub edge: usize,
    pub similarity: f32,
    pub reasons: Vec<ConnectionReason>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeptEdge {
    pub edge: usize,
    pub source: usize,
    pub target: usize,
    pub similarity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    MissingSource,
    MissingTarget,
    MissingBoth,
    SelfLoop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DroppedEdge {
    pub edge: usize,
    pub reason: DropReason,
}

/// Per-node connection lists built from a [`GraphData`], aligned with its
/// node order.
#[derive(Clone, Debug, Default)]
pub struct ConnectionIndex {
    index_by_id: HashMap<String, usize>,
    connections: Vec<Vec<NodeConnection>>,
    kept: Vec<KeptEdge>,
    dropped: Vec<DroppedEdge>,
    center: Option<usize>,
}

impl ConnectionIndex {
    pub fn build(data: &GraphData) -> Self {
        let mut index_by_id = HashMap::with_capacity(data.nodes.len());
        for (index, node) in data.nodes.iter().enumerate() {
            index_by_id.entry(node.id.clone()).or_insert(index);
        }

        let mut connections = vec![Vec::new(); data.nodes.len()];
        let mut kept = Vec::with_capacity(data.edges.len());
        let mut dropped = Vec::new();

        for (edge_index, edge) in data.edges.iter().enumerate() {
            let source = index_by_id.get(&edge.source).copied();
            let target = index_by_id.get(&edge.target).copied();

            let (source, target) = match (source, target) {
                (Some(source), Some(target)) if source == target => {
                    dropped.push(DroppedEdge {
                        edge: edge_index,
                        reason: DropReason::SelfLoop,
                    });
                    continue;
                }
                (Some(source), Some(target)) => (source, target),
                (None, Some(_)) => {
                    dropped.push(DroppedEdge {
                        edge: edge_index,
                        reason: DropReason::MissingSource,
                    });
                    continue;
                }
                (Some(_), None) => {
                    dropped.push(DroppedEdge {
                        edge: edge_index,
                        reason: DropReason::MissingTarget,
                    });
                    continue;
                }
                (None, None) => {
                    dropped.push(DroppedEdge {
                        edge: edge_index,
                        reason: DropReason::MissingBoth,
                    });
                    continue;
                }
            };

            let similarity = edge.weight();
            connections[source].push(NodeConnection {
                other: target,
                edge: edge_index,
                similarity,
                reasons: edge.reasons.clone(),
            });
            connections[target].push(NodeConnection {
                other: source,
                edge: edge_index,
                similarity,
                reasons: edge.reasons.clone(),
            });
            kept.push(KeptEdge {
                edge: edge_index,
                source,
                target,
                similarity,
            });
        }

        if !dropped.is_empty() {
            for entry in &dropped {
                let edge = &data.edges[entry.edge];
                debug!(
                    source = %edge.source,
                    target = %edge.target,
                    reason = ?entry.reason,
                    "dropping edge"
                );
            }
            warn!(
                dropped = dropped.len(),
                total = data.edges.len(),
                "graph contains edges that reference unknown nodes"
            );
        }

        Self {
            index_by_id,
            connections,
            kept,
            dropped,
            center: data.center_index(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.connections.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn center(&self) -> Option<usize> {
        self.center
    }

    pub fn connections(&self, node: usize) -> &[NodeConnection] {
        self.connections
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn connections_for(&self, id: &str) -> &[NodeConnection] {
        self.index_of(id)
            .map(|node| self.connections(node))
            .unwrap_or_default()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.connections(node).len()
    }

    pub fn kept_edges(&self) -> &[KeptEdge] {
        &self.kept
    }

    pub fn dropped_edges(&self) -> &[DroppedEdge] {
        &self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{ConnectionType, GraphEdge, GraphNode, MediaType};

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, id.to_uppercase(), MediaType::Movie)
    }

    #[test]
    fn every_kept_edge_appears_once_on_each_side() {
        let data = GraphData::new(
            vec![node("a").center(), node("b"), node("c")],
            vec![
                GraphEdge::new(
                    "a",
                    "b",
                    0.8,
                    vec![ConnectionReason::new(ConnectionType::Genre, "Drama")],
                ),
                GraphEdge::new("c", "a", 0.5, vec![]),
            ],
        );
        let index = ConnectionIndex::build(&data);

        for kept in index.kept_edges() {
            let forward = index
                .connections(kept.source)
                .iter()
                .filter(|entry| entry.other == kept.target)
                .collect::<Vec<_>>();
            let backward = index
                .connections(kept.target)
                .iter()
                .filter(|entry| entry.other == kept.source)
                .collect::<Vec<_>>();

            assert_eq!(forward.len(), 1);
            assert_eq!(backward.len(), 1);
            assert_eq!(forward[0].reasons, data.edges[kept.edge].reasons);
            assert_eq!(forward[0].similarity, backward[0].similarity);
        }
        assert_eq!(index.degree(0), 2);
        assert_eq!(index.degree(1), 1);
    }

    #[test]
    fn edges_with_unknown_endpoints_are_dropped() {
        let data = GraphData::new(
            vec![node("a").center(), node("b")],
            vec![
                GraphEdge::new("a", "b", 0.6, vec![]),
                GraphEdge::new("a", "ghost", 0.6, vec![]),
                GraphEdge::new("ghost", "b", 0.6, vec![]),
                GraphEdge::new("x", "y", 0.6, vec![]),
                GraphEdge::new("b", "b", 0.6, vec![]),
            ],
        );
        let index = ConnectionIndex::build(&data);

        assert_eq!(index.kept_edges().len(), 1);
        let reasons = index
            .dropped_edges()
            .iter()
            .map(|entry| entry.reason)
            .collect::<Vec<_>>();
        assert_eq!(
            reasons,
            vec![
                DropReason::MissingTarget,
                DropReason::MissingSource,
                DropReason::MissingBoth,
                DropReason::SelfLoop,
            ]
        );
        assert_eq!(index.connections_for("b").len(), 1);
    }

    #[test]
    fn lookups_tolerate_unknown_ids() {
        let index = ConnectionIndex::build(&GraphData::default());
        assert!(index.connections_for("nope").is_empty());
        assert!(index.connections(7).is_empty());
        assert_eq!(index.center(), None);
    }
}
