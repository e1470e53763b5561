use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::stable_hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
        }
    }
}

/// Reason types in priority order: earlier variants win edge coloring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Collection,
    Director,
    Actor,
    Network,
    Studio,
    Genre,
    Keyword,
    Similarity,
}

impl ConnectionType {
    pub const ALL: [Self; 8] = [
        Self::Collection,
        Self::Director,
        Self::Actor,
        Self::Network,
        Self::Studio,
        Self::Genre,
        Self::Keyword,
        Self::Similarity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Collection => "Collection",
            Self::Director => "Director",
            Self::Actor => "Actor",
            Self::Network => "Network",
            Self::Studio => "Studio",
            Self::Genre => "Genre",
            Self::Keyword => "Keyword",
            Self::Similarity => "Similar",
        }
    }
}

/// A reason type as it arrived on the wire. Unrecognized strings are kept so
/// tooltips can still show them; they never take part in color priority.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReasonKind {
    Known(ConnectionType),
    Other(String),
}

impl ReasonKind {
    pub fn known(&self) -> Option<ConnectionType> {
        match self {
            Self::Known(kind) => Some(*kind),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(kind) => f.write_str(kind.label()),
            Self::Other(name) => f.write_str(name),
        }
    }
}

impl From<ConnectionType> for ReasonKind {
    fn from(kind: ConnectionType) -> Self {
        Self::Known(kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReason {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ConnectionReason {
    pub fn new(kind: ConnectionType, value: impl Into<String>) -> Self {
        Self {
            kind: ReasonKind::Known(kind),
            value: Some(value.into()),
        }
    }

    pub fn bare(kind: ConnectionType) -> Self {
        Self {
            kind: ReasonKind::Known(kind),
            value: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub media_type: MediaType,
    #[serde(default)]
    pub is_center: bool,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            poster_url: None,
            media_type,
            is_center: false,
        }
    }

    pub fn center(mut self) -> Self {
        self.is_center = true;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub similarity: f32,
    #[serde(default)]
    pub reasons: Vec<ConnectionReason>,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        similarity: f32,
        reasons: Vec<ConnectionReason>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            similarity,
            reasons,
        }
    }

    /// Similarity clamped into `[0, 1]`; non-finite values read as zero.
    pub fn weight(&self) -> f32 {
        if self.similarity.is_finite() {
            self.similarity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphFingerprint(u64);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the node that anchors the layout: the first flagged center,
    /// or the first node when nothing is flagged.
    pub fn center_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.is_center)
            .or_else(|| (!self.nodes.is_empty()).then_some(0))
    }

    /// Identity of the graph for rebuild decisions: center id plus the sorted
    /// node ids. Edge changes alone do not produce a new fingerprint.
    pub fn fingerprint(&self) -> GraphFingerprint {
        let center = self
            .center_index()
            .map(|index| self.nodes[index].id.as_str())
            .unwrap_or_default();
        let mut ids = self
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        ids.sort_unstable();

        GraphFingerprint(stable_hash(std::iter::once(center).chain(ids)))
    }

    /// Subgraph around `id`: that item as the new center plus its direct
    /// neighbors, keeping every edge among them.
    pub fn recentered_on(&self, id: &str) -> Option<GraphData> {
        if !self.nodes.iter().any(|node| node.id == id) {
            return None;
        }

        let mut keep = HashSet::new();
        keep.insert(id);
        for edge in &self.edges {
            if edge.source == id {
                keep.insert(edge.target.as_str());
            } else if edge.target == id {
                keep.insert(edge.source.as_str());
            }
        }

        let nodes = self
            .nodes
            .iter()
            .filter(|node| keep.contains(node.id.as_str()))
            .map(|node| GraphNode {
                is_center: node.id == id,
                ..node.clone()
            })
            .collect::<Vec<_>>();
        let edges = self
            .edges
            .iter()
            .filter(|edge| {
                keep.contains(edge.source.as_str()) && keep.contains(edge.target.as_str())
            })
            .cloned()
            .collect::<Vec<_>>();

        Some(GraphData { nodes, edges })
    }
}
