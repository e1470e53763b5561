use std::collections::BTreeMap;

use super::index::ConnectionIndex;
use super::types::{ConnectionReason, GraphEdge, ReasonKind};

pub const TOOLTIP_VALUE_CAP: usize = 3;

/// Distinct values for one reason type, in first-seen order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReasonGroup {
    pub kind: ReasonKind,
    pub values: Vec<String>,
}

impl ReasonGroup {
    pub fn shown(&self) -> &[String] {
        &self.values[..self.values.len().min(TOOLTIP_VALUE_CAP)]
    }

    pub fn hidden_count(&self) -> usize {
        self.values.len().saturating_sub(TOOLTIP_VALUE_CAP)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|known| known == value)
    }

    /// `"Actor: Tom Hanks, Meg Ryan +2 more"`, or just the type label when no
    /// reason carried a value.
    pub fn summary_line(&self) -> String {
        let mut line = self.kind.to_string();
        if self.values.is_empty() {
            return line;
        }

        line.push_str(": ");
        line.push_str(&self.shown().join(", "));
        let hidden = self.hidden_count();
        if hidden > 0 {
            line.push_str(&format!(" +{hidden} more"));
        }
        line
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSummary {
    pub connection_count: usize,
    pub groups: Vec<ReasonGroup>,
}

impl ConnectionSummary {
    pub fn group(&self, kind: impl Into<ReasonKind>) -> Option<&ReasonGroup> {
        let kind = kind.into();
        self.groups.iter().find(|group| group.kind == kind)
    }
}

pub fn group_reasons<'a>(reasons: impl IntoIterator<Item = &'a ConnectionReason>) -> Vec<ReasonGroup> {
    let mut grouped: BTreeMap<&ReasonKind, Vec<String>> = BTreeMap::new();
    for reason in reasons {
        let values = grouped.entry(&reason.kind).or_default();
        if let Some(value) = reason.value.as_deref()
            && !values.iter().any(|known| known == value)
        {
            values.push(value.to_owned());
        }
    }

    grouped
        .into_iter()
        .map(|(kind, values)| ReasonGroup {
            kind: kind.clone(),
            values,
        })
        .collect()
}

/// Everything that ties `node` to the rest of the graph, grouped for a tooltip.
pub fn summarize_node(index: &ConnectionIndex, node: usize) -> ConnectionSummary {
    let connections = index.connections(node);
    ConnectionSummary {
        connection_count: connections.len(),
        groups: group_reasons(connections.iter().flat_map(|entry| entry.reasons.iter())),
    }
}

pub fn summarize_edge(edge: &GraphEdge) -> ConnectionSummary {
    ConnectionSummary {
        connection_count: 1,
        groups: group_reasons(&edge.reasons),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{ConnectionType, GraphData, GraphNode, MediaType};

    fn movie(id: &str) -> GraphNode {
        GraphNode::new(id, id, MediaType::Movie)
    }

    #[test]
    fn groups_follow_priority_order_and_dedupe_values() {
        let reasons = vec![
            ConnectionReason::new(ConnectionType::Genre, "Drama"),
            ConnectionReason::new(ConnectionType::Actor, "Tom Hanks"),
            ConnectionReason::new(ConnectionType::Genre, "Drama"),
            ConnectionReason::new(ConnectionType::Genre, "War"),
            ConnectionReason::bare(ConnectionType::Similarity),
        ];
        let groups = group_reasons(&reasons);

        let kinds = groups.iter().map(|group| group.kind.clone()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ReasonKind::Known(ConnectionType::Actor),
                ReasonKind::Known(ConnectionType::Genre),
                ReasonKind::Known(ConnectionType::Similarity),
            ]
        );
        assert_eq!(groups[1].values, vec!["Drama", "War"]);
        assert!(groups[2].values.is_empty());
        assert_eq!(groups[2].summary_line(), "Similar");
    }

    #[test]
    fn long_groups_report_hidden_values() {
        let reasons = ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(|name| ConnectionReason::new(ConnectionType::Actor, name))
            .collect::<Vec<_>>();
        let group = &group_reasons(&reasons)[0];

        assert_eq!(group.shown(), ["A", "B", "C"]);
        assert_eq!(group.hidden_count(), 2);
        assert_eq!(group.summary_line(), "Actor: A, B, C +2 more");
    }

    #[test]
    fn unknown_types_sort_after_known_ones() {
        let reasons = vec![
            ConnectionReason {
                kind: ReasonKind::Other("composer".to_owned()),
                value: Some("Hans Zimmer".to_owned()),
            },
            ConnectionReason::new(ConnectionType::Keyword, "heist"),
        ];
        let groups = group_reasons(&reasons);

        assert_eq!(groups[0].kind, ReasonKind::Known(ConnectionType::Keyword));
        assert_eq!(groups[1].summary_line(), "composer: Hans Zimmer");
    }

    #[test]
    fn node_summary_collects_both_directions() {
        let data = GraphData::new(
            vec![movie("a").center(), movie("b"), movie("c")],
            vec![
                GraphEdge::new(
                    "a",
                    "b",
                    0.8,
                    vec![ConnectionReason::new(ConnectionType::Genre, "Drama")],
                ),
                GraphEdge::new(
                    "c",
                    "a",
                    0.5,
                    vec![ConnectionReason::new(ConnectionType::Director, "Nolan")],
                ),
            ],
        );
        let index = ConnectionIndex::build(&data);
        let summary = summarize_node(&index, 0);

        assert_eq!(summary.connection_count, 2);
        assert!(summary.group(ConnectionType::Director).is_some());
        assert!(
            summary
                .group(ConnectionType::Genre)
                .is_some_and(|group| group.contains("Drama"))
        );
        assert_eq!(summarize_node(&index, 2).connection_count, 1);
    }
}
