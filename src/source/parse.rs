use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::graph::GraphData;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to read graph file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate node id {0:?}")]
    DuplicateNode(String),

    #[error("node at position {0} has an empty id")]
    EmptyId(usize),
}

/// Accepts a bare `{ "nodes": [...], "edges": [...] }` document or the same
/// object wrapped in the recommendation API's `{ "data": ... }` envelope.
pub fn parse_graph_data(raw: &str) -> Result<GraphData, GraphError> {
    let mut parsed: Value = serde_json::from_str(raw)?;
    let envelope = parsed
        .as_object_mut()
        .and_then(|object| object.remove("data"));
    let payload = envelope.unwrap_or(parsed);
    Ok(GraphData::deserialize(payload)?)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub centers_flagged: usize,
    pub similarities_clamped: usize,
}

/// Rejects graphs whose node ids are not unique, and normalizes the rest:
/// exactly one center flag survives and similarities are clamped into
/// `[0, 1]`.
pub fn validate_graph_data(data: &mut GraphData) -> Result<ValidationReport, GraphError> {
    let mut seen = HashSet::with_capacity(data.nodes.len());
    for (position, node) in data.nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            return Err(GraphError::EmptyId(position));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
    }

    let mut report = ValidationReport {
        centers_flagged: data.nodes.iter().filter(|node| node.is_center).count(),
        ..ValidationReport::default()
    };

    match report.centers_flagged {
        0 if !data.nodes.is_empty() => {
            warn!(anchor = %data.nodes[0].id, "no center node flagged; anchoring on the first node");
        }
        count if count > 1 => {
            let mut kept = false;
            for node in &mut data.nodes {
                if node.is_center {
                    node.is_center = !kept;
                    kept = true;
                }
            }
            warn!(count, "several center nodes flagged; keeping the first");
        }
        _ => {}
    }

    for edge in &mut data.edges {
        let weight = edge.weight();
        if weight != edge.similarity {
            edge.similarity = weight;
            report.similarities_clamped += 1;
        }
    }
    if report.similarities_clamped > 0 {
        warn!(
            count = report.similarities_clamped,
            "clamped similarity scores outside [0, 1]"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{
        "nodes": [
            {"id": "m1", "title": "Heat", "year": 1995, "mediaType": "movie", "isCenter": true,
             "posterUrl": "https://img.example/heat.jpg"},
            {"id": "s1", "title": "The Wire", "mediaType": "series"}
        ],
        "edges": [
            {"source": "m1", "target": "s1", "similarity": 0.7,
             "reasons": [{"type": "genre", "value": "Crime"}, {"type": "keyword"}]}
        ]
    }"#;

    #[test]
    fn parses_bare_and_enveloped_documents() {
        let bare = parse_graph_data(BARE).expect("bare document");
        let wrapped = parse_graph_data(&format!(r#"{{"data": {BARE}}}"#)).expect("envelope");

        assert_eq!(bare, wrapped);
        assert_eq!(bare.nodes.len(), 2);
        assert_eq!(bare.nodes[0].year, Some(1995));
        assert!(bare.nodes[0].is_center);
        assert!(!bare.nodes[1].is_center);
        assert_eq!(bare.edges[0].reasons.len(), 2);
    }

    #[test]
    fn malformed_envelope_is_not_an_empty_graph() {
        assert!(matches!(
            parse_graph_data(r#"{"data": {"nodes": [{"id": 3}]}}"#),
            Err(GraphError::Json(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_graph_data("{\"nodes\": [}"),
            Err(GraphError::Json(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_an_error() {
        let mut data = parse_graph_data(BARE).expect("bare document");
        data.nodes[1].id = "m1".to_owned();

        assert!(matches!(
            validate_graph_data(&mut data),
            Err(GraphError::DuplicateNode(id)) if id == "m1"
        ));
    }

    #[test]
    fn extra_centers_are_cleared_and_scores_clamped() {
        let mut data = parse_graph_data(BARE).expect("bare document");
        data.nodes[1].is_center = true;
        data.edges[0].similarity = 1.5;

        let report = validate_graph_data(&mut data).expect("valid ids");
        assert_eq!(report.centers_flagged, 2);
        assert_eq!(report.similarities_clamped, 1);
        assert!(data.nodes[0].is_center);
        assert!(!data.nodes[1].is_center);
        assert_eq!(data.edges[0].similarity, 1.0);
    }
}
