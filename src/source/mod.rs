//! Loading pipeline that feeds the graph view: reads a `GraphData` document
//! on a worker thread and reports phased [`LoadingStatus`] updates.

mod parse;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use tracing::info;

use crate::graph::{GraphData, LayoutConfig};

pub use parse::{GraphError, ValidationReport, parse_graph_data, validate_graph_data};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Fetching,
    Validating,
    Building,
}

impl LoadPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Validating => "validating",
            Self::Building => "building",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadingStatus {
    pub phase: LoadPhase,
    /// Percent complete, 0-100, when the producer knows it.
    pub progress: Option<f32>,
    pub message: Option<String>,
    pub detail: Option<String>,
}

impl LoadingStatus {
    pub fn new(phase: LoadPhase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("Loading...")
    }

    pub fn progress_fraction(&self) -> Option<f32> {
        self.progress
            .filter(|progress| progress.is_finite())
            .map(|progress| (progress / 100.0).clamp(0.0, 1.0))
    }
}

#[derive(Clone, Debug)]
pub struct LoadedGraph {
    pub data: GraphData,
    pub report: ValidationReport,
}

pub enum LoadUpdate {
    Status(LoadingStatus),
    Finished(Result<LoadedGraph, String>),
}

pub fn load_graph_file(
    path: &Path,
    mut report_status: impl FnMut(LoadingStatus),
) -> Result<LoadedGraph> {
    report_status(
        LoadingStatus::new(LoadPhase::Fetching)
            .with_progress(0.0)
            .with_message("Reading similarity graph")
            .with_detail(path.display().to_string()),
    );
    let raw = fs::read_to_string(path)
        .map_err(GraphError::from)
        .with_context(|| format!("failed to read {}", path.display()))?;

    report_status(
        LoadingStatus::new(LoadPhase::Validating)
            .with_progress(40.0)
            .with_message("Validating graph"),
    );
    let mut data = parse_graph_data(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let report = validate_graph_data(&mut data)
        .with_context(|| format!("graph in {} is not usable", path.display()))?;

    report_status(
        LoadingStatus::new(LoadPhase::Building)
            .with_progress(80.0)
            .with_message("Building graph")
            .with_detail(format!(
                "{} items, {} connections",
                data.nodes.len(),
                data.edges.len()
            )),
    );
    info!(
        path = %path.display(),
        nodes = data.nodes.len(),
        edges = data.edges.len(),
        "loaded similarity graph"
    );

    Ok(LoadedGraph { data, report })
}

pub fn spawn_load(path: PathBuf) -> Receiver<LoadUpdate> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let status_tx = tx.clone();
        let result = load_graph_file(&path, |status| {
            let _ = status_tx.send(LoadUpdate::Status(status));
        })
        .map_err(|error| format!("{error:#}"));
        let _ = tx.send(LoadUpdate::Finished(result));
    });

    rx
}

pub fn load_layout_config(path: &Path) -> Result<LayoutConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout config {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid layout config in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("reelgraph-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn status_defaults_are_generic() {
        let status = LoadingStatus::default();
        assert_eq!(status.phase, LoadPhase::Fetching);
        assert_eq!(status.message(), "Loading...");
        assert_eq!(status.progress_fraction(), None);

        let blank = LoadingStatus::new(LoadPhase::Building).with_message("  ");
        assert_eq!(blank.message(), "Loading...");
        assert_eq!(
            LoadingStatus::default().with_progress(250.0).progress_fraction(),
            Some(1.0)
        );
        assert_eq!(
            LoadingStatus::default().with_progress(f32::NAN).progress_fraction(),
            None
        );
    }

    #[test]
    fn loading_reports_every_phase_in_order() {
        let path = temp_file(
            "phases.json",
            r#"{"nodes": [{"id": "a", "title": "A", "mediaType": "movie", "isCenter": true}], "edges": []}"#,
        );
        let mut phases = Vec::new();
        let loaded = load_graph_file(&path, |status| phases.push(status.phase)).expect("loads");
        let _ = fs::remove_file(&path);

        assert_eq!(
            phases,
            vec![LoadPhase::Fetching, LoadPhase::Validating, LoadPhase::Building]
        );
        assert_eq!(loaded.data.nodes.len(), 1);
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let error = load_graph_file(Path::new("/definitely/not/here.json"), |_| {})
            .expect_err("missing file");
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn worker_thread_finishes_with_a_result() {
        let path = temp_file("worker.json", r#"{"nodes": [], "edges": []}"#);
        let rx = spawn_load(path.clone());

        let mut finished = None;
        for update in rx.iter() {
            if let LoadUpdate::Finished(result) = update {
                finished = Some(result);
            }
        }
        let _ = fs::remove_file(&path);

        let loaded = finished.expect("finished").expect("valid graph");
        assert!(loaded.data.is_empty());
    }

    #[test]
    fn partial_layout_config_keeps_defaults() {
        let path = temp_file("layout.json", r#"{"chargeStrength": -400.0, "settleTicks": 5}"#);
        let config = load_layout_config(&path).expect("valid config");
        let _ = fs::remove_file(&path);

        assert_eq!(config.charge_strength, -400.0);
        assert_eq!(config.settle_ticks, 5);
        assert_eq!(config.alpha_decay, LayoutConfig::default().alpha_decay);
    }
}
