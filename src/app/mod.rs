use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui::{self, Context, Vec2};
use tracing::{error, info};

use crate::graph::{
    ConnectionIndex, GraphData, GraphFingerprint, InteractionController, LayoutConfig,
    LayoutEngine,
};
use crate::source::{LoadUpdate, LoadedGraph, LoadingStatus, ValidationReport, spawn_load};

mod graph;
mod render_utils;
mod ui;

/// Startup options collected from the command line.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub graph_path: PathBuf,
    pub compact: bool,
    pub center: Option<String>,
    pub layout: LayoutConfig,
}

pub struct SimilarityGraphApp {
    options: LaunchOptions,
    state: AppState,
    reload: Option<PendingLoad>,
}

enum AppState {
    Loading(PendingLoad),
    Ready(Box<GraphView>),
    Error(String),
}

struct PendingLoad {
    rx: Receiver<LoadUpdate>,
    status: LoadingStatus,
}

impl PendingLoad {
    fn start(options: &LaunchOptions) -> Self {
        info!(path = %options.graph_path.display(), "loading similarity graph");
        Self {
            rx: spawn_load(options.graph_path.clone()),
            status: LoadingStatus::default(),
        }
    }

    /// Drains pending updates; returns the outcome once the worker is done.
    fn poll(&mut self) -> Option<Result<LoadedGraph, String>> {
        loop {
            match self.rx.try_recv() {
                Ok(LoadUpdate::Status(status)) => self.status = status,
                Ok(LoadUpdate::Finished(result)) => return Some(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return Some(Err("Background load worker disconnected".to_owned()));
                }
            }
        }
    }
}

struct GraphView {
    full: GraphData,
    data: GraphData,
    index: ConnectionIndex,
    fingerprint: GraphFingerprint,
    report: ValidationReport,
    engine: Option<LayoutEngine>,
    interaction: InteractionController,
    layout: LayoutConfig,
    viewport: Vec2,
    compact: bool,
    selected: Option<usize>,
    search: String,
    last_alpha: f32,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl SimilarityGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = AppState::Loading(PendingLoad::start(&options));
        Self {
            options,
            state,
            reload: None,
        }
    }

    fn ready_state(&self, loaded: LoadedGraph, compact: bool) -> AppState {
        AppState::Ready(Box::new(GraphView::new(
            loaded,
            self.options.center.as_deref(),
            self.options.layout,
            compact,
        )))
    }
}

impl eframe::App for SimilarityGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading(pending) => {
                if let Some(result) = pending.poll() {
                    transition = Some(result);
                } else {
                    ctx.request_repaint();
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui::draw_loading(ui, &pending.status);
                });
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load similarity graph");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            AppState::Ready(view) => {
                let mut reload_requested = false;
                let reloading = self.reload.as_ref().map(|pending| &pending.status);
                view.show(ctx, reloading, &mut reload_requested);

                if reload_requested && self.reload.is_none() {
                    self.reload = Some(PendingLoad::start(&self.options));
                }
            }
        }

        if retry {
            self.state = AppState::Loading(PendingLoad::start(&self.options));
        }

        if let Some(pending) = self.reload.as_mut() {
            if let Some(result) = pending.poll() {
                transition = Some(result);
            } else {
                ctx.request_repaint();
            }
        }

        if let Some(result) = transition {
            self.reload = None;
            let compact = match &self.state {
                AppState::Ready(view) => view.compact,
                _ => self.options.compact,
            };
            if let AppState::Ready(view) = &mut self.state {
                view.stop_layout();
            }
            self.state = match result {
                Ok(loaded) => self.ready_state(loaded, compact),
                Err(message) => {
                    error!(%message, "loading similarity graph failed");
                    AppState::Error(message)
                }
            };
        }
    }
}
