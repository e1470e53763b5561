use eframe::egui::Context;

use crate::graph::RunState;

use super::super::GraphView;

impl GraphView {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        const FPS_SAMPLE_WINDOW: usize = 120;

        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if self.fps_samples.is_empty() {
            return None;
        }

        let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
        Some(format!("FPS {:.0} | avg {:.1}", self.fps_current, avg))
    }

    pub(in crate::app) fn simulation_text(&self) -> String {
        match self.engine.as_ref().map(|engine| engine.state()) {
            Some(RunState::Running) => format!("alpha {:.3}", self.last_alpha),
            Some(RunState::Idle) => "settled".to_owned(),
            Some(RunState::Stopped) | None => "idle".to_owned(),
        }
    }
}
