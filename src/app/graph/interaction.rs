use eframe::egui::{self, Rect, Ui, Vec2};

use crate::graph::{GraphEvent, PointerInput, summarize_edge, summarize_node};
use crate::util::format_similarity;

use super::super::GraphView;

/// Ends a press. egui may drop the position when the button goes up outside
/// the window, and may never report the release at all; a gesture still open
/// while the button is up is cancelled either way.
fn release_input(
    released: bool,
    button_down: bool,
    gesture_active: bool,
    pos: Option<Vec2>,
    time: f64,
) -> Option<PointerInput> {
    if released {
        return Some(match pos {
            Some(pos) => PointerInput::Released { pos, time },
            None => PointerInput::Cancelled,
        });
    }
    (gesture_active && !button_down).then_some(PointerInput::Cancelled)
}

/// Translates this frame's egui pointer state into controller input, in
/// coordinates relative to the top-left corner of `rect`.
pub(super) fn pointer_inputs(
    ui: &Ui,
    rect: Rect,
    response: &egui::Response,
    gesture_active: bool,
) -> Vec<PointerInput> {
    let origin = rect.min.to_vec2();
    let captured = response.hovered() || response.dragged();

    ui.input(|input| {
        let mut inputs = Vec::new();
        let time = input.time;
        let pointer = &input.pointer;

        if pointer.primary_pressed()
            && response.hovered()
            && let Some(pos) = pointer.interact_pos()
        {
            inputs.push(PointerInput::Pressed {
                pos: pos.to_vec2() - origin,
                time,
            });
        }

        match pointer.hover_pos() {
            Some(pos) if captured => inputs.push(PointerInput::Moved {
                pos: pos.to_vec2() - origin,
            }),
            _ => inputs.push(PointerInput::Left),
        }

        let last_pos = pointer.interact_pos().or(pointer.latest_pos());
        inputs.extend(release_input(
            pointer.primary_released(),
            pointer.primary_down(),
            gesture_active || pointer.primary_pressed(),
            last_pos.map(|pos| pos.to_vec2() - origin),
            time,
        ));

        if response.hovered()
            && let Some(pos) = pointer.hover_pos()
        {
            let delta = input.raw_scroll_delta.y;
            if delta.abs() > f32::EPSILON {
                inputs.push(PointerInput::Scrolled {
                    pos: pos.to_vec2() - origin,
                    delta,
                });
            }
        }

        inputs
    })
}

impl GraphView {
    pub(in crate::app) fn apply_graph_events(&mut self, events: Vec<GraphEvent>) {
        let mut recenter = None;
        for event in events {
            match event {
                GraphEvent::NodeClicked(node) => self.selected = Some(node),
                GraphEvent::NodeDoubleClicked(node) => {
                    recenter = self.data.nodes.get(node).map(|item| item.id.clone());
                }
            }
        }

        if let Some(id) = recenter {
            self.recenter_on(&id);
        }
    }

    /// Tooltip text for whatever the pointer is over, node first.
    pub(in crate::app) fn hover_lines(&self) -> Vec<String> {
        if let Some(node) = self.interaction.hovered_node() {
            let Some(item) = self.data.nodes.get(node) else {
                return Vec::new();
            };
            let summary = summarize_node(&self.index, node);
            let mut lines = vec![match item.year {
                Some(year) => format!("{} ({year})", item.title),
                None => item.title.clone(),
            }];
            lines.push(match summary.connection_count {
                1 => "1 connection".to_owned(),
                count => format!("{count} connections"),
            });
            lines.extend(summary.groups.iter().map(|group| group.summary_line()));
            return lines;
        }

        if let Some(edge_index) = self.interaction.hovered_edge() {
            let Some(edge) = self.data.edges.get(edge_index) else {
                return Vec::new();
            };
            let title = |id: &str| {
                self.index
                    .index_of(id)
                    .and_then(|index| self.data.nodes.get(index))
                    .map_or_else(|| id.to_owned(), |node| node.title.clone())
            };
            let summary = summarize_edge(edge);
            let mut lines = vec![
                format!("{} - {}", title(&edge.source), title(&edge.target)),
                format!("{} similar", format_similarity(edge.weight())),
            ];
            lines.extend(summary.groups.iter().map(|group| group.summary_line()));
            return lines;
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    #[test]
    fn release_keeps_its_position_when_known() {
        assert_eq!(
            release_input(true, false, true, Some(vec2(4.0, 5.0)), 2.0),
            Some(PointerInput::Released {
                pos: vec2(4.0, 5.0),
                time: 2.0
            })
        );
    }

    #[test]
    fn release_without_position_cancels() {
        assert_eq!(
            release_input(true, false, true, None, 2.0),
            Some(PointerInput::Cancelled)
        );
    }

    #[test]
    fn lost_release_cancels_an_open_gesture() {
        assert_eq!(
            release_input(false, false, true, None, 2.0),
            Some(PointerInput::Cancelled)
        );
        assert_eq!(release_input(false, true, true, None, 2.0), None);
        assert_eq!(release_input(false, false, false, None, 2.0), None);
    }
}
