use eframe::egui::{
    Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2, vec2,
};

use crate::graph::MediaType;
use crate::graph::render::{EdgeLine, NodeCard};

const CARD_FILL: Color32 = Color32::from_rgb(30, 36, 46);
const CENTER_ACCENT: Color32 = Color32::from_rgb(245, 158, 11);
const HOVER_ACCENT: Color32 = Color32::from_rgb(96, 165, 250);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, translate: Vec2, scale: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 20, 26));

    let step = (64.0 * scale).max(24.0);
    let origin = rect.min + translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn paint_edge(painter: &Painter, origin: Vec2, line: &EdgeLine) {
    let start = (origin + line.start).to_pos2();
    let end = (origin + line.end).to_pos2();
    if !edge_visible(painter.clip_rect(), start, end, line.width) {
        return;
    }

    painter.line_segment(
        [start, end],
        Stroke::new(line.width, line.color.gamma_multiply(line.opacity)),
    );
}

fn poster_placeholder(media_type: MediaType) -> Color32 {
    match media_type {
        MediaType::Movie => Color32::from_rgb(51, 65, 85),
        MediaType::Series => Color32::from_rgb(67, 56, 92),
    }
}

pub(super) fn paint_card(painter: &Painter, origin: Vec2, card: &NodeCard, scale: f32) {
    let rect = card.rect.translate(origin);
    if !rect.intersects(painter.clip_rect()) {
        return;
    }
    let poster = card.poster.translate(origin);
    let rounding = 6.0 * scale;

    painter.rect_filled(rect, rounding, CARD_FILL);
    painter.rect_filled(poster, rounding, poster_placeholder(card.media_type));
    painter.text(
        poster.center(),
        Align2::CENTER_CENTER,
        card.media_type.label(),
        FontId::proportional(11.0 * scale),
        Color32::from_gray(170),
    );

    let title_size = (if card.is_center { 13.0 } else { 11.0 }) * scale;
    let strip_top = poster.bottom() + 3.0 * scale;
    painter.text(
        Pos2::new(rect.center().x, strip_top),
        Align2::CENTER_TOP,
        card.title.as_str(),
        FontId::proportional(title_size),
        Color32::from_gray(236),
    );
    if let Some(year) = card.year.as_deref() {
        painter.text(
            Pos2::new(rect.center().x, strip_top + title_size + 3.0 * scale),
            Align2::CENTER_TOP,
            year,
            FontId::proportional(10.0 * scale),
            Color32::from_gray(150),
        );
    }

    let border = if card.selected || card.hovered {
        Some((2.0, HOVER_ACCENT))
    } else if card.is_center {
        Some((2.0, CENTER_ACCENT))
    } else {
        None
    };
    if let Some((width, color)) = border {
        let color = if card.is_center && card.hovered {
            blend_color(CENTER_ACCENT, HOVER_ACCENT, 0.5)
        } else {
            color
        };
        painter.rect_stroke(rect, rounding, Stroke::new(width, color), StrokeKind::Inside);
    }
}

/// Small framed text block anchored just below-right of the pointer and kept
/// inside the clip rect.
pub(super) fn paint_tooltip(painter: &Painter, pointer: Pos2, lines: &[String]) {
    if lines.is_empty() {
        return;
    }

    let galley = painter.layout_no_wrap(
        lines.join("\n"),
        FontId::proportional(12.0),
        Color32::from_gray(235),
    );
    let padding = vec2(8.0, 6.0);
    let size = galley.size() + padding * 2.0;
    let clip = painter.clip_rect();

    let mut min = pointer + vec2(14.0, 14.0);
    if min.x + size.x > clip.right() {
        min.x = (pointer.x - 14.0 - size.x).max(clip.left());
    }
    if min.y + size.y > clip.bottom() {
        min.y = (pointer.y - 14.0 - size.y).max(clip.top());
    }

    let frame = Rect::from_min_size(min, size);
    painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(12, 14, 19, 235));
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, Color32::from_gray(70)),
        StrokeKind::Inside,
    );
    painter.galley(min + padding, galley, Color32::from_gray(235));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_mixes_channels_linearly() {
        let mixed = blend_color(Color32::from_rgb(0, 0, 0), Color32::from_rgb(200, 100, 50), 0.5);
        assert_eq!((mixed.r(), mixed.g(), mixed.b()), (100, 50, 25));
    }

    #[test]
    fn offscreen_edges_are_culled() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(edge_visible(rect, Pos2::new(-50.0, 50.0), Pos2::new(50.0, 50.0), 1.0));
        assert!(!edge_visible(rect, Pos2::new(200.0, 0.0), Pos2::new(300.0, 80.0), 2.0));
    }
}
