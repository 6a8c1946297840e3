use crate::core::tag::{IntervalStore, Tag};
use crate::core::timefmt::format_ruler;
use eframe::egui;

/// Ruler steps in seconds, coarsest last.
pub const RULER_CANDIDATES: [f64; 10] =
    [1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// Minimum horizontal room per ruler label before labels collide.
const MIN_LABEL_SPACING_PX: f32 = 60.0;

/// Width floor so zero-length and very short tags stay clickable.
pub const MIN_BAR_WIDTH_PCT: f64 = 0.5;

const BAR_COLORS: [egui::Color32; 5] = [
    egui::Color32::from_rgb(0x4c, 0xaf, 0x50),
    egui::Color32::from_rgb(0x21, 0x96, 0xf3),
    egui::Color32::from_rgb(0xff, 0x98, 0x00),
    egui::Color32::from_rgb(0x9c, 0x27, 0xb0),
    egui::Color32::from_rgb(0xf4, 0x43, 0x36),
];

/// Picks the ruler step: the finest candidate whose marker count fits the
/// available width. A duration that would paint fewer than two labels drops
/// back to a finer step so the ruler never degenerates to a single mark.
pub fn ruler_interval(duration: f64, width_px: f32) -> f64 {
    let max_markers = (width_px / MIN_LABEL_SPACING_PX).floor().max(1.0) as f64;
    let mut interval = RULER_CANDIDATES[RULER_CANDIDATES.len() - 1];
    for candidate in RULER_CANDIDATES {
        if duration / candidate <= max_markers {
            interval = candidate;
            break;
        }
    }
    if duration > 1.0 && duration / interval < 2.0 {
        for candidate in RULER_CANDIDATES.iter().rev() {
            if *candidate < interval && duration / candidate >= 2.0 {
                interval = *candidate;
                break;
            }
        }
    }
    interval
}

/// Proportional placement of one tag bar as (left %, width %). Tags outside
/// the media window are not drawn at all.
pub fn bar_geometry(start: f64, end: f64, duration: f64) -> Option<(f64, f64)> {
    if duration <= 0.0 || start < 0.0 || end < start || end > duration {
        return None;
    }
    let left = start / duration * 100.0;
    let width = ((end - start) / duration * 100.0).max(MIN_BAR_WIDTH_PCT);
    Some((left, width))
}

/// Maps a click x offset inside the track to media time.
pub fn click_to_time(offset_x: f32, track_width: f32, duration: f64) -> f64 {
    if track_width <= 0.0 {
        return 0.0;
    }
    (offset_x / track_width).clamp(0.0, 1.0) as f64 * duration
}

/// All tags whose interval covers the clicked time, boundaries inclusive.
pub fn resolve_click<'a>(sorted: &[&'a Tag], time: f64) -> Vec<&'a Tag> {
    sorted
        .iter()
        .copied()
        .filter(|tag| tag.start <= time && time <= tag.end)
        .collect()
}

/// What a track click does. Zero matches is a no-op, one match jumps to the
/// tag's start, more than one asks the user which tag was meant.
#[derive(Debug, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Seek(f64),
    /// (tag id, display text, start) per overlapping candidate.
    Ambiguous(Vec<(String, String, f64)>),
}

pub fn click_outcome(store: &IntervalStore, duration: f64, time: f64) -> ClickOutcome {
    let sorted = store.sorted_by_start();
    let valid: Vec<&Tag> = sorted
        .into_iter()
        .filter(|tag| tag.is_valid_for(duration))
        .collect();
    match resolve_click(&valid, time).as_slice() {
        [] => ClickOutcome::Ignored,
        [only] => ClickOutcome::Seek(only.start),
        many => ClickOutcome::Ambiguous(
            many.iter()
                .map(|tag| (tag.id.clone(), describe(tag), tag.start))
                .collect(),
        ),
    }
}

struct DisambiguationMenu {
    screen_pos: egui::Pos2,
    /// (tag id, display text, start) per overlapping candidate.
    candidates: Vec<(String, String, f64)>,
}

/// Result of one timeline frame, consumed by the app.
#[derive(Default)]
pub struct TimelineRenderResult {
    pub seek_to: Option<f64>,
}

pub struct TimelineWidget {
    menu: Option<DisambiguationMenu>,
}

impl TimelineWidget {
    pub fn new() -> Self {
        TimelineWidget { menu: None }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &IntervalStore,
        duration: f64,
        current_time: f64,
    ) -> TimelineRenderResult {
        let mut result = TimelineRenderResult::default();

        let available_width = ui.available_width();
        let timeline_height = 64.0;
        let (rect, response) = ui.allocate_exact_size(
            egui::Vec2::new(available_width, timeline_height),
            egui::Sense::click(),
        );

        if !ui.is_rect_visible(rect) {
            return result;
        }

        let painter = ui.painter();
        painter.rect_filled(rect, egui::Rounding::same(4.0), ui.visuals().extreme_bg_color);

        let track_rect = egui::Rect::from_min_size(
            rect.min + egui::Vec2::new(8.0, 22.0),
            egui::Vec2::new(available_width - 16.0, 26.0),
        );
        painter.rect_stroke(
            track_rect,
            egui::Rounding::same(2.0),
            egui::Stroke::new(1.0, ui.visuals().weak_text_color()),
        );

        if duration > 0.0 {
            self.paint_ruler(ui, track_rect, duration);
            self.paint_bars(ui, track_rect, store, duration);
            self.paint_start_dot(ui, track_rect, store, duration);
            self.paint_playhead(ui, rect, track_rect, current_time, duration);
        }

        if response.clicked() && duration > 0.0 {
            if let Some(pos) = response.interact_pointer_pos() {
                let time = click_to_time(pos.x - track_rect.min.x, track_rect.width(), duration);
                match click_outcome(store, duration, time) {
                    ClickOutcome::Ignored => {}
                    ClickOutcome::Seek(start) => result.seek_to = Some(start),
                    ClickOutcome::Ambiguous(candidates) => {
                        self.menu = Some(DisambiguationMenu {
                            screen_pos: pos,
                            candidates,
                        });
                    }
                }
            }
        }

        if let Some(choice) = self.show_menu(ui) {
            result.seek_to = Some(choice);
        }

        result
    }

    fn paint_ruler(&self, ui: &egui::Ui, track_rect: egui::Rect, duration: f64) {
        let painter = ui.painter();
        let interval = ruler_interval(duration, track_rect.width());
        let mut marker = 0;
        loop {
            let time = marker as f64 * interval;
            if time > duration {
                break;
            }
            let x = track_rect.min.x + (time / duration) as f32 * track_rect.width();
            painter.line_segment(
                [
                    egui::Pos2::new(x, track_rect.min.y),
                    egui::Pos2::new(x, track_rect.max.y),
                ],
                egui::Stroke::new(0.5, ui.visuals().weak_text_color()),
            );
            painter.text(
                egui::Pos2::new(x, track_rect.min.y - 12.0),
                egui::Align2::CENTER_BOTTOM,
                format_ruler(time),
                egui::FontId::monospace(10.0),
                ui.visuals().weak_text_color(),
            );
            marker += 1;
        }
    }

    fn paint_bars(
        &self,
        ui: &egui::Ui,
        track_rect: egui::Rect,
        store: &IntervalStore,
        duration: f64,
    ) {
        let painter = ui.painter();
        for (index, tag) in store.sorted_by_start().iter().enumerate() {
            let Some((left_pct, width_pct)) = bar_geometry(tag.start, tag.end, duration) else {
                log::debug!(
                    "Skipping tag {} outside media window ({:.3}s - {:.3}s of {:.3}s)",
                    tag.id,
                    tag.start,
                    tag.end,
                    duration
                );
                continue;
            };
            let left = track_rect.min.x + (left_pct / 100.0) as f32 * track_rect.width();
            let width = (width_pct / 100.0) as f32 * track_rect.width();
            let bar_rect = egui::Rect::from_min_size(
                egui::Pos2::new(left, track_rect.min.y + 4.0),
                egui::Vec2::new(width, track_rect.height() - 8.0),
            );
            painter.rect_filled(
                bar_rect,
                egui::Rounding::same(2.0),
                BAR_COLORS[index % BAR_COLORS.len()].gamma_multiply(0.8),
            );
        }
    }

    fn paint_start_dot(
        &self,
        ui: &egui::Ui,
        track_rect: egui::Rect,
        store: &IntervalStore,
        duration: f64,
    ) {
        let Some(pending) = store.pending() else {
            return;
        };
        if pending.start < 0.0 || pending.start > duration {
            return;
        }
        let x = track_rect.min.x + (pending.start / duration) as f32 * track_rect.width();
        ui.painter().circle_filled(
            egui::Pos2::new(x, track_rect.center().y),
            4.0,
            egui::Color32::YELLOW,
        );
    }

    fn paint_playhead(
        &self,
        ui: &egui::Ui,
        rect: egui::Rect,
        track_rect: egui::Rect,
        current_time: f64,
        duration: f64,
    ) {
        let x = track_rect.min.x
            + (current_time / duration).clamp(0.0, 1.0) as f32 * track_rect.width();
        ui.painter().line_segment(
            [
                egui::Pos2::new(x, rect.min.y + 4.0),
                egui::Pos2::new(x, rect.max.y - 4.0),
            ],
            egui::Stroke::new(2.0, egui::Color32::RED),
        );
    }

    /// Overlap disambiguation popup. Returns the chosen start time.
    fn show_menu(&mut self, ui: &mut egui::Ui) -> Option<f64> {
        let menu = self.menu.as_ref()?;
        let mut chosen = None;
        let mut close = false;

        let area = egui::Area::new(egui::Id::new("timeline_disambiguation"))
            .fixed_pos(menu.screen_pos)
            .order(egui::Order::Foreground);
        let area_response = area.show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                for (id, display, start) in &menu.candidates {
                    if ui.button(display).clicked() {
                        log::debug!("Disambiguation chose tag {}", id);
                        chosen = Some(*start);
                        close = true;
                    }
                }
            });
        });

        if chosen.is_none() && ui.input(|i| i.pointer.any_click()) {
            // A click that did not land inside the popup dismisses it with no
            // action. The opening click sits at the popup's anchor corner and
            // is therefore inside.
            if let Some(pos) = ui.ctx().input(|i| i.pointer.interact_pos()) {
                close = click_dismisses_menu(area_response.response.rect, pos);
            }
        }
        if close {
            self.menu = None;
        }
        chosen
    }
}

impl Default for TimelineWidget {
    fn default() -> Self {
        Self::new()
    }
}

/// Dismissal test against the popup's painted rect, not a distance guess.
fn click_dismisses_menu(menu_rect: egui::Rect, click: egui::Pos2) -> bool {
    !menu_rect.contains(click)
}

fn describe(tag: &Tag) -> String {
    let label = if tag.labels.is_empty() {
        "(no label)".to_string()
    } else {
        tag.labels.join(", ")
    };
    format!("{} [{:.1}s - {:.1}s]", label, tag.start, tag.end)
}
