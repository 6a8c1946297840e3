use crate::core::tag::Tag;
use crate::core::timefmt::format_hms;
use eframe::egui;

/// Actions requested by one rendered tag row. The app applies them after the
/// whole list has been drawn so the store is never mutated mid-iteration.
#[derive(Default)]
pub struct TagRowResult {
    pub seek_to: Option<f64>,
    pub delete_requested: bool,
    pub edit_requested: bool,
}

pub struct TagListRenderer;

impl TagListRenderer {
    /// Render a single tag row and return what actions need to be taken.
    pub fn render_tag_row(ui: &mut egui::Ui, tag: &Tag, row_index: usize) -> TagRowResult {
        let mut result = TagRowResult::default();

        ui.push_id(("tag_row", row_index), |ui| {
            ui.horizontal(|ui| {
                // Start and end are clickable jump targets.
                if ui
                    .link(format_hms(tag.start, true))
                    .on_hover_text("Jump to start")
                    .clicked()
                {
                    result.seek_to = Some(tag.start);
                }
                ui.label("-");
                if ui
                    .link(format_hms(tag.end, true))
                    .on_hover_text("Jump to end")
                    .clicked()
                {
                    result.seek_to = Some(tag.end);
                }

                ui.add_space(8.0);
                ui.label(Self::label_text(tag));

                if !tag.languages.is_empty() {
                    let languages: Vec<&str> =
                        tag.languages.iter().map(|l| l.as_str()).collect();
                    ui.weak(languages.join(", "));
                }
                if !tag.remarks.is_empty() {
                    ui.weak(&tag.remarks).on_hover_text(&tag.remarks);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("🗑").on_hover_text("Delete tag").clicked() {
                        result.delete_requested = true;
                    }
                    if ui.small_button("✏").on_hover_text("Edit tag").clicked() {
                        result.edit_requested = true;
                    }
                });
            });
        });

        result
    }

    pub fn heading(tag_count: usize) -> String {
        if tag_count == 0 {
            "No tags".to_string()
        } else {
            format!("Edit Tags ({})", tag_count)
        }
    }

    fn label_text(tag: &Tag) -> String {
        if tag.labels.is_empty() {
            "(no label)".to_string()
        } else {
            tag.labels.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_heading_reflects_count() {
        assert_eq!(TagListRenderer::heading(0), "No tags");
        assert_eq!(TagListRenderer::heading(3), "Edit Tags (3)");
    }

    #[test]
    fn test_label_text() {
        let tag = Tag::new(0.0, 1.0, Vec::new(), BTreeSet::new(), String::new());
        assert_eq!(TagListRenderer::label_text(&tag), "(no label)");

        let tag = Tag::new(
            0.0,
            1.0,
            vec!["Greeting".to_string(), "Song".to_string()],
            BTreeSet::new(),
            String::new(),
        );
        assert_eq!(TagListRenderer::label_text(&tag), "Greeting; Song");
    }
}
