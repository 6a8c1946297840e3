use crate::core::{
    build_summary, AppConfig, Language, MediaMode, Session, SessionEvent, SummaryMode,
};
use crate::exchange::{export_csv, load_session, save_session};
use crate::gui::tag_list::{TagListRenderer, TagRowResult};
use crate::gui::timeline::TimelineWidget;
use crate::player::{ControlSyncLoop, PlaybackController};
use eframe::egui;
use tokio::sync::broadcast;

/// Edit buffers for one tag being edited in the modal.
pub struct TagEditor {
    pub tag_id: String,
    pub labels_text: String,
    pub remarks_text: String,
    pub languages: std::collections::BTreeSet<Language>,
}

pub struct MediaTaggerApp {
    pub config: AppConfig,
    pub session: Session,
    pub controller: PlaybackController,
    pub sync: ControlSyncLoop,
    pub timeline: TimelineWidget,
    pub preset_labels: Vec<String>,
    pub summary_mode: SummaryMode,
    pub stream_url_input: String,
    pub jump_time_input: String,
    pub remarks_input: String,
    pub volume: u8,
    pub error_message: Option<String>,
    pub confirm_delete: Option<String>,
    pub confirm_clear: bool,
    pub editing_tag: Option<TagEditor>,
    pub event_receiver: broadcast::Receiver<SessionEvent>,
}

impl MediaTaggerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load()?;
        let preset_labels = config.load_preset_labels();
        log::info!("Loaded {} preset labels", preset_labels.len());

        let session = Session::new();
        let event_receiver = session.subscribe();

        let mut controller = PlaybackController::new();
        // The embed runtime initializes with the app in this build; loads
        // issued before this point would have been deferred.
        controller.on_embed_api_ready();

        Ok(Self {
            config,
            session,
            controller,
            sync: ControlSyncLoop::new(),
            timeline: TimelineWidget::new(),
            preset_labels,
            summary_mode: SummaryMode::default(),
            stream_url_input: String::new(),
            jump_time_input: String::new(),
            remarks_input: String::new(),
            volume: 100,
            error_message: None,
            confirm_delete: None,
            confirm_clear: false,
            editing_tag: None,
            event_receiver,
        })
    }

    fn report_error(&mut self, message: String) {
        log::error!("{}", message);
        self.error_message = Some(message);
    }

    pub fn open_local_media(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter(
            "Media",
            &["mp3", "wav", "ogg", "flac", "m4a", "mp4", "mkv", "webm"],
        );
        if let Some(dir) = &self.config.last_media_directory {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };

        if let Some(parent) = path.parent() {
            self.config.last_media_directory = Some(parent.to_path_buf());
            if let Err(e) = self.config.save() {
                log::warn!("Failed to persist config: {}", e);
            }
        }

        match self.controller.load_local_source(&path) {
            Ok(()) => {
                self.session.video_source = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.session.emit(SessionEvent::SourceLoaded);
                if self.controller.backend_ready() {
                    self.session.emit(SessionEvent::BackendReady);
                }
                self.apply_volume();
            }
            Err(e) => self.report_error(e.to_string()),
        }
    }

    pub fn load_stream_from_input(&mut self) {
        let url = self.stream_url_input.trim().to_string();
        match self.controller.load_streaming_source(&url) {
            Ok(()) => {
                self.session.video_source = url;
                self.session.emit(SessionEvent::SourceLoaded);
                if self.controller.backend_ready() {
                    self.session.emit(SessionEvent::BackendReady);
                }
                self.apply_volume();
            }
            Err(e) => self.report_error(e.to_string()),
        }
    }

    fn apply_volume(&mut self) {
        let volume = self.volume;
        if let Some(backend) = self.controller.backend_mut() {
            backend.set_volume(volume as i64);
        }
    }

    pub fn begin_tag(&mut self) {
        let time = self.controller.current_time();
        let ready = self.controller.backend_ready();
        if let Err(e) = self.session.start_interval(time, ready) {
            self.report_error(e.to_string());
        }
    }

    pub fn end_tag(&mut self) {
        let time = self.controller.current_time();
        let remarks = std::mem::take(&mut self.remarks_input);
        if let Err(e) = self.session.commit_interval(time, remarks) {
            self.report_error(e.to_string());
        }
    }

    pub fn request_clear(&mut self) {
        self.confirm_clear = true;
    }

    pub fn clear_session(&mut self) {
        self.controller.teardown();
        self.sync.reset_idle();
        self.session.clear();
        if self.config.media_mode != MediaMode::Audio {
            self.config.media_mode = MediaMode::Audio;
            if let Err(e) = self.config.save() {
                log::warn!("Failed to persist config: {}", e);
            }
        }
        self.confirm_clear = false;
    }

    pub fn export_csv_to_file(&mut self) {
        let export = match export_csv(&self.session) {
            Ok(export) => export,
            Err(e) => return self.report_error(e.to_string()),
        };
        let Some(path) = rfd::FileDialog::new().set_file_name(&export.filename).save_file()
        else {
            return;
        };
        match std::fs::write(&path, export.content) {
            Ok(()) => log::info!("Exported CSV to {}", path.display()),
            Err(e) => self.report_error(format!("Failed to write CSV: {}", e)),
        }
    }

    pub fn save_session_to_file(&mut self) {
        let json = match save_session(&self.session) {
            Ok(json) => json,
            Err(e) => return self.report_error(e.to_string()),
        };
        let filename = format!("{}.json", self.session.vid.trim());
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Session", &["json"])
            .set_file_name(&filename)
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, json) {
            Ok(()) => {
                self.session.mark_saved();
                log::info!("Saved session to {}", path.display());
            }
            Err(e) => self.report_error(format!("Failed to write session: {}", e)),
        }
    }

    pub fn load_session_from_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Session", &["json"])
            .pick_file()
        else {
            return;
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => return self.report_error(format!("Failed to read session: {}", e)),
        };
        match load_session(&content) {
            Ok(document) => {
                document.apply_to(&mut self.session);
                self.session.emit(SessionEvent::SourceLoaded);
            }
            Err(e) => self.report_error(e.to_string()),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            log::debug!("Session event: {:?}", event);
        }
    }

    pub(crate) fn apply_row_result(&mut self, tag_id: &str, result: TagRowResult) {
        if let Some(time) = result.seek_to {
            self.controller.seek_to(time);
        }
        if result.delete_requested {
            self.confirm_delete = Some(tag_id.to_string());
        }
        if result.edit_requested {
            if let Some(tag) = self.session.store.get(tag_id) {
                self.editing_tag = Some(TagEditor {
                    tag_id: tag.id.clone(),
                    labels_text: tag.labels.join("; "),
                    remarks_text: tag.remarks.clone(),
                    languages: tag.languages.clone(),
                });
            }
        }
    }

    fn show_source_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("VID:");
            ui.add(
                egui::TextEdit::singleline(&mut self.session.vid).desired_width(120.0),
            );

            ui.separator();
            if ui.button("Open file...").clicked() {
                self.open_local_media();
            }
            ui.label("or URL:");
            ui.add(
                egui::TextEdit::singleline(&mut self.stream_url_input).desired_width(260.0),
            );
            if ui.button("Load").clicked() {
                self.load_stream_from_input();
            }

            ui.separator();
            if ui.button("Clear").clicked() {
                self.request_clear();
            }
        });

        if !self.session.video_source.is_empty() {
            ui.horizontal(|ui| {
                ui.label("Source:");
                ui.monospace(&self.session.video_source);
                if self.session.is_dirty() {
                    ui.weak("(unsaved changes)");
                }
            });
        }

        if self.config.media_mode_switch_enabled {
            ui.horizontal(|ui| {
                ui.label("Mode:");
                let mut changed = false;
                changed |= ui
                    .radio_value(&mut self.config.media_mode, MediaMode::Audio, "Audio")
                    .changed();
                changed |= ui
                    .radio_value(&mut self.config.media_mode, MediaMode::Video, "Video")
                    .changed();
                if changed {
                    if let Err(e) = self.config.save() {
                        log::warn!("Failed to persist config: {}", e);
                    }
                }
            });
        }
    }

    fn show_transport(&mut self, ui: &mut egui::Ui) {
        let duration = self.controller.duration();

        ui.horizontal(|ui| {
            ui.add_enabled_ui(self.sync.controls_enabled, |ui| {
                let play_label = if self.sync.playing { "Pause" } else { "Play" };
                if ui.button(play_label).clicked() {
                    self.controller.toggle_playback();
                }
            });

            ui.monospace(format!(
                "{} / {}",
                self.sync.elapsed_text, self.sync.duration_text
            ));

            let slider_max = if duration > 0.0 { duration } else { 1.0 };
            let mut position = self.sync.scrub_position;
            let response = ui.add_enabled(
                self.sync.controls_enabled,
                egui::Slider::new(&mut position, 0.0..=slider_max).show_value(false),
            );
            if response.drag_started() {
                self.sync.begin_scrub();
            }
            if response.changed() {
                self.sync.scrub_preview(position);
            }
            if response.drag_stopped() {
                self.sync.end_scrub(&mut self.controller);
            }

            ui.separator();
            ui.label("Jump:");
            let jump_response = ui.add(
                egui::TextEdit::singleline(&mut self.jump_time_input).desired_width(80.0),
            );
            let submitted =
                jump_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if submitted || ui.small_button("Go").clicked() {
                self.controller.jump_to_time(&self.jump_time_input.clone());
            }

            ui.separator();
            ui.label("Vol:");
            if ui
                .add(egui::Slider::new(&mut self.volume, 0..=100).show_value(false))
                .changed()
            {
                self.apply_volume();
            }
        });
    }

    fn show_tagging_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Start Tag").clicked() {
                self.begin_tag();
            }
            let has_pending = self.session.store.pending().is_some();
            ui.add_enabled_ui(has_pending, |ui| {
                if ui.button("End Tag").clicked() {
                    self.end_tag();
                }
                if ui.button("Cancel").clicked() {
                    self.session.store.cancel_pending();
                }
            });
            if let Some(pending) = self.session.store.pending() {
                ui.weak(format!("tagging from {:.1}s", pending.start));
            }

            ui.separator();
            ui.label("Remarks:");
            ui.add(
                egui::TextEdit::singleline(&mut self.remarks_input).desired_width(200.0),
            );
        });

        ui.horizontal_wrapped(|ui| {
            ui.label("Languages:");
            for language in Language::ALL {
                let mut selected = self.session.session_languages().contains(&language);
                if ui.checkbox(&mut selected, language.as_str()).changed() {
                    self.session.toggle_language(language);
                }
            }
        });

        if !self.preset_labels.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("Labels:");
                let mut pending: Vec<String> = self.session.pending_labels().to_vec();
                let mut changed = false;
                for preset in &self.preset_labels {
                    let mut selected = pending.iter().any(|l| l == preset);
                    if ui.checkbox(&mut selected, preset).changed() {
                        if selected {
                            pending.push(preset.clone());
                        } else {
                            pending.retain(|l| l != preset);
                        }
                        changed = true;
                    }
                }
                if changed {
                    self.session.set_pending_labels(pending);
                }
            });
        }
    }

    fn show_tag_list(&mut self, ui: &mut egui::Ui) {
        ui.heading(TagListRenderer::heading(self.session.store.len()));
        let rows: Vec<String> = self
            .session
            .store
            .sorted_by_start()
            .iter()
            .map(|tag| tag.id.clone())
            .collect();

        egui::ScrollArea::vertical()
            .id_source("tag_list_scroll")
            .show(ui, |ui| {
                let mut pending_actions: Vec<(String, TagRowResult)> = Vec::new();
                for (index, id) in rows.iter().enumerate() {
                    let Some(tag) = self.session.store.get(id) else {
                        continue;
                    };
                    let result = TagListRenderer::render_tag_row(ui, tag, index);
                    pending_actions.push((id.clone(), result));
                }
                for (id, result) in pending_actions {
                    self.apply_row_result(&id, result);
                }
            });
    }

    fn show_summary(&mut self, ui: &mut egui::Ui) {
        ui.heading("Summary");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.summary_mode, SummaryMode::Label, "By label");
            ui.selectable_value(&mut self.summary_mode, SummaryMode::Language, "By language");
        });
        for (name, count) in build_summary(&self.session.store, self.summary_mode) {
            ui.horizontal(|ui| {
                ui.label(name);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.monospace(count.to_string());
                });
            });
        }

        ui.separator();
        if ui.button("Export CSV").clicked() {
            self.export_csv_to_file();
        }
        if ui.button("Save session").clicked() {
            self.save_session_to_file();
        }
        if ui.button("Load session").clicked() {
            self.load_session_from_file();
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.error_message.clone() {
            let mut open = true;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(&message);
                    if ui.button("OK").clicked() {
                        self.error_message = None;
                    }
                });
            if !open {
                self.error_message = None;
            }
        }

        if let Some(tag_id) = self.confirm_delete.clone() {
            egui::Window::new("Delete tag?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("This tag will be removed permanently.");
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            if self.session.store.delete(&tag_id) {
                                self.session.mark_dirty();
                            }
                            self.confirm_delete = None;
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_delete = None;
                        }
                    });
                });
        }

        if self.confirm_clear {
            egui::Window::new("Clear session?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("All tags and the loaded media will be discarded.");
                    ui.horizontal(|ui| {
                        if ui.button("Clear").clicked() {
                            self.clear_session();
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_clear = false;
                        }
                    });
                });
        }

        self.show_tag_editor(ctx);
    }

    fn show_tag_editor(&mut self, ctx: &egui::Context) {
        let Some(editor) = &mut self.editing_tag else {
            return;
        };
        let mut save = false;
        let mut cancel = false;

        egui::Window::new("Edit tag")
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label("Labels (separated by ;):");
                ui.text_edit_singleline(&mut editor.labels_text);
                ui.label("Remarks:");
                ui.text_edit_singleline(&mut editor.remarks_text);
                ui.horizontal(|ui| {
                    for language in Language::ALL {
                        let mut selected = editor.languages.contains(&language);
                        if ui.checkbox(&mut selected, language.as_str()).changed() {
                            if selected {
                                editor.languages.insert(language);
                            } else {
                                editor.languages.remove(&language);
                            }
                        }
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if save {
            let Some(editor) = self.editing_tag.take() else {
                return;
            };
            let labels: Vec<String> =
                editor.labels_text.split(';').map(str::to_string).collect();
            let id = editor.tag_id;
            let mut touched = self.session.store.update_labels(&id, labels);
            touched |= self.session.store.update_remarks(&id, &editor.remarks_text);
            touched |= self.session.store.update_languages(&id, editor.languages);
            if touched {
                self.session.mark_dirty();
            }
        } else if cancel {
            self.editing_tag = None;
        }
    }
}

impl eframe::App for MediaTaggerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.sync.tick(&mut self.controller) {
            self.session.emit(SessionEvent::PlaybackStateChanged);
        }
        self.drain_events();

        egui::TopBottomPanel::top("source_panel").show(ctx, |ui| {
            self.show_source_panel(ui);
        });

        egui::SidePanel::right("summary_panel")
            .default_width(200.0)
            .show(ctx, |ui| {
                self.show_summary(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let duration = self.controller.duration();
            let current = self.controller.current_time();
            let result = self
                .timeline
                .show(ui, &self.session.store, duration, current);
            if let Some(time) = result.seek_to {
                self.controller.seek_to(time);
            }

            self.show_transport(ui);
            ui.separator();
            self.show_tagging_controls(ui);
            ui.separator();
            self.show_tag_list(ui);
        });

        self.show_dialogs(ctx);

        // Keep ticking while media advances; otherwise the display only
        // updates on input events.
        if self.sync.playing {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
