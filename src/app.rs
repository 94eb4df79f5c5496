use crate::config::AppConfig;
use crate::event::AppEvent;
use crate::preview::PreviewSync;
use crate::session::controller::{SendOutcome, SessionController, TurnState};
use crate::session::PageId;
use crate::theme::Theme;
use crate::ui::canvas::{self, ModalAction};
use crate::ui::chat::{self, ChatAction};
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};

const HOME_PAGE: &str = "home";

pub struct CanvasChatApp {
    rx: Receiver<AppEvent>,
    controller: SessionController,
    preview: PreviewSync,
    config: AppConfig,
    theme: Theme,
    pages: Vec<PageId>,
    active_page: PageId,
    input_buffer: String,
    diagnostics_log: Vec<String>,
}

impl CanvasChatApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        controller: SessionController,
        preview: PreviewSync,
        config: AppConfig,
        theme: Theme,
        pages: Vec<PageId>,
    ) -> Self {
        Self {
            rx,
            controller,
            preview,
            config,
            theme,
            pages,
            active_page: PageId::new(HOME_PAGE),
            input_buffer: String::new(),
            diagnostics_log: Vec::new(),
        }
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    pub fn log_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message));
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ReplyDue(ticket) => {
                if let Err(err) = self.controller.deliver_reply(ticket) {
                    self.log_diagnostic(err.to_string());
                }
            }
            AppEvent::PageChangeRequested(page) => {
                self.active_page = page;
            }
        }
    }

    fn submit_prompt(&mut self) {
        match self.controller.send(&self.input_buffer) {
            Ok(SendOutcome::Ignored) => {}
            Ok(_) => self.input_buffer.clear(),
            Err(err) => {
                self.input_buffer.clear();
                self.log_diagnostic(err.to_string());
            }
        }
    }

    fn reset_session(&mut self) {
        if let Err(err) = self.controller.reset() {
            self.log_diagnostic(err.to_string());
        }
    }

    fn apply_chat_action(&mut self, action: ChatAction) {
        match action {
            ChatAction::ImageClicked(image) => self.preview.on_image_clicked(image),
            ChatAction::JumpActivated { target, image } => {
                self.preview.on_jump_activated(Some(target), image)
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut reset = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Canvas Chat");
                ui.separator();
                ui.label(
                    RichText::new(format!("Page: {}", self.active_page))
                        .color(self.theme.text_muted),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    reset = ui
                        .button("★")
                        .on_hover_text("Start a new conversation")
                        .clicked();
                });
            });
        });
        if reset {
            self.reset_session();
        }
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("pages_panel")
            .resizable(false)
            .exact_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Pages");
                ui.separator();
                for page in &self.pages {
                    let selected = *page == self.active_page;
                    if ui.selectable_label(selected, page.as_str()).clicked() {
                        self.active_page = page.clone();
                    }
                }

                ui.separator();
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(160.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                if self.diagnostics_log.is_empty() {
                                    ui.label(RichText::new("No diagnostics").color(self.theme.text_muted));
                                }
                                for entry in &self.diagnostics_log {
                                    ui.label(RichText::new(entry).color(self.theme.danger).size(12.0));
                                }
                            });
                    });
            });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        let mut composer = None;

        egui::SidePanel::right("chat_panel")
            .resizable(true)
            .default_width(400.0)
            .show(ctx, |ui| {
                let theme = &self.theme;
                let config = &self.config;
                let queued: Vec<&str> = self.controller.queued().collect();
                let awaiting = self.controller.state() == TurnState::AwaitingReply;

                egui::TopBottomPanel::bottom("composer_panel")
                    .show_separator_line(false)
                    .show_inside(ui, |ui| {
                        composer = Some(chat::render_composer(ui, theme, &mut self.input_buffer));
                    });

                egui::CentralPanel::default().show_inside(ui, |ui| {
                    chat::render_transcript(
                        ui,
                        theme,
                        self.controller.messages(),
                        &queued,
                        awaiting,
                        &|reference: &str| config.image_uri(reference),
                        &mut |action: ChatAction| actions.push(action),
                    );
                });
            });

        for action in actions {
            self.apply_chat_action(action);
        }
        if let Some(composer) = composer {
            if composer.reset {
                self.reset_session();
            } else if composer.submit {
                self.submit_prompt();
            }
        }
    }

    fn render_canvas_panel(&mut self, ctx: &egui::Context) {
        let image_uri = self
            .preview
            .canvas_image()
            .map(|image| self.config.image_uri(image.as_str()));
        egui::CentralPanel::default().show(ctx, |ui| {
            canvas::render_canvas(ui, &self.theme, image_uri);
        });
    }

    fn render_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.preview.modal().cloned() else {
            return;
        };
        let image_uri = self.config.image_uri(modal.image.as_str());
        match canvas::render_modal(ctx, &self.theme, &modal, image_uri) {
            ModalAction::None => {}
            ModalAction::Close => self.preview.close_modal(),
            ModalAction::ConfirmJump => self.preview.confirm_jump(modal.target.as_ref()),
        }
    }
}

impl eframe::App for CanvasChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_chat_panel(ctx);
        self.render_canvas_panel(ctx);
        self.render_modal(ctx);
    }
}
