use crate::session::{ImageRef, Message, PageId, Sender};
use crate::theme::Theme;
use eframe::egui::{self, Align, Layout, RichText, ScrollArea};

/// Clicks routed out of rendered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    ImageClicked(ImageRef),
    JumpActivated {
        target: PageId,
        image: Option<ImageRef>,
    },
}

pub fn render_transcript(
    ui: &mut egui::Ui,
    theme: &Theme,
    messages: &[Message],
    queued: &[&str],
    awaiting_reply: bool,
    image_uri: &dyn Fn(&str) -> String,
    emit: &mut dyn FnMut(ChatAction),
) {
    ScrollArea::vertical()
        .id_salt("chat_transcript")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in messages {
                render_message(ui, theme, message, image_uri, emit);
            }

            if awaiting_reply {
                ui.label(
                    RichText::new("Assistant is typing…")
                        .italics()
                        .color(theme.text_muted),
                );
            }

            for text in queued {
                ui.with_layout(Layout::right_to_left(Align::TOP), |ui| {
                    ui.label(
                        RichText::new(format!("queued: {text}"))
                            .color(theme.text_muted)
                            .size(12.0),
                    );
                });
            }
        });
}

fn render_message(
    ui: &mut egui::Ui,
    theme: &Theme,
    message: &Message,
    image_uri: &dyn Fn(&str) -> String,
    emit: &mut dyn FnMut(ChatAction),
) {
    let from_user = message.sender == Sender::User;
    let layout = if from_user {
        Layout::right_to_left(Align::TOP)
    } else {
        Layout::left_to_right(Align::TOP)
    };
    let max_width = ui.available_width() * 0.8;

    ui.with_layout(layout, |ui| {
        ui.label(if from_user { "🙂" } else { "🤖" });
        theme.bubble_frame(from_user).show(ui, |ui| {
            ui.set_max_width(max_width);
            ui.vertical(|ui| {
                if let Some(text) = &message.text {
                    ui.label(RichText::new(text).color(theme.bubble_text_color(from_user)));
                }

                if let Some(image) = &message.image_ref {
                    let response = ui
                        .add(
                            egui::Image::new(image_uri(image.as_str()))
                                .max_width(theme.inline_image_width)
                                .corner_radius(theme.radius_8 / 2)
                                .sense(egui::Sense::click()),
                        )
                        .on_hover_cursor(egui::CursorIcon::PointingHand);
                    if response.clicked() {
                        emit(ChatAction::ImageClicked(image.clone()));
                    }
                }

                if let Some(jump) = &message.jump {
                    if ui.small_button(&jump.label).clicked() {
                        emit(ChatAction::JumpActivated {
                            target: jump.target.clone(),
                            image: message.image_ref.clone(),
                        });
                    }
                }
            });
        });
    });
    ui.add_space(theme.spacing_4);
}

pub struct ComposerOutput {
    pub submit: bool,
    pub reset: bool,
}

/// Enter sends, Shift+Enter inserts a newline.
pub fn render_composer(ui: &mut egui::Ui, theme: &Theme, input_buffer: &mut String) -> ComposerOutput {
    let id = ui.make_persistent_id("chat_composer");
    let focused = ui.memory(|memory| memory.has_focus(id));
    let mut submit = focused
        && !ui.input(|input| input.modifiers.shift)
        && ui.input_mut(|input| input.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
    let mut reset = false;

    theme.composer_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            let send_width = 64.0;
            ui.add(
                egui::TextEdit::multiline(input_buffer)
                    .id(id)
                    .desired_rows(1)
                    .desired_width(ui.available_width() - send_width - theme.spacing_8)
                    .hint_text("Type a message..."),
            );
            ui.vertical(|ui| {
                submit |= ui
                    .add_enabled(!input_buffer.trim().is_empty(), egui::Button::new("Send"))
                    .clicked();
                reset = ui
                    .small_button("Reset")
                    .on_hover_text("Clear the conversation")
                    .clicked();
            });
        });
    });

    ComposerOutput { submit, reset }
}
