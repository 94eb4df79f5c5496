use crate::preview::ModalPreview;
use crate::theme::Theme;
use eframe::egui::{self, Align2, CornerRadius, FontId, RichText, Stroke};

/// Grid background with the selected image fitted inside, or a hint when empty.
pub fn render_canvas(ui: &mut egui::Ui, theme: &Theme, image_uri: Option<String>) {
    let rect = ui.available_rect_before_wrap();
    ui.allocate_rect(rect, egui::Sense::hover());

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, CornerRadius::same(theme.radius_8), theme.canvas_fill);
    let grid = Stroke::new(1.0, theme.canvas_grid);
    let mut x = rect.left();
    while x < rect.right() {
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], grid);
        x += theme.grid_step;
    }
    let mut y = rect.top();
    while y < rect.bottom() {
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], grid);
        y += theme.grid_step;
    }

    match image_uri {
        Some(uri) => {
            ui.put(
                rect.shrink(theme.spacing_8),
                egui::Image::new(uri)
                    .maintain_aspect_ratio(true)
                    .shrink_to_fit()
                    .corner_radius(theme.radius_8),
            );
        }
        None => {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Click an image in the chat to preview it here",
                FontId::proportional(20.0),
                theme.text_muted,
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    None,
    Close,
    ConfirmJump,
}

pub fn render_modal(
    ctx: &egui::Context,
    theme: &Theme,
    modal: &ModalPreview,
    image_uri: String,
) -> ModalAction {
    let screen = ctx.screen_rect();
    let mut action = ModalAction::None;

    let response = egui::Modal::new(egui::Id::new("jump_preview"))
        .backdrop_color(theme.modal_backdrop)
        .show(ctx, |ui| {
            ui.set_width(screen.width() * 0.9);
            ui.horizontal(|ui| {
                if let Some(target) = &modal.target {
                    if ui
                        .button(RichText::new(format!("Open {target}")).color(theme.text_on_accent))
                        .clicked()
                    {
                        action = ModalAction::ConfirmJump;
                    }
                }
                if ui.button("Close").clicked() {
                    action = ModalAction::Close;
                }
            });
            ui.add_space(theme.spacing_8);
            ui.add(
                egui::Image::new(image_uri)
                    .maintain_aspect_ratio(true)
                    .max_height(screen.height() * 0.8)
                    .shrink_to_fit(),
            );
        });

    if action == ModalAction::None && response.should_close() {
        action = ModalAction::Close;
    }
    action
}
