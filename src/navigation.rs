use crate::event::AppEvent;
use crate::session::PageId;
use eframe::egui;
use std::sync::mpsc;

/// Receives page change requests; what a "page" is belongs to the host.
pub trait PageRouter {
    fn request_page_change(&mut self, target: &PageId);
}

pub struct NavigationBridge {
    router: Box<dyn PageRouter>,
}

impl NavigationBridge {
    pub fn new(router: Box<dyn PageRouter>) -> Self {
        Self { router }
    }

    pub fn request_page_change(&mut self, target: &PageId) {
        tracing::info!(page = %target, "page change requested");
        self.router.request_page_change(target);
    }
}

/// Forwards requests into the app event loop.
pub struct ChannelRouter {
    tx: mpsc::Sender<AppEvent>,
    repaint: Option<egui::Context>,
}

impl ChannelRouter {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx, repaint: None }
    }

    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }
}

impl PageRouter for ChannelRouter {
    fn request_page_change(&mut self, target: &PageId) {
        if self
            .tx
            .send(AppEvent::PageChangeRequested(target.clone()))
            .is_err()
        {
            tracing::warn!(page = %target, "event loop gone, page change dropped");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingRouter {
    requests: std::rc::Rc<std::cell::RefCell<Vec<PageId>>>,
}

#[cfg(test)]
impl RecordingRouter {
    pub fn requests(&self) -> Vec<PageId> {
        self.requests.borrow().clone()
    }
}

#[cfg(test)]
impl PageRouter for RecordingRouter {
    fn request_page_change(&mut self, target: &PageId) {
        self.requests.borrow_mut().push(target.clone());
    }
}
