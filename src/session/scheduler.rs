use crate::event::AppEvent;
use eframe::egui;
use std::sync::mpsc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{self, Duration};

/// Identifies one scheduled reply so late or stale deliveries can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplyTicket(pub u64);

/// Handle to a scheduled reply; cancelling aborts the timer task.
#[derive(Debug, Default)]
pub struct ReplyTimer {
    abort: Option<AbortHandle>,
}

impl ReplyTimer {
    pub fn cancel(self) {
        if let Some(abort) = self.abort {
            abort.abort();
        }
    }
}

pub trait ReplyScheduler {
    fn schedule(&mut self, ticket: ReplyTicket, delay: Duration) -> ReplyTimer;
}

/// Sleeps on the tokio runtime and posts `AppEvent::ReplyDue` into the UI loop.
pub struct TokioScheduler {
    runtime_handle: Handle,
    tx: mpsc::Sender<AppEvent>,
    repaint: Option<egui::Context>,
}

impl TokioScheduler {
    pub fn new(runtime_handle: Handle, tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            runtime_handle,
            tx,
            repaint: None,
        }
    }

    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }
}

impl ReplyScheduler for TokioScheduler {
    fn schedule(&mut self, ticket: ReplyTicket, delay: Duration) -> ReplyTimer {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let task = self.runtime_handle.spawn(async move {
            time::sleep(delay).await;
            if tx.send(AppEvent::ReplyDue(ticket)).is_err() {
                tracing::debug!(ticket = ticket.0, "event loop gone, dropping scripted reply");
                return;
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
        tracing::debug!(ticket = ticket.0, delay_ms = delay.as_millis() as u64, "reply scheduled");
        ReplyTimer {
            abort: Some(task.abort_handle()),
        }
    }
}

/// Records schedules without a clock; tests fire tickets by hand.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    scheduled: std::rc::Rc<std::cell::RefCell<Vec<(ReplyTicket, Duration)>>>,
}

#[cfg(test)]
impl ManualScheduler {
    pub fn scheduled(&self) -> Vec<(ReplyTicket, Duration)> {
        self.scheduled.borrow().clone()
    }

    pub fn last_ticket(&self) -> Option<ReplyTicket> {
        self.scheduled.borrow().last().map(|(ticket, _)| *ticket)
    }
}

#[cfg(test)]
impl ReplyScheduler for ManualScheduler {
    fn schedule(&mut self, ticket: ReplyTicket, delay: Duration) -> ReplyTimer {
        self.scheduled.borrow_mut().push((ticket, delay));
        ReplyTimer::default()
    }
}
