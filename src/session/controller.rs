use crate::session::log::MessageLog;
use crate::session::scheduler::{ReplyScheduler, ReplyTicket, ReplyTimer};
use crate::session::script::{ResponseCursor, ResponseScript};
use crate::session::store::{JsonStore, StoreError};
use crate::session::{Message, Sender};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to persist session: {0}")]
    Persist(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// User message appended and its reply scheduled.
    Sent,
    /// Held until the pending reply lands.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The ticket belongs to a reply cancelled by a reset or already delivered.
    Stale,
}

/// Strictly increasing message ids seeded from the wall clock.
struct MessageIds {
    last: u64,
}

impl MessageIds {
    fn after(highest: Option<u64>) -> Self {
        Self {
            last: highest.unwrap_or(0),
        }
    }

    fn next(&mut self) -> u64 {
        let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_millis() as u64,
            Err(_) => 0,
        };
        self.last = now.max(self.last.saturating_add(1));
        self.last
    }
}

struct PendingReply {
    ticket: ReplyTicket,
    timer: ReplyTimer,
}

/// Drives one scripted conversation: user turns in, canned replies out.
///
/// Turns are strictly FIFO. While a reply is pending, further sends wait in
/// an outbox and are appended one at a time as earlier replies land, so the
/// log always alternates user message and its reply.
pub struct SessionController {
    log: MessageLog,
    cursor: ResponseCursor,
    seeds: Vec<Message>,
    scheduler: Box<dyn ReplyScheduler>,
    reply_delay: Duration,
    ids: MessageIds,
    pending: Option<PendingReply>,
    outbox: VecDeque<String>,
    next_ticket: u64,
}

impl SessionController {
    /// Restores the persisted session and seeds it if needed.
    pub fn start(
        store: JsonStore,
        script: ResponseScript,
        seeds: Vec<Message>,
        scheduler: Box<dyn ReplyScheduler>,
        reply_delay: Duration,
    ) -> (Self, Option<SessionError>) {
        let mut log = MessageLog::load(store.clone());
        let cursor = ResponseCursor::load(store, script);
        let seeded = log.ensure_seeded(&seeds);
        let ids = MessageIds::after(log.max_id());

        let controller = Self {
            log,
            cursor,
            seeds,
            scheduler,
            reply_delay,
            ids,
            pending: None,
            outbox: VecDeque::new(),
            next_ticket: 0,
        };
        (controller, seeded.err().map(SessionError::from))
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.position()
    }

    pub fn state(&self) -> TurnState {
        if self.pending.is_some() {
            TurnState::AwaitingReply
        } else {
            TurnState::Idle
        }
    }

    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.outbox.iter().map(String::as_str)
    }

    pub fn send(&mut self, text: &str) -> Result<SendOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        if self.pending.is_some() {
            self.outbox.push_back(text.to_string());
            tracing::debug!(queued = self.outbox.len(), "reply pending, turn queued");
            return Ok(SendOutcome::Queued);
        }

        self.begin_turn(text.to_string())?;
        Ok(SendOutcome::Sent)
    }

    /// Appends the scripted reply for `ticket` if it is still the pending one.
    pub fn deliver_reply(&mut self, ticket: ReplyTicket) -> Result<DeliveryOutcome, SessionError> {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                tracing::debug!(ticket = ticket.0, "ignoring stale scripted reply");
                return Ok(DeliveryOutcome::Stale);
            }
        }
        self.pending = None;

        let reply = Message::from_line(self.ids.next(), Sender::Assistant, self.cursor.next());
        let appended = self.log.append(reply).map(|_| ());
        let advanced = self.cursor.advance();
        tracing::info!(cursor = self.cursor.position(), "scripted reply delivered");

        let next_turn = match self.outbox.pop_front() {
            Some(text) => self.begin_turn(text),
            None => Ok(()),
        };

        appended?;
        advanced?;
        next_turn?;
        Ok(DeliveryOutcome::Delivered)
    }

    /// Cancels any pending reply and returns to the seed-only conversation.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if let Some(pending) = self.pending.take() {
            pending.timer.cancel();
        }
        self.outbox.clear();

        let cleared = self.log.reset();
        let seeded = self.log.ensure_seeded(&self.seeds).map(|_| ());
        let rewound = self.cursor.reset();
        self.ids = MessageIds::after(self.log.max_id());
        tracing::info!("session reset");

        cleared?;
        seeded?;
        rewound?;
        Ok(())
    }

    fn begin_turn(&mut self, text: String) -> Result<(), SessionError> {
        let message = Message::user(self.ids.next(), text);
        let appended = self.log.append(message).map(|_| ());

        self.next_ticket += 1;
        let ticket = ReplyTicket(self.next_ticket);
        let timer = self.scheduler.schedule(ticket, self.reply_delay);
        self.pending = Some(PendingReply { ticket, timer });

        appended?;
        Ok(())
    }
}
