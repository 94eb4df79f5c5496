use serde::{Deserialize, Serialize};
use std::fmt;

pub mod controller;
pub mod log;
pub mod scheduler;
pub mod script;
pub mod store;

pub const MESSAGES_KEY: &str = "chatMessages";
pub const CURSOR_KEY: &str = "responseCursorIndex";

/// Identifier of a destination page handed to the page router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path or URL of an image shown inline, on the canvas, or in the modal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

/// A "jump to page" affordance. Target and label only ever travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpAction {
    pub target: PageId,
    pub label: String,
}

impl JumpAction {
    pub fn new(target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: PageId::new(target),
            label: label.into(),
        }
    }
}

/// Message body shared by stored messages, seeds and scripted replies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptLine {
    pub text: Option<String>,
    pub image_ref: Option<ImageRef>,
    pub jump: Option<JumpAction>,
}

impl ScriptLine {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(ImageRef::new(image_ref));
        self
    }

    pub fn with_jump(mut self, target: impl Into<String>, label: impl Into<String>) -> Self {
        self.jump = Some(JumpAction::new(target, label));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MessageRecord", into = "MessageRecord")]
pub struct Message {
    pub id: u64,
    pub sender: Sender,
    pub text: Option<String>,
    pub image_ref: Option<ImageRef>,
    pub jump: Option<JumpAction>,
    pub is_seed: bool,
}

impl Message {
    pub fn from_line(id: u64, sender: Sender, line: &ScriptLine) -> Self {
        Self {
            id,
            sender,
            text: line.text.clone(),
            image_ref: line.image_ref.clone(),
            jump: line.jump.clone(),
            is_seed: false,
        }
    }

    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self::from_line(id, Sender::User, &ScriptLine::text(text))
    }

    pub fn seed(mut self) -> Self {
        self.is_seed = true;
        self
    }
}

/// Wire layout of a stored message: flat camelCase fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    id: u64,
    sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_ref: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jump_target: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jump_label: Option<String>,
    #[serde(default)]
    is_seed: bool,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        // a half-present pair is treated as no jump at all
        let jump = match (record.jump_target, record.jump_label) {
            (Some(target), Some(label)) => Some(JumpAction { target, label }),
            _ => None,
        };
        Self {
            id: record.id,
            sender: record.sender,
            text: record.text,
            image_ref: record.image_ref,
            jump,
            is_seed: record.is_seed,
        }
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        let (jump_target, jump_label) = match message.jump {
            Some(JumpAction { target, label }) => (Some(target), Some(label)),
            None => (None, None),
        };
        Self {
            id: message.id,
            sender: message.sender,
            text: message.text,
            image_ref: message.image_ref,
            jump_target,
            jump_label,
            is_seed: message.is_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_serializes_flat_camel_case_fields() {
        let line = ScriptLine::text("Device management view")
            .with_image("/images/03.png")
            .with_jump("devices", "Go to Devices");
        let message = Message::from_line(7, Sender::Assistant, &line);

        let value = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(
            value,
            json!({
                "id": 7,
                "sender": "assistant",
                "text": "Device management view",
                "imageRef": "/images/03.png",
                "jumpTarget": "devices",
                "jumpLabel": "Go to Devices",
                "isSeed": false
            })
        );
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let value = serde_json::to_value(Message::user(1, "hi")).expect("message should serialize");
        assert_eq!(
            value,
            json!({ "id": 1, "sender": "user", "text": "hi", "isSeed": false })
        );
    }

    #[test]
    fn half_jump_pair_is_dropped_on_read() {
        let message: Message = serde_json::from_value(json!({
            "id": 3,
            "sender": "assistant",
            "jumpTarget": "devices"
        }))
        .expect("record should parse");
        assert!(message.jump.is_none());
        assert!(!message.is_seed);
    }

    #[test]
    fn legacy_ai_sender_is_accepted() {
        let message: Message =
            serde_json::from_value(json!({ "id": 1, "sender": "ai", "text": "hello" }))
                .expect("legacy sender should parse");
        assert_eq!(message.sender, Sender::Assistant);
    }
}
