use crate::session::store::{JsonStore, StoreError};
use crate::session::{Message, ScriptLine, Sender, CURSOR_KEY};

/// Fixed, non-empty list of canned assistant replies.
#[derive(Debug, Clone)]
pub struct ResponseScript {
    lines: Vec<ScriptLine>,
}

impl ResponseScript {
    /// Returns `None` for an empty list; a script must have something to say.
    pub fn new(lines: Vec<ScriptLine>) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }
        Some(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, position: u64) -> &ScriptLine {
        let len = self.lines.len() as u64;
        &self.lines[(position % len) as usize]
    }
}

impl Default for ResponseScript {
    fn default() -> Self {
        Self {
            lines: vec![
                ScriptLine::text("Generating your smart home interface…")
                    .with_image("/images/01.png")
                    .with_jump("smart-home", "Go to Smart Home"),
                ScriptLine::text("Here is the improved layout")
                    .with_image("/images/02.png")
                    .with_jump("smart-home-improved", "Go to Improved Smart Home"),
                ScriptLine::text("This is the device management view")
                    .with_image("/images/03.png")
                    .with_jump("devices", "Go to Devices"),
                ScriptLine::text("Preview of the smart analytics view")
                    .with_image("/images/04.png")
                    .with_jump("analytics", "Go to Analytics"),
            ],
        }
    }
}

/// Introductory conversation shown on a fresh session.
pub fn default_seeds() -> Vec<Message> {
    let lines = [
        (
            Sender::Assistant,
            "Hi, I'm your interface assistant. Tell me what style of interface you want.",
        ),
        (Sender::User, "I'd like to generate a smart home interface"),
        (
            Sender::Assistant,
            "Great! Which features should the interface include?",
        ),
    ];
    lines
        .into_iter()
        .zip(1u64..)
        .map(|((sender, text), id)| Message::from_line(id, sender, &ScriptLine::text(text)).seed())
        .collect()
}

/// Position in the response script, persisted under `responseCursorIndex`.
pub struct ResponseCursor {
    store: JsonStore,
    script: ResponseScript,
    position: u64,
}

impl ResponseCursor {
    pub fn load(store: JsonStore, script: ResponseScript) -> Self {
        let position = store.read(CURSOR_KEY, 0u64);
        Self {
            store,
            script,
            position,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn next(&self) -> &ScriptLine {
        self.script.line(self.position)
    }

    pub fn advance(&mut self) -> Result<(), StoreError> {
        self.position = match self.position.checked_add(1) {
            Some(position) => position,
            None => {
                // restart the count at the same script line's successor
                tracing::warn!(position = self.position, "response cursor overflowed, wrapping");
                self.position % self.script.len() as u64 + 1
            }
        };
        self.persist()
    }

    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.position = 0;
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.store.write(CURSOR_KEY, &self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_script(len: usize) -> ResponseScript {
        ResponseScript::new(
            (0..len)
                .map(|index| ScriptLine::text(format!("reply {index}")))
                .collect(),
        )
        .expect("script should not be empty")
    }

    #[test]
    fn empty_script_is_rejected() {
        assert!(ResponseScript::new(Vec::new()).is_none());
    }

    #[test]
    fn next_wraps_modulo_script_length() {
        let script = numbered_script(3);
        let mut cursor = ResponseCursor::load(JsonStore::in_memory(), script.clone());

        for k in 0..10u64 {
            let expected = format!("reply {}", k % 3);
            assert_eq!(cursor.next().text.as_deref(), Some(expected.as_str()), "k = {k}");
            cursor.advance().expect("advance should persist");
        }
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn next_does_not_move_the_cursor() {
        let cursor = ResponseCursor::load(JsonStore::in_memory(), numbered_script(2));
        assert_eq!(cursor.next(), cursor.next());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn position_survives_reload() {
        let store = JsonStore::in_memory();
        let mut cursor = ResponseCursor::load(store.clone(), numbered_script(4));
        cursor.advance().expect("advance should persist");
        cursor.advance().expect("advance should persist");

        let reloaded = ResponseCursor::load(store.clone(), numbered_script(4));
        assert_eq!(reloaded.position(), 2);
        assert_eq!(reloaded.next().text.as_deref(), Some("reply 2"));
        assert_eq!(store.raw(CURSOR_KEY).as_deref(), Some("2"));
    }

    #[test]
    fn reset_returns_to_first_line() {
        let store = JsonStore::in_memory();
        let mut cursor = ResponseCursor::load(store.clone(), numbered_script(2));
        cursor.advance().expect("advance should persist");

        cursor.reset().expect("reset should persist");

        assert_eq!(cursor.position(), 0);
        assert_eq!(store.read::<u64>(CURSOR_KEY, 99), 0);
    }

    #[test]
    fn corrupt_position_falls_back_to_zero() {
        let store = JsonStore::in_memory();
        store.put_raw(CURSOR_KEY, "-3");
        let cursor = ResponseCursor::load(store, numbered_script(2));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn built_in_script_offers_a_jump_on_every_reply() {
        let script = ResponseScript::default();
        assert_eq!(script.len(), 4);
        for position in 0..4 {
            let line = script.line(position);
            assert!(line.image_ref.is_some());
            assert!(line.jump.is_some());
        }
    }

    #[test]
    fn default_seeds_are_flagged_and_ordered() {
        let seeds = default_seeds();
        assert_eq!(seeds.len(), 3);
        assert!(seeds.iter().all(|message| message.is_seed));
        assert!(seeds.windows(2).all(|pair| pair[0].id < pair[1].id));
        assert_eq!(seeds[1].sender, Sender::User);
    }

    #[test]
    fn advance_from_largest_position_keeps_script_order() {
        let store = JsonStore::in_memory();
        store.put_raw(CURSOR_KEY, "18446744073709551615");
        let mut cursor = ResponseCursor::load(store.clone(), numbered_script(3));
        assert_eq!(cursor.position(), u64::MAX);
        // u64::MAX % 3 == 0
        assert_eq!(cursor.next().text.as_deref(), Some("reply 0"));

        cursor.advance().expect("advance should persist");

        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.next().text.as_deref(), Some("reply 1"));
        assert_eq!(store.raw(CURSOR_KEY).as_deref(), Some("1"));
    }
}
