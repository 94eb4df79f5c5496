use crate::session::store::{JsonStore, StoreError};
use crate::session::{Message, MESSAGES_KEY};

/// Ordered conversation history mirrored to the `chatMessages` key.
///
/// Every mutation updates memory first and then writes the whole log; a
/// failed write is reported but never rolls the in-memory log back.
pub struct MessageLog {
    store: JsonStore,
    messages: Vec<Message>,
}

impl MessageLog {
    /// Restores the log; ids that are out of order or leave no room above
    /// the last one are repaired and written back.
    pub fn load(store: JsonStore) -> Self {
        let mut messages: Vec<Message> = store.read(MESSAGES_KEY, Vec::new());
        let repaired = repair_ids(&mut messages);
        let log = Self { store, messages };
        if repaired {
            tracing::warn!(count = log.messages.len(), "restored message ids were not increasing, renumbered");
            if let Err(err) = log.persist() {
                tracing::warn!(error = %err, "failed to persist repaired message ids");
            }
        }
        log
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn max_id(&self) -> Option<u64> {
        self.messages.iter().map(|message| message.id).max()
    }

    pub fn has_seed(&self) -> bool {
        self.messages.iter().any(|message| message.is_seed)
    }

    /// Prepends `seeds` unless the log already holds a seed message.
    pub fn ensure_seeded(&mut self, seeds: &[Message]) -> Result<bool, StoreError> {
        if self.has_seed() {
            return Ok(false);
        }

        let history = std::mem::take(&mut self.messages);
        let seed_count = seeds.len() as u64;
        // seeds take ids 1..=n; history keeps its ids unless they sit inside that range
        let shift_history = history.first().is_some_and(|message| message.id <= seed_count);
        self.messages = seeds
            .iter()
            .cloned()
            .map(Message::seed)
            .chain(history)
            .collect();
        if shift_history {
            tracing::warn!("history ids collide with seed ids, renumbering");
            renumber_from_one(&mut self.messages);
        } else {
            renumber_from_one(&mut self.messages[..seeds.len()]);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn append(&mut self, message: Message) -> Result<&[Message], StoreError> {
        self.messages.push(message);
        self.persist()?;
        Ok(&self.messages)
    }

    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.store.write(MESSAGES_KEY, &self.messages)
    }
}

/// Ensures ids strictly increase and the last one can still be followed.
/// Returns whether anything was changed.
fn repair_ids(messages: &mut [Message]) -> bool {
    let ordered = messages.windows(2).all(|pair| pair[0].id < pair[1].id);
    let has_room = messages.last().map_or(true, |message| message.id < u64::MAX);
    if ordered && has_room {
        return false;
    }
    if !bump_increasing(messages) {
        renumber_from_one(messages);
    }
    true
}

/// Raises each out-of-order id just above its predecessor, keeping ids that
/// are already in order. Fails if that would run past `u64::MAX - 1`.
fn bump_increasing(messages: &mut [Message]) -> bool {
    let mut previous: Option<u64> = None;
    for message in messages.iter_mut() {
        if let Some(previous) = previous {
            if message.id <= previous {
                match previous.checked_add(1) {
                    Some(id) => message.id = id,
                    None => return false,
                }
            }
        }
        previous = Some(message.id);
    }
    previous.map_or(true, |last| last < u64::MAX)
}

fn renumber_from_one(messages: &mut [Message]) {
    for (message, id) in messages.iter_mut().zip(1u64..) {
        message.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ScriptLine, Sender};

    fn seeds() -> Vec<Message> {
        vec![
            Message::from_line(1, Sender::Assistant, &ScriptLine::text("Hi, describe a style")),
            Message::user(2, "A smart home dashboard"),
            Message::from_line(3, Sender::Assistant, &ScriptLine::text("Which features?")),
        ]
    }

    fn persisted(store: &JsonStore) -> Vec<Message> {
        store.read(MESSAGES_KEY, Vec::new())
    }

    #[test]
    fn load_without_data_is_empty() {
        let log = MessageLog::load(JsonStore::in_memory());
        assert!(log.messages().is_empty());
        assert_eq!(log.max_id(), None);
    }

    #[test]
    fn seeding_fresh_log_marks_every_seed() {
        let store = JsonStore::in_memory();
        let mut log = MessageLog::load(store.clone());

        assert!(log.ensure_seeded(&seeds()).expect("seeding should persist"));
        assert_eq!(log.messages().len(), 3);
        assert!(log.messages().iter().all(|message| message.is_seed));
        assert_eq!(persisted(&store), log.messages());
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = JsonStore::in_memory();
        let mut log = MessageLog::load(store.clone());
        log.append(Message::user(10, "earlier"))
            .expect("append should persist");

        log.ensure_seeded(&seeds()).expect("seeding should persist");
        let once = log.messages().to_vec();
        assert!(!log.ensure_seeded(&seeds()).expect("second call should succeed"));

        assert_eq!(log.messages(), once.as_slice());
        assert_eq!(persisted(&store), once);
    }

    #[test]
    fn seeds_go_before_prior_history() {
        let store = JsonStore::in_memory();
        let mut log = MessageLog::load(store);
        log.append(Message::user(1_700_000_000_000, "kept"))
            .expect("append should persist");

        log.ensure_seeded(&seeds()).expect("seeding should persist");

        let texts: Vec<_> = log
            .messages()
            .iter()
            .map(|message| message.text.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(
            texts,
            ["Hi, describe a style", "A smart home dashboard", "Which features?", "kept"]
        );
        assert!(!log.messages()[3].is_seed);
        assert_eq!(log.messages()[3].id, 1_700_000_000_000);
    }

    #[test]
    fn seeding_keeps_ids_strictly_increasing() {
        let mut log = MessageLog::load(JsonStore::in_memory());
        log.append(Message::user(2, "low id")).expect("append should persist");

        log.ensure_seeded(&seeds()).expect("seeding should persist");

        let ids: Vec<u64> = log.messages().iter().map(|message| message.id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
    }

    #[test]
    fn reload_restores_appended_messages() {
        let store = JsonStore::in_memory();
        let mut log = MessageLog::load(store.clone());
        log.ensure_seeded(&seeds()).expect("seeding should persist");
        log.append(Message::user(100, "persist me"))
            .expect("append should persist");

        let mut reloaded = MessageLog::load(store);
        assert!(!reloaded.ensure_seeded(&seeds()).expect("no-op should succeed"));
        assert_eq!(reloaded.messages().len(), 4);
        assert_eq!(reloaded.messages()[3].text.as_deref(), Some("persist me"));
    }

    #[test]
    fn reset_clears_memory_and_storage() {
        let store = JsonStore::in_memory();
        let mut log = MessageLog::load(store.clone());
        log.ensure_seeded(&seeds()).expect("seeding should persist");

        log.reset().expect("reset should persist");

        assert!(log.messages().is_empty());
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn seeding_leaves_history_ids_untouched_when_they_fit_above_seeds() {
        let mut log = MessageLog::load(JsonStore::in_memory());
        log.append(Message::user(4, "kept id")).expect("append should persist");
        log.append(Message::user(9, "also kept")).expect("append should persist");

        log.ensure_seeded(&seeds()).expect("seeding should persist");

        let ids: Vec<u64> = log.messages().iter().map(|message| message.id).collect();
        assert_eq!(ids, [1, 2, 3, 4, 9]);
    }

    #[test]
    fn out_of_order_restored_ids_are_repaired_on_load() {
        let store = JsonStore::in_memory();
        let restored = vec![
            Message::user(1, "seed").seed(),
            Message::user(9_000_000_000_000_000, "far ahead"),
            Message::user(5, "behind"),
        ];
        store.write(MESSAGES_KEY, &restored).expect("write should succeed");

        let log = MessageLog::load(store.clone());

        let ids: Vec<u64> = log.messages().iter().map(|message| message.id).collect();
        assert_eq!(ids, [1, 9_000_000_000_000_000, 9_000_000_000_000_001]);
        assert_eq!(log.max_id(), Some(9_000_000_000_000_001));
        assert_eq!(persisted(&store), log.messages());
    }

    #[test]
    fn restored_max_id_is_renumbered_from_one() {
        let store = JsonStore::in_memory();
        let restored = vec![
            Message::user(1, "seed").seed(),
            Message::user(u64::MAX, "no room after me"),
        ];
        store.write(MESSAGES_KEY, &restored).expect("write should succeed");

        let log = MessageLog::load(store);

        let ids: Vec<u64> = log.messages().iter().map(|message| message.id).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn well_ordered_log_loads_unchanged() {
        let store = JsonStore::in_memory();
        let restored = vec![Message::user(1, "a").seed(), Message::user(40, "b")];
        store.write(MESSAGES_KEY, &restored).expect("write should succeed");

        let log = MessageLog::load(store);

        assert_eq!(log.messages(), restored.as_slice());
    }
}
