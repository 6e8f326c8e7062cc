use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::cards::{Card, ChunkFailureInfo};
use crate::utils::error::ApiError;

/// One user's working set: the normalized source text plus the cards of the
/// latest generation run. Everything here is ephemeral; nothing survives a
/// restart.
pub struct Session {
    pub id: Uuid,
    pub text: String,
    pub cards: Vec<Card>,
    pub failures: Vec<ChunkFailureInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory session store. Sessions are capped; creating one past the cap
/// evicts the oldest.
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a session around freshly ingested text.
    pub fn create(&self, text: String) -> Uuid {
        self.evict_oldest_if_full();

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.sessions.insert(
            id,
            Session {
                id,
                text,
                cards: Vec::new(),
                failures: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        info!("Created session {} ({} total)", id, self.sessions.len());
        id
    }

    /// Replace a session's text. Starts a fresh run: existing cards are gone.
    pub fn replace_text(&self, id: Uuid, text: String) -> Result<(), ApiError> {
        let mut session = self.get_mut(id)?;
        session.text = text;
        session.cards.clear();
        session.failures.clear();
        session.updated_at = Utc::now();
        Ok(())
    }

    pub fn text(&self, id: Uuid) -> Result<String, ApiError> {
        Ok(self.get(id)?.text.clone())
    }

    /// Store the outcome of a generation run, replacing any previous cards.
    pub fn replace_cards(
        &self,
        id: Uuid,
        cards: Vec<Card>,
        failures: Vec<ChunkFailureInfo>,
    ) -> Result<(), ApiError> {
        let mut session = self.get_mut(id)?;
        session.cards = cards;
        session.failures = failures;
        session.updated_at = Utc::now();
        Ok(())
    }

    pub fn cards(&self, id: Uuid) -> Result<Vec<Card>, ApiError> {
        Ok(self.get(id)?.cards.clone())
    }

    pub fn update_card(
        &self,
        id: Uuid,
        index: usize,
        front: String,
        back: String,
    ) -> Result<Card, ApiError> {
        let mut session = self.get_mut(id)?;
        let len = session.cards.len();
        let card = session
            .cards
            .get_mut(index)
            .ok_or_else(|| card_index_error(index, len))?;
        card.front = front;
        card.back = back;
        let updated = card.clone();
        session.updated_at = Utc::now();
        Ok(updated)
    }

    pub fn delete_card(&self, id: Uuid, index: usize) -> Result<(), ApiError> {
        let mut session = self.get_mut(id)?;
        if index >= session.cards.len() {
            return Err(card_index_error(index, session.cards.len()));
        }
        session.cards.remove(index);
        session.updated_at = Utc::now();
        Ok(())
    }

    /// Append a hand-written card; returns its position.
    pub fn append_card(&self, id: Uuid, card: Card) -> Result<usize, ApiError> {
        let mut session = self.get_mut(id)?;
        session.cards.push(card);
        session.updated_at = Utc::now();
        Ok(session.cards.len() - 1)
    }

    /// Clearing a session destroys its cards and text.
    pub fn clear(&self, id: Uuid) -> Result<(), ApiError> {
        self.sessions
            .remove(&id)
            .map(|_| debug!("Cleared session {}", id))
            .ok_or_else(|| session_not_found(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn get(&self, id: Uuid) -> Result<dashmap::mapref::one::Ref<'_, Uuid, Session>, ApiError> {
        self.sessions.get(&id).ok_or_else(|| session_not_found(id))
    }

    fn get_mut(
        &self,
        id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, Session>, ApiError> {
        self.sessions.get_mut(&id).ok_or_else(|| session_not_found(id))
    }

    fn evict_oldest_if_full(&self) {
        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    debug!("Evicted oldest session {}", id);
                }
                None => break,
            }
        }
    }
}

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("session {} not found", id))
}

fn card_index_error(index: usize, len: usize) -> ApiError {
    ApiError::BadRequest(format!("card index {} out of range (have {})", index, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, back: &str) -> Card {
        Card {
            front: front.to_string(),
            back: back.to_string(),
            source_chunk: 0,
        }
    }

    #[test]
    fn create_and_read_back_text() {
        let store = SessionStore::new(8);
        let id = store.create("some notes".to_string());
        assert_eq!(store.text(id).unwrap(), "some notes");
    }

    #[test]
    fn unknown_session_is_not_found() {
        let store = SessionStore::new(8);
        assert!(matches!(
            store.text(Uuid::new_v4()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn replacing_text_clears_cards() {
        let store = SessionStore::new(8);
        let id = store.create("v1".to_string());
        store
            .replace_cards(id, vec![card("q", "a")], Vec::new())
            .unwrap();
        store.replace_text(id, "v2".to_string()).unwrap();
        assert!(store.cards(id).unwrap().is_empty());
    }

    #[test]
    fn card_edits_are_index_addressed() {
        let store = SessionStore::new(8);
        let id = store.create("notes".to_string());
        store
            .replace_cards(id, vec![card("q0", "a0"), card("q1", "a1")], Vec::new())
            .unwrap();

        let updated = store
            .update_card(id, 1, "q1 edited".to_string(), "a1 edited".to_string())
            .unwrap();
        assert_eq!(updated.front, "q1 edited");

        store.delete_card(id, 0).unwrap();
        let cards = store.cards(id).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "q1 edited");
    }

    #[test]
    fn out_of_range_card_index_is_rejected() {
        let store = SessionStore::new(8);
        let id = store.create("notes".to_string());
        assert!(matches!(
            store.delete_card(id, 0),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn append_returns_position() {
        let store = SessionStore::new(8);
        let id = store.create("notes".to_string());
        assert_eq!(store.append_card(id, card("q", "a")).unwrap(), 0);
        assert_eq!(store.append_card(id, card("q2", "a2")).unwrap(), 1);
    }

    #[test]
    fn clear_destroys_the_session() {
        let store = SessionStore::new(8);
        let id = store.create("notes".to_string());
        store.clear(id).unwrap();
        assert!(store.cards(id).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn oldest_session_is_evicted_at_the_cap() {
        let store = SessionStore::new(2);
        let first = store.create("one".to_string());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create("two".to_string());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let third = store.create("three".to_string());

        assert_eq!(store.len(), 2);
        assert!(store.text(first).is_err());
        assert!(store.text(second).is_ok());
        assert!(store.text(third).is_ok());
    }
}
