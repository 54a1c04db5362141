//! Message store
//!
//! Messages carry no index entry of their own. They are found through the
//! point they are attached to: a radius search asks the point store for the
//! point ids in range and joins them against a `point_id -> message ids`
//! secondary index.

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::store::point::PointStore;
use crate::store::SearchResults;
use crate::validate::normalize_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A text message attached to a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub point_id: u64,
    /// Opaque identity of the author, as supplied by the auth layer
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MessageState {
    records: BTreeMap<u64, Message>,
    by_point: HashMap<u64, Vec<u64>>,
    next_id: u64,
}

#[derive(Debug)]
pub struct MessageStore {
    points: Arc<PointStore>,
    state: RwLock<MessageState>,
}

impl MessageStore {
    pub fn new(points: Arc<PointStore>) -> Self {
        Self {
            points,
            state: RwLock::new(MessageState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Rebuild a store from previously persisted messages
    ///
    /// Every message must reference a point present in `points`.
    pub fn from_messages(points: Arc<PointStore>, messages: Vec<Message>) -> Result<Self> {
        let mut state = MessageState::default();

        for message in messages {
            if !points.contains(message.point_id)? {
                return Err(Error::Storage(format!(
                    "Stored message {} references missing point {}",
                    message.id, message.point_id
                )));
            }
            if state.records.contains_key(&message.id) {
                return Err(Error::Storage(format!(
                    "Duplicate stored message id {}",
                    message.id
                )));
            }
            state
                .by_point
                .entry(message.point_id)
                .or_default()
                .push(message.id);
            state.records.insert(message.id, message);
        }

        state.next_id = state.records.keys().next_back().map_or(1, |id| id + 1);

        Ok(Self {
            points,
            state: RwLock::new(state),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MessageState>> {
        self.state
            .read()
            .map_err(|_| Error::Storage("Message store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MessageState>> {
        self.state
            .write()
            .map_err(|_| Error::Storage("Message store lock poisoned".to_string()))
    }

    /// Attach a new message to an existing point
    ///
    /// # Errors
    /// - [`Error::PointNotFound`] when `point_id` is not stored
    /// - [`Error::Validation`] when the text is blank or the author is empty
    pub fn create(&self, point_id: u64, author_id: &str, text: &str) -> Result<Message> {
        if !self.points.contains(point_id)? {
            return Err(Error::PointNotFound(point_id));
        }
        let text = normalize_text(text)?;
        if author_id.trim().is_empty() {
            return Err(Error::validation("author_id", "An author is required"));
        }

        let mut state = self.write()?;
        let message = Message {
            id: state.next_id,
            point_id,
            author_id: author_id.to_string(),
            text,
            created_at: Utc::now(),
        };
        state.by_point.entry(point_id).or_default().push(message.id);
        state.records.insert(message.id, message.clone());
        state.next_id += 1;

        Ok(message)
    }

    /// Undo a create: drop the record and its `by_point` entry
    pub(crate) fn remove(&self, id: u64) -> Result<Option<Message>> {
        let mut state = self.write()?;
        let Some(message) = state.records.remove(&id) else {
            return Ok(None);
        };
        if let Some(ids) = state.by_point.get_mut(&message.point_id) {
            ids.retain(|m| *m != id);
            if ids.is_empty() {
                state.by_point.remove(&message.point_id);
            }
        }
        if state.next_id == id + 1 {
            state.next_id = id;
        }
        Ok(Some(message))
    }

    /// Messages whose point lies within `radius_km` of `center`, by ascending id
    pub fn search_within_radius(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<SearchResults<Message>> {
        let point_ids = self.points.ids_within_radius(center, radius_km)?;

        let state = self.read()?;
        let mut message_ids: Vec<u64> = point_ids
            .iter()
            .filter_map(|point_id| state.by_point.get(point_id))
            .flatten()
            .copied()
            .collect();
        message_ids.sort_unstable();

        let messages = message_ids
            .into_iter()
            .filter_map(|id| state.records.get(&id).cloned())
            .collect();

        Ok(SearchResults::new(messages))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.records.is_empty())
    }

    /// Copy of every stored message, ordered by id
    pub fn snapshot(&self) -> Result<Vec<Message>> {
        Ok(self.read()?.records.values().cloned().collect())
    }
}
