//! Point and message storage
//!
//! Both stores are in-memory and authoritative. [`Database`] ties them
//! together and optionally mirrors them to a JSON snapshot file, stored by
//! default in the XDG data directory (~/.local/share/geo-board/store.json).

pub mod message;
pub mod point;

pub use message::{Message, MessageStore};
pub use point::{Point, PointStore};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const APP_DIR_NAME: &str = "geo-board";
const STORE_FILE_NAME: &str = "store.json";

/// An ordered, finite search result
///
/// Iterating does not consume it, so the same result can be walked again.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults<T> {
    items: Vec<T>,
}

impl<T> SearchResults<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for SearchResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a SearchResults<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// On-disk layout of the snapshot file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    points: Vec<Point>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Snapshot {
    /// Pair copied records, dropping messages whose point was not copied
    fn new(points: Vec<Point>, mut messages: Vec<Message>) -> Self {
        let point_ids: HashSet<u64> = points.iter().map(|p| p.id).collect();
        messages.retain(|m| point_ids.contains(&m.point_id));
        Self { points, messages }
    }
}

/// Point and message stores with optional snapshot persistence
///
/// Creates made through [`Database::create_point`] and
/// [`Database::create_message`] are transactional: the record is only kept
/// if the snapshot that includes it was written.
#[derive(Debug)]
pub struct Database {
    points: Arc<PointStore>,
    messages: Arc<MessageStore>,
    path: Option<PathBuf>,
    read_only: bool,
    commit_lock: Mutex<()>,
}

impl Database {
    /// Get the default snapshot file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_DIR_NAME).join(STORE_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }

    /// Empty database that is never written to disk
    pub fn in_memory(cell_size_deg: f64) -> Result<Self> {
        let points = Arc::new(PointStore::new(cell_size_deg)?);
        let messages = Arc::new(MessageStore::new(Arc::clone(&points)));
        Ok(Self {
            points,
            messages,
            path: None,
            read_only: false,
            commit_lock: Mutex::new(()),
        })
    }

    /// Load the snapshot at `path`, or start empty if it does not exist yet
    ///
    /// The grid index and the message secondary index are rebuilt from the
    /// loaded records.
    pub fn open(path: impl Into<PathBuf>, cell_size_deg: f64) -> Result<Self> {
        let path = path.into();

        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Storage(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Snapshot::default()
        };

        let point_count = snapshot.points.len();
        let message_count = snapshot.messages.len();
        let points = Arc::new(PointStore::from_points(snapshot.points, cell_size_deg)?);
        let messages = Arc::new(MessageStore::from_messages(
            Arc::clone(&points),
            snapshot.messages,
        )?);

        info!(
            path = %path.display(),
            points = point_count,
            messages = message_count,
            "store_loaded"
        );

        Ok(Self {
            points,
            messages,
            path: Some(path),
            read_only: false,
            commit_lock: Mutex::new(()),
        })
    }

    /// Keep the loaded contents but never write the snapshot file
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn points(&self) -> &Arc<PointStore> {
        &self.points
    }

    pub fn messages(&self) -> &Arc<MessageStore> {
        &self.messages
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.commit_lock
            .lock()
            .map_err(|_| Error::Storage("Commit lock poisoned".to_string()))
    }

    /// Store a new point and write the snapshot including it
    ///
    /// If the snapshot cannot be written the point is removed again and the
    /// write error is returned.
    pub fn create_point(&self, title: Option<&str>, latitude: f64, longitude: f64) -> Result<Point> {
        let _guard = self.lock()?;
        let point = self.points.create(title, latitude, longitude)?;

        if let Err(err) = self.write_snapshot() {
            self.points.remove(point.id)?;
            warn!(id = point.id, error = %err, "point_rolled_back");
            return Err(err);
        }
        Ok(point)
    }

    /// Store a new message and write the snapshot including it
    ///
    /// Rolled back like [`Database::create_point`].
    pub fn create_message(&self, point_id: u64, author_id: &str, text: &str) -> Result<Message> {
        let _guard = self.lock()?;
        let message = self.messages.create(point_id, author_id, text)?;

        if let Err(err) = self.write_snapshot() {
            self.messages.remove(message.id)?;
            warn!(id = message.id, error = %err, "message_rolled_back");
            return Err(err);
        }
        Ok(message)
    }

    /// Write the current contents to the snapshot file
    ///
    /// No-op for in-memory and read-only databases.
    pub fn save(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.write_snapshot()
    }

    // Caller holds the commit lock
    fn write_snapshot(&self) -> Result<()> {
        let Some(path) = self.path.as_deref().filter(|_| !self.read_only) else {
            return Ok(());
        };

        // Points first, so any message created in between is dropped by
        // Snapshot::new rather than written without its point
        let points = self.points.snapshot()?;
        let snapshot = Snapshot::new(points, self.messages.snapshot()?);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let content = serde_json::to_string(&snapshot)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!(
            path = %path.display(),
            points = snapshot.points.len(),
            messages = snapshot.messages.len(),
            "store_saved"
        );
        Ok(())
    }
}
