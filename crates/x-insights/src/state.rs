//! Application state: the currently loaded rows and their provenance.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     AnalyticsState                        │
//! ├───────────────────────────────────────────────────────────┤
//! │  data: RwLock<AnalyticsSnapshot>                          │
//! │  ┌─────────────────────────┐ ┌─────────────────────────┐  │
//! │  │ content_rows            │ │ overview_rows           │  │
//! │  │ content_file_name       │ │ overview_file_name      │  │
//! │  │ content_missing_optional│ │ overview_missing_opt... │  │
//! │  └─────────────────────────┘ └─────────────────────────┘  │
//! ├───────────────────────────────────────────────────────────┤
//! │  store: Option<Box<dyn RowStore>>  (snapshot persistence) │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Thread Safety
//!
//! The snapshot is wrapped in a `parking_lot` `RwLock`, so one state object
//! can be shared by a presentation layer and the ingestion code.
//!
//! # Persistence
//!
//! When a [`RowStore`] is injected, every transition writes the new
//! snapshot. A failed write is logged and otherwise ignored; the in-memory
//! state stays authoritative.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::demo::{
    DEMO_CONTENT_FILE_NAME, DEMO_OVERVIEW_FILE_NAME, demo_content_rows, demo_overview_rows,
};
use crate::error::{Result, ResultExt};
use crate::types::{CanonicalField, ContentRow, OverviewRow};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Everything the dashboard renders from.
///
/// Persisted snapshots use the row wire format, where optional numerics are
/// a number or `null`. A [`NumericField::Invalid`] cell therefore restores
/// as [`NumericField::Missing`]; the invalid-value warnings belong to the
/// import that produced them and are not stored.
///
/// [`NumericField::Invalid`]: crate::types::NumericField::Invalid
/// [`NumericField::Missing`]: crate::types::NumericField::Missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub content_rows: Vec<ContentRow>,
    pub overview_rows: Vec<OverviewRow>,
    pub content_file_name: String,
    pub overview_file_name: String,
    pub content_missing_optional: Vec<CanonicalField>,
    pub overview_missing_optional: Vec<CanonicalField>,
}

impl AnalyticsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.content_rows.is_empty() && self.overview_rows.is_empty()
    }
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Storage capability for snapshots.
pub trait RowStore: Send + Sync {
    /// Load the last written snapshot, if one exists.
    fn read(&self) -> Result<Option<AnalyticsSnapshot>>;

    /// Replace the stored snapshot.
    fn write(&self, snapshot: &AnalyticsSnapshot) -> Result<()>;
}

/// Stores the snapshot as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowStore for JsonFileStore {
    fn read(&self) -> Result<Option<AnalyticsSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .context(format!("Failed to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    fn write(&self, snapshot: &AnalyticsSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json).context(format!("Failed to write {}", self.path.display()))
    }
}

// ============================================================================
// STATE
// ============================================================================

/// The loaded analytics, shared by reference.
#[derive(Default)]
pub struct AnalyticsState {
    data: RwLock<AnalyticsSnapshot>,
    store: Option<Box<dyn RowStore>>,
}

static_assertions::assert_impl_all!(AnalyticsState: Send, Sync);

impl AnalyticsState {
    /// Creates an empty, unpersisted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty state that writes every transition to `store`.
    pub fn with_store(store: impl RowStore + 'static) -> Self {
        Self {
            data: RwLock::new(AnalyticsSnapshot::default()),
            store: Some(Box::new(store)),
        }
    }

    /// Creates a state backed by `store`, starting from its stored snapshot.
    ///
    /// Later transitions replace one record kind at a time, so rows of the
    /// other kind stored by an earlier session survive.
    pub fn open(store: impl RowStore + 'static) -> Result<Self> {
        let state = Self::with_store(store);
        if state.restore()? {
            debug!("Opened stored analytics state");
        }
        Ok(state)
    }

    /// Replace the in-memory state with the stored snapshot, if any.
    ///
    /// Returns `true` when a snapshot was found.
    pub fn restore(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.read()? {
            Some(snapshot) => {
                info!(
                    "Restored {} content and {} overview rows",
                    snapshot.content_rows.len(),
                    snapshot.overview_rows.len()
                );
                *self.data.write() = snapshot;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_content_rows(
        &self,
        rows: Vec<ContentRow>,
        file_name: impl Into<String>,
        missing_optional: Vec<CanonicalField>,
    ) {
        {
            let mut data = self.data.write();
            debug!("Loading {} content rows", rows.len());
            data.content_rows = rows;
            data.content_file_name = file_name.into();
            data.content_missing_optional = missing_optional;
        }
        self.persist();
    }

    pub fn set_overview_rows(
        &self,
        rows: Vec<OverviewRow>,
        file_name: impl Into<String>,
        missing_optional: Vec<CanonicalField>,
    ) {
        {
            let mut data = self.data.write();
            debug!("Loading {} overview rows", rows.len());
            data.overview_rows = rows;
            data.overview_file_name = file_name.into();
            data.overview_missing_optional = missing_optional;
        }
        self.persist();
    }

    /// Replace everything with the demo dataset.
    pub fn load_demo(&self) {
        *self.data.write() = AnalyticsSnapshot {
            content_rows: demo_content_rows(),
            overview_rows: demo_overview_rows(),
            content_file_name: DEMO_CONTENT_FILE_NAME.to_string(),
            overview_file_name: DEMO_OVERVIEW_FILE_NAME.to_string(),
            content_missing_optional: Vec::new(),
            overview_missing_optional: Vec::new(),
        };
        info!("Loaded demo dataset");
        self.persist();
    }

    /// Drop all rows and provenance.
    pub fn clear(&self) {
        *self.data.write() = AnalyticsSnapshot::default();
        info!("Cleared analytics state");
        self.persist();
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        self.data.read().clone()
    }

    pub fn content_rows(&self) -> Vec<ContentRow> {
        self.data.read().content_rows.clone()
    }

    pub fn overview_rows(&self) -> Vec<OverviewRow> {
        self.data.read().overview_rows.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.snapshot();
        if let Err(e) = store.write(&snapshot) {
            warn!("Failed to persist analytics state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use crate::types::NumericField;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        writes: Arc<AtomicUsize>,
    }

    impl RowStore for CountingStore {
        fn read(&self) -> Result<Option<AnalyticsSnapshot>> {
            Ok(None)
        }

        fn write(&self, _snapshot: &AnalyticsSnapshot) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(InsightsError::InvalidConfig("read-only".to_string()))
        }
    }

    #[test]
    fn test_set_rows_and_clear() {
        let state = AnalyticsState::new();
        assert!(state.is_empty());

        state.set_content_rows(
            vec![ContentRow::new("hi", None, 10.0)],
            "content.csv",
            vec![CanonicalField::Likes],
        );
        state.set_overview_rows(
            vec![OverviewRow::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 5.0)],
            "overview.csv",
            Vec::new(),
        );

        let snapshot = state.snapshot();
        assert_eq!(snapshot.content_rows.len(), 1);
        assert_eq!(snapshot.content_file_name, "content.csv");
        assert_eq!(snapshot.content_missing_optional, vec![CanonicalField::Likes]);
        assert_eq!(snapshot.overview_file_name, "overview.csv");

        state.clear();
        assert_eq!(state.snapshot(), AnalyticsSnapshot::default());
    }

    #[test]
    fn test_load_demo() {
        let state = AnalyticsState::new();
        state.load_demo();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.content_rows.len(), 8);
        assert_eq!(snapshot.overview_rows.len(), 7);
        assert_eq!(snapshot.content_file_name, "demo_content.csv");
        assert_eq!(snapshot.overview_file_name, "demo_overview.csv");
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let state = AnalyticsState::with_store(JsonFileStore::new(&path));
        let mut row = ContentRow::new("persist me", None, 42.0);
        row.likes = NumericField::Present(3.0);
        state.set_content_rows(vec![row], "content.csv", Vec::new());
        assert!(path.exists());

        let reloaded = AnalyticsState::with_store(JsonFileStore::new(&path));
        assert!(reloaded.restore().unwrap());
        assert_eq!(reloaded.snapshot(), state.snapshot());
    }

    #[test]
    fn test_open_keeps_stored_rows_of_other_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let first = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
        assert!(first.is_empty());
        first.set_overview_rows(
            vec![OverviewRow::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 5.0)],
            "overview.csv",
            Vec::new(),
        );

        let second = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
        second.set_content_rows(vec![ContentRow::new("hi", None, 10.0)], "content.csv", Vec::new());

        let stored = JsonFileStore::new(&path).read().unwrap().unwrap();
        assert_eq!(stored.overview_rows.len(), 1);
        assert_eq!(stored.overview_file_name, "overview.csv");
        assert_eq!(stored.content_rows.len(), 1);
    }

    #[test]
    fn test_invalid_cells_restore_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = AnalyticsState::with_store(JsonFileStore::new(&path));
        let mut row = ContentRow::new("bad likes", None, 10.0);
        row.likes = NumericField::Invalid;
        row.replies = NumericField::Present(2.0);
        state.set_content_rows(vec![row], "content.csv", Vec::new());

        let restored = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
        let rows = restored.content_rows();
        assert_eq!(rows[0].likes, NumericField::Missing);
        assert_eq!(rows[0].replies, NumericField::Present(2.0));
    }

    #[test]
    fn test_restore_without_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = AnalyticsState::with_store(JsonFileStore::new(dir.path().join("none.json")));
        assert!(!state.restore().unwrap());
        assert!(!AnalyticsState::new().restore().unwrap());
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let writes = Arc::new(AtomicUsize::new(0));
        let state = AnalyticsState::with_store(CountingStore {
            writes: writes.clone(),
        });

        state.load_demo();
        state.clear();

        assert_eq!(writes.load(Ordering::SeqCst), 2);
        assert!(state.is_empty());
    }
}
