//! Feedback stores: in memory and JSON lines on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::catalog::FeedbackSink;
use crate::error::{Result, SongbridgeError};

use super::record::{FeedbackRecord, label_key};

/// Lazily produced records for one label.
pub type FeedbackIter<'a> = Box<dyn Iterator<Item = Result<FeedbackRecord>> + 'a>;

/// A feedback sink that can also be read back.
pub trait FeedbackStore: FeedbackSink {
    /// All records for a raw label, oldest first.
    fn lookup_by_raw_label(&self, raw_label: &str) -> Result<FeedbackIter<'_>>;
}

/// Feedback kept in memory.
#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    records: Mutex<Vec<FeedbackRecord>>,
}

impl MemoryFeedbackStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> SongbridgeError {
    SongbridgeError::Persistence("feedback store lock poisoned".to_string())
}

impl FeedbackSink for MemoryFeedbackStore {
    fn append(&self, record: &FeedbackRecord) -> Result<()> {
        self.records.lock().map_err(|_| poisoned())?.push(record.clone());
        Ok(())
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn lookup_by_raw_label(&self, raw_label: &str) -> Result<FeedbackIter<'_>> {
        let key = label_key(raw_label);
        let matching: Vec<FeedbackRecord> = self
            .records
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|r| r.label_key() == key)
            .cloned()
            .collect();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }
}

/// One line of the JSON-lines file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    label_key: String,
    #[serde(flatten)]
    record: FeedbackRecord,
}

/// Feedback appended to a JSON-lines file, one record per line.
///
/// A failed write is rolled back by truncating the file to its previous
/// length, so a record is either fully present or absent.
#[derive(Debug)]
pub struct JsonlFeedbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFeedbackStore {
    /// Use the file at `path`, creating it on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    SongbridgeError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                SongbridgeError::Persistence(format!(
                    "Failed to open feedback file '{}': {}",
                    self.path.display(),
                    e
                ))
            })
    }
}

impl FeedbackSink for JsonlFeedbackStore {
    fn append(&self, record: &FeedbackRecord) -> Result<()> {
        let stored = StoredRecord {
            label_key: record.label_key(),
            record: record.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let _guard = self.write_lock.lock().map_err(|_| poisoned())?;
        let mut file = self.open_for_append()?;
        let original_len = file
            .metadata()
            .map_err(|e| SongbridgeError::Persistence(format!("Failed to stat feedback file: {}", e)))?
            .len();

        let written = file
            .write_all(line.as_bytes())
            .and_then(|_| file.sync_data());
        if let Err(e) = written {
            // Drop whatever part of the line made it to disk.
            let _ = file.set_len(original_len);
            return Err(SongbridgeError::Persistence(format!(
                "Failed to append feedback to '{}': {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

impl FeedbackStore for JsonlFeedbackStore {
    fn lookup_by_raw_label(&self, raw_label: &str) -> Result<FeedbackIter<'_>> {
        if !self.path.exists() {
            return Ok(Box::new(std::iter::empty()));
        }

        let file = File::open(&self.path).map_err(|e| {
            SongbridgeError::Persistence(format!(
                "Failed to open feedback file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let key = label_key(raw_label);
        let path = self.path.clone();
        let records = BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(move |(index, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(SongbridgeError::Io { path: path.clone(), source: e })),
                };
                if line.trim().is_empty() {
                    return None;
                }
                match serde_json::from_str::<StoredRecord>(&line) {
                    Ok(stored) if stored.label_key == key => Some(Ok(stored.record)),
                    Ok(_) => None,
                    Err(e) => Some(Err(SongbridgeError::Persistence(format!(
                        "Malformed feedback at {}:{}: {}",
                        path.display(),
                        index + 1,
                        e
                    )))),
                }
            });
        Ok(Box::new(records))
    }
}
