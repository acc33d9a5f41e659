//! On-disk snapshots standing in for the remote services.
//!
//! A catalog snapshot holds the destination's searchable tracks plus the
//! optional label tables used by the metadata and structured-catalog
//! stages. A destination snapshot is the playlist's current track ids.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use songbridge::catalog::memory::{InMemoryCatalog, MemoryPlaylist, StaticLookup};
use songbridge::{CatalogTrack, SyncReport};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Destination catalog with its lookup tables.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    /// Searchable destination tracks.
    pub tracks: Vec<CatalogTrack>,
    /// Licensed metadata, keyed by raw label.
    pub metadata: StaticLookup,
    /// Structured catalog entries, keyed by raw label.
    pub structured: StaticLookup,
}

impl CatalogSnapshot {
    pub fn load(path: &Path) -> CliResult<Self> {
        read_json(path, "Catalog snapshot")
    }

    /// Split into the engine's collaborators.
    pub fn into_parts(self) -> (InMemoryCatalog, Option<StaticLookup>, Option<StaticLookup>) {
        let non_empty = |lookup: StaticLookup| (!lookup.is_empty()).then_some(lookup);
        (
            InMemoryCatalog::new(self.tracks),
            non_empty(self.metadata),
            non_empty(self.structured),
        )
    }
}

/// Current contents of the destination playlist.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DestinationSnapshot {
    pub tracks: Vec<String>,
}

impl DestinationSnapshot {
    /// Load the snapshot; a missing file is an empty playlist.
    pub fn load_or_empty(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        read_json(path, "Destination snapshot")
    }

    pub fn playlist(&self) -> MemoryPlaylist {
        MemoryPlaylist::new(self.tracks.iter().cloned())
    }

    pub fn from_playlist(playlist: &MemoryPlaylist) -> CliResult<Self> {
        Ok(Self {
            tracks: playlist.tracks()?,
        })
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        write_json(path, self)
    }
}

/// Load a sync report written by `songbridge sync`.
pub fn load_report(path: &Path) -> CliResult<SyncReport> {
    read_json(path, "Sync report")
}

pub fn save_report(path: &Path, report: &SyncReport) -> CliResult<()> {
    write_json(path, report)
}

/// Default report path: `<destination stem>.report.json` next to it.
pub fn default_report_path(destination: &Path) -> PathBuf {
    let mut p = destination.to_path_buf();
    let stem = p.file_stem().unwrap_or_default().to_string_lossy().to_string();
    p.set_file_name(format!("{}.report.json", stem));
    p
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> CliResult<T> {
    if !path.exists() {
        return Err(format!("{} not found: {}", what, path.display()).into());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {} '{}': {}", what.to_lowercase(), path.display(), e).into())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_snapshot_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{
                "tracks": [{"native_id": "t1", "title": "Yellow", "artist": "Coldplay"}],
                "metadata": {"coldplay yellow 2000": {"title": "Yellow", "artist": "Coldplay"}}
            }"#,
        )
        .unwrap();

        let (catalog, metadata, structured) = CatalogSnapshot::load(&path).unwrap().into_parts();
        assert_eq!(catalog.tracks.len(), 1);
        assert_eq!(metadata.map(|m| m.len()), Some(1));
        assert!(structured.is_none());
    }

    #[test]
    fn test_destination_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.json");

        let empty = DestinationSnapshot::load_or_empty(&path).unwrap();
        assert!(empty.tracks.is_empty());

        DestinationSnapshot {
            tracks: vec!["t1".to_string(), "t2".to_string()],
        }
        .save(&path)
        .unwrap();
        let loaded = DestinationSnapshot::load_or_empty(&path).unwrap();
        assert_eq!(loaded.tracks, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(loaded.playlist().tracks().unwrap().len(), 2);
    }

    #[test]
    fn test_default_report_path() {
        assert_eq!(
            default_report_path(Path::new("/tmp/dest.json")),
            PathBuf::from("/tmp/dest.report.json")
        );
    }
}
