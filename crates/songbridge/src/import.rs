//! Loading source playlists from disk.
//!
//! Accepts a JSON array of [`RawItem`]s or a delimited table with a header
//! row. The delimiter is sniffed from the first lines, so comma, tab, and
//! semicolon exports all load without extra flags.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SongbridgeError};
use crate::model::{Platform, RawItem};

/// Candidate delimiters. Pipes are left out: video titles use them as
/// separators far more often than exports use them between columns.
const DELIMITERS: &[u8] = &[b',', b'\t', b';'];

/// One row of a delimited playlist export.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(alias = "title", alias = "label")]
    raw_label: String,
    #[serde(default, alias = "raw_description")]
    description: Option<String>,
    #[serde(default, alias = "source_platform")]
    platform: Option<String>,
    #[serde(alias = "source_native_id", alias = "id")]
    native_id: String,
    #[serde(default)]
    channel: Option<String>,
}

impl Row {
    fn into_item(self, default_platform: Platform) -> Result<RawItem> {
        let platform = match self.platform.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.parse()?,
            _ => default_platform,
        };
        let mut item = RawItem::new(self.raw_label, platform, self.native_id);
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            item = item.with_description(description);
        }
        if let Some(channel) = self.channel.filter(|c| !c.trim().is_empty()) {
            item = item.with_channel(channel);
        }
        Ok(item)
    }
}

/// Load source items from a `.json`, `.csv`, or `.tsv` file.
///
/// Rows without a platform column are taken to come from the video
/// platform.
pub fn load_raw_items(path: impl AsRef<Path>) -> Result<Vec<RawItem>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SongbridgeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let items = match extension.as_deref() {
        Some("json") => serde_json::from_slice(&bytes)?,
        Some("tsv") => parse_delimited(&bytes, b'\t', Platform::Video)?,
        _ => {
            let content = String::from_utf8_lossy(&bytes);
            parse_delimited(&bytes, detect_delimiter(&content), Platform::Video)?
        }
    };

    debug!(path = %path.display(), items = items.len(), "loaded source playlist");
    Ok(items)
}

/// Parse a delimited table with a header row.
pub fn parse_delimited(bytes: &[u8], delimiter: u8, default_platform: Platform) -> Result<Vec<RawItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let mut items = Vec::new();
    for (index, row) in reader.deserialize::<Row>().enumerate() {
        let row = row?;
        let item = row.into_item(default_platform).map_err(|e| {
            // Header is line 1.
            SongbridgeError::InvalidInput(format!("Row {}: {}", index + 2, e))
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Detect the delimiter by checking consistency across the first lines.
pub fn detect_delimiter(content: &str) -> u8 {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    if lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0usize;

    for &delimiter in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delimiter))
            .collect();

        let first = counts[0];
        if first == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first);
        let score = if consistent {
            // Tabs rarely appear inside labels, so prefer them on a tie.
            first * 1000 + if delimiter == b'\t' { 100 } else { 0 }
        } else {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            let variance = counts
                .iter()
                .map(|&c| (c as f64 - mean).powi(2))
                .sum::<f64>()
                / counts.len() as f64;
            if variance < 1.0 { first * 100 } else { first }
        };

        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

/// Count delimiter occurrences outside double quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let mut count = 0;
    let mut in_quotes = false;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("raw_label,native_id\na,1\nb,2\n"), b',');
        assert_eq!(detect_delimiter("raw_label\tnative_id\na\t1\nb\t2\n"), b'\t');
        assert_eq!(detect_delimiter("raw_label;native_id\na;1\nb;2\n"), b';');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn test_quoted_commas_do_not_count() {
        let content = "raw_label;native_id\n\"Song, Part 2\";1\n\"A, B, C\";2\n";
        assert_eq!(detect_delimiter(content), b';');
    }

    #[test]
    fn test_parse_csv_with_optional_columns() {
        let csv = "raw_label,native_id,channel,platform\n\
                   \"Tum Hi Ho | Aashiqui 2 | Arijit Singh\",v1,T-Series,\n\
                   Yellow,s1,,spotify\n";
        let items = parse_delimited(csv.as_bytes(), b',', Platform::Video).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].raw_label, "Tum Hi Ho | Aashiqui 2 | Arijit Singh");
        assert_eq!(items[0].channel(), Some("T-Series"));
        assert_eq!(items[0].source_platform, Platform::Video);
        assert_eq!(items[1].channel(), None);
        assert_eq!(items[1].source_platform, Platform::Streaming);
    }

    #[test]
    fn test_unknown_platform_names_row() {
        let csv = "raw_label,native_id,platform\nYellow,s1,vinyl\n";
        let err = parse_delimited(csv.as_bytes(), b',', Platform::Video).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_load_json_and_tsv() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("playlist.json");
        fs::write(
            &json,
            r#"[{"raw_label": "Yellow", "source_platform": "video", "source_native_id": "v1"}]"#,
        )
        .unwrap();
        let items = load_raw_items(&json).unwrap();
        assert_eq!(items[0].source_native_id, "v1");

        let tsv = dir.path().join("playlist.tsv");
        fs::write(&tsv, "title\tid\nPerfect, Live\tv2\n").unwrap();
        let items = load_raw_items(&tsv).unwrap();
        assert_eq!(items[0].raw_label, "Perfect, Live");
        assert_eq!(items[0].source_native_id, "v2");
    }

    #[test]
    fn test_missing_file() {
        let err = load_raw_items("/nonexistent/playlist.csv").unwrap_err();
        assert!(matches!(err, SongbridgeError::Io { .. }));
    }
}
