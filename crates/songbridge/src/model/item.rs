//! Raw playlist entries as read from the source platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongbridgeError};

/// The catalog a playlist entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Video platform (free-text titles, uploader channels).
    #[serde(alias = "youtube")]
    Video,
    /// Streaming platform (canonical title/artist per track).
    #[serde(alias = "spotify")]
    Streaming,
}

impl Platform {
    /// The platform on the other side of a sync.
    pub fn other(&self) -> Platform {
        match self {
            Platform::Video => Platform::Streaming,
            Platform::Streaming => Platform::Video,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Video => write!(f, "video"),
            Platform::Streaming => write!(f, "streaming"),
        }
    }
}

impl FromStr for Platform {
    type Err = SongbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "video" | "youtube" | "a" => Ok(Platform::Video),
            "streaming" | "spotify" | "b" => Ok(Platform::Streaming),
            other => Err(SongbridgeError::InvalidInput(format!(
                "Unknown platform '{}'. Use video or streaming.",
                other
            ))),
        }
    }
}

/// One playlist entry before identity resolution.
///
/// Built fresh from persisted playlist data at sync time and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Free-text label as shown on the source platform (e.g. a video title).
    pub raw_label: String,

    /// Optional long description supplied by the uploader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_description: Option<String>,

    /// Platform the entry was read from.
    pub source_platform: Platform,

    /// Identifier of the entry on the source platform.
    pub source_native_id: String,

    /// Uploader/channel name, when the source platform exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl RawItem {
    /// Create a raw item with no description or channel.
    pub fn new(
        raw_label: impl Into<String>,
        source_platform: Platform,
        source_native_id: impl Into<String>,
    ) -> Self {
        Self {
            raw_label: raw_label.into(),
            raw_description: None,
            source_platform,
            source_native_id: source_native_id.into(),
            channel: None,
        }
    }

    /// Attach the uploader description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw_description = Some(description.into());
        self
    }

    /// Attach the uploader/channel name.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Description, if present and non-blank.
    pub fn description(&self) -> Option<&str> {
        self.raw_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Channel, if present and non-blank.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Check that the item can be synced at all.
    ///
    /// An item without a native id cannot be traced back to its source
    /// playlist, and a blank label gives the resolver nothing to work on.
    pub fn validate(&self) -> Result<()> {
        if self.source_native_id.trim().is_empty() {
            return Err(SongbridgeError::InvalidInput(format!(
                "Item '{}' has no source id",
                self.raw_label
            )));
        }
        if self.raw_label.trim().is_empty() {
            return Err(SongbridgeError::InvalidInput(format!(
                "Item '{}' has an empty label",
                self.source_native_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::Video);
        assert_eq!("spotify".parse::<Platform>().unwrap(), Platform::Streaming);
        assert!("vinyl".parse::<Platform>().is_err());
        assert_eq!(Platform::Video.other(), Platform::Streaming);
    }

    #[test]
    fn test_validate() {
        let ok = RawItem::new("Song - Artist", Platform::Video, "vid1");
        assert!(ok.validate().is_ok());

        let no_id = RawItem::new("Song - Artist", Platform::Video, "  ");
        assert!(no_id.validate().is_err());

        let blank = RawItem::new("   ", Platform::Video, "vid2");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_blank_optional_fields() {
        let item = RawItem::new("x", Platform::Video, "1")
            .with_description("   ")
            .with_channel(" Label Records ");
        assert_eq!(item.description(), None);
        assert_eq!(item.channel(), Some("Label Records"));
    }

    #[test]
    fn test_deserialize_platform_alias() {
        let json = r#"{"raw_label":"a","source_platform":"youtube","source_native_id":"x"}"#;
        let item: RawItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source_platform, Platform::Video);
        assert!(item.raw_description.is_none());
    }
}
