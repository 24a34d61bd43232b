//! Video tag store
//!
//! A JSON file mapping each video name to where its source lives and which
//! quadrants were selected for it; the orchestrator only consumes it to
//! discover which videos are references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Tag data recorded for one video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter_quadrant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides_quadrant: Option<String>,
}

/// All tagged videos, keyed by name in deterministic order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoTags(pub BTreeMap<String, TagEntry>);

impl VideoTags {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self(serde_json::from_str(&content)?))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries whose source path contains `filter`; an empty filter selects
    /// every tagged video.
    pub fn references(&self, filter: &str) -> Vec<(&String, &TagEntry)> {
        self.0
            .iter()
            .filter(|(_, entry)| filter.is_empty() || entry.path.contains(filter))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "2025-11-18 10-29-29.mov": {
            "path": "/events/Second Room/2025-11-18 10-29-29.mov",
            "presenter_quadrant": "top-left",
            "slides_quadrant": "top-right"
        },
        "2025-11-18 14-03-11.mov": {
            "path": "/events/Main Hall/2025-11-18 14-03-11.mov"
        }
    }"#;

    #[test]
    fn test_parse_tags_json() {
        let tags: VideoTags = VideoTags(serde_json::from_str(SAMPLE).unwrap());
        assert_eq!(tags.len(), 2);

        let entry = &tags.0["2025-11-18 10-29-29.mov"];
        assert_eq!(entry.presenter_quadrant.as_deref(), Some("top-left"));
        assert!(tags.0["2025-11-18 14-03-11.mov"].slides_quadrant.is_none());
    }

    #[test]
    fn test_filter_selects_by_path_substring() {
        let tags = VideoTags(serde_json::from_str(SAMPLE).unwrap());

        let second_room = tags.references("Second Room");
        assert_eq!(second_room.len(), 1);
        assert_eq!(second_room[0].0, "2025-11-18 10-29-29.mov");

        assert_eq!(tags.references("").len(), 2);
        assert!(tags.references("Green Room").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let result = VideoTags::load(Path::new("/nonexistent/tags.json"));
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }
}
