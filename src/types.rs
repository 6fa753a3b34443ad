use serde::{Deserialize, Serialize};

/// Sentinel meaning "no rating data yet". Never a valid star value.
pub const NO_RATING: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Case-insensitive parse, matching the backend's tolerant type handling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// A catalog entry as returned by the content endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_min: u32,
    #[serde(default)]
    pub difficulty: Option<u8>,
    pub language: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ContentItem {
    /// Opaque identity; items without a server id fall back to their title.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Content <-> category association row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCategory {
    #[serde(default)]
    pub id: Option<String>,
    pub content_id: String,
    pub category_id: String,
}

/// A `ContentItem` plus derived fields. Enrichment never drops an item:
/// a failed lookup degrades the affected field to its empty/sentinel form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedContentItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub category_names: Vec<String>,
    /// Star rating in [0, 5], or [`NO_RATING`] when no one has rated yet.
    pub rating: f64,
}

impl EnrichedContentItem {
    pub fn unrated(item: ContentItem) -> Self {
        Self { item, category_names: Vec::new(), rating: NO_RATING }
    }
}

/// Generic page envelope used by the paginated backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    pub text: String,
    pub posted_at: String,
}

/// One user's interaction with a content item: progress, rating, comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub content_id: String,
    #[serde(default)]
    pub watched_at: Option<String>,
    #[serde(default)]
    pub content_duration: u32,
    #[serde(default)]
    pub watched_duration: u32,
    /// Backend scale 0-10; see `history::stars_from_backend`.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub roles: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub preferences: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    // Wellness metrics, 0-10 each
    #[serde(default)]
    pub mental: u8,
    #[serde(default)]
    pub sleep: u8,
    #[serde(default)]
    pub stress: u8,
    #[serde(default)]
    pub meditation: u8,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanLevel {
    Easy,
    Intermediate,
    Advanced,
}

impl PlanLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanLevel::Easy => "EASY",
            PlanLevel::Intermediate => "INTERMEDIATE",
            PlanLevel::Advanced => "ADVANCED",
        }
    }

    /// Number of entries the backend puts into a plan of this level.
    pub fn entry_count(&self) -> usize {
        match self {
            PlanLevel::Easy => 3,
            PlanLevel::Intermediate => 7,
            PlanLevel::Advanced => 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    pub notified: bool,
    #[serde(default)]
    pub content_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub level: PlanLevel,
    #[serde(default)]
    pub to_watch: Vec<PlanEntry>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_parse_is_case_insensitive() {
        assert_eq!(MediaKind::parse("Video"), Some(MediaKind::Video));
        assert_eq!(MediaKind::parse(" AUDIO "), Some(MediaKind::Audio));
        assert_eq!(MediaKind::parse("podcast"), None);
    }

    #[test]
    fn content_item_deserializes_backend_shape() {
        let json = r#"{
            "id": "abc",
            "title": "Calm Sleep",
            "type": "audio",
            "durationMin": 8,
            "language": "EN",
            "isActive": true,
            "createdAt": "2025-01-01T00:00:00"
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.key(), "abc");
        assert_eq!(item.duration_min, 8);
        assert_eq!(item.difficulty, None);
        assert_eq!(item.kind, "audio");
    }

    #[test]
    fn plan_level_round_trips_upper_case() {
        let level: PlanLevel = serde_json::from_str("\"ADVANCED\"").unwrap();
        assert_eq!(level, PlanLevel::Advanced);
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"ADVANCED\"");
        assert_eq!(level.entry_count(), 10);
    }
}
