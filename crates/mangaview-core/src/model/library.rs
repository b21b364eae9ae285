// ── Series-level records ──
//
// Everything the reader shows about a series besides its chapters: metadata,
// reading history entries and search hits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::chapter::ChapterId;

/// A chapter reference embedded in series records (latest, last read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub id: Option<ChapterId>,
    pub title: Option<String>,
}

impl ChapterSummary {
    /// Title for display, falling back to the id.
    pub fn label(&self) -> String {
        match (&self.title, self.id) {
            (Some(title), _) => title.clone(),
            (None, Some(id)) => format!("#{id}"),
            (None, None) => "-".into(),
        }
    }
}

/// Header metadata of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaMeta {
    pub manga_id: Option<i64>,
    /// Public thumbnail URL (already rewritten).
    pub thumbnail: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub finished: Option<bool>,
    pub latest_chapter: Option<ChapterSummary>,
}

impl MangaMeta {
    /// `YYYY-MM-DD` of the last update, as shown in the series header.
    pub fn last_update_date(&self) -> Option<String> {
        self.last_update.map(|ts| ts.format("%Y-%m-%d").to_string())
    }
}

/// A series as listed in history or returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaSummary {
    pub id: Option<i64>,
    pub name: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub finished: Option<bool>,
    pub is_fav: bool,
    pub last_read_chapter: Option<ChapterSummary>,
    pub latest_chapter: Option<ChapterSummary>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Option<i64>,
    pub name: String,
    pub url: Option<String>,
}

/// Source site searched by the backend scrapers.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Site {
    #[default]
    Manhuaren,
    Copymanga,
    Mangabat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_names_are_lowercase() {
        assert_eq!(Site::Copymanga.to_string(), "copymanga");
        assert_eq!("MangaBat".parse::<Site>().ok(), Some(Site::Mangabat));
        assert!("anime1".parse::<Site>().is_err());
    }

    #[test]
    fn summary_label_falls_back_to_id() {
        let chapter = ChapterSummary {
            id: Some(ChapterId::new(12)),
            title: None,
        };
        assert_eq!(chapter.label(), "#12");
    }
}
