// Wire types for the reader backend.
//
// These mirror the JSON the backend emits. They are deliberately strict where
// the viewer depends on a field (chapter id/title, page idx/total/path) and
// lenient everywhere else, so a missing optional field never fails a call.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// One entry of a chapter group, as returned by `api/chapters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: i64,
    pub title: String,
}

/// Chapter groups keyed by group name (`"Chapter"`, `"Volume"`, `"Misc"`),
/// in the order the backend sent them.
pub type ChapterGroups = IndexMap<String, Vec<ChapterRecord>>;

/// Loose chapter reference embedded in manga and meta records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `api/meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(default)]
    pub manga_id: Option<i64>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub thum_img: Option<String>,
    #[serde(default)]
    pub latest_chapter: Option<ChapterRef>,
}

/// A manga as returned by `api/manga` and `user/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub thum_img: Option<String>,
    #[serde(default)]
    pub is_fav: bool,
    #[serde(default)]
    pub last_read_chapter: Option<ChapterRef>,
    #[serde(default)]
    pub latest_chapter: Option<ChapterRef>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_added: Option<DateTime<Utc>>,
}

/// One result of `api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

// ── Anime ────────────────────────────────────────────────────────────

/// One episode as listed by `api/episodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Loose episode reference embedded in anime records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `api/episode`: where the downloaded video landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeVideo {
    /// Storage-internal path, e.g. `/downloaded/anime1/title/season/ep1.mp4`.
    pub vid_path: String,
}

/// An anime as returned by `api/anime` and `user/a_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub eps: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub latest_episode: Option<EpisodeRef>,
    #[serde(default)]
    pub last_read_episode: Option<EpisodeRef>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_added: Option<DateTime<Utc>>,
}

// ── Page feed messages ───────────────────────────────────────────────

/// A single page of a chapter as announced by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Zero-based ordinal of the page within the chapter.
    pub idx: usize,
    /// Total page count of the chapter.
    pub total: usize,
    /// Storage-internal image path, e.g. `/downloaded/site/title/ch1/0.png`.
    pub pic_path: String,
}

/// One message of the page feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Page(PageDescriptor),
    /// The `{}` end-of-stream marker.
    Terminal,
}

impl PageEvent {
    /// Decode the `data` payload of one feed message.
    ///
    /// An empty JSON object is the terminal marker; anything else must be a
    /// complete page descriptor.
    pub fn parse(data: &str) -> Result<Self, Error> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| Error::MalformedEvent {
                message: e.to_string(),
                data: data.to_owned(),
            })?;

        if value.as_object().is_some_and(serde_json::Map::is_empty) {
            return Ok(Self::Terminal);
        }

        serde_json::from_value(value)
            .map(Self::Page)
            .map_err(|e| Error::MalformedEvent {
                message: e.to_string(),
                data: data.to_owned(),
            })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

// ── Timestamps ───────────────────────────────────────────────────────

/// The backend emits RFC 3339 timestamps when the value carries an offset
/// and naive ISO-8601 timestamps otherwise. Naive values are taken as UTC.
mod timestamp {
    use super::{DateTime, Deserialize, Deserializer, NaiveDateTime, Utc};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_terminal() {
        assert_eq!(PageEvent::parse("{}").expect("valid"), PageEvent::Terminal);
        assert_eq!(PageEvent::parse(" { } ").expect("valid"), PageEvent::Terminal);
    }

    #[test]
    fn page_descriptor_is_decoded() {
        let event =
            PageEvent::parse(r#"{"idx":1,"total":3,"pic_path":"/downloaded/b.png"}"#).expect("valid");
        assert_eq!(
            event,
            PageEvent::Page(PageDescriptor {
                idx: 1,
                total: 3,
                pic_path: "/downloaded/b.png".into(),
            })
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = PageEvent::parse(r#"{"idx":1,"total":3}"#).expect_err("missing pic_path");
        assert!(matches!(err, Error::MalformedEvent { .. }));
    }

    #[test]
    fn negative_index_is_malformed() {
        let err = PageEvent::parse(r#"{"idx":-1,"total":3,"pic_path":"/x"}"#)
            .expect_err("negative idx");
        assert!(matches!(err, Error::MalformedEvent { .. }));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            PageEvent::parse("[DONE]"),
            Err(Error::MalformedEvent { .. })
        ));
    }

    #[test]
    fn naive_and_offset_timestamps_are_accepted() {
        let naive: MetaRecord =
            serde_json::from_str(r#"{"last_update":"2024-03-01T12:30:00"}"#).expect("naive");
        let offset: MetaRecord =
            serde_json::from_str(r#"{"last_update":"2024-03-01T12:30:00+00:00"}"#).expect("rfc3339");
        assert_eq!(naive.last_update, offset.last_update);
        assert!(naive.last_update.is_some());
    }

    #[test]
    fn manga_record_tolerates_missing_optionals() {
        let manga: MangaRecord = serde_json::from_str(r#"{"name":"One Piece"}"#).expect("valid");
        assert_eq!(manga.name, "One Piece");
        assert!(manga.last_read_chapter.is_none());
        assert!(!manga.is_fav);
    }

    #[test]
    fn anime_record_reads_last_watched_episode() {
        let anime: AnimeRecord = serde_json::from_str(
            r#"{"id":4,"name":"Frieren","eps":"28","year":"2023","season":"Fall","sub":"zh",
                "last_read_episode":{"id":12,"title":"[05]","last_update":"2023-10-06T00:00:00","data":"x"}}"#,
        )
        .expect("valid");
        assert_eq!(anime.season.as_deref(), Some("Fall"));
        assert_eq!(anime.last_read_episode.and_then(|e| e.id), Some(12));
        assert!(anime.latest_episode.is_none());
    }

    #[test]
    fn chapter_groups_keep_backend_order() {
        let groups: ChapterGroups = serde_json::from_str(
            r#"{"Volume":[{"id":9,"title":"Vol 1"}],"Chapter":[{"id":1,"title":"Ch1"}]}"#,
        )
        .expect("valid");
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["Volume".to_string(), "Chapter".to_string()]);
    }
}
