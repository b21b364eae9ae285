// ── API-to-domain type conversions ──
//
// Bridges raw `mangaview_api` payloads into `crate::model` types. Thumbnail
// paths go through the `AssetRewriter`, so those conversions take it as an
// argument instead of being plain `From` impls.

use std::collections::HashSet;

use mangaview_api::{
    AnimeRecord, ChapterGroups, ChapterRef, EpisodeRecord, EpisodeRef, MangaRecord, MetaRecord,
    SearchHit,
};

use crate::assets::AssetRewriter;
use crate::error::CoreError;
use crate::model::{
    AnimeSummary, ChapterId, ChapterIndex, ChapterKind, ChapterSummary, Episode, EpisodeId,
    EpisodeList, EpisodeSummary, EpisodeVideo, MangaMeta, MangaSummary, SearchResult,
};

// ── Chapter index ──────────────────────────────────────────────────

impl TryFrom<ChapterGroups> for ChapterIndex {
    type Error = CoreError;

    /// Group names must be one of the known tabs; anything else means the
    /// payload is not a chapter index.
    fn try_from(groups: ChapterGroups) -> Result<Self, Self::Error> {
        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(groups.len());

        for (name, records) in groups {
            let kind: ChapterKind = name.parse().map_err(|_| CoreError::Fetch {
                message: format!("unknown chapter group {name:?}"),
                status: None,
            })?;
            if !seen.insert(kind) {
                return Err(CoreError::Fetch {
                    message: format!("chapter group {kind} listed twice"),
                    status: None,
                });
            }
            let chapters: Vec<_> = records
                .into_iter()
                .map(|r| (ChapterId::new(r.id), r.title))
                .collect();
            parsed.push((kind, chapters));
        }

        Ok(ChapterIndex::from_groups(parsed))
    }
}

// ── Series records ─────────────────────────────────────────────────

impl From<ChapterRef> for ChapterSummary {
    fn from(r: ChapterRef) -> Self {
        Self {
            id: r.id.map(ChapterId::new),
            title: r.title,
        }
    }
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.id,
            name: hit.name,
            url: hit.url,
        }
    }
}

pub(crate) fn meta_from_record(record: MetaRecord, assets: &AssetRewriter) -> MangaMeta {
    MangaMeta {
        manga_id: record.manga_id,
        thumbnail: record.thum_img.as_deref().map(|p| assets.rewrite(p)),
        last_update: record.last_update,
        finished: record.finished,
        latest_chapter: record.latest_chapter.map(Into::into),
    }
}

pub(crate) fn summary_from_record(record: MangaRecord, assets: &AssetRewriter) -> MangaSummary {
    MangaSummary {
        id: record.id,
        name: record.name,
        url: record.url,
        thumbnail: record.thum_img.as_deref().map(|p| assets.rewrite(p)),
        last_update: record.last_update,
        finished: record.finished,
        is_fav: record.is_fav,
        last_read_chapter: record.last_read_chapter.map(Into::into),
        latest_chapter: record.latest_chapter.map(Into::into),
    }
}

// ── Anime records ──────────────────────────────────────────────────

impl From<Vec<EpisodeRecord>> for EpisodeList {
    fn from(records: Vec<EpisodeRecord>) -> Self {
        EpisodeList::from_entries(
            records
                .into_iter()
                .map(|r| (EpisodeId::new(r.id), r.title, r.last_update)),
        )
    }
}

impl From<EpisodeRef> for EpisodeSummary {
    fn from(r: EpisodeRef) -> Self {
        Self {
            id: r.id.map(EpisodeId::new),
            title: r.title,
        }
    }
}

impl From<AnimeRecord> for AnimeSummary {
    fn from(record: AnimeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            url: record.url,
            eps: record.eps,
            year: record.year,
            season: record.season,
            last_watched: record.last_read_episode.map(Into::into),
            latest_episode: record.latest_episode.map(Into::into),
            last_added: record.last_added,
        }
    }
}

pub(crate) fn video_from_record(
    episode: Episode,
    video: &mangaview_api::EpisodeVideo,
    assets: &AssetRewriter,
) -> EpisodeVideo {
    EpisodeVideo {
        episode,
        video_url: assets.rewrite(&video.vid_path),
    }
}

#[cfg(test)]
mod tests {
    use mangaview_api::ChapterRecord;
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: i64, title: &str) -> ChapterRecord {
        ChapterRecord {
            id,
            title: title.into(),
        }
    }

    #[test]
    fn groups_become_index_in_tab_order() {
        let mut groups = ChapterGroups::new();
        groups.insert("Misc".into(), vec![record(30, "Extra")]);
        groups.insert("Chapter".into(), vec![record(1, "Ch1"), record(2, "Ch2")]);

        let index = ChapterIndex::try_from(groups).expect("valid index");
        let order: Vec<_> = index
            .tabs()
            .filter(|(_, chapters)| !chapters.is_empty())
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(order, vec![ChapterKind::Chapter, ChapterKind::Misc]);
        assert_eq!(index.get(ChapterKind::Chapter, 1).map(|c| c.id), Some(ChapterId::new(2)));
    }

    #[test]
    fn unknown_group_is_a_fetch_error() {
        let mut groups = ChapterGroups::new();
        groups.insert("Episode".into(), vec![record(1, "Ep1")]);
        let err = ChapterIndex::try_from(groups).expect_err("unknown group");
        assert!(matches!(err, CoreError::Fetch { .. }));
    }

    #[test]
    fn duplicate_group_is_rejected() {
        let mut groups = ChapterGroups::new();
        groups.insert("Chapter".into(), vec![record(1, "Ch1")]);
        groups.insert("chapter".into(), vec![record(2, "Ch2")]);
        assert!(ChapterIndex::try_from(groups).is_err());
    }

    #[test]
    fn thumbnails_are_rewritten() {
        let meta = meta_from_record(
            MetaRecord {
                manga_id: Some(7),
                last_update: None,
                finished: Some(false),
                thum_img: Some("/downloaded/site/op/thum_img.jpg".into()),
                latest_chapter: Some(ChapterRef {
                    id: Some(3),
                    title: Some("Ch3".into()),
                }),
            },
            &AssetRewriter::default(),
        );
        assert_eq!(meta.thumbnail.as_deref(), Some("/static/site/op/thum_img.jpg"));
        assert_eq!(
            meta.latest_chapter.map(|c| c.label()),
            Some("Ch3".to_string())
        );
    }

    #[test]
    fn video_path_is_rewritten() {
        let episode = Episode {
            id: EpisodeId::new(12),
            title: "[02]".into(),
            position: 1,
            last_update: None,
        };
        let video = video_from_record(
            episode,
            &mangaview_api::EpisodeVideo {
                vid_path: "/downloaded/anime1/Frieren/Fall/[02].mp4".into(),
            },
            &AssetRewriter::new("/downloaded", "http://media.local/static"),
        );
        assert_eq!(
            video.video_url,
            "http://media.local/static/anime1/Frieren/Fall/[02].mp4"
        );
    }

    #[test]
    fn last_watched_episode_is_carried_over() {
        let summary = AnimeSummary::from(AnimeRecord {
            id: Some(4),
            name: "Frieren".into(),
            url: None,
            eps: Some("28".into()),
            year: Some("2023".into()),
            season: Some("Fall".into()),
            latest_episode: None,
            last_read_episode: Some(EpisodeRef {
                id: Some(12),
                title: None,
            }),
            last_added: None,
        });
        assert_eq!(
            summary.last_watched.map(|e| e.label()),
            Some("#12".to_string())
        );
    }
}
