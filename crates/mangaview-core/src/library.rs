// ── Library reads ──
//
// Series-level calls that do not involve the viewer: chapter index fetch,
// metadata, reading history, search, and the anime side (episodes, videos,
// watch history). Every result is converted into domain types before it
// leaves this module.

use std::sync::Arc;

use mangaview_api::ReaderClient;
use tracing::debug;

use crate::assets::AssetRewriter;
use crate::config::ReaderConfig;
use crate::convert::{meta_from_record, summary_from_record, video_from_record};
use crate::error::CoreError;
use crate::model::{
    AnimeSummary, ChapterId, ChapterIndex, ChapterSummary, Episode, EpisodeId, EpisodeList,
    EpisodeSummary, EpisodeVideo, MangaMeta, MangaSummary, SearchResult, Site,
};

/// Cheaply cloneable handle to the backend's library endpoints.
#[derive(Clone)]
pub struct Library {
    client: Arc<ReaderClient>,
    assets: AssetRewriter,
}

impl Library {
    /// Build the HTTP client described by `config`.
    pub fn connect(config: &ReaderConfig) -> Result<Self, CoreError> {
        let client = ReaderClient::new(config.server.clone(), &config.transport())?;
        Ok(Self::with_client(client, config.assets.clone()))
    }

    pub fn with_client(client: ReaderClient, assets: AssetRewriter) -> Self {
        Self {
            client: Arc::new(client),
            assets,
        }
    }

    pub(crate) fn client(&self) -> &ReaderClient {
        &self.client
    }

    pub fn assets(&self) -> &AssetRewriter {
        &self.assets
    }

    /// Fetch the grouped chapter list of a series.
    pub async fn chapters(&self, manga_id: i64) -> Result<ChapterIndex, CoreError> {
        let groups = self.client.list_chapters(manga_id).await?;
        let index = ChapterIndex::try_from(groups)?;
        debug!(manga_id, chapters = index.len(), "chapter index fetched");
        Ok(index)
    }

    pub async fn meta(&self, manga_id: i64) -> Result<MangaMeta, CoreError> {
        let record = self.client.get_meta(manga_id).await?;
        Ok(meta_from_record(record, &self.assets))
    }

    pub async fn manga(&self, manga_id: i64) -> Result<MangaSummary, CoreError> {
        let record = self.client.get_manga(manga_id).await?;
        Ok(summary_from_record(record, &self.assets))
    }

    /// The chapter the user last opened, if any.
    pub async fn last_read(&self, manga_id: i64) -> Result<Option<ChapterSummary>, CoreError> {
        Ok(self.manga(manga_id).await?.last_read_chapter)
    }

    pub async fn history(&self) -> Result<Vec<MangaSummary>, CoreError> {
        let records = self.client.list_history().await?;
        Ok(records
            .into_iter()
            .map(|r| summary_from_record(r, &self.assets))
            .collect())
    }

    pub async fn add_to_history(&self, manga_id: i64) -> Result<(), CoreError> {
        self.client.add_history(manga_id).await?;
        Ok(())
    }

    /// Returns whether the backend reported an entry as removed.
    pub async fn remove_from_history(&self, manga_id: i64) -> Result<bool, CoreError> {
        Ok(self.client.remove_history(manga_id).await?)
    }

    /// Mark `chapter_id` as the last chapter read.
    pub async fn record_reading(&self, manga_id: i64, chapter_id: ChapterId) -> Result<(), CoreError> {
        self.client.update_history(manga_id, chapter_id.get()).await?;
        Ok(())
    }

    pub async fn search(&self, keyword: &str, site: Site) -> Result<Vec<SearchResult>, CoreError> {
        let hits = self.client.search(keyword, &site.to_string()).await?;
        Ok(hits.into_iter().map(Into::into).collect())
    }

    // ── Anime ────────────────────────────────────────────────────────

    pub async fn episodes(&self, anime_id: i64) -> Result<EpisodeList, CoreError> {
        let episodes = EpisodeList::from(self.client.list_episodes(anime_id).await?);
        debug!(anime_id, episodes = episodes.len(), "episode list fetched");
        Ok(episodes)
    }

    /// Resolve `episode` to its public video URL.
    pub async fn episode_video(&self, episode: Episode) -> Result<EpisodeVideo, CoreError> {
        let video = self.client.get_episode(episode.id.get()).await?;
        Ok(video_from_record(episode, &video, &self.assets))
    }

    pub async fn anime(&self, anime_id: i64) -> Result<AnimeSummary, CoreError> {
        Ok(self.client.get_anime(anime_id).await?.into())
    }

    /// The episode the user last watched, if any.
    pub async fn last_watched(&self, anime_id: i64) -> Result<Option<EpisodeSummary>, CoreError> {
        Ok(self.anime(anime_id).await?.last_watched)
    }

    pub async fn anime_history(&self) -> Result<Vec<AnimeSummary>, CoreError> {
        let records = self.client.list_anime_history().await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn add_to_anime_history(&self, anime_id: i64) -> Result<(), CoreError> {
        self.client.add_anime_history(anime_id).await?;
        Ok(())
    }

    pub async fn remove_from_anime_history(&self, anime_id: i64) -> Result<bool, CoreError> {
        Ok(self.client.remove_anime_history(anime_id).await?)
    }

    /// Mark `episode_id` as the last episode watched.
    pub async fn record_watching(&self, anime_id: i64, episode_id: EpisodeId) -> Result<(), CoreError> {
        self.client
            .update_anime_history(anime_id, episode_id.get())
            .await?;
        Ok(())
    }
}
