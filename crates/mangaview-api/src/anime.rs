// Anime endpoints: episode list, episode video, last-watched summary and the
// watch history (`user/a_history`).
//
// Mirrors the manga side: reads are query-string GETs, history mutations are
// form-encoded.

use serde::{Deserialize, Serialize};

use crate::client::ReaderClient;
use crate::error::Error;
use crate::history::DeleteAck;
use crate::models::{AnimeRecord, EpisodeRecord, EpisodeVideo};

#[derive(Serialize)]
struct AnimeHistoryForm {
    anime_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    episode_id: Option<i64>,
}

/// Acknowledgement returned by watch-history mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimeHistoryAck {
    #[serde(default)]
    pub anime_id: Option<i64>,
    #[serde(default)]
    pub episode_id: Option<i64>,
}

impl ReaderClient {
    /// List the episodes of an anime in backend order.
    ///
    /// `GET api/episodes?anime_id={anime_id}`
    pub async fn list_episodes(&self, anime_id: i64) -> Result<Vec<EpisodeRecord>, Error> {
        let id = anime_id.to_string();
        let url = self.endpoint("api/episodes", &[("anime_id", &id)])?;
        self.get(url).await
    }

    /// Resolve an episode to its downloaded video. The backend downloads on
    /// first request, so this can take a while.
    ///
    /// `GET api/episode?episode_id={episode_id}`
    pub async fn get_episode(&self, episode_id: i64) -> Result<EpisodeVideo, Error> {
        let id = episode_id.to_string();
        let url = self.endpoint("api/episode", &[("episode_id", &id)])?;
        self.get(url).await
    }

    /// Fetch the anime summary, including the caller's last-watched episode.
    ///
    /// `GET api/anime?anime_id={anime_id}`
    pub async fn get_anime(&self, anime_id: i64) -> Result<AnimeRecord, Error> {
        let id = anime_id.to_string();
        let url = self.endpoint("api/anime", &[("anime_id", &id)])?;
        self.get(url).await
    }

    /// `GET user/a_history`
    pub async fn list_anime_history(&self) -> Result<Vec<AnimeRecord>, Error> {
        let url = self.endpoint("user/a_history", &[])?;
        self.get(url).await
    }

    /// `POST user/a_history` with form `anime_id`
    pub async fn add_anime_history(&self, anime_id: i64) -> Result<AnimeHistoryAck, Error> {
        let url = self.endpoint("user/a_history", &[])?;
        let form = AnimeHistoryForm {
            anime_id,
            episode_id: None,
        };
        self.post_form(url, &form).await
    }

    /// Record `episode_id` as the last-watched episode of `anime_id`.
    ///
    /// `PUT user/a_history` with form `anime_id`, `episode_id`
    pub async fn update_anime_history(
        &self,
        anime_id: i64,
        episode_id: i64,
    ) -> Result<AnimeHistoryAck, Error> {
        let url = self.endpoint("user/a_history", &[])?;
        let form = AnimeHistoryForm {
            anime_id,
            episode_id: Some(episode_id),
        };
        self.put_form(url, &form).await
    }

    /// `DELETE user/a_history` with form `anime_id`
    pub async fn remove_anime_history(&self, anime_id: i64) -> Result<bool, Error> {
        let url = self.endpoint("user/a_history", &[])?;
        let form = AnimeHistoryForm {
            anime_id,
            episode_id: None,
        };
        let ack: DeleteAck = self.delete_form(url, &form).await?;
        Ok(ack.success)
    }
}
