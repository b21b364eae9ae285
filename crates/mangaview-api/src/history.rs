// Reading-history endpoints (`user/history`).
//
// All mutations are form-encoded, matching the backend's `Form()` params.

use serde::{Deserialize, Serialize};

use crate::client::ReaderClient;
use crate::error::Error;
use crate::models::MangaRecord;

#[derive(Serialize)]
struct HistoryForm {
    manga_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    chapter_id: Option<i64>,
}

/// Acknowledgement returned by history mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryAck {
    #[serde(default)]
    pub manga_id: Option<i64>,
    #[serde(default)]
    pub chapter_id: Option<i64>,
}

#[derive(Deserialize)]
pub(crate) struct DeleteAck {
    #[serde(default)]
    pub(crate) success: bool,
}

impl ReaderClient {
    /// List the caller's reading history, most recent first.
    ///
    /// `GET user/history`
    pub async fn list_history(&self) -> Result<Vec<MangaRecord>, Error> {
        let url = self.endpoint("user/history", &[])?;
        self.get(url).await
    }

    /// Add a manga to the caller's history.
    ///
    /// `POST user/history` with form `manga_id`
    pub async fn add_history(&self, manga_id: i64) -> Result<HistoryAck, Error> {
        let url = self.endpoint("user/history", &[])?;
        let form = HistoryForm {
            manga_id,
            chapter_id: None,
        };
        self.post_form(url, &form).await
    }

    /// Record `chapter_id` as the last-read chapter of `manga_id`.
    ///
    /// `PUT user/history` with form `manga_id`, `chapter_id`
    pub async fn update_history(&self, manga_id: i64, chapter_id: i64) -> Result<HistoryAck, Error> {
        let url = self.endpoint("user/history", &[])?;
        let form = HistoryForm {
            manga_id,
            chapter_id: Some(chapter_id),
        };
        self.put_form(url, &form).await
    }

    /// Remove a manga from the caller's history. Returns whether an entry
    /// was removed.
    ///
    /// `DELETE user/history` with form `manga_id`
    pub async fn remove_history(&self, manga_id: i64) -> Result<bool, Error> {
        let url = self.endpoint("user/history", &[])?;
        let form = HistoryForm {
            manga_id,
            chapter_id: None,
        };
        let ack: DeleteAck = self.delete_form(url, &form).await?;
        Ok(ack.success)
    }
}
