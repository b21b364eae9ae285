// Manga-level read endpoints: meta, last-read summary, and search.

use crate::client::ReaderClient;
use crate::error::Error;
use crate::models::{MangaRecord, MetaRecord, SearchHit};

impl ReaderClient {
    /// Fetch cover, update time, completion flag and latest chapter.
    ///
    /// `GET api/meta?manga_id={manga_id}`
    pub async fn get_meta(&self, manga_id: i64) -> Result<MetaRecord, Error> {
        let id = manga_id.to_string();
        let url = self.endpoint("api/meta", &[("manga_id", &id)])?;
        self.get(url).await
    }

    /// Fetch the manga summary, including the caller's last-read chapter.
    ///
    /// `GET api/manga?manga_id={manga_id}`
    pub async fn get_manga(&self, manga_id: i64) -> Result<MangaRecord, Error> {
        let id = manga_id.to_string();
        let url = self.endpoint("api/manga", &[("manga_id", &id)])?;
        self.get(url).await
    }

    /// Search a source site by keyword.
    ///
    /// `GET api/search?keyword={keyword}&site={site}`
    pub async fn search(&self, keyword: &str, site: &str) -> Result<Vec<SearchHit>, Error> {
        let url = self.endpoint("api/search", &[("keyword", keyword), ("site", site)])?;
        self.get(url).await
    }
}
