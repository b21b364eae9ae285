// Chapter index endpoint.

use tracing::debug;

use crate::client::ReaderClient;
use crate::error::Error;
use crate::models::ChapterGroups;

impl ReaderClient {
    /// List the chapter groups of a manga.
    ///
    /// `GET api/chapters?manga_id={manga_id}`
    pub async fn list_chapters(&self, manga_id: i64) -> Result<ChapterGroups, Error> {
        let id = manga_id.to_string();
        let url = self.endpoint("api/chapters", &[("manga_id", &id)])?;
        let groups: ChapterGroups = self.get(url).await?;
        debug!(
            manga_id,
            groups = groups.len(),
            chapters = groups.values().map(Vec::len).sum::<usize>(),
            "chapter index fetched"
        );
        Ok(groups)
    }
}
