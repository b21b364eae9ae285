//! Server-sent page feed.
//!
//! `GET api/pages?chapter_id=` answers with a `text/event-stream` body whose
//! messages are page descriptors followed by a `{}` end marker. [`PageFeed`]
//! turns the raw body into [`PageEvent`]s, one at a time.
//!
//! ```rust,ignore
//! let mut feed = client.open_page_feed(532).await?;
//! while let Some(event) = feed.next_event().await {
//!     match event? {
//!         PageEvent::Page(page) => println!("{} / {}", page.idx, page.total),
//!         PageEvent::Terminal => break,
//!     }
//! }
//! ```

use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::client::ReaderClient;
use crate::error::Error;
use crate::models::PageEvent;
use crate::sse::SseDecoder;

impl ReaderClient {
    /// Open the page feed for one chapter.
    ///
    /// Resolves once the backend has answered with a success status; page
    /// events are then pulled with [`PageFeed::next_event`].
    pub async fn open_page_feed(&self, chapter_id: i64) -> Result<PageFeed, Error> {
        let id = chapter_id.to_string();
        let url = self.endpoint("api/pages", &[("chapter_id", &id)])?;
        let resp = self.open_stream(url).await?;
        debug!(chapter_id, "page feed opened");
        Ok(PageFeed::from_body(resp.bytes_stream()))
    }
}

/// A decoded page feed.
///
/// Yields events until the terminal marker, the first malformed message, or
/// the end of the body, whichever comes first. Dropping the feed closes the
/// underlying connection.
pub struct PageFeed {
    body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl PageFeed {
    /// Wrap any byte stream carrying an event-stream body.
    pub fn from_body<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            body: body.boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Pull the next event.
    ///
    /// Returns `None` once the feed is exhausted. A body that ends before the
    /// terminal marker also returns `None`; callers that need the marker
    /// should track whether they saw it.
    pub async fn next_event(&mut self) -> Option<Result<PageEvent, Error>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(data) = self.pending.pop_front() {
                let event = PageEvent::parse(&data);
                if !matches!(event, Ok(PageEvent::Page(_))) {
                    self.finished = true;
                }
                trace!(?event, "page feed message");
                return Some(event);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(Error::Transport(e)));
                }
                None => {
                    debug!(
                        trailing_bytes = self.decoder.pending_bytes(),
                        "page feed body ended"
                    );
                    self.finished = true;
                }
            }
        }
    }

    /// `true` once no further events will be produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;
    use crate::models::PageDescriptor;

    fn feed(chunks: &[&'static str]) -> PageFeed {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        PageFeed::from_body(stream::iter(chunks))
    }

    #[tokio::test]
    async fn yields_pages_then_terminal() {
        let mut feed = feed(&[
            "data: {\"idx\":1,\"total\":2,\"pic_path\":\"/downloaded/b.png\"}\n\n",
            "data: {\"idx\":0,\"total\":2,\"pic_path\":\"/downloaded/a.png\"}\n\ndata: {}\n\n",
        ]);

        let first = feed.next_event().await.expect("event").expect("valid");
        assert_eq!(
            first,
            PageEvent::Page(PageDescriptor {
                idx: 1,
                total: 2,
                pic_path: "/downloaded/b.png".into(),
            })
        );
        let second = feed.next_event().await.expect("event").expect("valid");
        assert!(matches!(second, PageEvent::Page(ref p) if p.idx == 0));
        let last = feed.next_event().await.expect("event").expect("valid");
        assert!(last.is_terminal());
        assert!(feed.next_event().await.is_none());
        assert!(feed.is_finished());
    }

    #[tokio::test]
    async fn nothing_after_terminal_is_delivered() {
        let mut feed = feed(&[
            "data: {}\n\ndata: {\"idx\":0,\"total\":1,\"pic_path\":\"/x\"}\n\n",
        ]);
        assert!(feed.next_event().await.expect("event").expect("valid").is_terminal());
        assert!(feed.next_event().await.is_none());
    }

    #[tokio::test]
    async fn malformed_message_ends_feed() {
        let mut feed = feed(&["data: {\"idx\":0}\n\n", "data: {}\n\n"]);
        assert!(matches!(
            feed.next_event().await,
            Some(Err(Error::MalformedEvent { .. }))
        ));
        assert!(feed.next_event().await.is_none());
    }

    #[tokio::test]
    async fn body_ending_early_returns_none() {
        let mut feed = feed(&["data: {\"idx\":0,\"total\":3,\"pic_path\":\"/a\"}\n\n"]);
        assert!(feed.next_event().await.expect("event").is_ok());
        assert!(feed.next_event().await.is_none());
    }
}
