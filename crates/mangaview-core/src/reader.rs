// ── Reader driver ──
//
// Async owner of a `ChapterStreamViewer`. Fetches the index, opens one page
// feed per session and forwards its events to the viewer tagged with the
// session id. At most one feed task runs; opening a session cancels the
// previous one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::error::CoreError;
use crate::library::Library;
use crate::model::{
    Chapter, ChapterId, ChapterIndex, ChapterKind, ChapterSummary, Direction, MangaMeta,
    MangaSummary, SearchResult, Site,
};
use crate::surface::PageSurface;
use crate::viewer::{ChapterStreamViewer, EventOutcome, SessionId, SessionTicket, ViewerState};

const EVENT_CHANNEL_SIZE: usize = 256;

// ── ReaderEvent ──────────────────────────────────────────────────

/// Notifications published while the reader runs.
///
/// Stream failures surface here; they never propagate out of the feed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    IndexLoaded {
        chapters: usize,
    },
    SessionOpened {
        session: SessionId,
        chapter: Chapter,
    },
    PageRendered {
        session: SessionId,
        idx: usize,
        total: usize,
    },
    ChapterComplete {
        session: SessionId,
        chapter_id: ChapterId,
        pages: usize,
    },
    StreamFailed {
        session: SessionId,
        chapter_id: ChapterId,
        error: String,
        /// No event arrived within `stream_timeout`.
        timed_out: bool,
    },
    HistoryRecorded {
        chapter_id: ChapterId,
    },
    LastRead(Option<ChapterSummary>),
}

// ── Reader ───────────────────────────────────────────────────────

/// Cheaply cloneable via `Arc<ReaderInner>`.
pub struct Reader<S> {
    inner: Arc<ReaderInner<S>>,
}

impl<S> Clone for Reader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ReaderInner<S> {
    config: ReaderConfig,
    library: Library,
    viewer: Mutex<ChapterStreamViewer<S>>,
    /// Lock order: `feed` before `viewer`.
    feed: Mutex<Option<FeedTask>>,
    state: watch::Sender<ViewerState>,
    event_tx: broadcast::Sender<ReaderEvent>,
    cancel: CancellationToken,
}

struct FeedTask {
    session: SessionId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl FeedTask {
    async fn stop(self) {
        self.cancel.cancel();
        match self.handle.await {
            Err(e) if e.is_panic() => warn!(session = %self.session, "feed task panicked"),
            _ => {}
        }
    }
}

impl<S: PageSurface + Send + 'static> Reader<S> {
    /// Create a reader for `config.manga_id` rendering into `surface`.
    pub fn new(config: ReaderConfig, surface: S) -> Result<Self, CoreError> {
        let library = Library::connect(&config)?;
        Ok(Self::with_library(config, library, surface))
    }

    pub fn with_library(config: ReaderConfig, library: Library, surface: S) -> Self {
        let viewer = ChapterStreamViewer::new(surface, library.assets().clone());
        let (state, _) = watch::channel(ViewerState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ReaderInner {
                config,
                library,
                viewer: Mutex::new(viewer),
                feed: Mutex::new(None),
                state,
                event_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.inner.config
    }

    pub fn library(&self) -> &Library {
        &self.inner.library
    }

    /// Subscribe to viewer state changes.
    pub fn state(&self) -> watch::Receiver<ViewerState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to reader notifications.
    pub fn events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Run `f` against the viewer under its lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&ChapterStreamViewer<S>) -> R) -> R {
        let viewer = self.inner.viewer.lock().await;
        f(&viewer)
    }

    // ── Index ────────────────────────────────────────────────────────

    /// Fetch the chapter index and hand it to the viewer.
    pub async fn load_index(&self) -> Result<ChapterIndex, CoreError> {
        let index = self.inner.library.chapters(self.inner.config.manga_id).await?;
        self.inner.viewer.lock().await.replace_index(index.clone());

        info!(
            manga_id = self.inner.config.manga_id,
            chapters = index.len(),
            "chapter index loaded"
        );
        let _ = self.inner.event_tx.send(ReaderEvent::IndexLoaded {
            chapters: index.len(),
        });
        Ok(index)
    }

    pub async fn set_active_tab(&self, tab: ChapterKind) {
        self.inner.viewer.lock().await.set_active_tab(tab);
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Open a chapter, preempting whatever is streaming.
    pub async fn select_chapter(
        &self,
        group: ChapterKind,
        position: usize,
    ) -> Result<SessionTicket, CoreError> {
        let mut feed = self.inner.feed.lock().await;
        let ticket = {
            let mut viewer = self.inner.viewer.lock().await;
            let ticket = viewer.select_chapter(group, position)?;
            self.inner.publish(&viewer);
            ticket
        };
        self.start_feed(&mut feed, ticket.clone()).await;
        Ok(ticket)
    }

    /// Open the next chapter of the group. `None` when there is none or a
    /// chapter is still loading.
    pub async fn next(&self) -> Option<SessionTicket> {
        self.navigate(Direction::Next).await
    }

    pub async fn previous(&self) -> Option<SessionTicket> {
        self.navigate(Direction::Previous).await
    }

    async fn navigate(&self, direction: Direction) -> Option<SessionTicket> {
        let mut feed = self.inner.feed.lock().await;
        let ticket = {
            let mut viewer = self.inner.viewer.lock().await;
            let ticket = viewer.navigate(direction)?;
            self.inner.publish(&viewer);
            ticket
        };
        self.start_feed(&mut feed, ticket.clone()).await;
        Some(ticket)
    }

    async fn start_feed(&self, slot: &mut Option<FeedTask>, ticket: SessionTicket) {
        if let Some(previous) = slot.take() {
            debug!(session = %previous.session, "cancelling superseded feed");
            previous.stop().await;
        }

        let _ = self.inner.event_tx.send(ReaderEvent::SessionOpened {
            session: ticket.session,
            chapter: ticket.chapter.clone(),
        });

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(feed_task(
            Arc::clone(&self.inner),
            ticket.clone(),
            cancel.clone(),
        ));
        *slot = Some(FeedTask {
            session: ticket.session,
            cancel,
            handle,
        });

        if self.inner.config.record_history {
            tokio::spawn(record_history(Arc::clone(&self.inner), ticket.chapter.id));
        }
    }

    /// Close the open session and stop its feed.
    pub async fn close(&self) {
        let mut feed = self.inner.feed.lock().await;
        {
            let mut viewer = self.inner.viewer.lock().await;
            if let Some(session) = viewer.close() {
                info!(%session, "stream session closed");
            }
            self.inner.publish(&viewer);
        }
        if let Some(task) = feed.take() {
            task.stop().await;
        }
    }

    /// Close and stop every background task of this reader.
    pub async fn shutdown(&self) {
        self.close().await;
        self.inner.cancel.cancel();
    }

    /// Resolve once the viewer is `Idle`: the chapter completed, failed or
    /// was closed.
    pub async fn wait_idle(&self) -> Result<(), CoreError> {
        let mut state = self.inner.state.subscribe();
        state
            .wait_for(ViewerState::is_idle)
            .await
            .map(|_| ())
            .map_err(|_| CoreError::Internal("reader state channel closed".into()))
    }

    // ── Series reads ─────────────────────────────────────────────────

    pub async fn meta(&self) -> Result<MangaMeta, CoreError> {
        self.inner.library.meta(self.inner.config.manga_id).await
    }

    pub async fn last_read(&self) -> Result<Option<ChapterSummary>, CoreError> {
        self.inner.library.last_read(self.inner.config.manga_id).await
    }

    pub async fn add_to_history(&self) -> Result<(), CoreError> {
        self.inner
            .library
            .add_to_history(self.inner.config.manga_id)
            .await
    }

    pub async fn history(&self) -> Result<Vec<MangaSummary>, CoreError> {
        self.inner.library.history().await
    }

    pub async fn search(&self, keyword: &str, site: Site) -> Result<Vec<SearchResult>, CoreError> {
        self.inner.library.search(keyword, site).await
    }
}

impl<S: PageSurface> ReaderInner<S> {
    /// Push the viewer state to watchers when it changed.
    fn publish(&self, viewer: &ChapterStreamViewer<S>) {
        let next = viewer.state();
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

// ── Background tasks ─────────────────────────────────────────────

enum FeedEnd {
    Complete { pages: usize },
    /// The session was closed or replaced while the feed was running.
    Superseded,
    Failed(CoreError),
}

enum FeedError {
    /// The viewer rejected an event and already closed the session.
    Rejected(CoreError),
    /// The feed itself failed; the session is still open.
    Feed(CoreError),
}

async fn feed_task<S: PageSurface + Send + 'static>(
    inner: Arc<ReaderInner<S>>,
    ticket: SessionTicket,
    cancel: CancellationToken,
) {
    let session = ticket.session;
    let end = tokio::select! {
        biased;
        _ = cancel.cancelled() => FeedEnd::Superseded,
        end = pump(&inner, &ticket) => end,
    };

    match end {
        FeedEnd::Complete { pages } => {
            let _ = inner.event_tx.send(ReaderEvent::ChapterComplete {
                session,
                chapter_id: ticket.chapter.id,
                pages,
            });
        }
        FeedEnd::Superseded => debug!(%session, "feed task finished for inactive session"),
        FeedEnd::Failed(err) => {
            warn!(%session, chapter_id = %ticket.chapter.id, error = %err, "page stream failed");
            let _ = inner.event_tx.send(ReaderEvent::StreamFailed {
                session,
                chapter_id: ticket.chapter.id,
                timed_out: matches!(err, CoreError::StreamTimeout { .. }),
                error: err.to_string(),
            });
        }
    }
}

async fn pump<S: PageSurface>(inner: &ReaderInner<S>, ticket: &SessionTicket) -> FeedEnd {
    match stream_pages(inner, ticket).await {
        Ok(end) => end,
        Err(FeedError::Rejected(err)) => FeedEnd::Failed(err),
        Err(FeedError::Feed(err)) => {
            let mut viewer = inner.viewer.lock().await;
            if viewer.fail_session(ticket.session) {
                inner.publish(&viewer);
                FeedEnd::Failed(err)
            } else {
                FeedEnd::Superseded
            }
        }
    }
}

async fn stream_pages<S: PageSurface>(
    inner: &ReaderInner<S>,
    ticket: &SessionTicket,
) -> Result<FeedEnd, FeedError> {
    let wait = inner.config.stream_timeout;
    let timed_out = || {
        FeedError::Feed(CoreError::StreamTimeout {
            timeout_ms: millis(wait),
        })
    };

    let open = inner.library.client().open_page_feed(ticket.chapter.id.get());
    let mut feed = time::timeout(wait, open)
        .await
        .map_err(|_| timed_out())?
        .map_err(|e| FeedError::Feed(CoreError::stream(e)))?;

    loop {
        let event = match time::timeout(wait, feed.next_event()).await {
            Err(_) => return Err(timed_out()),
            Ok(None) => {
                return Err(FeedError::Feed(CoreError::Stream {
                    message: "feed ended before the end-of-chapter marker".into(),
                }));
            }
            Ok(Some(Err(e))) => return Err(FeedError::Feed(CoreError::stream(e))),
            Ok(Some(Ok(event))) => event,
        };

        let outcome = {
            let mut viewer = inner.viewer.lock().await;
            let outcome = viewer.on_page_event(ticket.session, event);
            inner.publish(&viewer);
            outcome
        };

        match outcome {
            Ok(EventOutcome::Placed { idx, total }) => {
                let _ = inner.event_tx.send(ReaderEvent::PageRendered {
                    session: ticket.session,
                    idx,
                    total,
                });
            }
            Ok(EventOutcome::Complete { pages }) => return Ok(FeedEnd::Complete { pages }),
            Ok(EventOutcome::Stale) => return Ok(FeedEnd::Superseded),
            Err(err) => return Err(FeedError::Rejected(err)),
        }
    }
}

/// Fire-and-forget history update; failures are logged and dropped.
async fn record_history<S>(inner: Arc<ReaderInner<S>>, chapter_id: ChapterId) {
    let manga_id = inner.config.manga_id;
    let library = inner.library.clone();

    let recorded = tokio::select! {
        _ = inner.cancel.cancelled() => return,
        result = library.record_reading(manga_id, chapter_id) => result,
    };
    if let Err(err) = recorded {
        warn!(manga_id, %chapter_id, error = %err, "failed to record reading history");
        return;
    }
    let _ = inner.event_tx.send(ReaderEvent::HistoryRecorded { chapter_id });

    match library.last_read(manga_id).await {
        Ok(last) => {
            let _ = inner.event_tx.send(ReaderEvent::LastRead(last));
        }
        Err(err) => warn!(manga_id, error = %err, "failed to refresh last-read chapter"),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
