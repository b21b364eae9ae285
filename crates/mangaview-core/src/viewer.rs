//! Chapter stream viewer.
//!
//! A synchronous state machine over a [`PageSurface`]: it owns the chapter
//! index, the navigation cursor and at most one [`StreamSession`]. Page events
//! are applied by ordinal index, so arrival order never affects the rendered
//! result.
//!
//! ```text
//! Idle ──select/next/previous──▶ Loading(session)
//!  ▲                                 │ page event (self-loop)
//!  └──── terminal / failure / close ─┘
//! ```
//!
//! The viewer performs no I/O. [`crate::Reader`] drives it from a page feed;
//! tests drive it directly.

use std::fmt;

use mangaview_api::{PageDescriptor, PageEvent};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::assets::AssetRewriter;
use crate::error::CoreError;
use crate::model::{Chapter, ChapterId, ChapterIndex, ChapterKind, Direction, NavigationCursor};
use crate::surface::PageSurface;

/// Largest slot count a chapter may announce. Anything above is treated as
/// a malformed feed rather than allocated.
pub const MAX_PAGE_TOTAL: usize = 10_000;

// ── Session identity ────────────────────────────────────────────────

/// Generation counter tagging each stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handed out when a session opens; the driver uses it to open the feed and
/// to tag every event it forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub session: SessionId,
    pub chapter: Chapter,
}

/// The single page-feed binding for the chapter on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSession {
    pub id: SessionId,
    pub chapter: Chapter,
    /// Slot count, fixed by the first page event.
    pub allocated: Option<usize>,
    /// Page placements so far, redeliveries included.
    pub received: usize,
    /// Set once the terminal marker arrived.
    pub complete: bool,
}

impl StreamSession {
    fn new(id: SessionId, chapter: Chapter) -> Self {
        Self {
            id,
            chapter,
            allocated: None,
            received: 0,
            complete: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewerState {
    Idle,
    Loading {
        session: SessionId,
        chapter_id: ChapterId,
    },
}

impl ViewerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ViewerState::Idle)
    }
}

/// What a page event did to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Placed { idx: usize, total: usize },
    Complete { pages: usize },
    /// Tagged with a session that is no longer active; nothing changed.
    Stale,
}

// ── Viewer ──────────────────────────────────────────────────────────

pub struct ChapterStreamViewer<S> {
    surface: S,
    assets: AssetRewriter,
    index: ChapterIndex,
    active_tab: ChapterKind,
    cursor: Option<NavigationCursor>,
    session: Option<StreamSession>,
    generation: u64,
}

impl<S: PageSurface> ChapterStreamViewer<S> {
    pub fn new(surface: S, assets: AssetRewriter) -> Self {
        Self {
            surface,
            assets,
            index: ChapterIndex::default(),
            active_tab: ChapterKind::Chapter,
            cursor: None,
            session: None,
            generation: 0,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> ViewerState {
        match &self.session {
            Some(s) if !s.complete => ViewerState::Loading {
                session: s.id,
                chapter_id: s.chapter.id,
            },
            _ => ViewerState::Idle,
        }
    }

    pub fn index(&self) -> &ChapterIndex {
        &self.index
    }

    pub fn cursor(&self) -> Option<NavigationCursor> {
        self.cursor
    }

    /// The chapter under the cursor.
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.cursor.and_then(|c| self.index.resolve(c))
    }

    /// The latest session, open or complete. `None` after `close`.
    pub fn session(&self) -> Option<&StreamSession> {
        self.session.as_ref()
    }

    pub fn active_tab(&self) -> ChapterKind {
        self.active_tab
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    // ── Index ────────────────────────────────────────────────────────

    /// Install a freshly fetched index and redraw the chapter list.
    ///
    /// The cursor follows its chapter by id and is cleared when the chapter
    /// is gone. An open stream is left running.
    pub fn replace_index(&mut self, index: ChapterIndex) {
        let current = self.current_chapter().map(|c| c.id);
        self.index = index;
        self.cursor = current
            .and_then(|id| self.index.find(id))
            .map(Chapter::cursor);
        if current.is_some() && self.cursor.is_none() {
            debug!("open chapter no longer in index, cursor cleared");
        }
        self.surface.render_chapter_list(&self.index, self.active_tab);
    }

    /// Switch the visible tab of the chapter list.
    pub fn set_active_tab(&mut self, tab: ChapterKind) {
        self.active_tab = tab;
        self.surface.render_chapter_list(&self.index, tab);
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Open the chapter at `position` in `group`, preempting any running
    /// stream. An invalid selection leaves the viewer untouched.
    pub fn select_chapter(
        &mut self,
        group: ChapterKind,
        position: usize,
    ) -> Result<SessionTicket, CoreError> {
        let chapters = self.index.group(group);
        let chapter = match chapters.get(position) {
            Some(chapter) => chapter.clone(),
            None if chapters.is_empty() => {
                return Err(CoreError::InvalidSelection {
                    group,
                    position,
                    reason: "group has no chapters".into(),
                });
            }
            None => {
                return Err(CoreError::InvalidSelection {
                    group,
                    position,
                    reason: format!("group has {} chapters", chapters.len()),
                });
            }
        };
        Ok(self.open(chapter))
    }

    pub fn next(&mut self) -> Option<SessionTicket> {
        self.navigate(Direction::Next)
    }

    pub fn previous(&mut self) -> Option<SessionTicket> {
        self.navigate(Direction::Previous)
    }

    /// Step to the adjacent chapter of the same group.
    ///
    /// `None` at a group boundary, without a cursor, or while a chapter is
    /// still loading.
    pub fn navigate(&mut self, direction: Direction) -> Option<SessionTicket> {
        if let ViewerState::Loading { session, .. } = self.state() {
            debug!(%session, ?direction, "navigation ignored while loading");
            return None;
        }
        let cursor = self.cursor?;
        let Some(chapter) = self.index.adjacent(cursor, direction).cloned() else {
            debug!(?cursor, ?direction, "no adjacent chapter");
            return None;
        };
        Some(self.open(chapter))
    }

    fn open(&mut self, chapter: Chapter) -> SessionTicket {
        if let Some(previous) = self.close() {
            debug!(session = %previous, "preempted by new selection");
        }
        self.generation += 1;
        let id = SessionId(self.generation);

        self.cursor = Some(chapter.cursor());
        self.surface.clear_pages();
        self.session = Some(StreamSession::new(id, chapter.clone()));

        info!(session = %id, chapter_id = %chapter.id, title = %chapter.title, "stream session opened");
        SessionTicket {
            session: id,
            chapter,
        }
    }

    // ── Streaming ────────────────────────────────────────────────────

    /// Apply one page event tagged with the session it was read for.
    ///
    /// A rejected page (`total` zero or above [`MAX_PAGE_TOTAL`], or `idx`
    /// outside the allocated slots)
    /// closes the session and returns `CoreError::Stream`.
    pub fn on_page_event(
        &mut self,
        session: SessionId,
        event: PageEvent,
    ) -> Result<EventOutcome, CoreError> {
        let Some(active) = self
            .session
            .as_mut()
            .filter(|s| s.id == session && !s.complete)
        else {
            trace!(%session, "dropping event for inactive session");
            return Ok(EventOutcome::Stale);
        };

        match event {
            PageEvent::Terminal => {
                active.complete = true;
                let pages = active.allocated.unwrap_or(0);
                info!(%session, pages, "chapter stream complete");
                Ok(EventOutcome::Complete { pages })
            }
            PageEvent::Page(page) => self
                .place(page)
                .map_err(|message| self.reject(session, message)),
        }
    }

    /// Write one page into the open session's slots.
    fn place(&mut self, page: PageDescriptor) -> Result<EventOutcome, String> {
        let Some(active) = self.session.as_mut() else {
            return Ok(EventOutcome::Stale);
        };

        let total = match active.allocated {
            Some(total) => total,
            None if page.total == 0 => return Err("page total is zero".into()),
            None if page.total > MAX_PAGE_TOTAL => {
                return Err(format!(
                    "page total {} exceeds limit of {MAX_PAGE_TOTAL}",
                    page.total
                ));
            }
            None => {
                self.surface.allocate_pages(page.total);
                active.allocated = Some(page.total);
                page.total
            }
        };
        if page.idx >= total {
            return Err(format!("page index {} outside {} slots", page.idx, total));
        }

        let url = self.assets.rewrite(&page.pic_path);
        self.surface.place_page(page.idx, &url);
        active.received += 1;
        trace!(session = %active.id, idx = page.idx, total, %url, "page placed");
        Ok(EventOutcome::Placed {
            idx: page.idx,
            total,
        })
    }

    fn reject(&mut self, session: SessionId, message: String) -> CoreError {
        warn!(%session, %message, "page event rejected, closing session");
        self.session = None;
        CoreError::Stream { message }
    }

    /// Close `session` after a feed-level failure. Returns `false` when it
    /// was no longer the open session.
    pub fn fail_session(&mut self, session: SessionId) -> bool {
        match &self.session {
            Some(active) if active.id == session && !active.complete => {
                self.session = None;
                true
            }
            _ => false,
        }
    }

    /// Close the open session, if any. Later events tagged with it are
    /// ignored. Returns the id of the session that was still streaming.
    pub fn close(&mut self) -> Option<SessionId> {
        let closed = self.session.take()?;
        if closed.complete {
            return None;
        }
        debug!(session = %closed.id, received = closed.received, "stream session closed");
        Some(closed.id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::surface::MemorySurface;

    fn three_chapters() -> ChapterIndex {
        ChapterIndex::from_groups([(
            ChapterKind::Chapter,
            vec![
                (ChapterId::new(1), "Ch1".to_string()),
                (ChapterId::new(2), "Ch2".to_string()),
                (ChapterId::new(3), "Ch3".to_string()),
            ],
        )])
    }

    fn viewer() -> ChapterStreamViewer<MemorySurface> {
        let mut viewer = ChapterStreamViewer::new(MemorySurface::new(), AssetRewriter::default());
        viewer.replace_index(three_chapters());
        viewer
    }

    fn page(idx: usize, total: usize, path: &str) -> PageEvent {
        PageEvent::Page(PageDescriptor {
            idx,
            total,
            pic_path: path.into(),
        })
    }

    /// Every ordering of `0..n`.
    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![vec![]];
        }
        let mut out = Vec::new();
        for rest in permutations(n - 1) {
            for at in 0..=rest.len() {
                let mut p = rest.clone();
                p.insert(at, n - 1);
                out.push(p);
            }
        }
        out
    }

    #[test]
    fn three_chapter_scenario() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 1).expect("valid");
        assert_eq!(ticket.chapter.id, ChapterId::new(2));

        for event in [
            page(2, 3, "/downloaded/c.png"),
            page(0, 3, "/downloaded/a.png"),
            page(1, 3, "/downloaded/b.png"),
        ] {
            viewer.on_page_event(ticket.session, event).expect("page placed");
        }
        let outcome = viewer
            .on_page_event(ticket.session, PageEvent::Terminal)
            .expect("terminal");

        assert_eq!(outcome, EventOutcome::Complete { pages: 3 });
        assert_eq!(
            viewer.surface().rendered_pages(),
            vec!["/static/a.png", "/static/b.png", "/static/c.png"]
        );
        assert!(viewer.state().is_idle());

        let next = viewer.next().expect("Ch3 follows Ch2");
        assert_eq!(next.chapter.title, "Ch3");
        assert_eq!(
            viewer.cursor(),
            Some(NavigationCursor {
                group: ChapterKind::Chapter,
                position: 2
            })
        );
        assert!(viewer.surface().slots().is_empty());
    }

    #[test]
    fn placement_is_independent_of_arrival_order() {
        let paths = ["/downloaded/0.png", "/downloaded/1.png", "/downloaded/2.png", "/downloaded/3.png"];
        let expected: Vec<String> = paths.iter().map(|p| p.replacen("/downloaded", "/static", 1)).collect();

        for order in permutations(paths.len()) {
            let mut viewer = viewer();
            let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
            for &idx in &order {
                viewer
                    .on_page_event(ticket.session, page(idx, paths.len(), paths[idx]))
                    .expect("page placed");
            }
            assert_eq!(viewer.surface().rendered_pages(), expected, "order {order:?}");
        }
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut viewer = viewer();

        let first = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        viewer.on_page_event(first.session, PageEvent::Terminal).expect("terminal");
        assert!(viewer.previous().is_none());
        assert_eq!(viewer.cursor().map(|c| c.position), Some(0));

        let last = viewer.select_chapter(ChapterKind::Chapter, 2).expect("valid");
        viewer.on_page_event(last.session, PageEvent::Terminal).expect("terminal");
        assert!(viewer.next().is_none());
        assert_eq!(viewer.cursor().map(|c| c.position), Some(2));
        assert_eq!(viewer.session().map(|s| s.id), Some(last.session));
    }

    #[test]
    fn navigation_waits_for_the_open_chapter() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");

        assert!(viewer.next().is_none());
        assert_eq!(
            viewer.state(),
            ViewerState::Loading {
                session: ticket.session,
                chapter_id: ChapterId::new(1)
            }
        );
    }

    #[test]
    fn explicit_selection_preempts_and_isolates_sessions() {
        let mut viewer = viewer();
        let first = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        viewer
            .on_page_event(first.session, page(0, 2, "/downloaded/old-0.png"))
            .expect("placed");

        let second = viewer.select_chapter(ChapterKind::Chapter, 1).expect("valid");
        assert!(second.session > first.session);

        let late = viewer
            .on_page_event(first.session, page(1, 2, "/downloaded/old-1.png"))
            .expect("stale is not an error");
        assert_eq!(late, EventOutcome::Stale);
        assert!(viewer.surface().slots().is_empty());

        viewer
            .on_page_event(second.session, page(0, 1, "/downloaded/new.png"))
            .expect("placed");
        assert_eq!(viewer.surface().rendered_pages(), vec!["/static/new.png"]);
    }

    #[test]
    fn events_after_close_are_ignored() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        viewer
            .on_page_event(ticket.session, page(0, 2, "/downloaded/a.png"))
            .expect("placed");

        assert_eq!(viewer.close(), Some(ticket.session));
        assert!(viewer.state().is_idle());

        let outcome = viewer
            .on_page_event(ticket.session, page(1, 2, "/downloaded/b.png"))
            .expect("ignored");
        assert_eq!(outcome, EventOutcome::Stale);
        assert_eq!(viewer.surface().filled(), 1);
        assert_eq!(viewer.close(), None);
    }

    #[test]
    fn redelivered_page_overwrites_its_slot() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        viewer
            .on_page_event(ticket.session, page(0, 1, "/downloaded/a.png"))
            .expect("placed");
        viewer
            .on_page_event(ticket.session, page(0, 1, "/downloaded/a.png"))
            .expect("placed again");

        assert_eq!(viewer.surface().rendered_pages(), vec!["/static/a.png"]);
        assert_eq!(viewer.session().map(|s| s.received), Some(2));
    }

    #[test]
    fn out_of_range_index_fails_the_session() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        viewer
            .on_page_event(ticket.session, page(0, 2, "/downloaded/a.png"))
            .expect("placed");

        let err = viewer
            .on_page_event(ticket.session, page(5, 2, "/downloaded/f.png"))
            .expect_err("outside slots");
        assert!(matches!(err, CoreError::Stream { .. }));
        assert!(viewer.state().is_idle());
        assert!(viewer.session().is_none());
    }

    #[test]
    fn zero_total_fails_the_session() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        let err = viewer
            .on_page_event(ticket.session, page(0, 0, "/downloaded/a.png"))
            .expect_err("no slots");
        assert!(matches!(err, CoreError::Stream { .. }));
        assert!(viewer.state().is_idle());
    }

    #[test]
    fn oversized_total_fails_the_session_without_allocating() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        let err = viewer
            .on_page_event(ticket.session, page(0, usize::MAX, "/downloaded/a.png"))
            .expect_err("too many slots");
        assert!(matches!(err, CoreError::Stream { ref message } if message.contains("exceeds")));
        assert!(viewer.state().is_idle());
        assert!(viewer.surface().rendered_pages().is_empty());

        let ticket = viewer.select_chapter(ChapterKind::Chapter, 1).expect("valid");
        let outcome = viewer
            .on_page_event(ticket.session, page(0, MAX_PAGE_TOTAL, "/downloaded/b.png"))
            .expect("at the limit");
        assert_eq!(
            outcome,
            EventOutcome::Placed {
                idx: 0,
                total: MAX_PAGE_TOTAL
            }
        );
    }

    #[test]
    fn invalid_selection_leaves_state_untouched() {
        let mut viewer = viewer();
        let open = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");

        let empty = viewer.select_chapter(ChapterKind::Volume, 0).expect_err("empty group");
        assert!(matches!(
            empty,
            CoreError::InvalidSelection {
                group: ChapterKind::Volume,
                ..
            }
        ));
        let out_of_range = viewer.select_chapter(ChapterKind::Chapter, 3).expect_err("past end");
        assert!(matches!(out_of_range, CoreError::InvalidSelection { position: 3, .. }));

        assert_eq!(viewer.session().map(|s| s.id), Some(open.session));
        assert_eq!(viewer.cursor().map(|c| c.position), Some(0));
    }

    #[test]
    fn replacing_the_index_follows_the_open_chapter() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 1).expect("valid");

        // Ch2 moved to the front.
        viewer.replace_index(ChapterIndex::from_groups([(
            ChapterKind::Chapter,
            vec![
                (ChapterId::new(2), "Ch2".to_string()),
                (ChapterId::new(4), "Ch4".to_string()),
            ],
        )]));
        assert_eq!(viewer.cursor().map(|c| c.position), Some(0));
        assert_eq!(viewer.session().map(|s| s.id), Some(ticket.session));

        viewer.replace_index(ChapterIndex::default());
        assert!(viewer.cursor().is_none());
        assert!(!viewer.state().is_idle());
    }

    #[test]
    fn chapter_list_is_rendered_on_index_and_tab_change() {
        let mut viewer = viewer();
        assert_eq!(viewer.surface().tabs()[0].1, vec!["Ch1", "Ch2", "Ch3"]);
        assert_eq!(viewer.surface().active_tab(), Some(ChapterKind::Chapter));

        viewer.set_active_tab(ChapterKind::Misc);
        assert_eq!(viewer.surface().active_tab(), Some(ChapterKind::Misc));
    }

    #[test]
    fn empty_chapter_completes_with_no_pages() {
        let mut viewer = viewer();
        let ticket = viewer.select_chapter(ChapterKind::Chapter, 0).expect("valid");
        let outcome = viewer
            .on_page_event(ticket.session, PageEvent::Terminal)
            .expect("terminal");
        assert_eq!(outcome, EventOutcome::Complete { pages: 0 });
        let again = viewer
            .on_page_event(ticket.session, PageEvent::Terminal)
            .expect("ignored");
        assert_eq!(again, EventOutcome::Stale);
    }
}
