// mangaview-core: Chapter index, streamed page viewer, async reader driver and anime episodes.

pub mod assets;
pub mod config;
mod convert;
pub mod error;
pub mod library;
pub mod model;
pub mod reader;
pub mod surface;
pub mod viewer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assets::AssetRewriter;
pub use config::{ReaderConfig, TlsVerification};
pub use error::CoreError;
pub use library::Library;
pub use reader::{Reader, ReaderEvent};
pub use surface::{MemorySurface, PageSurface};
pub use viewer::{
    ChapterStreamViewer, EventOutcome, MAX_PAGE_TOTAL, SessionId, SessionTicket, StreamSession,
    ViewerState,
};

// Feed types the viewer consumes.
pub use mangaview_api::{PageDescriptor, PageEvent};

pub use model::{
    AnimeSummary, Chapter, ChapterId, ChapterIndex, ChapterKind, ChapterSummary, Direction,
    Episode, EpisodeId, EpisodeList, EpisodeSummary, EpisodeVideo, MangaMeta, MangaSummary,
    NavigationCursor, SearchResult, Site,
};
