// ── Reader domain model ──
//
// Canonical types consumed by the viewer, the reader driver and the CLI.
// Backend payloads are converted into these in `crate::convert`.

pub mod anime;
pub mod chapter;
pub mod library;

pub use anime::{AnimeSummary, Episode, EpisodeId, EpisodeList, EpisodeSummary, EpisodeVideo};
pub use chapter::{Chapter, ChapterId, ChapterIndex, ChapterKind, Direction, NavigationCursor};
pub use library::{ChapterSummary, MangaMeta, MangaSummary, SearchResult, Site};
