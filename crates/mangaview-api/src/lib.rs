// mangaview-api: Async Rust client for the manga reader backend (REST + SSE page feed)

mod anime;
mod chapters;
pub mod client;
pub mod error;
mod history;
mod library;
pub mod models;
pub mod pages;
pub mod sse;
pub mod transport;

pub use client::ReaderClient;
pub use error::Error;
pub use anime::AnimeHistoryAck;
pub use history::HistoryAck;
pub use models::{
    AnimeRecord, ChapterGroups, ChapterRecord, ChapterRef, EpisodeRecord, EpisodeRef,
    EpisodeVideo, MangaRecord, MetaRecord, PageDescriptor, PageEvent, SearchHit,
};
pub use pages::PageFeed;
pub use transport::{TlsMode, TransportConfig};
