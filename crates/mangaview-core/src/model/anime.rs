// ── Anime domain types ──
//
// Episodes form a single flat list per anime; there are no tabs and no page
// stream. Watching an episode resolves it to one video URL.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend episode identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(i64);

impl EpisodeId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    /// Zero-based position in the episode list.
    pub position: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/// Episodes of one anime in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EpisodeList {
    episodes: Vec<Episode>,
}

impl EpisodeList {
    /// Build from `(id, title, last_update)` triples, assigning positions.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (EpisodeId, String, Option<DateTime<Utc>>)>,
    ) -> Self {
        let episodes = entries
            .into_iter()
            .enumerate()
            .map(|(position, (id, title, last_update))| Episode {
                id,
                title,
                position,
                last_update,
            })
            .collect();
        Self { episodes }
    }

    pub fn get(&self, position: usize) -> Option<&Episode> {
        self.episodes.get(position)
    }

    pub fn find(&self, id: EpisodeId) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    /// The episode following `id`, or `None` at the end of the list or when
    /// `id` is not listed.
    pub fn after(&self, id: EpisodeId) -> Option<&Episode> {
        let current = self.find(id)?;
        self.episodes.get(current.position + 1)
    }

    pub fn as_slice(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// An episode reference embedded in anime records (latest, last watched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub id: Option<EpisodeId>,
    pub title: Option<String>,
}

impl EpisodeSummary {
    pub fn label(&self) -> String {
        match (&self.title, self.id) {
            (Some(title), _) => title.clone(),
            (None, Some(id)) => format!("#{id}"),
            (None, None) => "-".into(),
        }
    }
}

/// An anime as listed in watch history or returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub id: Option<i64>,
    pub name: String,
    pub url: Option<String>,
    /// Episode count as the source site labels it.
    pub eps: Option<String>,
    pub year: Option<String>,
    pub season: Option<String>,
    pub last_watched: Option<EpisodeSummary>,
    pub latest_episode: Option<EpisodeSummary>,
    pub last_added: Option<DateTime<Utc>>,
}

/// A playable episode: public video URL (already rewritten).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeVideo {
    pub episode: Episode,
    pub video_url: String,
}
