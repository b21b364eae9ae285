// ── Chapter index domain types ──

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Chapter group, shown as one tab of the chapter list.
///
/// Declaration order is tab order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ChapterKind {
    Chapter,
    Volume,
    Misc,
}

/// Backend chapter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(i64);

impl ChapterId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ChapterId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One readable unit of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub kind: ChapterKind,
    /// Zero-based position within its group.
    pub position: usize,
}

/// The (group, position) pair of the chapter open in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationCursor {
    pub group: ChapterKind,
    pub position: usize,
}

/// Direction of adjacent-chapter navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Snapshot of a series' chapter groups.
///
/// Rebuilt wholesale on each fetch; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterIndex {
    groups: BTreeMap<ChapterKind, Vec<Chapter>>,
}

impl ChapterIndex {
    /// Build an index from ordered `(kind, titles)` groups, assigning
    /// positions in the given order.
    pub fn from_groups<I, C>(groups: I) -> Self
    where
        I: IntoIterator<Item = (ChapterKind, C)>,
        C: IntoIterator<Item = (ChapterId, String)>,
    {
        let groups = groups
            .into_iter()
            .map(|(kind, chapters)| {
                let chapters = chapters
                    .into_iter()
                    .enumerate()
                    .map(|(position, (id, title))| Chapter {
                        id,
                        title,
                        kind,
                        position,
                    })
                    .collect();
                (kind, chapters)
            })
            .collect();
        Self { groups }
    }

    /// Chapters of one group, empty if the group is absent.
    pub fn group(&self, kind: ChapterKind) -> &[Chapter] {
        self.groups.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Every tab in display order, including empty ones.
    pub fn tabs(&self) -> impl Iterator<Item = (ChapterKind, &[Chapter])> + '_ {
        ChapterKind::iter().map(|kind| (kind, self.group(kind)))
    }

    pub fn get(&self, kind: ChapterKind, position: usize) -> Option<&Chapter> {
        self.group(kind).get(position)
    }

    pub fn resolve(&self, cursor: NavigationCursor) -> Option<&Chapter> {
        self.get(cursor.group, cursor.position)
    }

    /// Locate a chapter by id across all groups.
    pub fn find(&self, id: ChapterId) -> Option<&Chapter> {
        self.groups.values().flatten().find(|c| c.id == id)
    }

    /// The chapter one step from `cursor` within the same group, or `None`
    /// at the group boundary.
    pub fn adjacent(&self, cursor: NavigationCursor, direction: Direction) -> Option<&Chapter> {
        let position = match direction {
            Direction::Next => cursor.position.checked_add(1)?,
            Direction::Previous => cursor.position.checked_sub(1)?,
        };
        self.get(cursor.group, position)
    }

    /// Total number of chapters across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Chapter {
    pub fn cursor(&self) -> NavigationCursor {
        NavigationCursor {
            group: self.kind,
            position: self.position,
        }
    }
}
