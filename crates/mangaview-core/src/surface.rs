// ── Page surface ──
//
// The rendering sink the viewer writes into. The viewer decides *what* goes
// where; a surface only knows how to show it.

use crate::model::{ChapterIndex, ChapterKind};

/// Rendering target for the chapter list and the page slots of the open
/// chapter.
pub trait PageSurface {
    /// Redraw the grouped chapter list with `active` as the selected tab.
    fn render_chapter_list(&mut self, index: &ChapterIndex, active: ChapterKind);

    /// Drop every page of the previous chapter.
    fn clear_pages(&mut self);

    /// Create `total` empty, position-addressed slots.
    fn allocate_pages(&mut self, total: usize);

    /// Show `url` in slot `idx`. Called at most once per slot per delivery;
    /// a redelivered page overwrites the slot.
    fn place_page(&mut self, idx: usize, url: &str);
}

impl<S: PageSurface + ?Sized> PageSurface for Box<S> {
    fn render_chapter_list(&mut self, index: &ChapterIndex, active: ChapterKind) {
        (**self).render_chapter_list(index, active);
    }

    fn clear_pages(&mut self) {
        (**self).clear_pages();
    }

    fn allocate_pages(&mut self, total: usize) {
        (**self).allocate_pages(total);
    }

    fn place_page(&mut self, idx: usize, url: &str) {
        (**self).place_page(idx, url);
    }
}

/// Rendered chapter list entry: tab, titles in position order.
pub type RenderedTab = (ChapterKind, Vec<String>);

/// A surface that records everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    slots: Vec<Option<String>>,
    tabs: Vec<RenderedTab>,
    active_tab: Option<ChapterKind>,
    placements: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot contents in position order; `None` for slots still loading.
    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// URLs of filled slots, in position order.
    pub fn rendered_pages(&self) -> Vec<&str> {
        self.slots.iter().filter_map(|s| s.as_deref()).collect()
    }

    /// `true` when slots were allocated and every one is filled.
    pub fn is_filled(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Option::is_some)
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of `place_page` calls since creation, redeliveries included.
    pub fn placements(&self) -> usize {
        self.placements
    }

    pub fn tabs(&self) -> &[RenderedTab] {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<ChapterKind> {
        self.active_tab
    }
}

impl PageSurface for MemorySurface {
    fn render_chapter_list(&mut self, index: &ChapterIndex, active: ChapterKind) {
        self.tabs = index
            .tabs()
            .map(|(kind, chapters)| (kind, chapters.iter().map(|c| c.title.clone()).collect()))
            .collect();
        self.active_tab = Some(active);
    }

    fn clear_pages(&mut self) {
        self.slots.clear();
    }

    fn allocate_pages(&mut self, total: usize) {
        self.slots = vec![None; total];
    }

    fn place_page(&mut self, idx: usize, url: &str) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = Some(url.to_owned());
            self.placements += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChapterId;

    #[test]
    fn slots_are_position_addressed() {
        let mut surface = MemorySurface::new();
        surface.allocate_pages(3);
        surface.place_page(2, "c");
        surface.place_page(0, "a");

        assert_eq!(surface.slots(), &[Some("a".into()), None, Some("c".into())]);
        assert!(!surface.is_filled());

        surface.place_page(1, "b");
        assert_eq!(surface.rendered_pages(), vec!["a", "b", "c"]);
        assert!(surface.is_filled());
    }

    #[test]
    fn clear_drops_previous_pages() {
        let mut surface = MemorySurface::new();
        surface.allocate_pages(1);
        surface.place_page(0, "a");
        surface.clear_pages();
        assert!(surface.slots().is_empty());
        assert!(!surface.is_filled());
    }

    #[test]
    fn chapter_list_lists_every_tab() {
        let index = ChapterIndex::from_groups([(
            ChapterKind::Volume,
            vec![(ChapterId::new(1), "Vol 1".to_string())],
        )]);
        let mut surface = MemorySurface::new();
        surface.render_chapter_list(&index, ChapterKind::Volume);

        assert_eq!(surface.tabs().len(), 3);
        assert_eq!(surface.tabs()[1], (ChapterKind::Volume, vec!["Vol 1".to_string()]));
        assert_eq!(surface.active_tab(), Some(ChapterKind::Volume));
    }
}
