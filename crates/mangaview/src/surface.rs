//! Terminal page surface: slot bookkeeping plus a progress bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use mangaview_core::{ChapterIndex, ChapterKind, MemorySurface, PageSurface};

const BAR_TEMPLATE: &str = "{prefix:.cyan.bold} [{bar:30.cyan/blue}] {pos}/{len} pages";

/// Records pages like `MemorySurface` and mirrors slot fill on a progress
/// bar. The bar is hidden in quiet mode or when stderr is not a terminal.
pub struct TerminalSurface {
    pages: MemorySurface,
    bar: ProgressBar,
}

impl TerminalSurface {
    pub fn new(quiet: bool) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        if !quiet {
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        Self {
            pages: MemorySurface::new(),
            bar,
        }
    }

    /// Label shown in front of the bar, usually the chapter title.
    pub fn set_title(&self, title: &str) {
        self.bar.set_prefix(title.to_owned());
    }

    pub fn pages(&self) -> &MemorySurface {
        &self.pages
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PageSurface for TerminalSurface {
    fn render_chapter_list(&mut self, index: &ChapterIndex, active: ChapterKind) {
        self.pages.render_chapter_list(index, active);
    }

    fn clear_pages(&mut self) {
        self.pages.clear_pages();
        self.bar.reset();
        self.bar.set_length(0);
    }

    fn allocate_pages(&mut self, total: usize) {
        self.pages.allocate_pages(total);
        self.bar.set_length(to_u64(total));
        self.bar.set_position(0);
    }

    fn place_page(&mut self, idx: usize, url: &str) {
        self.pages.place_page(idx, url);
        self.bar.set_position(to_u64(self.pages.filled()));
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
