//! `chapters`: list a series' chapter index.

use tabled::Tabled;

use mangaview_core::Chapter;

use crate::cli::{ChaptersArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ChapterRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
}

impl From<&Chapter> for ChapterRow {
    fn from(c: &Chapter) -> Self {
        Self {
            group: c.kind.to_string(),
            position: c.position,
            id: c.id.to_string(),
            title: c.title.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ChaptersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let library = util::library(global, args.manga_id)?;
    let index = library
        .chapters(args.manga_id)
        .await
        .map_err(util::manga_error(args.manga_id))?;

    let chapters: Vec<Chapter> = match args.group {
        Some(group) => index.group(util::chapter_kind(group)).to_vec(),
        None => index.tabs().flat_map(|(_, group)| group.iter().cloned()).collect(),
    };

    if chapters.is_empty() {
        if !global.quiet {
            eprintln!("No chapters for manga {}", args.manga_id);
        }
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        &chapters,
        |c| ChapterRow::from(c),
        |c| c.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
