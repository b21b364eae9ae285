//! `meta` and `last-read`: series header information.

use mangaview_core::{ChapterSummary, MangaMeta};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(m: &MangaMeta) -> String {
    [
        format!(
            "ID:           {}",
            m.manga_id.map_or_else(|| "-".into(), |id| id.to_string())
        ),
        format!(
            "Latest:       {}",
            m.latest_chapter
                .as_ref()
                .map_or_else(|| "-".into(), ChapterSummary::label)
        ),
        format!(
            "Updated:      {}",
            m.last_update_date().unwrap_or_else(|| "-".into())
        ),
        format!("Finished:     {}", util::yes_no(m.finished)),
        format!("Thumbnail:    {}", m.thumbnail.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

pub async fn handle_meta(manga_id: i64, global: &GlobalOpts) -> Result<(), CliError> {
    let library = util::library(global, manga_id)?;
    let meta = library
        .meta(manga_id)
        .await
        .map_err(util::manga_error(manga_id))?;

    let out = output::render_single(&global.output, &meta, detail, |m| {
        m.manga_id.map(|id| id.to_string()).unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_last_read(manga_id: i64, global: &GlobalOpts) -> Result<(), CliError> {
    let library = util::library(global, manga_id)?;
    let last = library
        .last_read(manga_id)
        .await
        .map_err(util::manga_error(manga_id))?;

    let Some(chapter) = last else {
        if !global.quiet {
            eprintln!("Nothing read yet in manga {manga_id}");
        }
        return Ok(());
    };

    let out = output::render_single(&global.output, &chapter, ChapterSummary::label, |c| {
        c.id.map(|id| id.to_string()).unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
