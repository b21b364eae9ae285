//! Shared helpers for command handlers.

use mangaview_core::{ChapterKind, CoreError, Library, Site};

use crate::cli::{GlobalOpts, Group, SiteArg};
use crate::config;
use crate::error::CliError;

/// Connect to the backend configured for `manga_id`.
pub fn library(global: &GlobalOpts, manga_id: i64) -> Result<Library, CliError> {
    let config = config::resolve_reader_config(global, manga_id)?;
    Ok(Library::connect(&config)?)
}

/// Map a backend 404 on a series lookup to `NotFound`.
pub fn manga_error(manga_id: i64) -> impl FnOnce(CoreError) -> CliError {
    not_found("manga", manga_id, "history list")
}

/// Map a backend 404 on an anime lookup to `NotFound`.
pub fn anime_error(anime_id: i64) -> impl FnOnce(CoreError) -> CliError {
    not_found("anime", anime_id, "history list --anime")
}

fn not_found(
    resource_type: &'static str,
    id: i64,
    list_command: &'static str,
) -> impl FnOnce(CoreError) -> CliError {
    move |err| {
        if err.is_not_found() {
            CliError::NotFound {
                resource_type: resource_type.into(),
                identifier: id.to_string(),
                list_command: list_command.into(),
            }
        } else {
            err.into()
        }
    }
}

pub fn chapter_kind(group: Group) -> ChapterKind {
    match group {
        Group::Chapter => ChapterKind::Chapter,
        Group::Volume => ChapterKind::Volume,
        Group::Misc => ChapterKind::Misc,
    }
}

pub fn site(site: SiteArg) -> Site {
    match site {
        SiteArg::Manhuaren => Site::Manhuaren,
        SiteArg::Copymanga => Site::Copymanga,
        SiteArg::Mangabat => Site::Mangabat,
    }
}

/// `Yes`/`No` for optional flags, `-` when unknown.
pub fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}
