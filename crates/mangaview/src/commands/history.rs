//! `history`: list, add and remove reading-history entries, or with
//! `--anime` the watch history.

use tabled::Tabled;

use mangaview_core::{AnimeSummary, ChapterSummary, EpisodeSummary, MangaSummary};

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Last read")]
    last_read: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Fav")]
    fav: String,
}

impl From<&MangaSummary> for HistoryRow {
    fn from(m: &MangaSummary) -> Self {
        let label = |c: &Option<ChapterSummary>| {
            c.as_ref().map_or_else(|| "-".into(), ChapterSummary::label)
        };
        Self {
            id: m.id.map(|id| id.to_string()).unwrap_or_default(),
            name: m.name.clone(),
            last_read: label(&m.last_read_chapter),
            latest: label(&m.latest_chapter),
            updated: m
                .last_update
                .map_or_else(|| "-".into(), |ts| ts.format("%Y-%m-%d").to_string()),
            fav: if m.is_fav { "★".into() } else { String::new() },
        }
    }
}

#[derive(Tabled)]
struct WatchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Season")]
    season: String,
    #[tabled(rename = "Last watched")]
    last_watched: String,
    #[tabled(rename = "Added")]
    added: String,
}

impl From<&AnimeSummary> for WatchRow {
    fn from(a: &AnimeSummary) -> Self {
        let season = match (&a.year, &a.season) {
            (Some(year), Some(season)) => format!("{year} {season}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => "-".into(),
        };
        Self {
            id: a.id.map(|id| id.to_string()).unwrap_or_default(),
            name: a.name.clone(),
            season,
            last_watched: a
                .last_watched
                .as_ref()
                .map_or_else(|| "-".into(), EpisodeSummary::label),
            added: a
                .last_added
                .map_or_else(|| "-".into(), |ts| ts.format("%Y-%m-%d").to_string()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.anime {
        return handle_anime(args.command, global).await;
    }
    match args.command {
        HistoryCommand::List => {
            let library = util::library(global, 0)?;
            let entries = library.history().await?;
            if entries.is_empty() {
                if !global.quiet {
                    eprintln!("Reading history is empty");
                }
                return Ok(());
            }
            let out = output::render_list(&global.output, &entries, |m| HistoryRow::from(m), |m| {
                m.id.map(|id| id.to_string()).unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HistoryCommand::Add { id: manga_id } => {
            let library = util::library(global, manga_id)?;
            library
                .add_to_history(manga_id)
                .await
                .map_err(util::manga_error(manga_id))?;
            if !global.quiet {
                eprintln!("Manga {manga_id} added to history");
            }
            Ok(())
        }

        HistoryCommand::Remove { id: manga_id } => {
            if !util::confirm(&format!("Remove manga {manga_id} from history?"), global.yes)? {
                return Ok(());
            }
            let library = util::library(global, manga_id)?;
            let removed = library
                .remove_from_history(manga_id)
                .await
                .map_err(util::manga_error(manga_id))?;
            if !removed {
                return Err(CliError::NotFound {
                    resource_type: "history entry".into(),
                    identifier: manga_id.to_string(),
                    list_command: "history list".into(),
                });
            }
            if !global.quiet {
                eprintln!("Manga {manga_id} removed from history");
            }
            Ok(())
        }
    }
}

async fn handle_anime(command: HistoryCommand, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        HistoryCommand::List => {
            let library = util::library(global, 0)?;
            let entries = library.anime_history().await?;
            if entries.is_empty() {
                if !global.quiet {
                    eprintln!("Watch history is empty");
                }
                return Ok(());
            }
            let out = output::render_list(&global.output, &entries, |a| WatchRow::from(a), |a| {
                a.id.map(|id| id.to_string()).unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HistoryCommand::Add { id: anime_id } => {
            let library = util::library(global, 0)?;
            library
                .add_to_anime_history(anime_id)
                .await
                .map_err(util::anime_error(anime_id))?;
            if !global.quiet {
                eprintln!("Anime {anime_id} added to watch history");
            }
            Ok(())
        }

        HistoryCommand::Remove { id: anime_id } => {
            if !util::confirm(&format!("Remove anime {anime_id} from watch history?"), global.yes)? {
                return Ok(());
            }
            let library = util::library(global, 0)?;
            let removed = library
                .remove_from_anime_history(anime_id)
                .await
                .map_err(util::anime_error(anime_id))?;
            if !removed {
                return Err(CliError::NotFound {
                    resource_type: "watch history entry".into(),
                    identifier: anime_id.to_string(),
                    list_command: "history list --anime".into(),
                });
            }
            if !global.quiet {
                eprintln!("Anime {anime_id} removed from watch history");
            }
            Ok(())
        }
    }
}
