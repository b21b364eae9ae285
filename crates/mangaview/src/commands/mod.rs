//! Command dispatch: bridges CLI args to core calls and output formatting.

pub mod anime;
pub mod chapters;
pub mod config_cmd;
pub mod history;
pub mod meta;
pub mod read;
pub mod search;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Chapters(args) => chapters::handle(args, global).await,
        Command::Read(args) => read::handle(args, global).await,
        Command::Meta { manga_id } => meta::handle_meta(manga_id, global).await,
        Command::LastRead { manga_id } => meta::handle_last_read(manga_id, global).await,
        Command::Episodes { anime_id } => anime::handle_episodes(anime_id, global).await,
        Command::Watch(args) => anime::handle_watch(args, global).await,
        Command::LastWatched { anime_id } => anime::handle_last_watched(anime_id, global).await,
        Command::History(args) => history::handle(args, global).await,
        Command::Search(args) => search::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are not dispatched".into(),
        )),
    }
}
