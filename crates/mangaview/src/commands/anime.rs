//! `episodes`, `watch` and `last-watched`: the anime side of the library.

use tabled::Tabled;
use tracing::warn;

use mangaview_core::{Episode, EpisodeList, EpisodeSummary, EpisodeVideo, Library};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EpisodeRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Episode> for EpisodeRow {
    fn from(e: &Episode) -> Self {
        Self {
            position: e.position,
            id: e.id.to_string(),
            title: e.title.clone(),
            updated: e
                .last_update
                .map_or_else(|| "-".into(), |ts| ts.format("%Y-%m-%d").to_string()),
        }
    }
}

fn detail(v: &EpisodeVideo, color: bool) -> String {
    [
        format!(
            "{} {}",
            output::accent(&v.episode.title, color),
            output::muted(&format!("(episode {})", v.episode.position), color)
        ),
        format!("ID:     {}", v.episode.id),
        format!("Video:  {}", v.video_url),
    ]
    .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_episodes(anime_id: i64, global: &GlobalOpts) -> Result<(), CliError> {
    let library = util::library(global, anime_id)?;
    let episodes = library
        .episodes(anime_id)
        .await
        .map_err(util::anime_error(anime_id))?;

    if episodes.is_empty() {
        if !global.quiet {
            eprintln!("No episodes for anime {anime_id}");
        }
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        episodes.as_slice(),
        |e| EpisodeRow::from(e),
        |e| e.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_watch(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let reader_config = config::resolve_reader_config(global, args.anime_id)?;
    let record_history = reader_config.record_history && !args.no_history;
    let library = Library::connect(&reader_config)?;
    let anime_id = args.anime_id;

    let episodes = library
        .episodes(anime_id)
        .await
        .map_err(util::anime_error(anime_id))?;

    let episode = if args.next {
        let last = library
            .last_watched(anime_id)
            .await
            .map_err(util::anime_error(anime_id))?;
        match resume_point(&episodes, last.as_ref()) {
            Resume::Episode(episode) => episode,
            Resume::Finished(title) => {
                if !global.quiet {
                    eprintln!("{title} is the last episode");
                }
                return Ok(());
            }
        }
    } else {
        episodes.get(args.position).cloned()
    };
    let Some(episode) = episode else {
        return Err(CliError::InvalidSelection {
            message: format!(
                "Episode {} is out of range: anime {anime_id} has {} episodes",
                args.position,
                episodes.len()
            ),
            list_command: format!("episodes {anime_id}"),
        });
    };

    if record_history {
        if let Err(err) = library.add_to_anime_history(anime_id).await {
            warn!(anime_id, error = %err, "could not add anime to watch history");
        }
    }

    let episode_id = episode.id;
    let video = library
        .episode_video(episode)
        .await
        .map_err(util::anime_error(anime_id))?;

    if record_history {
        if let Err(err) = library.record_watching(anime_id, episode_id).await {
            warn!(anime_id, %episode_id, error = %err, "watch history update failed");
        }
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &video,
        |v| detail(v, color),
        |v| v.video_url.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_last_watched(anime_id: i64, global: &GlobalOpts) -> Result<(), CliError> {
    let library = util::library(global, anime_id)?;
    let last = library
        .last_watched(anime_id)
        .await
        .map_err(util::anime_error(anime_id))?;

    let Some(episode) = last else {
        if !global.quiet {
            eprintln!("Nothing watched yet in anime {anime_id}");
        }
        return Ok(());
    };

    let out = output::render_single(&global.output, &episode, EpisodeSummary::label, |e| {
        e.id.map(|id| id.to_string()).unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Resume ──────────────────────────────────────────────────────────

enum Resume {
    /// Episode to play; `None` when the list is empty.
    Episode(Option<Episode>),
    /// The last watched episode closes the list.
    Finished(String),
}

/// The episode after `last`. Starts from the top when nothing was watched
/// or the watched episode is no longer listed.
fn resume_point(episodes: &EpisodeList, last: Option<&EpisodeSummary>) -> Resume {
    let Some(current) = last.and_then(|l| l.id).and_then(|id| episodes.find(id)) else {
        return Resume::Episode(episodes.get(0).cloned());
    };
    match episodes.after(current.id) {
        Some(next) => Resume::Episode(Some(next.clone())),
        None => Resume::Finished(current.title.clone()),
    }
}

#[cfg(test)]
mod tests {
    use mangaview_core::EpisodeId;

    use super::*;

    fn episodes() -> EpisodeList {
        EpisodeList::from_entries([
            (EpisodeId::new(11), "[01]".to_string(), None),
            (EpisodeId::new(12), "[02]".to_string(), None),
        ])
    }

    fn watched(id: i64) -> EpisodeSummary {
        EpisodeSummary {
            id: Some(EpisodeId::new(id)),
            title: None,
        }
    }

    #[test]
    fn test_resume_point() {
        let list = episodes();
        assert!(matches!(
            resume_point(&list, None),
            Resume::Episode(Some(ref e)) if e.id == EpisodeId::new(11)
        ));
        assert!(matches!(
            resume_point(&list, Some(&watched(11))),
            Resume::Episode(Some(ref e)) if e.id == EpisodeId::new(12)
        ));
        assert!(matches!(
            resume_point(&list, Some(&watched(12))),
            Resume::Finished(ref title) if title == "[02]"
        ));
        assert!(matches!(
            resume_point(&list, Some(&watched(99))),
            Resume::Episode(Some(ref e)) if e.id == EpisodeId::new(11)
        ));
        assert!(matches!(
            resume_point(&EpisodeList::default(), None),
            Resume::Episode(None)
        ));
    }

    #[test]
    fn test_detail_shows_video_url() {
        let video = EpisodeVideo {
            episode: episodes().get(1).cloned().expect("second episode"),
            video_url: "/static/anime1/[02].mp4".into(),
        };
        assert_eq!(
            detail(&video, false),
            "[02] (episode 1)\nID:     12\nVideo:  /static/anime1/[02].mp4"
        );
    }
}
