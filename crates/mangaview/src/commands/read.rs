//! `read`: stream a chapter's pages and optionally follow on to the next.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};

use mangaview_core::{Chapter, ChapterId, Reader, ReaderEvent, SessionTicket};

use crate::cli::{GlobalOpts, ReadArgs};
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::surface::TerminalSurface;

use super::util;

type TermReader = Reader<TerminalSurface>;

/// One finished chapter as printed to stdout.
#[derive(Serialize)]
struct ChapterPages {
    chapter: Chapter,
    pages: Vec<String>,
}

enum Finish {
    Complete,
    Interrupted,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ReadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut reader_config = config::resolve_reader_config(global, args.manga_id)?;
    if args.no_history {
        reader_config.record_history = false;
    }
    let record_history = reader_config.record_history;
    let history_wait = reader_config.timeout;

    let reader = Reader::new(reader_config, TerminalSurface::new(global.quiet))?;
    let mut events = reader.events();
    let mut recorded = HashSet::new();

    reader
        .load_index()
        .await
        .map_err(util::manga_error(args.manga_id))?;
    let kind = util::chapter_kind(args.group);
    reader.set_active_tab(kind).await;

    let ticket = reader.select_chapter(kind, args.position).await?;
    let result = read_chapters(&reader, &mut events, ticket, args.follow, global, &mut recorded).await;

    if let Ok((Finish::Complete, last)) = &result {
        if record_history && !recorded.contains(last) {
            wait_for_history(&mut events, *last, history_wait).await;
        }
    }

    reader.inspect(|v| v.surface().finish()).await;
    reader.shutdown().await;
    result.map(|_| ())
}

/// Read the selected chapter plus up to `follow` chapters after it.
/// Returns how reading ended and the id of the last chapter opened.
async fn read_chapters(
    reader: &TermReader,
    events: &mut broadcast::Receiver<ReaderEvent>,
    mut ticket: SessionTicket,
    follow: usize,
    global: &GlobalOpts,
    recorded: &mut HashSet<ChapterId>,
) -> Result<(Finish, ChapterId), CliError> {
    let mut remaining = follow;
    loop {
        if let Finish::Interrupted = wait_chapter(reader, events, &ticket, recorded).await? {
            if !global.quiet {
                eprintln!("Interrupted while reading {}", ticket.chapter.title);
            }
            return Ok((Finish::Interrupted, ticket.chapter.id));
        }
        print_chapter(reader, &ticket, global).await;

        if remaining == 0 {
            return Ok((Finish::Complete, ticket.chapter.id));
        }
        remaining -= 1;

        match reader.next().await {
            Some(next) => ticket = next,
            None => {
                if !global.quiet {
                    eprintln!("{} is the last chapter", ticket.chapter.title);
                }
                return Ok((Finish::Complete, ticket.chapter.id));
            }
        }
    }
}

/// Block until the session of `ticket` completes, fails or the user hits
/// Ctrl-C.
async fn wait_chapter(
    reader: &TermReader,
    events: &mut broadcast::Receiver<ReaderEvent>,
    ticket: &SessionTicket,
    recorded: &mut HashSet<ChapterId>,
) -> Result<Finish, CliError> {
    let title = ticket.chapter.title.clone();
    reader.inspect(|v| v.surface().set_title(&title)).await;

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                reader.close().await;
                return Ok(Finish::Interrupted);
            }
            event = events.recv() => event,
        };

        match event {
            Ok(ReaderEvent::ChapterComplete { session, pages, .. }) if session == ticket.session => {
                info!(%session, pages, chapter = %title, "chapter complete");
                return Ok(Finish::Complete);
            }
            Ok(ReaderEvent::StreamFailed {
                session,
                error,
                timed_out,
                ..
            }) if session == ticket.session => {
                return Err(if timed_out {
                    CliError::Timeout {
                        chapter: title,
                        message: error,
                    }
                } else {
                    CliError::Stream {
                        chapter: title,
                        message: error,
                    }
                });
            }
            Ok(ReaderEvent::HistoryRecorded { chapter_id }) => {
                recorded.insert(chapter_id);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "reader events lagged, checking viewer");
                if let Some(finish) = settled(reader, ticket).await? {
                    return Ok(finish);
                }
            }
            Err(RecvError::Closed) => {
                return Err(CliError::Internal("reader event channel closed".into()));
            }
        }
    }
}

/// After lagging behind the event channel, read the outcome off the viewer.
async fn settled(reader: &TermReader, ticket: &SessionTicket) -> Result<Option<Finish>, CliError> {
    let session = reader
        .inspect(|v| v.session().map(|s| (s.id, s.complete)))
        .await;
    match session {
        Some((id, true)) if id == ticket.session => Ok(Some(Finish::Complete)),
        Some((id, false)) if id == ticket.session => Ok(None),
        _ => Err(CliError::Stream {
            chapter: ticket.chapter.title.clone(),
            message: "session ended while events were dropped".into(),
        }),
    }
}

async fn wait_for_history(
    events: &mut broadcast::Receiver<ReaderEvent>,
    chapter_id: ChapterId,
    wait: Duration,
) {
    let recorded = tokio::time::timeout(wait, async {
        loop {
            match events.recv().await {
                Ok(ReaderEvent::HistoryRecorded { chapter_id: id }) if id == chapter_id => break,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await;
    if recorded.is_err() {
        debug!(%chapter_id, "history update still pending at exit");
    }
}

// ── Output ──────────────────────────────────────────────────────────

async fn print_chapter(reader: &TermReader, ticket: &SessionTicket, global: &GlobalOpts) {
    let pages = reader
        .inspect(|v| {
            v.surface().finish();
            v.surface()
                .pages()
                .rendered_pages()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .await;
    let data = ChapterPages {
        chapter: ticket.chapter.clone(),
        pages,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &data,
        |d| detail(d, color),
        |d| d.pages.join("\n"),
    );
    output::print_output(&out, global.quiet);
}

fn detail(d: &ChapterPages, color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        output::accent(&d.chapter.title, color),
        output::muted(&format!("({} pages)", d.pages.len()), color)
    )];
    lines.extend(
        d.pages
            .iter()
            .enumerate()
            .map(|(i, url)| format!("{:>4}  {url}", i + 1)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use mangaview_core::ChapterKind;

    use super::*;

    #[test]
    fn test_detail_numbers_pages_from_one() {
        let data = ChapterPages {
            chapter: Chapter {
                id: ChapterId::new(2),
                title: "Ch2".into(),
                kind: ChapterKind::Chapter,
                position: 1,
            },
            pages: vec!["/static/a.png".into(), "/static/b.png".into()],
        };
        assert_eq!(
            detail(&data, false),
            "Ch2 (2 pages)\n   1  /static/a.png\n   2  /static/b.png"
        );
    }
}
