//! `search`: keyword search on an upstream site.

use tabled::Tabled;

use mangaview_core::SearchResult;

use crate::cli::{GlobalOpts, SearchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl From<&SearchResult> for ResultRow {
    fn from(r: &SearchResult) -> Self {
        Self {
            id: r.id.map(|id| id.to_string()).unwrap_or_default(),
            name: r.name.clone(),
            url: r.url.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(args: SearchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.keyword.trim().is_empty() {
        return Err(CliError::Validation {
            field: "keyword".into(),
            reason: "cannot be empty".into(),
        });
    }

    // Search is not tied to a series; the id only fills the config slot.
    let library = util::library(global, 0)?;

    let mut results = library.search(&args.keyword, util::site(args.site)).await?;
    results.truncate(args.limit);

    if results.is_empty() {
        if !global.quiet {
            eprintln!("No results for '{}'", args.keyword);
        }
        return Ok(());
    }

    let out = output::render_list(&global.output, &results, |r| ResultRow::from(r), |r| {
        r.url.clone().unwrap_or_else(|| r.name.clone())
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
