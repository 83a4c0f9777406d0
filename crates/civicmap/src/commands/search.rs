//! Location search handler.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use civicmap_core::{SearchController, SearchOutcome, SearchResult};

use crate::cli::{GlobalOpts, SearchArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URI")]
    uri: String,
}

impl From<&SearchResult> for ResultRow {
    fn from(r: &SearchResult) -> Self {
        Self {
            title: r.title.clone(),
            uri: r.uri.clone(),
        }
    }
}

fn spinner(query: &str, global: &GlobalOpts) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner());
    bar.set_message(format!("Searching for '{query}'"));
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

pub async fn handle(cfg: &Config, args: SearchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.query.trim().is_empty() {
        return Err(CliError::Validation {
            field: "query".into(),
            reason: "must not be blank".into(),
        });
    }
    let client = config::search_client(cfg, global)?.ok_or(CliError::SearchNotConfigured)?;
    let controller = SearchController::new(client);

    let bar = spinner(&args.query, global);
    let outcome = tokio::select! {
        outcome = controller.search(&args.query) => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.reset();
            SearchOutcome::Cancelled
        }
    };
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match outcome {
        SearchOutcome::Completed { count } => {
            tracing::debug!(count, "rendering search results");
            let results = controller.results();
            let out = output::render_list(
                &global.output,
                results.as_slice(),
                |r| ResultRow::from(r),
                |r| r.uri.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        SearchOutcome::Failed(e) => Err(e.into()),
        SearchOutcome::Skipped => Err(CliError::Validation {
            field: "query".into(),
            reason: "must not be blank".into(),
        }),
        SearchOutcome::Superseded | SearchOutcome::Cancelled => Err(CliError::Interrupted),
    }
}
