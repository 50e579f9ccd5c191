//! Command handlers behind the `ocrdesk` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast;

use ocrdesk_client::{OcrApi, OcrService};
use ocrdesk_core::error::CoreError;
use ocrdesk_core::results::{export_file_name, OcrResult, ResultDetail};
use ocrdesk_tracker::{OcrTracker, PollerState, StagedFiles, TrackerConfig};

use crate::cli::{Commands, ResultCommands};
use crate::render;

pub async fn run(command: Commands, config: &TrackerConfig) -> Result<()> {
    match command {
        Commands::Submit { files } => {
            let tracker = OcrTracker::from_config(config)?;
            submit_files(&tracker, &files).await
        }
        Commands::SubmitUrl { url } => {
            let tracker = OcrTracker::from_config(config)?;
            submit_url(&tracker, url).await
        }
        Commands::Results(cmd) => {
            let api = OcrApi::new(
                config.api_url.clone(),
                config.request_timeout,
                config.api_token.clone(),
            )?;
            run_results(cmd, &api).await
        }
    }
}

/// Stage `paths`, upload them as one batch, and watch until done.
pub async fn submit_files(tracker: &OcrTracker, paths: &[PathBuf]) -> Result<()> {
    let mut staged = StagedFiles::new();
    for path in paths {
        staged
            .stage_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    tracker.submit_files(&mut staged).await?;
    watch(tracker).await
}

/// Submit one URL and watch until done.
pub async fn submit_url(tracker: &OcrTracker, url: String) -> Result<()> {
    let mut input = url;
    tracker.submit_url(&mut input).await?;
    watch(tracker).await
}

/// Re-render the task table on every registry commit until the poller goes
/// idle or the user hits Ctrl-C.
pub async fn watch(tracker: &OcrTracker) -> Result<()> {
    let mut tasks_rx = tracker.registry().subscribe();
    let mut state_rx = tracker.poller().subscribe_state();
    let mut events = tracker.subscribe_events();

    print!("{}", render::task_table(&tasks_rx.borrow_and_update()));

    loop {
        tokio::select! {
            changed = tasks_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = tasks_rx.borrow_and_update().clone();
                println!();
                print!("{}", render::task_table(&snapshot));
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = render::notice(&event) {
                        eprintln!("> {line}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Notice receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            idle = state_rx.wait_for(|state| *state == PollerState::Idle) => {
                if idle.is_ok() {
                    tracing::info!("No tasks left in flight");
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping status polling");
                break;
            }
        }
    }

    tracker.shutdown().await;
    Ok(())
}

pub async fn run_results(cmd: ResultCommands, service: &dyn OcrService) -> Result<()> {
    match cmd {
        ResultCommands::List => {
            let results = service.list_results().await?;
            print!("{}", render::history_table(&results));
        }
        ResultCommands::Show { id } => {
            let result = find_result(service, id).await?;
            print!("{}", render::result_detail(&result));
        }
        ResultCommands::Export { id, out } => {
            let result = find_result(service, id).await?;
            let path = export_result(&result, &out).await?;
            println!("Exported result {id} to {}", path.display());
        }
        ResultCommands::Delete { id } => {
            if !service.delete_result(id).await? {
                bail!("The service did not delete result {id}");
            }
            println!("Deleted result {id}");
        }
    }
    Ok(())
}

/// The history endpoint has no by-id lookup, so this scans the list.
pub async fn find_result(service: &dyn OcrService, id: i64) -> Result<OcrResult> {
    let results = service.list_results().await?;
    results
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| CoreError::NotFound(format!("result {id}")).into())
}

/// Write the plain text of `result` into `dir` and return the file path.
pub async fn export_result(result: &OcrResult, dir: &Path) -> Result<PathBuf> {
    let text = ResultDetail::parse(result).plain_text();
    if text.is_empty() {
        bail!("Result {} has no text to export", result.id);
    }

    let path = dir.join(export_file_name(result.id));
    tokio::fs::write(&path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(id = result.id, path = %path.display(), "Result exported");
    Ok(path)
}
