//! Plain-text rendering of the task table, tracker notices, and result
//! history. Everything here returns a `String`; printing is left to the
//! commands.

use std::fmt::Write;

use ocrdesk_core::results::{format_score, preview, OcrResult, ResultDetail, ScoreTier};
use ocrdesk_core::status::{ProgressState, TaskStatus};
use ocrdesk_core::task::OcrTask;
use ocrdesk_tracker::TrackerEvent;

/// Cells in the progress bar.
const PROGRESS_WIDTH: usize = 20;

/// Shown in place of a missing value.
const EMPTY_CELL: &str = "-";

/// Render a fixed-width progress bar followed by its percentage.
pub fn progress_bar(status: &TaskStatus) -> String {
    let percent = usize::from(status.progress_percent());
    let filled = percent * PROGRESS_WIDTH / 100;
    let fill = match status.progress_state() {
        ProgressState::Active => '#',
        ProgressState::Success => '=',
        ProgressState::Exception => 'x',
    };

    let mut bar = String::with_capacity(PROGRESS_WIDTH + 8);
    bar.push('[');
    bar.extend(std::iter::repeat(fill).take(filled));
    bar.extend(std::iter::repeat('.').take(PROGRESS_WIDTH - filled));
    bar.push(']');
    let _ = write!(bar, " {percent:>3}%");
    bar
}

/// Queue position is only meaningful while waiting.
fn queue_cell(task: &OcrTask) -> String {
    match task.status {
        TaskStatus::Waiting => task.queue_position.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

fn status_cell(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Unknown(raw) => format!("{} ({raw})", status.label()),
        known => known.label().to_string(),
    }
}

/// Render the task table, one row per task in registry order.
///
/// Failed tasks get their error message on an indented line below.
pub fn task_table(tasks: &[OcrTask]) -> String {
    if tasks.is_empty() {
        return "No tasks.\n".to_string();
    }

    let name_width = tasks
        .iter()
        .map(|t| t.file_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("FILE".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<12}  {:>5}  {:<27}  UPDATED",
        "FILE", "STATUS", "QUEUE", "PROGRESS",
    );

    for task in tasks {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<12}  {:>5}  {:<27}  {}",
            task.file_name,
            status_cell(&task.status),
            queue_cell(task),
            progress_bar(&task.status),
            task.update_time.as_deref().unwrap_or(EMPTY_CELL),
        );
        if task.status == TaskStatus::Failed {
            if let Some(message) = task.error_message.as_deref().filter(|m| !m.is_empty()) {
                let _ = writeln!(out, "  error: {message}");
            }
        }
    }
    out
}

/// One-line notice for a tracker event, or `None` for events that are not
/// worth showing.
pub fn notice(event: &TrackerEvent) -> Option<String> {
    match event {
        TrackerEvent::TasksSubmitted { task_ids } => {
            Some(format!("Submitted {} task(s)", task_ids.len()))
        }
        TrackerEvent::SubmissionFailed { reason } => Some(format!("Submission failed: {reason}")),
        TrackerEvent::PollerArmed => Some("Polling for status updates".to_string()),
        TrackerEvent::PollerDisarmed => Some("All tasks finished".to_string()),
        TrackerEvent::TickCompleted { failed, .. } if *failed > 0 => {
            Some(format!("{failed} status check(s) failed, retrying next tick"))
        }
        TrackerEvent::TickCompleted { .. } => None,
    }
}

/// Render the history list with a short preview per result.
pub fn history_table(results: &[OcrResult]) -> String {
    if results.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>8}  {:<5}  {:<19}  PREVIEW", "ID", "KIND", "CREATED");
    for result in results {
        let _ = writeln!(
            out,
            "{:>8}  {:<5}  {:<19}  {}",
            result.id,
            result.kind_label(),
            result.create_time.as_deref().unwrap_or(EMPTY_CELL),
            preview(result).as_deref().unwrap_or("No text content"),
        );
    }
    out
}

fn tier_label(tier: ScoreTier) -> &'static str {
    match tier {
        ScoreTier::High => "high",
        ScoreTier::Medium => "medium",
        ScoreTier::Low => "low",
    }
}

/// Render one result in full, with per-line confidence for image results.
pub fn result_detail(result: &OcrResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Result {} ({})", result.id, result.kind_label());
    if let Some(url) = &result.image_url {
        let _ = writeln!(out, "Source:  {url}");
    }
    if let Some(created) = &result.create_time {
        let _ = writeln!(out, "Created: {created}");
    }
    out.push('\n');

    match ResultDetail::parse(result) {
        ResultDetail::PlainText(text) => {
            let _ = writeln!(out, "{text}");
        }
        ResultDetail::Items(items) => {
            for item in &items {
                let score = item.ocr_text.score;
                let _ = writeln!(
                    out,
                    "{:>8} {:<6}  {}",
                    format_score(score),
                    tier_label(ScoreTier::from_score(score)),
                    item.ocr_text.text,
                );
            }
        }
        ResultDetail::Unparsed(raw) => {
            let _ = writeln!(out, "(unstructured result)");
            let _ = writeln!(out, "{raw}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, status: TaskStatus, position: u32) -> OcrTask {
        OcrTask {
            task_id: format!("id-{name}"),
            file_name: name.to_string(),
            status,
            queue_position: position,
            error_message: None,
            update_time: None,
        }
    }

    #[test]
    fn progress_bar_tracks_status() {
        assert_eq!(progress_bar(&TaskStatus::Waiting), "[##..................]  10%");
        assert_eq!(progress_bar(&TaskStatus::Processing), "[##########..........]  50%");
        assert_eq!(progress_bar(&TaskStatus::Success), "[====================] 100%");
        assert_eq!(progress_bar(&TaskStatus::Failed), "[xxxxxxxxxxxxxxxxxxxx] 100%");
    }

    #[test]
    fn table_lists_rows_in_order_with_queue_only_while_waiting() {
        let tasks = vec![
            task("receipt.png", TaskStatus::Waiting, 3),
            task("scan.pdf", TaskStatus::Processing, 0),
        ];
        let table = task_table(&tasks);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FILE"));
        assert!(lines[1].starts_with("receipt.png"));
        assert!(lines[1].contains("waiting"));
        assert!(lines[1].contains("    3"));
        assert!(lines[2].starts_with("scan.pdf"));
        assert!(lines[2].contains("processing"));
        assert!(lines[2].contains("    -"));
    }

    #[test]
    fn failed_row_shows_error_message() {
        let mut failed = task("bad.png", TaskStatus::Failed, 0);
        failed.error_message = Some("unsupported format".into());
        let table = task_table(&[failed]);

        assert!(table.contains("failed"));
        assert!(table.contains("  error: unsupported format"));
    }

    #[test]
    fn unknown_status_keeps_raw_value() {
        let table = task_table(&[task("x.png", TaskStatus::Unknown("PAUSED".into()), 0)]);
        assert!(table.contains("unknown (PAUSED)"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(task_table(&[]), "No tasks.\n");
    }

    #[test]
    fn healthy_ticks_are_silent() {
        let tick = TrackerEvent::TickCompleted {
            fetched: 2,
            updated: 2,
            failed: 0,
        };
        assert_eq!(notice(&tick), None);

        let flaky = TrackerEvent::TickCompleted {
            fetched: 2,
            updated: 1,
            failed: 1,
        };
        assert_eq!(
            notice(&flaky).as_deref(),
            Some("1 status check(s) failed, retrying next tick")
        );
    }

    #[test]
    fn detail_shows_scores_for_image_items() {
        let result = OcrResult {
            id: 9,
            image_url: Some("https://cdn/a.jpg".into()),
            text_result: Some(
                r#"[{"coordinates":[],"ocrText":{"text":"Total 12.50","score":0.953}}]"#.into(),
            ),
            create_time: Some("2024-05-01 10:00:00".into()),
        };
        let detail = result_detail(&result);

        assert!(detail.starts_with("Result 9 (image)"));
        assert!(detail.contains("95.30% high    Total 12.50"));
    }

    #[test]
    fn history_falls_back_when_text_is_missing() {
        let result = OcrResult {
            id: 1,
            image_url: None,
            text_result: None,
            create_time: None,
        };
        let table = history_table(&[result]);
        assert!(table.contains("No text content"));
    }
}
