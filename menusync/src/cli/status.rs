// menusync/src/cli/status.rs
use colored::*;
use menusync_common::cascade::CascadeEvent;
use menusync_common::report::{CascadeReport, ChildOutcome};
use prettytable::{format, Cell, Row, Table};
use tokio::sync::broadcast;
use tracing::debug;

/// Prints a line per cascade event until the sender side is gone.
pub async fn handle_events(mut event_rx: broadcast::Receiver<CascadeEvent>) {
    loop {
        match event_rx.recv().await {
            Ok(event) => print_event(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!("Status printer skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &CascadeEvent) {
    match event {
        CascadeEvent::CascadeStarted {
            template,
            total_children,
            workers,
        } => {
            println!(
                "{} Updating template {} and {} dependent VM(s) ({} workers)",
                "→".cyan(),
                template.cyan().bold(),
                total_children,
                workers
            );
        }
        CascadeEvent::TemplateSynced { template, summary } => {
            println!("{} {}: {}", " ✓".green().bold(), template.green(), summary);
        }
        CascadeEvent::TemplateFailed { template, error } => {
            println!("{} {}: {}", " ✗".red().bold(), template.red(), error);
        }
        CascadeEvent::ChildStarted { vm } => {
            debug!("Cascade started on {}", vm);
        }
        CascadeEvent::ChildSucceeded { vm, summary } => {
            println!("{} {}: {}", " ✓".green(), vm, summary.dimmed());
        }
        CascadeEvent::ChildFailed { vm, error } => {
            println!("{} {}: {}", " ✗".red(), vm.yellow(), error);
        }
        CascadeEvent::CascadeFinished {
            template,
            duration_secs,
            success_count,
            fail_count,
        } => {
            debug!(
                "Cascade from {} done in {:.2}s ({} ok, {} failed)",
                template, duration_secs, success_count, fail_count
            );
        }
    }
}

fn outcome_cells(outcome: &ChildOutcome) -> (Cell, Cell) {
    match outcome {
        ChildOutcome::Synced(report) if report.is_success() => (
            Cell::new("ok").style_spec("Fg"),
            Cell::new(&report.summary()),
        ),
        ChildOutcome::Synced(report) => (
            Cell::new("partial").style_spec("Fy"),
            Cell::new(&report.summary()),
        ),
        ChildOutcome::Failed(e) => (Cell::new("failed").style_spec("Fr"), Cell::new(&e.to_string())),
    }
}

pub fn print_cascade_summary(report: &CascadeReport) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(Row::new(vec![
        Cell::new("VM").style_spec("b"),
        Cell::new("Role").style_spec("b"),
        Cell::new("Status").style_spec("b"),
        Cell::new("Details").style_spec("b"),
    ]));

    let (status, details) = outcome_cells(&report.template_outcome);
    table.add_row(Row::new(vec![
        Cell::new(&report.template).style_spec("Fb"),
        Cell::new("template"),
        status,
        details,
    ]));
    for (vm, outcome) in &report.children {
        let (status, details) = outcome_cells(outcome);
        table.add_row(Row::new(vec![Cell::new(vm), Cell::new("dependent"), status, details]));
    }
    table.printstd();

    let failed = report.failed_children().len();
    if report.is_success() {
        println!("{}", format!("{} VM(s) up to date", report.children.len() + 1).green());
    } else {
        println!(
            "{}",
            format!(
                "{} of {} dependent VM(s) failed",
                failed,
                report.children.len()
            )
            .yellow()
        );
    }
}
