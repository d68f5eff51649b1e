// menusync-core/src/propagate.rs
//! Template updates cascading to dependent VMs on a bounded worker pool.
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use menusync_common::cascade::CascadeEvent;
use menusync_common::error::{MenuError, Result};
use menusync_common::report::{CascadeReport, ChildOutcome, SyncReport};
use threadpool::ThreadPool;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::context::MenuContext;
use crate::refresh;
use crate::sync::{synchronize, synchronize_locked, SyncOptions};

/// Outcome of `update`: a plain sync, or a template plus its dependents.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Single(SyncReport),
    Cascade(CascadeReport),
}

impl UpdateOutcome {
    pub fn into_result(self) -> Result<Self> {
        match self {
            UpdateOutcome::Single(r) => r.into_result().map(UpdateOutcome::Single),
            UpdateOutcome::Cascade(c) => c.into_result().map(UpdateOutcome::Cascade),
        }
    }
}

fn emit(events: Option<&broadcast::Sender<CascadeEvent>>, event: CascadeEvent) {
    if let Some(tx) = events {
        // No subscribers is fine.
        let _ = tx.send(event);
    }
}

fn outcome_of(result: Result<SyncReport>) -> ChildOutcome {
    match result {
        Ok(report) => ChildOutcome::Synced(report),
        Err(e) => ChildOutcome::Failed(e),
    }
}

fn changed(outcome: &ChildOutcome) -> bool {
    matches!(outcome, ChildOutcome::Synced(r) if r.changed())
}

/// Synchronizes `vm`; templates additionally cascade to their dependents.
pub fn update(
    ctx: &MenuContext,
    vm: &str,
    options: SyncOptions,
    events: Option<broadcast::Sender<CascadeEvent>>,
) -> Result<UpdateOutcome> {
    if ctx.inventory.require(vm)?.is_template() {
        update_with_cascade(ctx, vm, options, events).map(UpdateOutcome::Cascade)
    } else {
        synchronize(ctx, vm, options).map(UpdateOutcome::Single)
    }
}

/// Synchronizes `template`, then every VM based on it with at most
/// `config.max_workers` running at once. A child's failure is recorded
/// against that child only; the template's own lock is released before
/// children start.
#[instrument(skip(ctx, events), fields(force = options.force))]
pub fn update_with_cascade(
    ctx: &MenuContext,
    template: &str,
    options: SyncOptions,
    events: Option<broadcast::Sender<CascadeEvent>>,
) -> Result<CascadeReport> {
    let info = ctx.inventory.require(template)?;
    if !info.is_template() {
        return Err(MenuError::NotATemplate(template.to_string()));
    }
    let started = Instant::now();
    let children: Vec<String> = ctx
        .inventory
        .dependents(template)
        .into_iter()
        .map(|vm| vm.name.clone())
        .collect();
    let workers = ctx.config.max_workers.max(1).min(children.len().max(1));
    emit(
        events.as_ref(),
        CascadeEvent::CascadeStarted {
            template: template.to_string(),
            total_children: children.len(),
            workers,
        },
    );

    let template_outcome = outcome_of(synchronize_locked(ctx, template, options));
    match &template_outcome {
        ChildOutcome::Synced(r) if r.is_success() => emit(
            events.as_ref(),
            CascadeEvent::TemplateSynced {
                template: template.to_string(),
                summary: r.summary(),
            },
        ),
        other => {
            let error = other.error_message().unwrap_or_default();
            warn!("Template '{}' failed: {}", template, error);
            emit(
                events.as_ref(),
                CascadeEvent::TemplateFailed {
                    template: template.to_string(),
                    error,
                },
            );
        }
    }

    let mut results = run_children(ctx, &children, workers, options, events.as_ref());
    for child in &children {
        if !results.contains_key(child) {
            results.insert(
                child.clone(),
                ChildOutcome::Failed(MenuError::Generic(
                    "worker terminated before reporting".to_string(),
                )),
            );
        }
    }

    let report = CascadeReport {
        template: template.to_string(),
        template_outcome,
        children: results,
    };
    if changed(&report.template_outcome) || report.children.values().any(changed) {
        refresh::refresh_menus(&ctx.config);
    }

    let fail_count = report.failed_children().len();
    let elapsed = started.elapsed();
    info!(
        "Cascade from '{}' finished in {}: {} ok, {} failed",
        template,
        humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)),
        children.len() - fail_count,
        fail_count
    );
    emit(
        events.as_ref(),
        CascadeEvent::CascadeFinished {
            template: template.to_string(),
            duration_secs: elapsed.as_secs_f64(),
            success_count: children.len() - fail_count,
            fail_count,
        },
    );
    Ok(report)
}

fn run_children(
    ctx: &MenuContext,
    children: &[String],
    workers: usize,
    options: SyncOptions,
    events: Option<&broadcast::Sender<CascadeEvent>>,
) -> BTreeMap<String, ChildOutcome> {
    if children.is_empty() {
        return BTreeMap::new();
    }
    let pool = ThreadPool::new(workers);
    let (result_tx, result_rx) = unbounded::<(String, ChildOutcome)>();
    debug!("Cascade pool started with {} workers", workers);

    for child in children {
        let ctx = ctx.clone();
        let child = child.clone();
        let result_tx = result_tx.clone();
        let events = events.cloned();
        pool.execute(move || {
            emit(
                events.as_ref(),
                CascadeEvent::ChildStarted { vm: child.clone() },
            );
            let outcome = outcome_of(synchronize_locked(&ctx, &child, options));
            match &outcome {
                ChildOutcome::Synced(r) if r.is_success() => emit(
                    events.as_ref(),
                    CascadeEvent::ChildSucceeded {
                        vm: child.clone(),
                        summary: r.summary(),
                    },
                ),
                other => emit(
                    events.as_ref(),
                    CascadeEvent::ChildFailed {
                        vm: child.clone(),
                        error: other.error_message().unwrap_or_default(),
                    },
                ),
            }
            if result_tx.send((child.clone(), outcome)).is_err() {
                debug!("[{}] result receiver gone", child);
            }
        });
    }
    drop(result_tx);

    let results: BTreeMap<String, ChildOutcome> = result_rx.iter().collect();
    pool.join();
    results
}
