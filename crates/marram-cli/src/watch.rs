//! File-watch driver.
//!
//! Watches every pipeline's base directory, debounces change bursts, and on
//! each flush invalidates all pipelines and rewrites their outputs. Build
//! errors are reported and watching continues; only watcher setup failures
//! abort.

use crate::pipelines::Pipelines;
use miette::{IntoDiagnostic, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Debounce window for change bursts (editors often write several events
/// per save).
const DEBOUNCE_MS: u64 = 100;

/// Pending changes awaiting a quiet period.
#[derive(Default)]
struct DebounceState {
    pending: HashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl DebounceState {
    fn record(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_change = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending.is_empty() && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
            }
            None => false,
        }
    }

    fn take(&mut self) -> HashSet<PathBuf> {
        self.last_change = None;
        std::mem::take(&mut self.pending)
    }
}

/// Only content-affecting events trigger a rebuild.
fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watch the registered pipelines until the process is terminated.
///
/// `report` is called with the outcomes of every rebuild (the initial build
/// happens before this function).
pub fn run(
    runtime: &tokio::runtime::Runtime,
    pipelines: &Pipelines,
    report: impl Fn(&[crate::pipelines::PipelineOutcome]),
) -> Result<()> {
    let roots: BTreeSet<PathBuf> = pipelines
        .entries()
        .iter()
        .map(|p| p.packager.config().abs_basedir())
        .collect();

    let (tx, rx) = channel();
    let mut watcher =
        notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .into_diagnostic()?;
    for root in &roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .into_diagnostic()?;
        eprintln!("  watching {}", root.display());
    }

    let mut state = DebounceState::default();
    loop {
        match rx.recv_timeout(Duration::from_millis(DEBOUNCE_MS)) {
            Ok(Ok(event)) => {
                if is_relevant(&event.kind) {
                    for path in event.paths {
                        // Our own output writes must not retrigger a build.
                        if !pipelines.is_own_output(&path) {
                            state.record(path);
                        }
                    }
                }
            }
            Ok(Err(err)) => warn!(%err, "watch error"),
            Err(RecvTimeoutError::Timeout) => {
                if state.ready() {
                    let changed = state.take();
                    debug!(count = changed.len(), "change burst settled, rebuilding");
                    pipelines.invalidate_all();
                    let outcomes = runtime.block_on(pipelines.run_all());
                    report(&outcomes);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
