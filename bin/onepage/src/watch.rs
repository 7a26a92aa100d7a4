//! Source watcher with debounced rebuilds.
//!
//! Filesystem events are delivered to a dedicated thread which runs the
//! rebuild synchronously, so rebuilds never overlap.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::{Path, PathBuf},
    sync::mpsc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result, WrapErr};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use onepage_core::SourceSet;
use onepage_generator::{BuildError, BuildStats};

/// Default minimum interval between accepted rebuilds.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Tracks when the last rebuild was accepted.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_build: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer that has not seen a build yet.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_build: None,
        }
    }

    /// Whether an event arriving at `now` falls outside the current burst.
    #[must_use]
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_build {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        }
    }

    /// Mark a build as finished at `at`.
    pub fn record(&mut self, at: Instant) {
        self.last_build = Some(at);
    }
}

/// Turns filesystem events into rebuilds.
pub struct RebuildHandler<F> {
    sources: SourceSet,
    debouncer: Debouncer,
    on_trigger: F,
}

impl<F> RebuildHandler<F>
where
    F: FnMut() -> std::result::Result<BuildStats, BuildError>,
{
    /// Create a handler for `sources`.
    pub fn new(sources: SourceSet, window: Duration, on_trigger: F) -> Self {
        Self {
            sources,
            debouncer: Debouncer::new(window),
            on_trigger,
        }
    }

    /// Handle an event received now. Returns whether a rebuild ran.
    pub fn handle(&mut self, event: &Event) -> bool {
        self.handle_at(event, Instant::now())
    }

    /// Handle an event received at `received`.
    ///
    /// The debounce timestamp is set once the rebuild returns, whether it
    /// succeeded or not, and never earlier than `received`.
    pub fn handle_at(&mut self, event: &Event, received: Instant) -> bool {
        let Some(changed) = changed_paths(event)
            .into_iter()
            .find(|p| self.sources.matches(p))
        else {
            tracing::trace!(paths = ?event.paths, "ignoring unwatched path");
            return false;
        };

        if !self.debouncer.ready(received) {
            tracing::debug!(path = %changed.display(), "change within debounce window, ignoring");
            return false;
        }

        self.rebuild(changed);
        self.debouncer.record(Instant::now().max(received));
        true
    }

    fn rebuild(&mut self, changed: &Path) {
        let name = changed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        println!();
        println!("  Detected change in {name}, rebuilding...");
        tracing::info!(path = %changed.display(), "source changed");

        match catch_unwind(AssertUnwindSafe(|| (self.on_trigger)())) {
            Ok(Ok(stats)) => {
                println!("  ✓ Rebuilt in {}ms, refresh your browser", stats.duration_ms);
                tracing::debug!(?stats, "rebuild completed");
            }
            Ok(Err(e)) => {
                tracing::error!("Rebuild failed: {e}");
                eprintln!("  ✗ Rebuild failed: {e}");
            }
            Err(_) => {
                tracing::error!("Rebuild panicked");
                eprintln!("  ✗ Rebuild panicked, keeping previous output");
            }
        }
    }
}

/// Paths in `event` that may now hold new contents.
///
/// Editors that save through a rename report a create or a rename onto the
/// source, not a modify. A source renamed away, or with only its metadata
/// touched, has nothing new to build.
fn changed_paths(event: &Event) -> Vec<&Path> {
    let paths = event.paths.iter().map(PathBuf::as_path);
    match event.kind {
        EventKind::Create(_) => paths.collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From) | ModifyKind::Metadata(_)) => {
            Vec::new()
        }
        // Source first, destination second.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths.skip(1).collect(),
        // Direction unknown: only a path that still exists was renamed onto.
        EventKind::Modify(ModifyKind::Name(_)) => paths.filter(|p| p.is_file()).collect(),
        EventKind::Modify(_) => paths.collect(),
        _ => Vec::new(),
    }
}

/// Running watcher. Stopping releases the OS watches and joins the thread.
pub struct SourceWatcher {
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
}

impl SourceWatcher {
    /// Start watching `sources`, calling `on_trigger` for each accepted change.
    pub fn start<F>(sources: SourceSet, window: Duration, on_trigger: F) -> Result<Self>
    where
        F: FnMut() -> std::result::Result<BuildStats, BuildError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())
            .wrap_err("Failed to create file watcher")?;

        for dir in sources.directories() {
            watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "watching directory");
        }

        let mut handler = RebuildHandler::new(sources, window, on_trigger);
        let thread = std::thread::Builder::new()
            .name("onepage-watcher".to_string())
            .spawn(move || {
                // Ends once the watcher, and with it the sender, is dropped.
                for res in rx {
                    match res {
                        Ok(event) => {
                            handler.handle(&event);
                        }
                        Err(e) => tracing::warn!(error = %e, "watch error"),
                    }
                }
                tracing::debug!("watcher thread finished");
            })
            .wrap_err("Failed to spawn watcher thread")?;

        Ok(Self {
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }

    /// Whether the watcher is still delivering events.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop delivering events and wait for an in-progress rebuild to finish.
    ///
    /// Calling this on a stopped watcher does nothing.
    pub fn stop(&mut self) {
        let Some(watcher) = self.watcher.take() else {
            return;
        };
        drop(watcher);

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("watcher thread panicked");
            }
        }
        tracing::debug!("watcher stopped");
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
