//! Run-wide and per-file progress tracking.
//!
//! Counters are atomics so any worker can bump them. Everything printed
//! while a run is live goes through [`Progress`], which serializes output
//! so the status line and log messages never interleave.

use crate::console::Console;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Minimum time between two redraws of the status line.
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Line counters for a file currently being translated.
#[derive(Debug, Clone)]
struct ActiveFile {
    name: String,
    lines_done: usize,
    lines_total: usize,
}

#[derive(Debug)]
struct DisplayState {
    active: BTreeMap<usize, ActiveFile>,
    last_render: Option<Instant>,
}

/// Shared progress for one pipeline run.
#[derive(Debug)]
pub struct Progress {
    console: Console,
    total: usize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    next_file_id: AtomicUsize,
    started: Instant,
    state: Mutex<DisplayState>,
}

impl Progress {
    /// Creates progress for `total` jobs.
    pub fn new(console: Console, total: usize) -> Self {
        Self {
            console,
            total,
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            next_file_id: AtomicUsize::new(0),
            started: Instant::now(),
            state: Mutex::new(DisplayState {
                active: BTreeMap::new(),
                last_render: None,
            }),
        }
    }

    /// Total number of jobs in the run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Jobs finished so far, failed ones included.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Jobs that ended with an error.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Records that one job is done.
    pub fn job_finished(&self, success: bool) {
        if !success {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.render(true);
    }

    /// Registers a script file with `lines_total` lines.
    ///
    /// The file stays in the status line until the returned handle drops.
    pub fn start_file(self: &Arc<Self>, name: &str, lines_total: usize) -> FileProgress {
        let id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        self.lock().active.insert(
            id,
            ActiveFile {
                name: name.to_string(),
                lines_done: 0,
                lines_total,
            },
        );
        self.render(false);

        FileProgress {
            progress: Arc::clone(self),
            id,
        }
    }

    /// Prints a warning without breaking the status line.
    pub fn warning(&self, message: &str) {
        let _state = self.lock();
        self.console.clear_line();
        self.console.warning(message);
    }

    /// Prints an error without breaking the status line.
    pub fn error(&self, message: &str) {
        let _state = self.lock();
        self.console.clear_line();
        self.console.error(message);
    }

    /// Clears the status line once the run is over.
    pub fn finish(&self) {
        let _state = self.lock();
        self.console.clear_line();
    }

    /// Status line text, e.g. `[3/10] 30% | 2 active | a.ks 5/40 | 00:04`.
    pub fn status_line(&self) -> String {
        let state = self.lock();
        self.format_status(&state)
    }

    fn format_status(&self, state: &DisplayState) -> String {
        let completed = self.completed();
        let percent = if self.total == 0 {
            100
        } else {
            completed * 100 / self.total
        };

        let mut line = format!(
            "[{}/{}] {:>3}% | {} active",
            self.console.count(completed),
            self.total,
            percent,
            state.active.len()
        );
        if let Some(file) = state.active.values().next() {
            line.push_str(&format!(
                " | {} {}/{}",
                self.console.file(&file.name),
                file.lines_done,
                file.lines_total
            ));
        }
        line.push_str(&format!(" | {}", self.console.elapsed(self.elapsed())));
        line
    }

    /// Redraws the status line if the console supports it.
    fn render(&self, force: bool) {
        if !self.console.is_interactive() {
            return;
        }

        let mut state = self.lock();
        let due = state
            .last_render
            .is_none_or(|last| last.elapsed() >= RENDER_INTERVAL);
        if force || due {
            state.last_render = Some(Instant::now());
            self.console.progress_update(&self.format_status(&state));
        }
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle for one file in progress; removes it from the display on drop.
#[derive(Debug)]
pub struct FileProgress {
    progress: Arc<Progress>,
    id: usize,
}

impl FileProgress {
    /// Marks one more line as processed.
    pub fn advance(&self) {
        if let Some(file) = self.progress.lock().active.get_mut(&self.id) {
            file.lines_done += 1;
        }
        self.progress.render(false);
    }

    /// Lines processed so far.
    pub fn lines_done(&self) -> usize {
        self.progress
            .lock()
            .active
            .get(&self.id)
            .map_or(0, |file| file.lines_done)
    }
}

impl Drop for FileProgress {
    fn drop(&mut self) {
        self.progress.lock().active.remove(&self.id);
    }
}
