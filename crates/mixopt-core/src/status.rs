//! Terminal status output: a spinner line, an optional progress bar, and
//! plain log lines printed above them.
//!
//! Static lines are written under one mutex while the bar is suspended, so
//! the spinner tick, progress updates and printed lines never interleave
//! partial output.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

/// Spinner redraw interval.
pub const TICK_INTERVAL: Duration = Duration::from_millis(125);

// Last frame is shown once the bar is finished
const SPINNER_FRAMES: &str = "-\\|/ ";
const PROGRESS_CHARS: &str = "## ";

const IDLE_TEMPLATE: &str = "";
const LOADER_TEMPLATE: &str = "{spinner} {wide_msg}";
const LOADER_BAR_TEMPLATE: &str = "{spinner} {wide_msg} [{bar:10}] {percent:>3}%";
const BAR_TEMPLATE: &str = "[{wide_bar}] {percent:>3}%";

/// Token for cooperative cancellation of the status line.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min: u64,
    max: u64,
    value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Idle,
    Loader,
    LoaderBar,
    Bar,
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|e| {
            debug!(template, error = %e, "invalid status template");
            ProgressStyle::default_spinner()
        })
        .tick_chars(SPINNER_FRAMES)
        .progress_chars(PROGRESS_CHARS)
}

struct Screen {
    out: Box<dyn Write + Send>,
    loader: Option<String>,
    progress: Option<Bounds>,
    layout: Layout,
    ticking: bool,
}

impl Screen {
    fn layout(&self) -> Layout {
        match (self.loader.is_some(), self.progress.is_some()) {
            (false, false) => Layout::Idle,
            (true, false) => Layout::Loader,
            (true, true) => Layout::LoaderBar,
            (false, true) => Layout::Bar,
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut text = String::with_capacity(line.len() + 1);
        text.push_str(line);
        text.push('\n');
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}

fn lock(screen: &Mutex<Screen>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

fn report(result: io::Result<()>) {
    if let Err(e) = result {
        debug!(error = %e, "status output failed");
    }
}

/// Finish the bar and forget the dynamic state. Idempotent.
fn teardown(screen: &Mutex<Screen>, bar: &ProgressBar, token: &CancellationToken) {
    let mut screen = lock(screen);
    if token.is_cancelled() {
        return;
    }
    token.cancel();
    screen.loader = None;
    screen.progress = None;
    screen.ticking = false;
    bar.disable_steady_tick();
    bar.finish_and_clear();
    report(screen.out.flush());
}

/// Owner of all terminal output for one run.
///
/// Created once at startup and torn down with [`StatusConsole::shutdown`]
/// (or on drop), which stops the spinner tick.
pub struct StatusConsole {
    screen: Arc<Mutex<Screen>>,
    bar: ProgressBar,
    token: CancellationToken,
    interactive: bool,
}

impl StatusConsole {
    /// Console on stdout. The status line is only drawn on a terminal.
    pub fn stdout() -> Self {
        let target = if io::stdout().is_terminal() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self::new(io::stdout(), target)
    }

    /// Console that only writes static lines to `out`.
    pub fn plain(out: impl Write + Send + 'static) -> Self {
        Self::new(out, ProgressDrawTarget::hidden())
    }

    /// Static lines go to `out`, the status line to `target`.
    pub fn new(out: impl Write + Send + 'static, target: ProgressDrawTarget) -> Self {
        let interactive = !target.is_hidden();
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(style(IDLE_TEMPLATE));

        Self {
            screen: Arc::new(Mutex::new(Screen {
                out: Box::new(out),
                loader: None,
                progress: None,
                layout: Layout::Idle,
                ticking: false,
            })),
            bar,
            token: CancellationToken::new(),
            interactive,
        }
    }

    /// Push the dynamic state to the bar.
    fn refresh(&self, screen: &mut Screen) {
        if self.token.is_cancelled() {
            return;
        }

        let layout = screen.layout();
        if layout != screen.layout {
            self.bar.set_style(style(match layout {
                Layout::Idle => IDLE_TEMPLATE,
                Layout::Loader => LOADER_TEMPLATE,
                Layout::LoaderBar => LOADER_BAR_TEMPLATE,
                Layout::Bar => BAR_TEMPLATE,
            }));
            screen.layout = layout;
        }

        if let Some(bounds) = screen.progress {
            self.bar.set_length(bounds.max - bounds.min);
            self.bar.set_position(bounds.value - bounds.min);
        }

        let tick = self.interactive && screen.loader.is_some();
        if tick != screen.ticking {
            if tick {
                self.bar.enable_steady_tick(TICK_INTERVAL);
            } else {
                self.bar.disable_steady_tick();
            }
            screen.ticking = tick;
        }
        self.bar.tick();
    }

    /// Show the spinner with `text`.
    pub fn set_loading(&self, text: impl Into<String>) {
        let text = text.into();
        let mut screen = lock(&self.screen);
        self.bar.set_message(text.clone());
        screen.loader = Some(text);
        self.refresh(&mut screen);
    }

    pub fn reset_loading(&self) {
        let mut screen = lock(&self.screen);
        if screen.loader.take().is_some() {
            self.bar.set_message("");
            self.refresh(&mut screen);
        }
    }

    /// Show a progress bar over `[min, max]`, starting at `min`.
    pub fn init_progress(&self, min: u64, max: u64) {
        let mut screen = lock(&self.screen);
        screen.progress = Some(Bounds {
            min,
            max: max.max(min),
            value: min,
        });
        self.refresh(&mut screen);
    }

    /// Set the progress value, clamped to the bar's bounds.
    pub fn set_progress(&self, value: u64) {
        let mut screen = lock(&self.screen);
        if let Some(bounds) = screen.progress.as_mut() {
            bounds.value = value.clamp(bounds.min, bounds.max);
            self.refresh(&mut screen);
        }
    }

    pub fn inc_progress(&self) {
        let mut screen = lock(&self.screen);
        if let Some(bounds) = screen.progress.as_mut() {
            bounds.value = bounds.value.saturating_add(1).clamp(bounds.min, bounds.max);
            self.refresh(&mut screen);
        }
    }

    pub fn progress_value(&self) -> Option<u64> {
        lock(&self.screen).progress.map(|b| b.value)
    }

    pub fn reset_progress(&self) {
        let mut screen = lock(&self.screen);
        if screen.progress.take().is_some() {
            self.refresh(&mut screen);
        }
    }

    /// Print a line above the status line.
    pub fn print(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        let mut screen = lock(&self.screen);
        let result = if self.interactive && !self.token.is_cancelled() {
            self.bar.suspend(|| screen.write_line(line))
        } else {
            screen.write_line(line)
        };
        report(result);
    }

    /// Handle for clearing the status line from a signal handler.
    pub fn interrupt_guard(&self) -> InterruptGuard {
        InterruptGuard {
            screen: Arc::clone(&self.screen),
            bar: self.bar.clone(),
            token: self.token.clone(),
        }
    }

    /// Clear the status line and stop the spinner tick.
    pub fn shutdown(self) {
        // Drop does the teardown
    }
}

impl Drop for StatusConsole {
    fn drop(&mut self) {
        teardown(&self.screen, &self.bar, &self.token);
    }
}

/// Clears the status line without owning the console.
#[derive(Clone)]
pub struct InterruptGuard {
    screen: Arc<Mutex<Screen>>,
    bar: ProgressBar,
    token: CancellationToken,
}

impl InterruptGuard {
    pub fn clear(&self) {
        teardown(&self.screen, &self.bar, &self.token);
    }
}
