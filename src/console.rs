//! Console output formatting with ANSI color support.
//!
//! Colors and in-place status redraws are detected separately: `NO_COLOR`
//! only turns off styling, while redrawing needs stdout to be a terminal.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    /// Returns the ANSI escape code for this style.
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Kind of a labelled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
    Step,
}

impl Level {
    fn label(self) -> (&'static str, Style) {
        match self {
            Level::Info => ("INFO", Style::Blue),
            Level::Success => ("OK", Style::Green),
            Level::Warning => ("WARN", Style::Yellow),
            Level::Error => ("ERROR", Style::Red),
            Level::Step => ("STEP", Style::Cyan),
        }
    }
}

/// Console output handler shared by the pipeline and its workers.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    colors_enabled: bool,
    interactive: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console, detecting terminal and color support.
    ///
    /// Colors are disabled if `NO_COLOR` is set or stdout is not a TTY.
    /// The live status line only depends on stdout being a TTY.
    pub fn new() -> Self {
        let interactive = io::stdout().is_terminal();
        let colors_enabled = interactive && std::env::var_os("NO_COLOR").is_none();

        Self {
            colors_enabled,
            interactive,
        }
    }

    /// Creates a Console with colors and redraws both on or both off.
    pub fn with_colors(enabled: bool) -> Self {
        Self::with_modes(enabled, enabled)
    }

    /// Creates a Console with colors and redraws set independently.
    pub fn with_modes(colors_enabled: bool, interactive: bool) -> Self {
        Self {
            colors_enabled,
            interactive,
        }
    }

    /// Whether single-line progress updates can be redrawn in place.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    fn format_line(&self, level: Level, message: &str) -> String {
        let (label, color) = level.label();
        format!("{} {}", self.label(label, color), message)
    }

    fn emit(&self, level: Level, message: &str) {
        let line = self.format_line(level, message);
        if level == Level::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Prints an `[INFO]` message.
    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    /// Prints an `[OK]` message.
    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    /// Prints a `[WARN]` message.
    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    /// Prints an `[ERROR]` message to stderr.
    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// Prints a `[STEP]` message.
    pub fn step(&self, message: &str) {
        self.emit(Level::Step, message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Returns text styled as muted (dim gray).
    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Erases the status line so a regular message can take its place.
    pub fn clear_line(&self) {
        if self.interactive {
            print!("\r\x1b[2K");
            let _ = io::stdout().flush();
        }
    }

    /// Redraws the status line in place.
    pub fn progress_update(&self, message: &str) {
        self.clear_line();
        print!("{} {}", self.label("..", Style::Cyan), message);
        let _ = io::stdout().flush();
    }

    /// Formats a count in bold green.
    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats a file name in cyan.
    pub fn file(&self, name: &str) -> String {
        self.style(name, &[Style::Cyan])
    }

    /// Formats an elapsed duration as `mm:ss`.
    pub fn elapsed(&self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        self.style(
            &format!("{:02}:{:02}", secs / 60, secs % 60),
            &[Style::Yellow, Style::Bold],
        )
    }
}
