//! Handles all user-facing console output.
//!
//! The assertion engine and the supervisor report progress through an
//! [`OutputSink`], so the same code can print to a terminal, capture text in
//! tests, or stay silent.

use std::fmt;
use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

// ============================================================================
// SINK CONTRACT
// ============================================================================

/// How a reported step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// Destination for progress output.
pub trait OutputSink {
    /// Writes one line of plain text.
    fn emit(&mut self, text: &str);

    /// Reports that `step` finished with `outcome`.
    fn outcome(&mut self, step: &str, outcome: Outcome);
}

// ============================================================================
// OUTPUT SINKS: ConsoleSink, OutputBuffer and NullSink
// ============================================================================

/// ConsoleSink: writes to stdout, colouring outcomes when enabled.
pub struct ConsoleSink {
    stdout: StandardStream,
}

impl ConsoleSink {
    pub fn new(color: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(color),
        }
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{text}");
    }

    fn outcome(&mut self, step: &str, outcome: Outcome) {
        let color = match outcome {
            Outcome::Success => Color::Green,
            Outcome::Skipped => Color::Yellow,
        };
        let _ = write!(self.stdout, "{step} - ");
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(self.stdout, "{outcome}");
        let _ = self.stdout.reset();
        let _ = writeln!(self.stdout, ".");
        let _ = self.stdout.flush();
    }
}

/// OutputBuffer: collects output into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.buffer.lines()
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn outcome(&mut self, step: &str, outcome: Outcome) {
        self.emit(&format!("{step} - {outcome}."));
    }
}

/// NullSink: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}

    fn outcome(&mut self, _step: &str, _outcome: Outcome) {}
}
