//! Colored terminal output utilities.
//!
//! Status messages go to stderr; documents go to stdout so they can be piped.

use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    stdout: Term,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            stdout: Term::stdout(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a document to stdout, highlighting headings outside fences.
    pub(crate) fn document(&self, text: &str) {
        let styled = self.stdout.is_term();
        let mut fenced = false;

        for line in text.lines() {
            if line.starts_with("```") {
                fenced = !fenced;
            }
            if styled && !fenced && line.starts_with('#') {
                let _ = self
                    .stdout
                    .write_line(&self.cyan_bold.apply_to(line).to_string());
            } else {
                let _ = self.stdout.write_line(line);
            }
        }
    }
}
