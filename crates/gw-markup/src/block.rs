//! Raw block detection.
//!
//! [`BlockScanner`] walks markup line by line with an explicit two-state
//! machine ([`BlockState`]). Outside raw blocks, text is rewritten by the
//! rule set. Inside `<code>`/`<file>` blocks or an existing fence, lines are
//! kept verbatim.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::rules::RuleSet;

/// Fence token opening and closing a raw block in output.
pub(crate) const FENCE: &str = "```";

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(code|file)(?:[ \t]+([^>]*))?>").unwrap());
static CLOSE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</code>").unwrap());
static CLOSE_FILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</file>").unwrap());
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z!][^<>]*>").unwrap());

/// Strip markup tags, keeping their text content.
pub(crate) fn strip_tags(text: &str) -> Cow<'_, str> {
    TAG.replace_all(text, "")
}

/// Escape a raw line that would otherwise terminate its fence.
pub(crate) fn escape_raw(line: &str) -> String {
    if line.starts_with(FENCE) {
        format!(" {line}")
    } else {
        line.to_owned()
    }
}

/// Line produced by the scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Line {
    /// Rewritten markup text. May contain `\n` inserted by rules.
    Text(String),
    /// Raw block content, emitted verbatim.
    Raw(String),
    /// Fence opening or closing a raw block.
    Fence,
}

/// Marker that opened the current raw block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RawMarker {
    Code,
    File,
    Fence,
}

impl fmt::Display for RawMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("<code>"),
            Self::File => f.write_str("<file>"),
            Self::Fence => f.write_str(FENCE),
        }
    }
}

/// Scanner state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum BlockState {
    #[default]
    Normal,
    Raw(RawMarker),
}

/// Opening raw marker found inside a text line.
struct Opening<'a> {
    before: &'a str,
    marker: RawMarker,
    caption: Option<String>,
    after: &'a str,
}

fn find_opening(text: &str) -> Option<Opening<'_>> {
    let caps = OPEN_TAG.captures(text)?;
    let whole = caps.get(0)?;
    let marker = if caps[1].eq_ignore_ascii_case("code") {
        RawMarker::Code
    } else {
        RawMarker::File
    };

    // `<file - name.txt>`: "-" means "no language"
    let caption = caps.get(2).and_then(|args| {
        let mut words = args.as_str().split_whitespace().peekable();
        words.next_if_eq(&"-");
        let caption = words.collect::<Vec<_>>().join(" ");
        (!caption.is_empty()).then_some(caption)
    });

    Some(Opening {
        before: &text[..whole.start()],
        marker,
        caption,
        after: &text[whole.end()..],
    })
}

/// Line-by-line raw block scanner.
///
/// Borrowing the rule set keeps a shared [`Converter`](crate::Converter)
/// free of per-conversion state.
pub(crate) struct BlockScanner<'r> {
    rules: &'r RuleSet,
    state: BlockState,
    lines: Vec<Line>,
    warnings: Vec<String>,
}

impl<'r> BlockScanner<'r> {
    pub(crate) fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            state: BlockState::Normal,
            lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> BlockState {
        self.state
    }

    /// Process one input line (without line terminator).
    pub(crate) fn push_line(&mut self, line: &str) {
        let mut rest = line;
        let mut whole_line = true;

        loop {
            match self.state {
                BlockState::Normal => {
                    if rest.starts_with(FENCE) {
                        self.lines.push(Line::Fence);
                        self.state = BlockState::Raw(RawMarker::Fence);
                        return;
                    }

                    let Some(opening) = find_opening(rest) else {
                        if whole_line || !rest.trim().is_empty() {
                            self.push_text(rest);
                        }
                        return;
                    };

                    if !opening.before.trim().is_empty() {
                        self.push_text(opening.before);
                    }
                    if let Some(caption) = &opening.caption {
                        self.push_text(caption);
                    }
                    self.lines.push(Line::Fence);
                    self.state = BlockState::Raw(opening.marker);

                    rest = opening.after;
                    whole_line = false;
                    if rest.trim().is_empty() {
                        return;
                    }
                }
                BlockState::Raw(RawMarker::Fence) => {
                    if rest.starts_with(FENCE) {
                        self.lines.push(Line::Fence);
                        self.state = BlockState::Normal;
                    } else {
                        self.lines.push(Line::Raw(escape_raw(rest)));
                    }
                    return;
                }
                BlockState::Raw(marker) => {
                    let closing = if marker == RawMarker::Code {
                        &*CLOSE_CODE
                    } else {
                        &*CLOSE_FILE
                    };

                    let Some(close) = closing.find(rest) else {
                        self.lines.push(Line::Raw(escape_raw(rest)));
                        return;
                    };

                    let content = &rest[..close.start()];
                    if !content.is_empty() {
                        self.lines.push(Line::Raw(escape_raw(content)));
                    }
                    self.lines.push(Line::Fence);
                    self.state = BlockState::Normal;

                    rest = &rest[close.end()..];
                    whole_line = false;
                    if rest.trim().is_empty() {
                        return;
                    }
                }
            }
        }
    }

    /// Close a dangling raw block and return lines and warnings.
    pub(crate) fn finish(mut self) -> (Vec<Line>, Vec<String>) {
        if let BlockState::Raw(marker) = self.state {
            self.lines.push(Line::Fence);
            self.warnings
                .push(format!("Unclosed {marker} block closed at end of input"));
        }
        (self.lines, self.warnings)
    }

    fn push_text(&mut self, text: &str) {
        let text = strip_tags(text);
        self.lines.push(Line::Text(self.rules.apply(&text)));
    }
}
