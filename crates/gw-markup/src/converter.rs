//! `DokuWiki` to Gemtext conversion pipeline.

use std::borrow::Cow;

use crate::block::{BlockScanner, FENCE, Line, strip_tags};
use crate::rules::{LINE_BREAK, LinkConfig, RuleSet, restore_brackets};
use crate::table;

/// Result of converting one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversion {
    /// Gemtext output, lines joined with `\n`.
    pub text: String,
    /// Output lines in emission order.
    pub lines: Vec<String>,
    /// Recoverable problems found in the input (unclosed raw blocks,
    /// tables without rows).
    pub warnings: Vec<String>,
}

/// Markup converter.
///
/// Holds only its rule set, so one instance can be shared across threads
/// and reused for any number of conversions.
///
/// # Example
///
/// ```
/// use gw_markup::Converter;
///
/// let converter = Converter::default();
/// let result = converter.convert("====== Hello ======\n**World**").unwrap();
///
/// assert_eq!(result.text, "# Hello\n\nWorld");
/// ```
#[derive(Debug)]
pub struct Converter {
    rules: RuleSet,
}

impl Converter {
    /// Create a converter with a custom rule set.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Create a converter with the `DokuWiki` rule set.
    #[must_use]
    pub fn dokuwiki(links: &LinkConfig) -> Self {
        Self::new(RuleSet::dokuwiki(links))
    }

    /// Rule set used for text lines.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Convert `DokuWiki` markup to Gemtext.
    ///
    /// Returns `None` for empty input. Conversion is total otherwise:
    /// unmatched markup passes through unchanged.
    #[must_use]
    pub fn convert(&self, raw: &str) -> Option<Conversion> {
        if raw.is_empty() {
            return None;
        }

        let mut scanner = BlockScanner::new(&self.rules);
        for line in raw.split('\n') {
            scanner.push_line(line.strip_suffix('\r').unwrap_or(line));
        }
        let (lines, mut warnings) = scanner.finish();

        let lines = assemble(table::synthesize(lines, &mut warnings));

        Some(Conversion {
            text: lines.join("\n"),
            lines,
            warnings,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::dokuwiki(&LinkConfig::default())
    }
}

/// A line split off by a link or line break that starts with `- ` gets the
/// same `* ` marker the list rule would give it on the next conversion.
fn list_item(piece: &str) -> Cow<'_, str> {
    match piece.strip_prefix('-') {
        Some(rest) if rest.starts_with([' ', '\t']) => {
            Cow::Owned(format!("* {}", rest.trim_start()))
        }
        _ => Cow::Borrowed(piece),
    }
}

/// Flatten scanned lines into output lines.
///
/// Text lines are split at rule-inserted breaks, stripped of tags and
/// placeholders, and right-trimmed. Blank text runs collapse to a single
/// blank line; leading and trailing blanks are dropped. Raw lines pass
/// through untouched.
fn assemble(lines: Vec<Line>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut after_blank = true;

    for line in lines {
        match line {
            Line::Text(text) => {
                let text = restore_brackets(&strip_tags(&text)).replace(LINE_BREAK, "\n");
                for (i, piece) in text.split('\n').enumerate() {
                    let piece = if i == 0 {
                        Cow::Borrowed(piece.trim_end())
                    } else {
                        list_item(piece.trim())
                    };

                    if piece.is_empty() {
                        if !after_blank {
                            out.push(String::new());
                            after_blank = true;
                        }
                    } else {
                        // A text line must never open a fence on re-conversion
                        let piece = if piece.starts_with(FENCE) {
                            format!(" {piece}")
                        } else {
                            piece.into_owned()
                        };
                        out.push(piece);
                        after_blank = false;
                    }
                }
            }
            Line::Raw(raw) => {
                out.push(raw);
                after_blank = false;
            }
            Line::Fence => {
                out.push(FENCE.to_owned());
                after_blank = false;
            }
        }
    }

    if out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Converter: Send, Sync);

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ConversionRule, Replacement};

    fn convert(input: &str) -> String {
        Converter::default().convert(input).unwrap().text
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Converter::default().convert(""), None);
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let input = "====== Title ======\n\nSome **bold** text.\n\n===== Part =====\nMore";

        assert_eq!(
            convert(input),
            "# Title\n\nSome bold text.\n\n## Part\n\nMore"
        );
    }

    #[test]
    fn test_heading_levels_collapse() {
        let input = "# a\n## b\n### c\n#### d\n##### e\n###### f";

        assert_eq!(
            convert(input),
            "# a\n\n## b\n\n### c\n\n### d\n\n### e\n\n### f"
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(convert("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(convert("\n\na\n\n\n"), "a");
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(convert("a\r\n\r\nb\r\n"), "a\n\nb");
    }

    #[test]
    fn test_relative_link_becomes_link_line() {
        assert_eq!(
            convert("See [[some:page|Label]] for details."),
            "See\n=> /some:page Label\nfor details."
        );
    }

    #[test]
    fn test_wikipedia_link_inline() {
        let out = convert("Read about [[wp>Cat|Cats]] here");

        assert!(out.contains("Cats ( https://en.wikipedia.org/wiki/Cat )"));
    }

    #[test]
    fn test_media_link_with_custom_root() {
        let converter = Converter::dokuwiki(&LinkConfig {
            site_root: "/".to_owned(),
            media_root: "/files/".to_owned(),
        });

        assert_eq!(
            converter.convert("{{wiki:logo.png|Logo}}").unwrap().text,
            "=> /files/wiki:logo.png Logo"
        );
    }

    #[test]
    fn test_raw_block_preserved() {
        let input = "<code>\n====== raw ======\n  **keep**   spacing\n[[a|b]]\n</code>";

        assert_eq!(
            convert(input),
            "```\n====== raw ======\n  **keep**   spacing\n[[a|b]]\n```"
        );
    }

    #[test]
    fn test_raw_block_keeps_blank_lines() {
        assert_eq!(convert("<code>\na\n\n\n\nb\n</code>"), "```\na\n\n\n\nb\n```");
    }

    #[test]
    fn test_file_block_with_caption() {
        assert_eq!(
            convert("<file - hello.sh>\necho hi\n</file>"),
            "hello.sh\n```\necho hi\n```"
        );
    }

    #[test]
    fn test_unclosed_block_reports_warning() {
        let result = Converter::default().convert("<code>\nx").unwrap();

        assert_eq!(result.text, "```\nx\n```");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_table() {
        let input = "^A^B^\n|1|2|\n\nafter";

        assert_eq!(convert(input), "```\nA | B\n--+--\n1 | 2\n```\n\nafter");
    }

    #[test]
    fn test_table_without_rows() {
        let result = Converter::default().convert("^A^B^\n\ntext").unwrap();

        assert_eq!(result.text, "text");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_line_break_placeholder() {
        assert_eq!(convert(r"one\\ two"), "one\ntwo");
    }

    #[test]
    fn test_ipv6_restored() {
        assert_eq!(
            convert("[[http://[::1]:1965/|Local]]"),
            "Local ( http://[::1]:1965/ )"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(convert("  - one\n  * two"), "* one\n* two");
    }

    #[test]
    fn test_tags_stripped() {
        assert_eq!(convert("<del>old</del> <wrap hi>new</wrap>"), "old new");
    }

    #[test]
    fn test_lines_match_text() {
        let result = Converter::default().convert("# a\nb").unwrap();

        assert_eq!(result.lines, vec!["# a", "", "b"]);
        assert_eq!(result.text, result.lines.join("\n"));
    }

    #[test]
    fn test_split_line_dash_becomes_list_item() {
        assert_eq!(convert("See [[a|b]] - c"), "See\n=> /a b\n* c");
        assert_eq!(convert(r"one\\ - two"), "one\n* two");
        assert_eq!(convert(r"one\\ -two"), "one\n-two");
    }

    #[test]
    fn test_idempotent() {
        let converter = Converter::default();
        let inputs = [
            "====== Title ======\nText with **bold** and //italic//.\n\n\n\n  - item one\n  - item two",
            "See [[wiki:syntax|Syntax]], [[wp>Cat|Cats]] and [[https://example.com]].",
            "{{wiki:logo.png?100|Logo}}\n[[this>doku.php|Home]]\n~~NOTOC~~",
            "<file python app.py>\nprint('x')\n```\n</file>\nafter <code>inline</code> text",
            "^ Name ^ Value ^\n| a | 1 |\n| b | 2 |\n\nnext",
            "line\\\\ break and [[http://[2001:db8::1]/|v6]]",
            "<code>\nunclosed",
            "See [[a|b]] - c",
            r"one\\ - two",
        ];

        for input in inputs {
            let once = converter.convert(input).unwrap().text;
            let twice = converter.convert(&once).unwrap().text;
            assert_eq!(twice, once, "input: {input:?}");
        }
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let rules = RuleSet::new().with_rule(
            ConversionRule::new(r"^!(.*)$", Replacement::template("# ${1}")).unwrap(),
        );
        let converter = Converter::new(rules);

        assert_eq!(converter.convert("!Title\n**kept**").unwrap().text, "# Title\n**kept**");
    }
}
