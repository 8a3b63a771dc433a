//! Ordered line rewrite rules.
//!
//! A [`RuleSet`] is an ordered list of `(pattern, replacement)` pairs applied
//! to every markup line outside raw blocks. Order matters: a rule sees the
//! output of every rule before it on the same line.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::MarkupError;

/// Placeholder for an escaped line break (`\\`), expanded at final assembly.
pub(crate) const LINE_BREAK: char = '\u{E000}';
/// Placeholder for `[` around an `IPv6` address literal.
pub(crate) const IPV6_OPEN: char = '\u{E001}';
/// Placeholder for `]` around an `IPv6` address literal.
pub(crate) const IPV6_CLOSE: char = '\u{E002}';

static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?|gemini)://").unwrap());

/// Restore `IPv6` bracket placeholders.
pub(crate) fn restore_brackets(text: &str) -> String {
    text.replace(IPV6_OPEN, "[").replace(IPV6_CLOSE, "]")
}

/// Link prefixes used when rewriting relative links and media embeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// Prefix for page links (default `/`).
    pub site_root: String,
    /// Prefix for media links (default `/media/`).
    pub media_root: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            site_root: "/".to_owned(),
            media_root: "/media/".to_owned(),
        }
    }
}

/// Replacement callback type.
pub type ReplaceFn = dyn Fn(&Captures<'_>) -> String + Send + Sync;

/// Replacement strategy of a [`ConversionRule`].
pub enum Replacement {
    /// Template with `$n` / `${n}` capture references.
    Template(String),
    /// Function of the captures.
    Function(Box<ReplaceFn>),
}

impl Replacement {
    /// Create a template replacement.
    #[must_use]
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }

    /// Create a function replacement.
    #[must_use]
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Self::Function(Box::new(f))
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Single line rewrite rule.
#[derive(Debug)]
pub struct ConversionRule {
    regex: Regex,
    replacement: Replacement,
}

impl ConversionRule {
    /// Compile a rule from a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::InvalidPattern`] if the pattern doesn't compile.
    pub fn new(pattern: &str, replacement: Replacement) -> Result<Self, MarkupError> {
        let regex = Regex::new(pattern).map_err(|source| MarkupError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self::from_regex(regex, replacement))
    }

    /// Create a rule from a compiled regex.
    #[must_use]
    pub fn from_regex(regex: Regex, replacement: Replacement) -> Self {
        Self { regex, replacement }
    }

    /// Rule pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replace every match in `line`.
    ///
    /// Returns the input unchanged (borrowed) if nothing matched.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match &self.replacement {
            Replacement::Template(template) => self.regex.replace_all(line, template.as_str()),
            Replacement::Function(f) => self.regex.replace_all(line, |caps: &Captures<'_>| f(caps)),
        }
    }
}

/// Ordered list of conversion rules.
///
/// # Example
///
/// ```
/// use gw_markup::{ConversionRule, LinkConfig, Replacement, RuleSet};
///
/// let rules = RuleSet::dokuwiki(&LinkConfig::default())
///     .with_rule(ConversionRule::new(r"~~CLOSETOC~~", Replacement::template(""))?);
///
/// assert_eq!(rules.apply("~~CLOSETOC~~"), "");
/// # Ok::<(), gw_markup::MarkupError>(())
/// ```
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<ConversionRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `DokuWiki` to Gemtext rule table.
    ///
    /// In order: headings, inline emphasis, whitespace runs, links (`IPv6`
    /// guard, `wp`, `doku`, index menus, `this`, relative, absolute, media),
    /// lists, escaped line breaks, plugin macros and punctuation cleanup.
    #[must_use]
    pub fn dokuwiki(links: &LinkConfig) -> Self {
        let mut rules = Self::new();

        // Headings: `#` repeats, then symmetric `=` repeats
        for (markers, level) in [(1, 1), (2, 2), (3, 3), (4, 3), (5, 3), (6, 3)] {
            rules.push(builtin(
                &format!(r"^([ \t]*)#{{{markers}}}([^#].*)$"),
                Replacement::function(move |caps| heading(&caps[1], level, &caps[2])),
            ));
        }
        for (markers, level) in [(6, 1), (5, 2), (4, 3), (3, 3), (2, 3), (1, 3)] {
            rules.push(builtin(
                &format!(r"^([ \t]*)={{{markers}}}([^=].*?)={{{markers}}}[ \t]*$"),
                Replacement::function(move |caps| heading(&caps[1], level, &caps[2])),
            ));
        }

        // Emphasis
        rules.push(builtin(r"\*\*(.+?)\*\*", Replacement::template("${1}")));
        rules.push(builtin(r"''(.+?)''", Replacement::template("${1}")));
        rules.push(builtin(r"%%(.+?)%%", Replacement::template("${1}")));
        rules.push(builtin(r"__(.+?)__", Replacement::template("${1}")));
        rules.push(builtin(r"(^|[^:])//(.+?)//", Replacement::template("${1}${2}")));

        rules.push(builtin(r"[ \t]{2,}", Replacement::template(" ")));

        // Links
        rules.push(builtin(
            r"(://)\[([0-9A-Fa-f:.]+)\]",
            Replacement::function(|caps| format!("{}{IPV6_OPEN}{}{IPV6_CLOSE}", &caps[1], &caps[2])),
        ));
        rules.push(builtin(
            r"\[\[wp([A-Za-z]{2})?>([^|\]]+)(?:\|([^\]]*))?\]\]",
            Replacement::function(|caps| {
                let lang = caps.get(1).map_or("en", |m| m.as_str()).to_lowercase();
                let target = caps[2].trim().replace(' ', "_");
                let label = label_or(caps.get(3), &caps[2]);
                format!("{label} ( https://{lang}.wikipedia.org/wiki/{target} )")
            }),
        ));
        rules.push(builtin(
            r"\[\[doku>([^|\]]+)(?:\|([^\]]*))?\]\]",
            Replacement::function(|caps| {
                let target = caps[1].trim().replace(' ', "_");
                let label = label_or(caps.get(2), &caps[1]);
                format!("{label} ( https://www.dokuwiki.org/{target} )")
            }),
        ));
        rules.push(builtin(
            r"\{\{indexmenu(?:_n)?>[^}]*\}\}",
            Replacement::template(""),
        ));
        rules.push(builtin(
            r"\[\[this>([^|\]]*)(?:\|([^\]]*))?\]\]",
            Replacement::function(|caps| label_or(caps.get(2), &caps[1])),
        ));

        let site_root = links.site_root.clone();
        rules.push(builtin(
            r"\[\[([^|\]]+)(?:\|([^\]]*))?\]\]",
            Replacement::function(move |caps| {
                let target = caps[1].trim();
                if ABSOLUTE_URL.is_match(target) {
                    return caps[0].to_owned();
                }
                let path = target.trim_start_matches(':').replace(' ', "_");
                let label = label_or(caps.get(2), target);
                format!("\n=> {site_root}{path} {label}\n")
            }),
        ));
        rules.push(builtin(
            r"(?i)\[\[((?:https?|gemini)://[^|\]]+)(?:\|([^\]]*))?\]\]",
            Replacement::function(|caps| {
                let url = caps[1].trim();
                match caps.get(2).map(|m| m.as_str().trim()).filter(|l| !l.is_empty()) {
                    Some(label) => format!("{label} ( {url} )"),
                    None => url.to_owned(),
                }
            }),
        ));

        let media_root = links.media_root.clone();
        rules.push(builtin(
            r"\{\{([^}|]+)(?:\|([^}]*))?\}\}",
            Replacement::function(move |caps| {
                let target = caps[1].trim();
                if ABSOLUTE_URL.is_match(target) {
                    return caps[0].to_owned();
                }
                let path = target.trim_start_matches(':');
                let path = path.split_once('?').map_or(path, |(path, _)| path);
                let label = label_or(caps.get(2), path);
                format!("\n=> {media_root}{path} {label}\n")
            }),
        ));

        // Lists
        rules.push(builtin(r"^[ \t]*-[ \t]+", Replacement::template("* ")));
        rules.push(builtin(r"^[ \t]+\*[ \t]+", Replacement::template("* ")));

        rules.push(builtin(
            r"\\\\(?:[ \t]+|$)",
            Replacement::template(LINE_BREAK.to_string()),
        ));

        // Plugin macros
        rules.push(builtin(
            r"~~(?:DISCUSSION[^~]*|INFO:[^~]*|NOTOC|NOCACHE)~~",
            Replacement::template(""),
        ));

        // Punctuation stranded at the start of a line split off by a link
        rules.push(builtin(r"\n[.,;:]+", Replacement::template("\n")));

        rules
    }

    /// Append a rule (builder style).
    #[must_use]
    pub fn with_rule(mut self, rule: ConversionRule) -> Self {
        self.push(rule);
        self
    }

    /// Append a rule.
    pub fn push(&mut self, rule: ConversionRule) {
        self.rules.push(rule);
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in application order.
    pub fn iter(&self) -> impl Iterator<Item = &ConversionRule> {
        self.rules.iter()
    }

    /// Run every rule over `line` in order.
    #[must_use]
    pub fn apply(&self, line: &str) -> String {
        let mut current = line.to_owned();
        for rule in &self.rules {
            let replaced = match rule.apply(&current) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = replaced {
                current = s;
            }
        }
        current
    }
}

/// Compile a built-in rule. Built-in patterns are constants.
fn builtin(pattern: &str, replacement: Replacement) -> ConversionRule {
    ConversionRule::from_regex(Regex::new(pattern).unwrap(), replacement)
}

fn heading(indent: &str, level: usize, text: &str) -> String {
    format!("{indent}{} {}\n", "#".repeat(level), text.trim())
}

/// Trimmed label, or the trimmed fallback if the label is absent or blank.
fn label_or(label: Option<regex::Match<'_>>, fallback: &str) -> String {
    label
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| fallback.trim())
        .to_owned()
}
