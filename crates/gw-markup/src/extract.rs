//! Title and link extraction from converted Gemtext.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::FENCE;

static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]?#([^#].*)$").unwrap());
// Parentheses are kept only when balanced, as in Wikipedia article names.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:https?|gemini)://(?:\[[0-9a-f:.]+\](?:[^\s()<>\[\]{}|"']|\([^\s()]*\))*|(?:[^\s()<>\[\]{}|"']|\([^\s()]*\))+)"#,
    )
    .unwrap()
});

/// First level-1 heading of converted text, trimmed.
///
/// Lines inside fences are skipped, so a `#include` in a code sample is
/// never taken for a title. Returns `None` if no non-empty heading exists.
///
/// ```
/// assert_eq!(gw_markup::get_h1("intro\n# Title\n## Sub"), Some("Title".to_owned()));
/// ```
#[must_use]
pub fn get_h1(text: &str) -> Option<String> {
    let mut in_fence = false;
    for line in text.lines() {
        if line.starts_with(FENCE) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = H1.captures(line) {
            let title = caps[1].trim();
            if !title.is_empty() {
                return Some(title.to_owned());
            }
        }
    }
    None
}

/// Absolute `http`, `https` and `gemini` URLs in order of first appearance,
/// without duplicates.
#[must_use]
pub fn get_links(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL.find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
        .filter(|url| seen.insert(*url))
        .map(str::to_owned)
        .collect()
}
