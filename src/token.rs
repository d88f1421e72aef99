//! Placeholder recognition and repair.
//!
//! Placeholders reach us after a lossy trip through a layout engine: braces
//! get split (`{ {`), neighbouring tokens get glued (`}}{{`), pipes vanish
//! (`textbox:nameoptions:a,b`) and option keys pick up stray characters
//! (`Ivalue`). Recognition anchors on the field-kind keyword, repair rebuilds
//! the `kind:name|key:value` shape.

use std::sync::LazyLock;

use regex::Regex;

use crate::field::{OPTION_KEYWORDS, anchor_keywords};
use crate::sanitize::{is_invisible, sanitize};

/// Minimum normalized Levenshtein similarity for a fuzzy option-key match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.72;

/// Prefix characters a wrapped or OCR'd key commonly picks up.
const NOISE_PREFIXES: [char; 4] = ['i', 'l', '1', 'j'];

/// A placeholder candidate located in page text. Offsets are char indices
/// into the text handed to [`recognize`], `end` exclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn alternation(words: impl Iterator<Item = &'static str>) -> String {
    let mut words: Vec<&str> = words.collect();
    // Longest first so `rowheight:` wins over `height:` at the same start.
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|")
}

static RE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)(?:{}):", alternation(anchor_keywords()))).expect("anchor pattern is valid")
});
static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\{{?\{{?((?:{}):[A-Za-z0-9_\-]+[^{{}}\s]*)\}}?\}}?",
        alternation(anchor_keywords())
    ))
    .expect("placeholder pattern is valid")
});
static RE_OPTION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)(?:{}):", alternation(OPTION_KEYWORDS.iter().copied())))
        .expect("option pattern is valid")
});

/// Page text being rewritten, remembering where every char came from.
struct Traced {
    chars: Vec<char>,
    origin: Vec<usize>,
}

impl Traced {
    fn new(text: &str) -> Self {
        let (chars, origin) = text
            .chars()
            .enumerate()
            .filter(|(_, c)| !is_invisible(*c))
            .map(|(i, c)| (c, i))
            .unzip();
        Traced { chars, origin }
    }

    /// `{ {` -> `{{` and `} }` -> `}}`.
    fn close_braces(self) -> Self {
        let mut out = Traced { chars: Vec::new(), origin: Vec::new() };
        let mut i = 0;
        while i < self.chars.len() {
            let c = self.chars[i];
            out.chars.push(c);
            out.origin.push(self.origin[i]);
            i += 1;
            if c == '{' || c == '}' {
                let mut j = i;
                while j < self.chars.len() && self.chars[j].is_whitespace() {
                    j += 1;
                }
                if j > i && j < self.chars.len() && self.chars[j] == c {
                    i = j;
                }
            }
        }
        out
    }

    /// Insert a space wherever a new placeholder starts right after the
    /// previous one: `}}{{` and keyword anchors glued onto preceding text.
    fn separate_tokens(self) -> Self {
        let text: String = self.chars.iter().collect();
        let mut boundaries: Vec<usize> = Vec::new();
        let char_at_byte = byte_to_char_index(&text);

        for (byte, _) in text.match_indices("}}{{") {
            boundaries.push(char_at_byte[byte] + 2);
        }
        for m in RE_ANCHOR.find_iter(&text) {
            let at = char_at_byte[m.start()];
            if at == 0 {
                continue;
            }
            let prev = self.chars[at - 1];
            if prev.is_whitespace() || prev == '{' {
                continue;
            }
            boundaries.push(at);
        }
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut out = Traced { chars: Vec::new(), origin: Vec::new() };
        let mut next = boundaries.iter().peekable();
        for (i, (&c, &o)) in self.chars.iter().zip(&self.origin).enumerate() {
            if next.peek() == Some(&&i) {
                next.next();
                out.chars.push(' ');
                out.origin.push(o);
            }
            out.chars.push(c);
            out.origin.push(o);
        }
        out
    }
}

fn byte_to_char_index(text: &str) -> Vec<usize> {
    let mut map = vec![0; text.len() + 1];
    let mut count = 0;
    for (byte, c) in text.char_indices() {
        for slot in &mut map[byte..byte + c.len_utf8()] {
            *slot = count;
        }
        count += 1;
    }
    map[text.len()] = count;
    map
}

/// Find placeholder candidates in `page_text`, in source order.
pub fn recognize(page_text: &str) -> Vec<RawToken> {
    let traced = Traced::new(page_text).close_braces().separate_tokens();
    let text: String = traced.chars.iter().collect();
    let char_at_byte = byte_to_char_index(&text);
    let source: Vec<char> = page_text.chars().collect();

    RE_PLACEHOLDER
        .find_iter(&text)
        .filter_map(|m| {
            let first = char_at_byte[m.start()];
            let last = char_at_byte[m.end()].checked_sub(1)?;
            let start = traced.origin[first];
            let end = traced.origin[last] + 1;
            Some(RawToken {
                text: source[start..end].iter().collect(),
                start,
                end,
            })
        })
        .collect()
}

fn is_enclosing(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | '(' | ')')
}

/// Strip wrapping brackets. A trailing `)`/`]` is only dropped while it is
/// unbalanced, so scripts like `f(x)` survive.
fn strip_enclosing(token: &str) -> &str {
    let mut s = token.trim_start_matches(is_enclosing);
    loop {
        let Some(last) = s.chars().next_back() else { break };
        let unbalanced = match last {
            '}' => true,
            ')' => s.matches(')').count() > s.matches('(').count(),
            ']' => s.matches(']').count() > s.matches('[').count(),
            '{' | '(' | '[' => true,
            _ => false,
        };
        if !unbalanced {
            break;
        }
        s = &s[..s.len() - last.len_utf8()];
    }
    s
}

/// Rebuild a well-formed `kind:name|key:value` token: drop invisible chars,
/// wrapping brackets and whitespace, restore missing `|` before known option
/// keys, and collapse/trim pipes.
pub fn normalize_placeholder_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    let sanitized = sanitize(token);
    let spaceless: String = sanitized.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = strip_enclosing(&spaceless);

    let mut separated = String::with_capacity(compact.len() + 8);
    let mut copied = 0;
    for m in RE_OPTION_KEY.find_iter(compact) {
        separated.push_str(&compact[copied..m.start()]);
        match compact[..m.start()].chars().next_back() {
            None | Some('|') | Some(':') => {}
            Some(_) => separated.push('|'),
        }
        separated.push_str(m.as_str());
        copied = m.end();
    }
    separated.push_str(&compact[copied..]);

    let mut collapsed = String::with_capacity(separated.len());
    for c in separated.chars() {
        if c == '|' && collapsed.ends_with('|') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('|').to_string()
}

/// Normalize an option key that may carry noise, e.g. `Ivalue` -> `value`,
/// `reqiured` -> `required`. Keys that match nothing come back cleaned but
/// otherwise unchanged. `None` for keys with no alphanumeric content.
pub fn normalize_option_key(key: &str) -> Option<String> {
    normalize_option_key_with(key, DEFAULT_FUZZY_THRESHOLD)
}

pub fn normalize_option_key_with(key: &str, threshold: f64) -> Option<String> {
    let lowered = sanitize(key).trim().to_lowercase();
    if OPTION_KEYWORDS.contains(&lowered.as_str()) {
        return Some(lowered);
    }
    let base = lowered.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if base.is_empty() {
        return None;
    }
    if OPTION_KEYWORDS.contains(&base) {
        return Some(base.to_string());
    }
    for prefix in NOISE_PREFIXES {
        if let Some(stripped) = base.strip_prefix(prefix)
            && OPTION_KEYWORDS.contains(&stripped)
        {
            return Some(stripped.to_string());
        }
    }

    // Highest similarity wins; ties keep keyword-list order.
    let mut best: Option<(&str, f64)> = None;
    for candidate in OPTION_KEYWORDS {
        let score = strsim::normalized_levenshtein(base, candidate);
        if score >= threshold && best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    match best {
        Some((keyword, score)) => {
            log::debug!("option key '{key}' read as '{keyword}' (similarity {score:.2})");
            Some(keyword.to_string())
        }
        None => Some(base.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_enclosing_keeps_balanced_parens() {
        assert_eq!(strip_enclosing("{{textbox:a}}"), "textbox:a");
        assert_eq!(strip_enclosing("(textbox:a|calculation:f(x))"), "textbox:a|calculation:f(x)");
        assert_eq!(strip_enclosing("[textbox:a]"), "textbox:a");
    }

    #[test]
    fn byte_map_counts_multibyte_chars() {
        let map = byte_to_char_index("aé{");
        assert_eq!(map, vec![0, 1, 1, 2, 3]);
    }
}
