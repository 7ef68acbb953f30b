//! `@mention` recognition and identity canonicalisation.
//!
//! Two syntaxes are recognised: a bare `@word` where the word is made of
//! ASCII letters, digits, `_` and `-`, and a braced `@{Display Name}` that may
//! contain anything except a closing brace. Nothing here fails: text that
//! looks almost like a mention (a stray `@`, an unterminated brace) is plain
//! text and passes through untouched.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@\{([^}]+)\}|@([A-Za-z0-9_-]+)").expect("Failed to compile mention regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));
static DISALLOWED_KEY_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("Failed to compile key charset regex"));
static UNDERSCORE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("Failed to compile underscore regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionSyntax {
    Bare,
    Braced,
}

/// One recognised mention occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken {
    /// Text between `@` (or `@{`/`}`) delimiters, as written.
    pub raw: String,
    /// Canonical identity key of `raw`.
    pub key: String,
    pub syntax: MentionSyntax,
    /// Byte range of the whole occurrence, delimiters included.
    pub span: Range<usize>,
}

/// Canonical key: lowercase, whitespace runs become `_`, anything outside
/// `[a-z0-9_-]` is dropped, repeated underscores collapse and edge
/// underscores are trimmed. Idempotent.
pub fn normalize(token: &str) -> String {
    let lowered = token.trim().to_lowercase();
    let underscored = WHITESPACE_RE.replace_all(&lowered, "_");
    let filtered = DISALLOWED_KEY_CHARS_RE.replace_all(&underscored, "");
    let collapsed = UNDERSCORE_RUN_RE.replace_all(&filtered, "_");
    collapsed.trim_matches('_').to_string()
}

/// All mention occurrences in left-to-right order, duplicates kept.
pub fn scan(text: &str) -> Vec<MentionToken> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (raw, syntax) = match (caps.get(1), caps.get(2)) {
                (Some(braced), _) => (braced.as_str(), MentionSyntax::Braced),
                (None, Some(bare)) => (bare.as_str(), MentionSyntax::Bare),
                (None, None) => return None,
            };
            Some(MentionToken {
                raw: raw.to_string(),
                key: normalize(raw),
                syntax,
                span: whole.range(),
            })
        })
        .collect()
}

/// Raw mention strings in order of occurrence.
pub fn parse_tokens(text: &str) -> Vec<String> {
    scan(text).into_iter().map(|token| token.raw).collect()
}

/// Removes every mention and tidies the whitespace left behind.
pub fn strip(text: &str) -> String {
    let without = MENTION_RE.replace_all(text, "");
    WHITESPACE_RE.replace_all(&without, " ").trim().to_string()
}

/// Distinct canonical keys an identity answers to, stable id first.
/// Inputs that normalise to nothing contribute no key.
pub fn build_identity_keys(id: &str, display_name: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(2);
    for key in [normalize(id), normalize(display_name)] {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// `@{name}` form for inserting a mention by display name. Closing braces in
/// the name would end the mention early and are dropped.
pub fn format_display_mention(name: &str) -> String {
    let name: String = name.chars().filter(|&c| c != '}').collect();
    format!("@{{{name}}}")
}
