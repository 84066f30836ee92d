//! Configuration file parser.
//!
//! Parses the INI-like `[section]` / `key = value` format.

use super::Config;
use crate::error::{Error, Result};

/// Parses configuration file content into a `Config` instance.
///
/// # Errors
///
/// Returns `Error::InvalidConfig` with the 1-based line number for an
/// unterminated section header, an empty section or key name, or a key
/// that appears before any section.
pub fn parse(content: &str) -> Result<Config> {
    let mut config = Config::new();
    let mut current: Option<(String, String)> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        let invalid = |reason: &str| Error::InvalidConfig {
            line: line_no,
            reason: reason.to_string(),
        };

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let (section, subsection) =
                parse_section_header(line).ok_or_else(|| invalid("malformed section header"))?;
            if section.is_empty() {
                return Err(invalid("empty section name"));
            }
            current = Some((section, subsection));
            continue;
        }

        let (section, subsection) = current
            .as_ref()
            .ok_or_else(|| invalid("key outside of any section"))?;
        let (key, value) = parse_key_value(line);
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        config.set(section, subsection, &key, &value);
    }

    Ok(config)
}

/// Parses a section header like `[section]` or `[section "subsection"]`.
fn parse_section_header(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;

    if let Some(quote_start) = inner.find('"') {
        let section = inner[..quote_start].trim().to_string();
        let rest = &inner[quote_start + 1..];
        let quote_end = rest.rfind('"')?;
        if !rest[quote_end + 1..].trim().is_empty() {
            return None;
        }
        return Some((section, unescape(&rest[..quote_end])));
    }

    Some((inner.trim().to_string(), String::new()))
}

/// Parses `key = value`. A bare `key` means `true`.
fn parse_key_value(line: &str) -> (String, String) {
    match line.split_once('=') {
        Some((key, value)) => (key.trim().to_string(), parse_value(value)),
        None => (line.trim().to_string(), "true".to_string()),
    }
}

/// Parses a value, handling quotes, escapes and inline comments.
fn parse_value(s: &str) -> String {
    let s = remove_inline_comment(s.trim());

    if let Some(quoted) = s.strip_prefix('"') {
        if let Some(end) = quoted.rfind('"') {
            return unescape(&quoted[..end]);
        }
    }

    unescape(s)
}

/// Removes a trailing `#` or `;` comment that is not inside quotes.
fn remove_inline_comment(s: &str) -> &str {
    let mut in_quotes = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' => escape_next = true,
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return s[..i].trim_end(),
            _ => {}
        }
    }

    s
}

/// Resolves `\n`, `\t`, `\\` and `\"`; other backslashes are kept.
fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let replacement = match chars.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('\\') => '\\',
            Some('"') => '"',
            _ => {
                result.push(c);
                continue;
            }
        };
        result.push(replacement);
        chars.next();
    }

    result
}

/// Quotes a value for writing when it would not survive a plain round trip.
pub(super) fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value.contains(['#', ';', '"', '\\', '\n', '\t']);
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
