//! Line cleaning, record splitting and token scanning for deck text.
//!
//! Deck text is processed line by line: comments are stripped, lines are
//! trimmed, and data lines are accumulated into slash-terminated records
//! which are then split into raw tokens. Quoting (`'...'` and `"..."`)
//! protects whitespace, `/` and `--` inside a token.

use std::collections::VecDeque;

/// One cleaned input line with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub text: String,
    pub line: u32,
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

/// Find the byte offset of the first occurrence of `pat` outside quotes.
///
/// An unbalanced quote hides everything after it, so the search reports no
/// match in that case.
fn find_unquoted(s: &str, pat: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => {
                if is_quote(c) {
                    quote = Some(c);
                } else if s[i..].starts_with(pat) {
                    return Some(i);
                }
            }
        }
    }
    None
}

/// Remove a trailing `--` comment, respecting quotes.
pub fn strip_comments(line: &str) -> &str {
    match find_unquoted(line, "--") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Comment-stripped and trimmed line.
pub fn clean_line(line: &str) -> &str {
    strip_comments(line).trim_matches(is_separator)
}

/// Split deck text into cleaned lines. Empty lines are kept so that line
/// numbers stay aligned with the source.
pub fn clean_source(src: &str) -> Vec<SourceLine> {
    src.lines()
        .enumerate()
        .map(|(i, raw)| SourceLine {
            text: clean_line(raw).to_owned(),
            line: (i + 1) as u32,
        })
        .collect()
}

/// Cut a line after its first unquoted `/`, keeping the slash.
/// Returns the kept text and whether a slash was found.
pub fn del_after_slash(line: &str) -> (&str, bool) {
    match find_unquoted(line, "/") {
        Some(pos) => (&line[..=pos], true),
        None => (line, false),
    }
}

/// First whitespace-delimited word of a line, uppercased.
pub fn make_deck_name(line: &str) -> String {
    line.split(is_separator)
        .next()
        .unwrap_or("")
        .to_ascii_uppercase()
}

/// Whether `name` has the shape of a keyword heading.
pub fn valid_deck_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+')
}

/// Split record text into raw tokens. Quoted runs stay inside their token
/// (including the quotes) so `2*'A B'` is one token.
pub fn split_tokens(record: &str) -> Result<VecDeque<String>, String> {
    let mut tokens = VecDeque::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in record.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if is_separator(c) || c == '\n' {
                    if !current.is_empty() {
                        tokens.push_back(std::mem::take(&mut current));
                    }
                } else {
                    if is_quote(c) {
                        quote = Some(c);
                    }
                    current.push(c);
                }
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated quote {} in record '{}'", q, record));
    }
    if !current.is_empty() {
        tokens.push_back(current);
    }
    Ok(tokens)
}

/// Largest accepted `N` in a repeat marker.
pub const MAX_REPEAT_COUNT: usize = 10_000_000;

/// A repeat marker `N*value`, `N*` or `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct StarToken {
    pub count: usize,
    pub value: Option<String>,
}

impl StarToken {
    /// Whether `token` is a repeat marker: unquoted, with only digits (or
    /// nothing) in front of the first `*`. Tokens like `OP*` are plain text.
    pub fn is_star_token(token: &str) -> bool {
        if token.starts_with(is_quote) {
            return false;
        }
        match token.find('*') {
            Some(pos) => token[..pos].bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }

    pub fn parse(token: &str) -> Result<StarToken, String> {
        let pos = token
            .find('*')
            .ok_or_else(|| format!("'{}' is not a repeat marker", token))?;
        let count_str = &token[..pos];
        let count = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse::<usize>()
                .map_err(|_| format!("invalid repeat count in '{}'", token))?
        };
        if count == 0 {
            return Err(format!("repeat count must be positive in '{}'", token));
        }
        if count > MAX_REPEAT_COUNT {
            return Err(format!(
                "repeat count in '{}' exceeds the limit of {}",
                token, MAX_REPEAT_COUNT
            ));
        }
        let rest = &token[pos + 1..];
        let value = if rest.is_empty() {
            None
        } else {
            Some(rest.to_owned())
        };
        Ok(StarToken { count, value })
    }

    /// Text of this marker with `count` replaced, used to push the unused
    /// part of a run back onto a record.
    pub fn with_count(&self, count: usize) -> String {
        match &self.value {
            Some(v) => format!("{}*{}", count, v),
            None => format!("{}*", count),
        }
    }
}

/// The tokens of one slash-terminated record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub tokens: VecDeque<String>,
}

impl RawRecord {
    /// Build a record from its text with the terminating slash removed.
    pub fn parse(text: &str) -> Result<RawRecord, String> {
        Ok(RawRecord {
            tokens: split_tokens(text)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    pub fn push_front(&mut self, token: String) {
        self.tokens.push_front(token)
    }

    /// Whether this record is the single token `__RESET__`.
    pub fn is_reset_marker(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0] == crate::deck::RESET_MARKER
    }
}
