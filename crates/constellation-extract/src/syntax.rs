//! Low-level LaTeX delimiter scanning shared by the bibliography parsers and
//! the structure walker. All offsets are byte offsets; every delimiter
//! involved is ASCII, so returned offsets are always char boundaries.

use std::collections::HashMap;

use crate::assembler::is_escaped;

/// Precomputed `{`/`}` pairing for a whole text. Escaped braces (`\{`, `\}`)
/// are ignored. Built in one pass so group lookups are O(1).
#[derive(Debug, Default)]
pub struct BraceMap {
    close_of: HashMap<usize, usize>,
}

impl BraceMap {
    pub fn new(text: &str) -> Self {
        let mut close_of = HashMap::new();
        let mut stack: Vec<usize> = Vec::new();
        for (idx, b) in text.bytes().enumerate() {
            match b {
                b'{' if !is_escaped(text, idx) => stack.push(idx),
                b'}' if !is_escaped(text, idx) => {
                    if let Some(open) = stack.pop() {
                        close_of.insert(open, idx);
                    }
                }
                _ => {}
            }
        }
        Self { close_of }
    }

    /// Offset of the `}` closing the `{` at `open`, if balanced.
    pub fn close_for(&self, open: usize) -> Option<usize> {
        self.close_of.get(&open).copied()
    }
}

/// Depth-counting search for the delimiter closing the one at `open`.
/// Works for `{}` and `()`; escaped delimiters are skipped.
pub fn matching_close(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&open_ch) {
        return None;
    }
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        let b = bytes[idx];
        if b == b'\\' {
            idx += 2;
            continue;
        }
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
        idx += 1;
    }
    None
}

/// First offset at or after `pos` that is not whitespace, bounded by `end`.
pub fn skip_whitespace(text: &str, mut pos: usize, end: usize) -> usize {
    let bytes = text.as_bytes();
    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Offset of the `]` closing an optional argument opened at `open`.
/// Braced groups inside are skipped whole, so `[{a]b}]` is one argument.
pub fn bracket_close(text: &str, open: usize, end: usize, braces: &BraceMap) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut idx = open + 1;
    while idx < end {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'{' => idx = braces.close_for(idx).filter(|&c| c < end)? + 1,
            b']' => return Some(idx),
            _ => idx += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brace_map_pairs_and_ignores_escapes() {
        let text = r"{a{b}\{c}";
        let map = BraceMap::new(text);
        assert_eq!(map.close_for(0), Some(8));
        assert_eq!(map.close_for(2), Some(4));
        assert_eq!(map.close_for(6), None);
    }

    #[test]
    fn test_unclosed_brace_has_no_match() {
        let map = BraceMap::new("{a {b}");
        assert_eq!(map.close_for(0), None);
        assert_eq!(map.close_for(3), Some(5));
    }

    #[test]
    fn test_matching_close_parens_and_braces() {
        assert_eq!(matching_close("(a(b)c)", 0, b'(', b')'), Some(6));
        assert_eq!(matching_close(r"{a\}b}", 0, b'{', b'}'), Some(5));
        assert_eq!(matching_close("{a", 0, b'{', b'}'), None);
    }

    #[test]
    fn test_bracket_close_skips_groups() {
        let text = "[{a]b}] rest";
        let map = BraceMap::new(text);
        assert_eq!(bracket_close(text, 0, text.len(), &map), Some(6));
        assert_eq!(bracket_close("[never", 0, 6, &BraceMap::new("[never")), None);
    }
}
