//! Tolerant BibTeX reader.
//!
//! Records that cannot be delimited or whose fields cannot be read are
//! counted and skipped; the rest of the file is still read. `@string`
//! macros and `#` concatenation are supported, `@comment` and `@preamble`
//! are ignored.

use std::collections::HashMap;

use crate::models::{BibEntry, BibOrigin};
use crate::normalise::clean_latex;
use crate::syntax::{matching_close, skip_whitespace};

/// Fields left out of the matching text: long free text that mentions
/// other works, or tool metadata.
const IGNORED_FIELDS: &[&str] = &["abstract", "file", "keywords", "annote", "mendeley-tags"];

const MONTHS: &[(&str, &str)] = &[
    ("jan", "January"), ("feb", "February"), ("mar", "March"), ("apr", "April"),
    ("may", "May"), ("jun", "June"), ("jul", "July"), ("aug", "August"),
    ("sep", "September"), ("oct", "October"), ("nov", "November"), ("dec", "December"),
];

#[derive(Debug, Default)]
pub struct BibtexParse {
    pub entries: Vec<BibEntry>,
    pub malformed: usize,
}

pub fn parse(text: &str) -> BibtexParse {
    let mut out = BibtexParse::default();
    let mut strings: HashMap<String, String> = MONTHS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let bytes = text.as_bytes();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find('@') {
        let at = pos + rel;
        let type_start = at + 1;
        let type_end = bytes[type_start..]
            .iter()
            .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-'))
            .map_or(bytes.len(), |n| type_start + n);
        if type_end == type_start {
            pos = type_start;
            continue;
        }
        let entry_type = text[type_start..type_end].to_ascii_lowercase();

        let open = skip_whitespace(text, type_end, bytes.len());
        let close = match bytes.get(open) {
            Some(b'{') => matching_close(text, open, b'{', b'}'),
            Some(b'(') => matching_close(text, open, b'(', b')'),
            // Stray `@` in free text between records.
            _ => {
                pos = type_end;
                continue;
            }
        };
        let Some(close) = close else {
            out.malformed += 1;
            pos = open + 1;
            continue;
        };
        let body = &text[open + 1..close];
        pos = close + 1;

        match entry_type.as_str() {
            "comment" | "preamble" => {}
            "string" => match parse_fields(body, &strings) {
                Some(defs) => {
                    for (name, value) in defs {
                        strings.insert(name, value);
                    }
                }
                None => out.malformed += 1,
            },
            _ => match parse_entry(body, &strings) {
                Some(entry) => out.entries.push(entry),
                None => out.malformed += 1,
            },
        }
    }
    out
}

fn parse_entry(body: &str, strings: &HashMap<String, String>) -> Option<BibEntry> {
    let (key, rest) = body.split_once(',').unwrap_or((body, ""));
    let key = key.trim();
    if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '=' || c == '{' || c == '}') {
        return None;
    }

    let fields = parse_fields(rest, strings)?;
    let title = fields
        .iter()
        .find(|(name, _)| name == "title")
        .map(|(_, v)| clean_latex(v));
    let text = fields
        .iter()
        .filter(|(name, _)| !IGNORED_FIELDS.contains(&name.as_str()))
        .map(|(_, v)| clean_latex(v))
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(BibEntry {
        key: key.to_string(),
        text,
        title,
        origin: BibOrigin::Source,
    })
}

/// Parse `name = value, ...` pairs. Field names are lowercased.
fn parse_fields(body: &str, strings: &HashMap<String, String>) -> Option<Vec<(String, String)>> {
    let bytes = body.as_bytes();
    let end = bytes.len();
    let mut fields = Vec::new();
    let mut pos = 0;

    loop {
        while pos < end && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= end {
            return Some(fields);
        }

        let name_start = pos;
        while pos < end && !matches!(bytes[pos], b'=' | b',' | b'{' | b'}' | b'"') && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = body[name_start..pos].to_ascii_lowercase();
        pos = skip_whitespace(body, pos, end);
        if name.is_empty() || bytes.get(pos) != Some(&b'=') {
            return None;
        }
        pos = skip_whitespace(body, pos + 1, end);

        let mut value = String::new();
        loop {
            let (part, next) = parse_value_part(body, pos, strings)?;
            value.push_str(&part);
            pos = skip_whitespace(body, next, end);
            if bytes.get(pos) == Some(&b'#') {
                pos = skip_whitespace(body, pos + 1, end);
            } else {
                break;
            }
        }
        fields.push((name, value));
    }
}

/// One operand of a field value: `{...}`, `"..."`, a number or a macro name.
fn parse_value_part(body: &str, pos: usize, strings: &HashMap<String, String>) -> Option<(String, usize)> {
    let bytes = body.as_bytes();
    match bytes.get(pos)? {
        b'{' => {
            let close = matching_close(body, pos, b'{', b'}')?;
            Some((body[pos + 1..close].to_string(), close + 1))
        }
        b'"' => {
            let mut depth = 0usize;
            let mut idx = pos + 1;
            while idx < bytes.len() {
                match bytes[idx] {
                    b'\\' => idx += 1,
                    b'{' => depth += 1,
                    b'}' => depth = depth.saturating_sub(1),
                    b'"' if depth == 0 => return Some((body[pos + 1..idx].to_string(), idx + 1)),
                    _ => {}
                }
                idx += 1;
            }
            None
        }
        _ => {
            let end = bytes[pos..]
                .iter()
                .position(|b| matches!(b, b',' | b'#' | b'}' | b'"') || b.is_ascii_whitespace())
                .map_or(bytes.len(), |n| pos + n);
            if end == pos {
                return None;
            }
            let token = &body[pos..end];
            let value = if token.bytes().all(|b| b.is_ascii_digit()) {
                token.to_string()
            } else {
                strings
                    .get(&token.to_ascii_lowercase())
                    .cloned()
                    .unwrap_or_else(|| token.to_string())
            };
            Some((value, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_record() {
        let bib = r#"
@article{Smith2019,
  title = {A {S}tudy of \emph{X}},
  author = "Smith, John and Doe, Jane",
  year = 2019,
  doi = {10.1/xyz},
  abstract = {We compare with Another Paper.}
}"#;
        let parsed = parse(bib);
        assert_eq!(parsed.malformed, 0);
        assert_eq!(parsed.entries.len(), 1);
        let e = &parsed.entries[0];
        assert_eq!(e.key, "Smith2019");
        assert_eq!(e.title.as_deref(), Some("A Study of X"));
        assert_eq!(e.text, "A Study of X Smith, John and Doe, Jane 2019 10.1/xyz");
        assert_eq!(e.origin, BibOrigin::Source);
    }

    #[test]
    fn test_string_macros_concatenation_and_months() {
        let bib = r#"
@string{apj = "Astrophys. J."}
@comment{ this @article{fake, title={no}} is ignored }
@article(Key2,
  journal = apj # " Suppl.",
  month = jan,
  title = "Quoted {"}inner{"} title"
)"#;
        let parsed = parse(bib);
        assert_eq!(parsed.entries.len(), 1);
        let e = &parsed.entries[0];
        assert_eq!(e.key, "Key2");
        assert!(e.text.starts_with("Astrophys. J. Suppl. January"));
    }

    #[test]
    fn test_malformed_record_is_skipped_not_fatal() {
        let bib = r#"
@article{good1, title={One}}
@article{bad, title = }
@article{ , title={No key}}
@article{good2, title={Two}}
@article{unterminated, title={Three}
"#;
        let parsed = parse(bib);
        let keys: Vec<_> = parsed.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["good1", "good2"]);
        assert_eq!(parsed.malformed, 3);
    }

    #[test]
    fn test_stray_at_sign_in_free_text() {
        let parsed = parse("contact me@example.org\n@misc{k, note={n}}");
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.malformed, 0);
    }
}
