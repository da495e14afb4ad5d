//! Reader for compiled bibliographies (`.bbl`).
//!
//! Handles the classic `\bibitem[label]{key} ...` form emitted by BibTeX
//! styles and biblatex's `\entry{key}{type}{} ... \endentry` blocks. The
//! body of an item runs to the next item marker or to the end of the
//! bibliography environment.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{BibEntry, BibOrigin};
use crate::normalise::clean_latex;
use crate::syntax::{bracket_close, skip_whitespace, BraceMap};

fn item_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\(bibitem|entry)\b").expect("valid regex"))
}

fn end_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\end\s*\{thebibliography\}|\\endentry\b|\\endrefsection\b").expect("valid regex")
    })
}

#[derive(Debug, Default)]
pub struct BblParse {
    pub entries: Vec<BibEntry>,
    pub malformed: usize,
}

/// Parse compiled bibliography text. Comments must already be stripped.
pub fn parse(text: &str) -> BblParse {
    let braces = BraceMap::new(text);
    let markers: Vec<(usize, usize, bool)> = item_marker()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), &c[1] == "bibitem"))
        })
        .filter(|(start, _, _)| !crate::assembler::is_escaped(text, *start))
        .collect();

    let mut out = BblParse::default();
    for (i, &(start, after, classic)) in markers.iter().enumerate() {
        let limit = markers.get(i + 1).map_or(text.len(), |m| m.0);

        let mut pos = skip_whitespace(text, after, limit);
        if classic && text.as_bytes().get(pos) == Some(&b'[') {
            match bracket_close(text, pos, limit, &braces) {
                Some(close) => pos = skip_whitespace(text, close + 1, limit),
                None => {
                    out.malformed += 1;
                    continue;
                }
            }
        }

        let key_close = match text.as_bytes().get(pos) {
            Some(b'{') => braces.close_for(pos).filter(|&c| c < limit),
            _ => None,
        };
        let Some(key_close) = key_close else {
            tracing::debug!(offset = start, "Compiled bibliography item without a key");
            out.malformed += 1;
            continue;
        };
        let key = text[pos + 1..key_close].trim();
        if key.is_empty() {
            out.malformed += 1;
            continue;
        }

        let body_start = key_close + 1;
        let body_end = end_marker()
            .find(&text[body_start..limit])
            .map_or(limit, |m| body_start + m.start());
        let body = clean_latex(&text[body_start..body_end]);

        out.entries.push(BibEntry {
            key: key.to_string(),
            text: body,
            title: None,
            origin: BibOrigin::Compiled,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_bibitems() {
        let bbl = r"\begin{thebibliography}{2}
\bibitem[{Smith et~al.(2019)}]{smith19}
J.~Smith, \newblock A Study of \emph{X}, \newblock 2019.

\bibitem{doe20} Doe, J. 2020, ApJ, 1, 2
\end{thebibliography}
trailing text";
        let parsed = parse(bbl);
        assert_eq!(parsed.malformed, 0);
        let keys: Vec<_> = parsed.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["smith19", "doe20"]);
        assert_eq!(parsed.entries[0].text, "J. Smith, A Study of X, 2019.");
        assert_eq!(parsed.entries[1].text, "Doe, J. 2020, ApJ, 1, 2");
        assert!(parsed.entries.iter().all(|e| e.origin == BibOrigin::Compiled));
    }

    #[test]
    fn test_biblatex_entries() {
        let bbl = r"\refsection{0}
\entry{lee21}{article}{}
  \field{title}{Deep Fields}
  \verb{doi}
  \verb 10.5/abc
  \endverb
\endentry
\entry{kim22}{book}{}
  \field{title}{Other}
\endentry
\endrefsection";
        let parsed = parse(bbl);
        let keys: Vec<_> = parsed.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["lee21", "kim22"]);
        assert!(parsed.entries[0].text.contains("10.5/abc"));
        assert!(parsed.entries[0].text.contains("Deep Fields"));
        assert!(!parsed.entries[0].text.contains("Other"));
    }

    #[test]
    fn test_item_without_key_is_counted() {
        let parsed = parse(r"\bibitem no key here \bibitem{ok} fine");
        assert_eq!(parsed.malformed, 1);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].key, "ok");
    }
}
