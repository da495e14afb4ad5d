//! LaTeX-aware text normalisation for fuzzy bibliography matching.

use std::collections::HashSet;

/// Accent control symbols whose argument letter is kept (`\"o` → `o`).
const ACCENT_SYMBOLS: &[char] = &['"', '\'', '^', '`', '~', '=', '.'];

/// Strip LaTeX markup while keeping readable content.
///
/// Control words are replaced by a space, accent commands are dropped in
/// favour of their letter, other control symbols keep their character
/// (`\_` → `_`, `\&` → `&`), `\\` and `~` become spaces, braces are removed
/// and whitespace is collapsed.
pub fn clean_latex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(n) if n.is_ascii_alphabetic() => {
                    while chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                        chars.next();
                    }
                    out.push(' ');
                }
                Some('\\') => {
                    chars.next();
                    out.push(' ');
                }
                Some(n) if ACCENT_SYMBOLS.contains(&n) => {
                    chars.next();
                }
                Some(n) => {
                    chars.next();
                    out.push(n);
                }
                None => {}
            },
            '{' | '}' => {}
            '~' => out.push(' '),
            c => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map common accented Latin letters to their base letter.
pub fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'ď' | 'đ' => 'd',
        'Ď' | 'Đ' => 'D',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ğ' => 'g',
        'Ğ' => 'G',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => 'I',
        'ł' | 'ľ' => 'l',
        'Ł' | 'Ľ' => 'L',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => 'O',
        'ř' => 'r',
        'Ř' => 'R',
        'ś' | 'š' | 'ş' => 's',
        'Ś' | 'Š' | 'Ş' => 'S',
        'ť' | 'ţ' => 't',
        'Ť' | 'Ţ' => 'T',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        'ź' | 'ż' | 'ž' => 'z',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        c => c,
    }
}

/// Lowercase, markup-free, punctuation-free form with single spaces.
pub fn normalize_for_match(input: &str) -> String {
    let cleaned = clean_latex(input);
    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars().map(fold_diacritic) {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word tokens of an already-normalised string.
pub fn tokens(normalised: &str) -> Vec<&str> {
    normalised.split_whitespace().collect()
}

/// Jaccard similarity of the word-token sets of two normalised strings.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let sa: HashSet<&str> = tokens(a).into_iter().collect();
    let sb: HashSet<&str> = tokens(b).into_iter().collect();
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    inter as f64 / union as f64
}

/// Whole-word phrase containment over normalised strings.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// True if `year` appears in `text` not flanked by other digits
/// (so `2019a` matches but `120190` does not).
pub fn contains_year(text: &str, year: i32) -> bool {
    let needle = year.to_string();
    let bytes = text.as_bytes();
    text.match_indices(&needle).any(|(idx, m)| {
        let before = idx.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(idx + m.len()).copied();
        !before.is_some_and(|b| b.is_ascii_digit()) && !after.is_some_and(|b| b.is_ascii_digit())
    })
}
