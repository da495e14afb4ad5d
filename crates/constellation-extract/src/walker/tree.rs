//! Parse an assembled stream into a tree of groups, headings, citations and
//! other commands.
//!
//! Malformed pieces are skipped at the smallest unit that can be isolated:
//! an unbalanced `{` or stray `}` drops only that delimiter, and a heading or
//! citation whose arguments cannot be read drops only that command. Their
//! offsets are collected in `ParsedDocument::skipped`.
//!
//! Groups nested deeper than `MAX_GROUP_DEPTH` are read flat: commands inside
//! are still recognised but the inner braces stay plain text, and the
//! outermost flattened group is recorded as skipped.

use std::ops::Range;

use crate::models::SectionLevel;
use crate::syntax::{bracket_close, skip_whitespace, BraceMap};

use super::citation::CiteMacro;

/// Nesting bound for recursive group parsing.
pub const MAX_GROUP_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(Range<usize>),
    Group {
        offset: usize,
        children: Vec<Node>,
    },
    Section {
        level: SectionLevel,
        title: String,
        /// Nodes parsed from the heading argument.
        children: Vec<Node>,
        offset: usize,
    },
    Citation {
        macro_name: CiteMacro,
        keys: Vec<String>,
        offset: usize,
    },
    Command {
        name: String,
        offset: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub nodes: Vec<Node>,
    /// Offsets of skipped fragments, in the order they were met.
    pub skipped: Vec<usize>,
}

pub fn parse(text: &str) -> ParsedDocument {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        braces: BraceMap::new(text),
        skipped: Vec::new(),
    };
    let nodes = parser.parse_range(0, text.len(), 0);
    let mut skipped = parser.skipped;
    skipped.sort_unstable();
    ParsedDocument { nodes, skipped }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    braces: BraceMap,
    skipped: Vec<usize>,
}

/// Location of a command's mandatory argument and where parsing resumes.
struct Arguments {
    content: Range<usize>,
    next: usize,
}

impl<'a> Parser<'a> {
    fn parse_range(&mut self, mut pos: usize, end: usize, depth: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut text_start = pos;

        while pos < end {
            match self.bytes[pos] {
                b'\\' => {
                    push_text(&mut nodes, text_start, pos);
                    let (node, next) = self.parse_command(pos, end, depth);
                    nodes.extend(node);
                    pos = next;
                    text_start = pos;
                }
                b'{' => {
                    push_text(&mut nodes, text_start, pos);
                    match self.braces.close_for(pos).filter(|&c| c < end) {
                        Some(close) if depth < MAX_GROUP_DEPTH => {
                            let children = self.parse_range(pos + 1, close, depth + 1);
                            nodes.push(Node::Group { offset: pos, children });
                            pos = close + 1;
                        }
                        Some(close) => {
                            self.skipped.push(pos);
                            let children = self.parse_flat(pos + 1, close);
                            nodes.push(Node::Group { offset: pos, children });
                            pos = close + 1;
                        }
                        None => {
                            self.skipped.push(pos);
                            pos += 1;
                        }
                    }
                    text_start = pos;
                }
                b'}' => {
                    // Matched closers are consumed with their group, so any
                    // `}` met here has no opener in range.
                    push_text(&mut nodes, text_start, pos);
                    self.skipped.push(pos);
                    pos += 1;
                    text_start = pos;
                }
                _ => pos += 1,
            }
        }
        push_text(&mut nodes, text_start, pos);
        nodes
    }

    /// Like `parse_range`, but braces are text and never recursed into.
    fn parse_flat(&mut self, mut pos: usize, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut text_start = pos;
        while pos < end {
            if self.bytes[pos] == b'\\' {
                push_text(&mut nodes, text_start, pos);
                let (node, next) = self.parse_command(pos, end, MAX_GROUP_DEPTH);
                nodes.extend(node);
                pos = next;
                text_start = pos;
            } else {
                pos += 1;
            }
        }
        push_text(&mut nodes, text_start, pos);
        nodes
    }

    /// Parse the command starting at the backslash at `pos`.
    fn parse_command(&mut self, pos: usize, end: usize, depth: usize) -> (Option<Node>, usize) {
        let text = self.text;
        let name_start = pos + 1;
        let name_end = self.bytes[name_start..end]
            .iter()
            .position(|b| !b.is_ascii_alphabetic())
            .map_or(end, |n| name_start + n);

        if name_end == name_start {
            // Control symbol such as `\{`, `\%` or `\\`.
            let width = text[name_start..end]
                .chars()
                .next()
                .map_or(0, char::len_utf8);
            return (None, name_start + width);
        }

        let name = &text[name_start..name_end];

        if let Some(level) = SectionLevel::from_command(name) {
            return match self.arguments(name_end, end, 1) {
                Some(args) => {
                    let title = collapse_whitespace(&text[args.content.clone()]);
                    // Heading arguments count as one nesting level.
                    let children = if depth < MAX_GROUP_DEPTH {
                        self.parse_range(args.content.start, args.content.end, depth + 1)
                    } else {
                        Vec::new()
                    };
                    (Some(Node::Section { level, title, children, offset: pos }), args.next)
                }
                None => self.malformed(pos, name, name_end),
            };
        }

        if let Some(macro_name) = CiteMacro::from_name(name) {
            return match self.arguments(name_end, end, macro_name.max_notes()) {
                Some(args) => {
                    let keys = CiteMacro::split_keys(&text[args.content]);
                    (Some(Node::Citation { macro_name, keys, offset: pos }), args.next)
                }
                None => self.malformed(pos, name, name_end),
            };
        }

        (Some(Node::Command { name: name.to_string(), offset: pos }), name_end)
    }

    /// Read `*`, up to `max_optional` bracketed notes, then one braced
    /// argument. `None` if any of them is unterminated or the braced
    /// argument is missing.
    fn arguments(&self, after_name: usize, end: usize, max_optional: usize) -> Option<Arguments> {
        let mut p = after_name;
        if p < end && self.bytes[p] == b'*' {
            p += 1;
        }
        for _ in 0..max_optional {
            let q = skip_whitespace(self.text, p, end);
            if q < end && self.bytes[q] == b'[' {
                p = bracket_close(self.text, q, end, &self.braces)? + 1;
            } else {
                break;
            }
        }
        let open = skip_whitespace(self.text, p, end);
        if open >= end || self.bytes[open] != b'{' {
            return None;
        }
        let close = self.braces.close_for(open).filter(|&c| c < end)?;
        Some(Arguments { content: open + 1..close, next: close + 1 })
    }

    /// Drop a command whose arguments cannot be read; resume right after
    /// its name so the following text is still walked.
    fn malformed(&mut self, pos: usize, name: &str, name_end: usize) -> (Option<Node>, usize) {
        self.skipped.push(pos);
        (Some(Node::Command { name: name.to_string(), offset: pos }), name_end)
    }
}

fn push_text(nodes: &mut Vec<Node>, start: usize, end: usize) {
    if start < end {
        nodes.push(Node::Text(start..end));
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
