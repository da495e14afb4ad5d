//! Recognised citation macros.
//!
//! Adding an alias means a new variant, its `as_str` arm and a row in
//! `CITE_MACROS`. `\nocite` is not listed: it puts an entry in the
//! bibliography without citing it in text.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CiteMacro {
    Cite,
    CiteCap,
    Citep,
    CitepCap,
    Citet,
    CitetCap,
    Citealp,
    Citealt,
    Citeauthor,
    Citeyear,
    Citeyearpar,
    Citenum,
    Parencite,
    ParenciteCap,
    Textcite,
    TextciteCap,
    Autocite,
    AutociteCap,
    Footcite,
    Footcitetext,
    Fullcite,
    Smartcite,
    Supercite,
}

/// Every recognised alias, in lookup order.
const CITE_MACROS: &[CiteMacro] = &[
    CiteMacro::Cite,
    CiteMacro::CiteCap,
    CiteMacro::Citep,
    CiteMacro::CitepCap,
    CiteMacro::Citet,
    CiteMacro::CitetCap,
    CiteMacro::Citealp,
    CiteMacro::Citealt,
    CiteMacro::Citeauthor,
    CiteMacro::Citeyear,
    CiteMacro::Citeyearpar,
    CiteMacro::Citenum,
    CiteMacro::Parencite,
    CiteMacro::ParenciteCap,
    CiteMacro::Textcite,
    CiteMacro::TextciteCap,
    CiteMacro::Autocite,
    CiteMacro::AutociteCap,
    CiteMacro::Footcite,
    CiteMacro::Footcitetext,
    CiteMacro::Fullcite,
    CiteMacro::Smartcite,
    CiteMacro::Supercite,
];

/// natbib and biblatex both allow `\cite[pre][post]{key}`.
const MAX_NOTES: usize = 2;

impl CiteMacro {
    pub fn from_name(name: &str) -> Option<Self> {
        CITE_MACROS.iter().find(|m| m.as_str() == name).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CiteMacro::Cite         => "cite",
            CiteMacro::CiteCap      => "Cite",
            CiteMacro::Citep        => "citep",
            CiteMacro::CitepCap     => "Citep",
            CiteMacro::Citet        => "citet",
            CiteMacro::CitetCap     => "Citet",
            CiteMacro::Citealp      => "citealp",
            CiteMacro::Citealt      => "citealt",
            CiteMacro::Citeauthor   => "citeauthor",
            CiteMacro::Citeyear     => "citeyear",
            CiteMacro::Citeyearpar  => "citeyearpar",
            CiteMacro::Citenum      => "citenum",
            CiteMacro::Parencite    => "parencite",
            CiteMacro::ParenciteCap => "Parencite",
            CiteMacro::Textcite     => "textcite",
            CiteMacro::TextciteCap  => "Textcite",
            CiteMacro::Autocite     => "autocite",
            CiteMacro::AutociteCap  => "Autocite",
            CiteMacro::Footcite     => "footcite",
            CiteMacro::Footcitetext => "footcitetext",
            CiteMacro::Fullcite     => "fullcite",
            CiteMacro::Smartcite    => "smartcite",
            CiteMacro::Supercite    => "supercite",
        }
    }

    /// How many optional pre/post notes may precede the key argument.
    pub fn max_notes(&self) -> usize {
        MAX_NOTES
    }

    /// Split a key argument on commas, trimming whitespace and dropping
    /// empty pieces (`\cite{a, b,}` → `["a", "b"]`).
    pub fn split_keys(argument: &str) -> Vec<String> {
        argument
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for CiteMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CiteMacro {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
