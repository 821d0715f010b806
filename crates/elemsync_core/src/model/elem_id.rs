//! Stable element identity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Separator used when transliterating names into identifiers.
pub const NAME_SEPARATOR: char = '_';

static NON_ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid name regex"));

/// Identity of one canonical instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElemId {
    pub adapter: String,
    pub type_name: String,
    pub name: String,
}

impl ElemId {
    pub fn new(
        adapter: impl Into<String>,
        type_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// `<adapter>.<type>.instance.<name>`
    pub fn full_name(&self) -> String {
        format!("{}.{}.instance.{}", self.adapter, self.type_name, self.name)
    }
}

impl Display for ElemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Transliterates every run of non-alphanumeric characters to one separator.
///
/// Leading and trailing runs are dropped, so the result never starts or ends
/// with the separator.
pub fn naclify(raw: &str) -> String {
    NON_ALNUM_RUN
        .replace_all(raw.trim(), NAME_SEPARATOR.to_string().as_str())
        .trim_matches(NAME_SEPARATOR)
        .to_string()
}
