//! Namespace prefix insertion for vendor API names.
//!
//! # Invariants
//! - Only the editable segment chosen by the rule's `SegmentSplit` is touched.
//! - A segment already starting with `<prefix><separator>` is left unchanged.
//! - Applying the rule twice with the same prefix equals applying it once.

/// Where the editable segment of a compound API name starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSplit {
    /// The whole name is editable.
    Whole,
    /// Editable segment follows the first occurrence of the separator
    /// (`<object>-<layout name>`; the layout name may contain it again).
    AfterFirst(char),
    /// Editable segment follows the last occurrence of the separator
    /// (`<parent>.<child>`).
    AfterLast(char),
}

impl SegmentSplit {
    /// Byte offset where the editable segment of `name` starts.
    fn offset(&self, name: &str) -> usize {
        let found = match self {
            Self::Whole => None,
            Self::AfterFirst(separator) => name.find(*separator).map(|at| (at, *separator)),
            Self::AfterLast(separator) => name.rfind(*separator).map(|at| (at, *separator)),
        };
        found.map_or(0, |(at, separator)| at + separator.len_utf8())
    }
}

/// Prefix rule for one type, e.g. Salesforce `Test__TestPermissionSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePrefixRule {
    /// Field holding the API name to prefix.
    pub field: String,
    /// Token placed between prefix and name.
    pub separator: String,
    pub split: SegmentSplit,
}

impl NamespacePrefixRule {
    /// Rule prefixing the whole name; see `with_split` for compound names.
    pub fn new(field: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            separator: separator.into(),
            split: SegmentSplit::Whole,
        }
    }

    pub fn with_split(mut self, split: SegmentSplit) -> Self {
        self.split = split;
        self
    }

    /// Returns `name` with `prefix` inserted before its editable segment.
    ///
    /// An empty or non-alphanumeric `prefix` leaves the name unchanged.
    pub fn apply(&self, name: &str, prefix: &str) -> String {
        if !is_valid_prefix(prefix) || self.separator.is_empty() {
            return name.to_string();
        }

        let (parent, segment) = name.split_at(self.split.offset(name));
        let marker = format!("{prefix}{}", self.separator);
        if segment.is_empty() || segment.starts_with(&marker) {
            return name.to_string();
        }
        format!("{parent}{marker}{segment}")
    }
}

fn is_valid_prefix(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}
