//! Positional conventions of ordered list fields.
//!
//! Some vendor lists carry entries the API creates implicitly and never lets
//! clients edit. Fetch removes them; deploy must neither recreate them nor
//! count them when comparing the remote confirmation.

use serde_json::{Map, Value};
use std::fmt::Debug;

/// Per-type rule for implicit entries of one ordered list field.
pub trait ListEdgePolicy: Debug + Send + Sync {
    /// Path of the list field inside the canonical value.
    fn list_path(&self) -> &[String];

    /// Number of implicit leading entries for this instance; 0 when the
    /// convention does not apply.
    fn implicit_leading(&self, value: &Map<String, Value>) -> usize;

    /// Drops implicit entries from a fetched value in place.
    fn strip_fetched(&self, value: &mut Map<String, Value>) {
        let count = self.implicit_leading(value);
        if count == 0 {
            return;
        }
        if let Some(Value::Array(items)) = lookup_mut(value, self.list_path()) {
            items.drain(..count.min(items.len()));
        }
    }

    /// Drops implicit entries from a remote confirmation list.
    fn strip_confirmed(&self, value: &Map<String, Value>, entries: &mut Vec<Value>) {
        let count = self.implicit_leading(value).min(entries.len());
        entries.drain(..count);
    }
}

/// The first `count` entries exist implicitly when `field == equals`.
///
/// Jira kanban boards: the first column is always the non-editable backlog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitLeadingEntry {
    pub discriminator_field: String,
    pub discriminator_value: String,
    pub list_path: Vec<String>,
    pub count: usize,
}

impl ImplicitLeadingEntry {
    pub fn new(
        discriminator_field: impl Into<String>,
        discriminator_value: impl Into<String>,
        list_path: &[&str],
    ) -> Self {
        Self {
            discriminator_field: discriminator_field.into(),
            discriminator_value: discriminator_value.into(),
            list_path: list_path.iter().map(|segment| segment.to_string()).collect(),
            count: 1,
        }
    }
}

impl ListEdgePolicy for ImplicitLeadingEntry {
    fn list_path(&self) -> &[String] {
        &self.list_path
    }

    fn implicit_leading(&self, value: &Map<String, Value>) -> usize {
        let applies = value
            .get(&self.discriminator_field)
            .and_then(Value::as_str)
            .is_some_and(|kind| kind == self.discriminator_value);
        if applies {
            self.count
        } else {
            0
        }
    }
}

pub(crate) fn lookup_mut<'a>(
    value: &'a mut Map<String, Value>,
    path: &[String],
) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(value.get_mut(first)?, |current, segment| {
            current.get_mut(segment)
        })
}

#[cfg(test)]
mod tests {
    use super::{ImplicitLeadingEntry, ListEdgePolicy};
    use serde_json::{json, Map, Value};

    fn kanban() -> ImplicitLeadingEntry {
        ImplicitLeadingEntry::new("type", "kanban", &["columnConfig", "columns"])
    }

    fn board(kind: &str, columns: usize) -> Map<String, Value> {
        let columns = (0..columns)
            .map(|index| json!({"name": format!("c{index}")}))
            .collect::<Vec<_>>();
        json!({"type": kind, "columnConfig": {"columns": columns}})
            .as_object()
            .cloned()
            .expect("object fixture")
    }

    #[test]
    fn fetch_keeps_n_minus_one_entries_for_kanban() {
        for n in 0..6 {
            let mut value = board("kanban", n);
            kanban().strip_fetched(&mut value);
            let remaining = value["columnConfig"]["columns"]
                .as_array()
                .expect("columns")
                .len();
            assert_eq!(remaining, n.saturating_sub(1));
        }
    }

    #[test]
    fn other_board_types_are_untouched() {
        let mut value = board("scrum", 3);
        kanban().strip_fetched(&mut value);
        assert_eq!(value["columnConfig"]["columns"].as_array().expect("columns").len(), 3);

        let mut confirmed = vec![json!("a"), json!("b")];
        kanban().strip_confirmed(&value, &mut confirmed);
        assert_eq!(confirmed.len(), 2);
    }

    #[test]
    fn confirmation_drops_first_entry_for_kanban() {
        let value = board("kanban", 0);
        let mut confirmed = vec![json!("Backlog"), json!("To Do")];
        kanban().strip_confirmed(&value, &mut confirmed);
        assert_eq!(confirmed, vec![json!("To Do")]);

        let mut empty: Vec<Value> = Vec::new();
        kanban().strip_confirmed(&value, &mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn missing_list_is_ignored() {
        let mut value = json!({"type": "kanban"}).as_object().cloned().expect("object");
        kanban().strip_fetched(&mut value);
        assert_eq!(Value::Object(value), json!({"type": "kanban"}));
    }
}
