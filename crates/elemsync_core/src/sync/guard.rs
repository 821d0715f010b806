//! Structural guard for untrusted remote responses.
//!
//! # Responsibility
//! - Check a raw payload against a declared minimal shape before it is read.
//! - Hand callers a `ValidatedShape` whose accessors only reach declared keys.
//!
//! # Invariants
//! - Unknown keys are always accepted.
//! - A rejected payload is attached to the error verbatim.

use crate::error::{SyncError, SyncResult};
use serde_json::Value;

/// Expected structure of one value.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    String,
    Number,
    Bool,
    /// Object with the given required keys; other keys are allowed.
    Object(Vec<KeyRule>),
    ArrayOf(Box<ShapeKind>),
    Any,
}

impl ShapeKind {
    pub fn object(keys: Vec<KeyRule>) -> Self {
        Self::Object(keys)
    }

    pub fn array_of(kind: ShapeKind) -> Self {
        Self::ArrayOf(Box::new(kind))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Object(_) => "object",
            Self::ArrayOf(_) => "array",
            Self::Any => "any",
        }
    }
}

/// One required key and its expected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRule {
    pub key: String,
    pub kind: ShapeKind,
}

impl KeyRule {
    pub fn new(key: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

/// Declared shape of one response kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseShape {
    name: String,
    root: ShapeKind,
}

impl ResponseShape {
    /// Shape whose root is an object with the given required keys.
    pub fn object(name: impl Into<String>, keys: Vec<KeyRule>) -> Self {
        Self {
            name: name.into(),
            root: ShapeKind::Object(keys),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates `raw` and wraps it on success.
    ///
    /// # Errors
    /// - `InvalidRemoteResponse` naming the first offending location, with the
    ///   whole payload attached.
    pub fn validate<'a>(&'a self, raw: &'a Value) -> SyncResult<ValidatedShape<'a>> {
        if let Err(location) = check(&self.root, raw, "$") {
            return Err(SyncError::invalid_response(
                format!("received an invalid `{}` response: {location}", self.name),
                raw,
            ));
        }
        Ok(ValidatedShape { shape: self, raw })
    }
}

/// A payload that passed its shape check.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedShape<'a> {
    shape: &'a ResponseShape,
    raw: &'a Value,
}

impl<'a> ValidatedShape<'a> {
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// Items of a declared top-level array key.
    pub fn array(&self, key: &str) -> SyncResult<&'a [Value]> {
        self.declared(key)?;
        self.raw
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| self.undeclared(key))
    }

    /// Values of a declared string key inside every item of a declared array.
    pub fn strings_in(&self, array_key: &str, item_key: &str) -> SyncResult<Vec<&'a str>> {
        let item_rules = match self.declared(array_key)? {
            ShapeKind::ArrayOf(inner) => match inner.as_ref() {
                ShapeKind::Object(rules) => rules,
                _ => return Err(self.undeclared(item_key)),
            },
            _ => return Err(self.undeclared(array_key)),
        };
        if !item_rules
            .iter()
            .any(|rule| rule.key == item_key && rule.kind == ShapeKind::String)
        {
            return Err(self.undeclared(item_key));
        }
        self.array(array_key)?
            .iter()
            .map(|item| {
                item.get(item_key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.undeclared(item_key))
            })
            .collect()
    }

    fn declared(&self, key: &str) -> SyncResult<&'a ShapeKind> {
        match &self.shape.root {
            ShapeKind::Object(rules) => rules
                .iter()
                .find(|rule| rule.key == key)
                .map(|rule| &rule.kind)
                .ok_or_else(|| self.undeclared(key)),
            _ => Err(self.undeclared(key)),
        }
    }

    fn undeclared(&self, key: &str) -> SyncError {
        SyncError::invalid_response(
            format!(
                "key `{key}` is not part of the validated `{}` shape",
                self.shape.name
            ),
            self.raw,
        )
    }
}

fn check(kind: &ShapeKind, value: &Value, location: &str) -> Result<(), String> {
    let matches = match (kind, value) {
        (ShapeKind::Any, _) => true,
        (ShapeKind::String, Value::String(_)) => true,
        (ShapeKind::Number, Value::Number(_)) => true,
        (ShapeKind::Bool, Value::Bool(_)) => true,
        (ShapeKind::Object(rules), Value::Object(map)) => {
            for rule in rules {
                let child = format!("{location}.{}", rule.key);
                match map.get(&rule.key) {
                    Some(value) => check(&rule.kind, value, &child)?,
                    None => return Err(format!("required key `{child}` is missing")),
                }
            }
            true
        }
        (ShapeKind::ArrayOf(inner), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                check(inner, item, &format!("{location}[{index}]"))?;
            }
            true
        }
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(format!(
            "`{location}` should be {}, got {}",
            kind.label(),
            value_label(value)
        ))
    }
}

pub(crate) fn value_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyRule, ResponseShape, ShapeKind};
    use crate::error::SyncError;
    use serde_json::json;

    fn columns_shape() -> ResponseShape {
        ResponseShape::object(
            "columns update",
            vec![KeyRule::new(
                "mappedColumns",
                ShapeKind::array_of(ShapeKind::object(vec![KeyRule::new(
                    "name",
                    ShapeKind::String,
                )])),
            )],
        )
    }

    #[test]
    fn accepts_unknown_keys() {
        let raw = json!({
            "mappedColumns": [{"name": "To Do", "id": 3}],
            "rapidViewId": 1,
        });
        let shape = columns_shape();
        let validated = shape.validate(&raw).expect("shape should pass");
        assert_eq!(
            validated
                .strings_in("mappedColumns", "name")
                .expect("declared names"),
            vec!["To Do"]
        );
    }

    #[test]
    fn rejects_missing_required_key_with_payload() {
        let raw = json!({"columns": []});
        let err = columns_shape().validate(&raw).expect_err("missing key");
        match err {
            SyncError::InvalidRemoteResponse { message, payload } => {
                assert!(message.contains("$.mappedColumns"));
                assert_eq!(payload, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_element_type() {
        let raw = json!({"mappedColumns": [{"name": "a"}, {"name": 5}]});
        let err = columns_shape().validate(&raw).expect_err("wrong type");
        assert!(err.to_string().contains("$.mappedColumns[1].name"));
    }

    #[test]
    fn rejects_non_object_root() {
        let raw = json!(["mappedColumns"]);
        assert!(columns_shape().validate(&raw).is_err());
    }

    #[test]
    fn accessors_refuse_undeclared_keys() {
        let raw = json!({"mappedColumns": [], "other": [1]});
        let shape = columns_shape();
        let validated = shape.validate(&raw).expect("shape should pass");
        assert!(validated.array("other").is_err());
        assert!(validated.strings_in("mappedColumns", "id").is_err());
        assert!(validated.array("mappedColumns").expect("declared").is_empty());
    }
}
