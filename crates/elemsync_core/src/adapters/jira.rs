//! Jira adapter: boards and their column configuration.
//!
//! # Invariants
//! - Kanban boards always have a non-editable backlog as first column; it is
//!   removed on fetch and ignored in deploy confirmations.
//! - Column statuses are stored as status ids (or references to statuses).

use crate::adapters::definition::{AdapterDefinition, TypeRules};
use crate::error::{SyncError, SyncResult};
use crate::model::instance::CanonicalInstance;
use crate::model::schema::{FieldDecl, FieldKind, FieldSchema};
use crate::sync::deploy::FieldGroupDeployer;
use crate::sync::guard::{KeyRule, ResponseShape, ShapeKind, ValidatedShape};
use crate::sync::list_policy::ImplicitLeadingEntry;
use crate::sync::normalize::StructuralRule;
use serde_json::{json, Map, Value};

pub const JIRA: &str = "jira";
pub const BOARD_TYPE_NAME: &str = "Board";
pub const BOARD_COLUMN_CONFIG_TYPE: &str = "BoardConfiguration_columnConfig";
pub const BOARD_COLUMN_TYPE: &str = "BoardConfiguration_columnConfig_columns";
pub const STATUS_TYPE_NAME: &str = "Status";
pub const COLUMNS_CONFIG_FIELD: &str = "columnConfig";
pub const KANBAN_TYPE: &str = "kanban";
pub const COLUMNS_UPDATE_PATH: &str = "/rest/greenhopper/1.0/rapidviewconfig/columns";

const MAPPED_COLUMNS_FIELD: &str = "mappedColumns";

fn column_schema() -> FieldSchema {
    FieldSchema::new(BOARD_COLUMN_TYPE)
        .with_field(FieldDecl::new("name", FieldKind::string()).required())
        .with_field(FieldDecl::new("statuses", FieldKind::list_of(FieldKind::Any)))
        .with_field(FieldDecl::new("min", FieldKind::number()))
        .with_field(FieldDecl::new("max", FieldKind::number()))
}

fn column_config_schema() -> FieldSchema {
    FieldSchema::new(BOARD_COLUMN_CONFIG_TYPE)
        .with_field(
            FieldDecl::new(
                "columns",
                FieldKind::list_of(FieldKind::record(column_schema())),
            )
            .required(),
        )
        .with_field(FieldDecl::new("constraintType", FieldKind::string()))
}

pub fn board_schema() -> FieldSchema {
    FieldSchema::new(BOARD_TYPE_NAME)
        .with_name_field("name")
        .with_field(FieldDecl::new("id", FieldKind::number()))
        .with_field(FieldDecl::new("name", FieldKind::string()).required())
        .with_field(FieldDecl::new("type", FieldKind::string()))
        .with_field(FieldDecl::new("location", FieldKind::Any))
        .with_field(FieldDecl::new("filterId", FieldKind::Any))
        .with_field(FieldDecl::new(
            COLUMNS_CONFIG_FIELD,
            FieldKind::record(column_config_schema()),
        ))
}

pub fn status_schema() -> FieldSchema {
    FieldSchema::new(STATUS_TYPE_NAME)
        .with_name_field("name")
        .with_field(FieldDecl::new("id", FieldKind::string()).required())
        .with_field(FieldDecl::new("name", FieldKind::string()).required())
        .with_field(FieldDecl::new("description", FieldKind::string()))
        .with_field(FieldDecl::new("statusCategory", FieldKind::Any))
}

/// Jira adapter definition.
pub fn definition() -> AdapterDefinition {
    let columns_path = [COLUMNS_CONFIG_FIELD, "columns"];
    AdapterDefinition::new(JIRA)
        .with_type(
            TypeRules::new(board_schema())
                .with_rule(StructuralRule::hoist(
                    &["config", COLUMNS_CONFIG_FIELD],
                    COLUMNS_CONFIG_FIELD,
                ))
                .with_rule(StructuralRule::collapse_id_list(
                    &columns_path,
                    "statuses",
                    "id",
                ))
                .with_list_policy(ImplicitLeadingEntry::new("type", KANBAN_TYPE, &columns_path)),
        )
        .with_type(TypeRules::new(status_schema()))
}

/// Deploys `columnConfig` through the private columns endpoint.
#[derive(Debug, Clone)]
pub struct BoardColumnsDeployer {
    shape: ResponseShape,
}

impl BoardColumnsDeployer {
    pub fn new() -> Self {
        Self {
            shape: ResponseShape::object(
                "columns update",
                vec![KeyRule::new(
                    MAPPED_COLUMNS_FIELD,
                    ShapeKind::array_of(ShapeKind::object(vec![KeyRule::new(
                        "name",
                        ShapeKind::String,
                    )])),
                )],
            ),
        }
    }
}

impl Default for BoardColumnsDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldGroupDeployer for BoardColumnsDeployer {
    fn field_group(&self) -> &str {
        COLUMNS_CONFIG_FIELD
    }

    fn write_path(&self) -> &str {
        COLUMNS_UPDATE_PATH
    }

    fn build_payload(&self, instance: &CanonicalInstance) -> SyncResult<Value> {
        let config = column_config(instance)?;
        let statistics_field = match config.get("constraintType") {
            Some(Value::String(kind)) => format!("{kind}_"),
            Some(Value::Null) | None => "none_".to_string(),
            Some(other) => format!("{other}_"),
        };
        let mapped_columns = columns(instance)?
            .iter()
            .map(convert_column)
            .collect::<Vec<_>>();

        Ok(json!({
            "currentStatisticsField": {"id": statistics_field},
            "rapidViewId": instance.get("id").cloned().unwrap_or(Value::Null),
            MAPPED_COLUMNS_FIELD: mapped_columns,
        }))
    }

    fn response_shape(&self) -> &ResponseShape {
        &self.shape
    }

    fn intended_entries(&self, instance: &CanonicalInstance) -> SyncResult<Vec<Value>> {
        Ok(columns(instance)?
            .iter()
            .map(|column| column.get("name").cloned().unwrap_or(Value::Null))
            .collect())
    }

    fn confirmed_entries(&self, response: &ValidatedShape<'_>) -> SyncResult<Vec<Value>> {
        Ok(response
            .strings_in(MAPPED_COLUMNS_FIELD, "name")?
            .into_iter()
            .map(|name| Value::String(name.to_string()))
            .collect())
    }
}

fn column_config(instance: &CanonicalInstance) -> SyncResult<&Map<String, Value>> {
    instance
        .get(COLUMNS_CONFIG_FIELD)
        .and_then(Value::as_object)
        .ok_or_else(|| SyncError::MissingField {
            type_name: instance.type_name.clone(),
            field: COLUMNS_CONFIG_FIELD.to_string(),
        })
}

fn columns(instance: &CanonicalInstance) -> SyncResult<&Vec<Value>> {
    column_config(instance)?
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::MissingField {
            type_name: BOARD_COLUMN_CONFIG_TYPE.to_string(),
            field: "columns".to_string(),
        })
}

fn convert_column(column: &Value) -> Value {
    let mapped_statuses = column
        .get("statuses")
        .and_then(Value::as_array)
        .map(|statuses| {
            statuses
                .iter()
                .map(|id| json!({"id": id}))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let bound = |key: &str| match column.get(key) {
        Some(Value::Null) | None => Value::String(String::new()),
        Some(value) => value.clone(),
    };

    json!({
        "name": column.get("name").cloned().unwrap_or(Value::Null),
        "mappedStatuses": mapped_statuses,
        "min": bound("min"),
        "max": bound("max"),
    })
}
