//! Salesforce adapter: metadata types of installed packages.
//!
//! Metadata of managed packages is listed without the package namespace in
//! some API names; the fetch flag `add_namespace_prefix` restores it.

use crate::adapters::definition::{AdapterDefinition, TypeRules};
use crate::model::schema::{FieldDecl, FieldKind, FieldSchema};
use crate::sync::naming::{NamespacePrefixRule, SegmentSplit};

pub const SALESFORCE: &str = "salesforce";
pub const INSTANCE_FULL_NAME_FIELD: &str = "fullName";
pub const NAMESPACE_SEPARATOR: &str = "__";
pub const PERMISSION_SET_METADATA_TYPE: &str = "PermissionSet";
pub const LAYOUT_METADATA_TYPE: &str = "Layout";
pub const CUSTOM_OBJECT_METADATA_TYPE: &str = "CustomObject";
pub const INSTALLED_PACKAGE_METADATA: &str = "InstalledPackage";

fn metadata_schema(type_name: &str) -> FieldSchema {
    FieldSchema::new(type_name)
        .with_name_field(INSTANCE_FULL_NAME_FIELD)
        .with_field(FieldDecl::new(INSTANCE_FULL_NAME_FIELD, FieldKind::string()).required())
        .with_field(FieldDecl::new("label", FieldKind::string()))
        .with_field(FieldDecl::new("description", FieldKind::string()))
}

/// Layout names are `<object>-<layout name>`; the layout name may contain `-`.
const LAYOUT_SPLIT: SegmentSplit = SegmentSplit::AfterFirst('-');
/// Nested metadata names are `<parent>.<child>`.
const NESTED_SPLIT: SegmentSplit = SegmentSplit::AfterLast('.');

fn prefixed(schema: FieldSchema, split: SegmentSplit) -> TypeRules {
    TypeRules::new(schema).with_naming(
        NamespacePrefixRule::new(INSTANCE_FULL_NAME_FIELD, NAMESPACE_SEPARATOR).with_split(split),
    )
}

/// Salesforce adapter definition.
pub fn definition() -> AdapterDefinition {
    AdapterDefinition::new(SALESFORCE)
        .with_type(prefixed(
            metadata_schema(PERMISSION_SET_METADATA_TYPE)
                .with_field(FieldDecl::new("hasActivationRequired", FieldKind::boolean()))
                .with_field(FieldDecl::new("userPermissions", FieldKind::list_of(FieldKind::Any))),
            NESTED_SPLIT,
        ))
        .with_type(prefixed(
            metadata_schema(LAYOUT_METADATA_TYPE)
                .with_field(FieldDecl::new("layoutSections", FieldKind::list_of(FieldKind::Any))),
            LAYOUT_SPLIT,
        ))
        .with_type(prefixed(
            metadata_schema(CUSTOM_OBJECT_METADATA_TYPE)
                .with_field(FieldDecl::new("fields", FieldKind::list_of(FieldKind::Any))),
            NESTED_SPLIT,
        ))
        .with_type(TypeRules::new(
            metadata_schema(INSTALLED_PACKAGE_METADATA)
                .with_field(FieldDecl::new("versionNumber", FieldKind::string())),
        ))
}

#[cfg(test)]
mod tests {
    use super::{
        definition, CUSTOM_OBJECT_METADATA_TYPE, INSTALLED_PACKAGE_METADATA, LAYOUT_METADATA_TYPE,
        PERMISSION_SET_METADATA_TYPE,
    };
    use crate::sync::normalize::{FetchOptions, Normalizer};
    use serde_json::json;

    fn fetch_full_name(type_name: &str, full_name: &str, options: &FetchOptions) -> String {
        let definition = definition();
        let instance = Normalizer::new(&definition)
            .normalize(type_name, &json!({"fullName": full_name}), options)
            .expect("metadata should normalize");
        instance
            .get_str("fullName")
            .expect("fullName should be kept")
            .to_string()
    }

    fn prefix_on(prefix: &str) -> FetchOptions {
        FetchOptions {
            add_namespace_prefix: true,
            namespace_prefix: None,
        }
        .with_namespace_prefix(prefix)
    }

    #[test]
    fn permission_set_gets_prefix_only_when_missing() {
        assert_eq!(
            fetch_full_name(PERMISSION_SET_METADATA_TYPE, "TestPermissionSet", &prefix_on("Test")),
            "Test__TestPermissionSet"
        );
        assert_eq!(
            fetch_full_name(
                PERMISSION_SET_METADATA_TYPE,
                "Test__TestPermissionSet",
                &prefix_on("Test")
            ),
            "Test__TestPermissionSet"
        );
    }

    #[test]
    fn flag_off_leaves_name_unchanged() {
        let options = FetchOptions::default().with_namespace_prefix("Test");
        assert_eq!(
            fetch_full_name(PERMISSION_SET_METADATA_TYPE, "TestPermissionSet", &options),
            "TestPermissionSet"
        );
    }

    #[test]
    fn compound_names_prefix_trailing_segment() {
        assert_eq!(
            fetch_full_name(CUSTOM_OBJECT_METADATA_TYPE, "Account.TestObject", &prefix_on("Test")),
            "Account.Test__TestObject"
        );
        assert_eq!(
            fetch_full_name(
                LAYOUT_METADATA_TYPE,
                "SBQQ__TestApiName__c-Test Layout",
                &prefix_on("SBQQ")
            ),
            "SBQQ__TestApiName__c-SBQQ__Test Layout"
        );
        assert_eq!(
            fetch_full_name(
                LAYOUT_METADATA_TYPE,
                "TestApiName__c-SBQQ__Test Layout",
                &prefix_on("SBQQ")
            ),
            "TestApiName__c-SBQQ__Test Layout"
        );
    }

    #[test]
    fn layout_name_with_hyphen_or_dot_keeps_prefix_after_object() {
        assert_eq!(
            fetch_full_name(
                LAYOUT_METADATA_TYPE,
                "Account-Case Layout - Support",
                &prefix_on("SBQQ")
            ),
            "Account-SBQQ__Case Layout - Support"
        );
        assert_eq!(
            fetch_full_name(LAYOUT_METADATA_TYPE, "Account-Layout v1.2", &prefix_on("SBQQ")),
            "Account-SBQQ__Layout v1.2"
        );
    }

    #[test]
    fn names_from_other_namespaces_still_get_the_package_prefix() {
        assert_eq!(
            fetch_full_name(PERMISSION_SET_METADATA_TYPE, "Sales__Ops", &prefix_on("Test")),
            "Test__Sales__Ops"
        );
        assert_eq!(
            fetch_full_name(PERMISSION_SET_METADATA_TYPE, "Sales-Ops", &prefix_on("Test")),
            "Test__Sales-Ops"
        );
    }

    #[test]
    fn installed_package_name_is_never_prefixed() {
        assert_eq!(
            fetch_full_name(INSTALLED_PACKAGE_METADATA, "TestNamespace", &prefix_on("Test")),
            "TestNamespace"
        );
    }
}
