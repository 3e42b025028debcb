//! Built-in named validators for constraints that are not "keyword present".

use serde_json::Value;

use crate::document::NodeRef;
use crate::rules::CustomValidator;
use crate::types::{child_path, json_type_name, Feature, ValidationIssue};

/// Names accepted by [`by_name`].
pub const VALIDATOR_NAMES: &[&str] = &[
    "allPropertiesRequired",
    "additionalPropertiesFalse",
    "rootMustBeObject",
    "enumValuesStrings",
];

/// Look up a built-in validator by its config name.
pub fn by_name(name: &str) -> Option<CustomValidator> {
    match name {
        "allPropertiesRequired" => Some(all_properties_required()),
        "additionalPropertiesFalse" => Some(additional_properties_false()),
        "rootMustBeObject" => Some(root_must_be_object()),
        "enumValuesStrings" => Some(enum_values_strings()),
        _ => None,
    }
}

/// Every declared property must be listed in `required`.
pub fn all_properties_required() -> CustomValidator {
    CustomValidator::new("allPropertiesRequired", |node, path, _| {
        let required = node.required();
        node.property_names()
            .into_iter()
            .filter(|name| !required.contains(name))
            .map(|name| {
                ValidationIssue::new(
                    &child_path(&child_path(path, "properties"), name),
                    Feature::OptionalProperties,
                    format!("property '{}' must be listed in 'required'", name),
                )
            })
            .collect()
    })
}

/// Object schemas must close themselves with `additionalProperties: false`.
pub fn additional_properties_false() -> CustomValidator {
    CustomValidator::new("additionalPropertiesFalse", |node, path, _| {
        if !node.is_object_schema() {
            return Vec::new();
        }
        match node.value("additionalProperties") {
            Some(Value::Bool(false)) => Vec::new(),
            Some(Value::Bool(true)) => vec![ValidationIssue::new(
                path,
                Feature::AdditionalProperties,
                "'additionalProperties' must be false",
            )],
            Some(other) => vec![ValidationIssue::new(
                path,
                Feature::AdditionalProperties,
                format!(
                    "'additionalProperties' must be false, got {}",
                    json_type_name(other)
                ),
            )],
            None if node.schema("additionalProperties").is_some() => vec![ValidationIssue::new(
                path,
                Feature::AdditionalProperties,
                "'additionalProperties' must be false, got a schema",
            )],
            None => vec![ValidationIssue::new(
                path,
                Feature::AdditionalProperties,
                "'additionalProperties: false' must be set on every object",
            )],
        }
    })
}

/// The document itself must describe an object.
pub fn root_must_be_object() -> CustomValidator {
    CustomValidator::new("rootMustBeObject", |node, path, is_root| {
        if !is_root || node.type_name() == Some("object") {
            return Vec::new();
        }
        vec![ValidationIssue::new(
            path,
            Feature::RootNotObject,
            describe_root_type(node),
        )]
    })
}

fn describe_root_type(node: NodeRef<'_>) -> String {
    match node.value("type") {
        Some(Value::String(t)) => format!("root schema must be an object, got type '{}'", t),
        Some(other) => format!("root schema must be an object, got type {}", other),
        None => "root schema must declare type 'object'".to_string(),
    }
}

/// `enum` members must all be strings.
pub fn enum_values_strings() -> CustomValidator {
    CustomValidator::new("enumValuesStrings", |node, path, _| {
        let Some(Value::Array(values)) = node.value("enum") else {
            return Vec::new();
        };
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_string())
            .map(|(i, v)| {
                ValidationIssue::new(
                    &child_path(&child_path(path, "enum"), i.to_string()),
                    Feature::Enum,
                    format!("enum values must be strings, got {}", json_type_name(v)),
                )
            })
            .collect()
    })
}
