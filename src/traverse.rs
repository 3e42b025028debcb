//! Schema traversal - walks a document and reports refused features.
//!
//! Every distinct node is visited once. The document root is the only node
//! checked in the `root` context; everything reached from it, including
//! top-level `allOf` branches, is `nested`.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::document::{NodeId, NodeRef, SchemaDocument};
use crate::rules::{ConstraintRule, ResolvedConstraints};
use crate::types::{child_path, Feature, FeatureContext, ValidationIssue};

/// Check every node of `doc` against `constraints`.
///
/// Returns all issues in traversal order; an empty list means compatible.
pub fn traverse(doc: &SchemaDocument, constraints: &ResolvedConstraints) -> Vec<ValidationIssue> {
    let mut walker = Walker {
        constraints,
        issues: Vec::new(),
        visited: HashSet::new(),
    };
    walker.visit(doc.root_node(), &[], true);
    debug!(
        provider = %constraints.provider,
        model = %constraints.model_id,
        nodes = walker.visited.len(),
        issues = walker.issues.len(),
        "traversal complete"
    );
    walker.issues
}

struct Walker<'c> {
    constraints: &'c ResolvedConstraints,
    issues: Vec<ValidationIssue>,
    visited: HashSet<NodeId>,
}

impl Walker<'_> {
    fn visit(&mut self, node: NodeRef<'_>, path: &[String], is_root: bool) {
        if !self.visited.insert(node.id()) {
            self.flag(Feature::Recursive, FeatureContext::Any, None, path);
            return;
        }

        let context = FeatureContext::of(is_root);

        self.check_composition(node, path, is_root);
        self.check_conditionals(node, path);
        self.check_validation_keywords(node, path, context);

        if node.is_object_schema() {
            self.check_object(node, path, context);
        }
        if node.is_array_schema() {
            self.check_array(node, path, context);
        }

        self.visit_subschemas(node, path);
        self.run_custom_checks(node, path, is_root);
    }

    /// Record an issue if a simple rule refuses `feature` here.
    fn flag(
        &mut self,
        feature: Feature,
        context: FeatureContext,
        value: Option<&Value>,
        path: &[String],
    ) -> bool {
        let Some(rule) = self.constraints.rules.refusal(feature, context, value) else {
            return false;
        };
        let message = self.constraints.message_for(rule, value);
        self.issues.push(ValidationIssue::new(path, feature, message));
        true
    }

    /// Flag a keyword if it is present on the node, whatever its value.
    fn flag_present(
        &mut self,
        node: NodeRef<'_>,
        feature: Feature,
        context: FeatureContext,
        path: &[String],
    ) {
        if node.has(feature.as_str()) {
            self.flag(feature, context, node.value(feature.as_str()), path);
        }
    }

    fn check_composition(&mut self, node: NodeRef<'_>, path: &[String], is_root: bool) {
        let context = FeatureContext::of(is_root);

        self.flag_present(node, Feature::AllOf, context, path);

        // Root-level anyOf is governed only by rootAnyOf
        if node.has("anyOf") {
            if is_root {
                self.flag(Feature::RootAnyOf, FeatureContext::Root, None, path);
            } else {
                self.flag(Feature::AnyOf, FeatureContext::Nested, None, path);
            }
        }

        // oneOf falls back to the plain rule in both positions
        if node.has("oneOf") {
            let root_flagged =
                is_root && self.flag(Feature::RootOneOf, FeatureContext::Root, None, path);
            if !root_flagged {
                self.flag(Feature::OneOf, context, None, path);
            }
        }

        self.flag_present(node, Feature::Not, context, path);
    }

    fn check_conditionals(&mut self, node: NodeRef<'_>, path: &[String]) {
        self.flag_present(node, Feature::If, FeatureContext::Any, path);
        self.flag_present(node, Feature::DependentRequired, FeatureContext::Any, path);
        self.flag_present(node, Feature::DependentSchemas, FeatureContext::Any, path);
    }

    fn check_validation_keywords(
        &mut self,
        node: NodeRef<'_>,
        path: &[String],
        context: FeatureContext,
    ) {
        for feature in Feature::NUMERIC_KEYWORDS
            .iter()
            .chain(Feature::STRING_KEYWORDS)
            .chain(Feature::VALUE_KEYWORDS)
        {
            // Presence, not truthiness: `minimum: 0` is still a minimum
            if let Some(value) = node.value(feature.as_str()) {
                self.flag(*feature, context, Some(value), path);
            }
        }
    }

    fn check_object(&mut self, node: NodeRef<'_>, path: &[String], context: FeatureContext) {
        self.flag_present(node, Feature::PatternProperties, context, path);
        self.flag_present(node, Feature::PropertyNames, context, path);

        if let Some(props) = node.schema_map("properties") {
            let props_path = child_path(path, "properties");
            for (name, prop) in props {
                self.visit(prop, &child_path(&props_path, name), false);
            }
        }

        if let Some(additional) = node.schema("additionalProperties") {
            self.visit(additional, &child_path(path, "additionalProperties"), false);
        }
    }

    fn check_array(&mut self, node: NodeRef<'_>, path: &[String], context: FeatureContext) {
        self.flag_present(node, Feature::PrefixItems, context, path);
        self.flag_present(node, Feature::Contains, context, path);
        if node.value("uniqueItems") == Some(&Value::Bool(true)) {
            self.flag(Feature::UniqueItems, context, node.value("uniqueItems"), path);
        }
        for feature in [Feature::MinItems, Feature::MaxItems] {
            if let Some(value) = node.value(feature.as_str()) {
                self.flag(feature, context, Some(value), path);
            }
        }

        let items_path = child_path(path, "items");
        if let Some(items) = node.schema("items") {
            self.visit(items, &items_path, false);
        } else if let Some(tuple) = node.schema_list("items") {
            for (i, item) in tuple.into_iter().enumerate() {
                self.visit(item, &child_path(&items_path, i.to_string()), false);
            }
        }

        if let Some(prefix) = node.schema_list("prefixItems") {
            let prefix_path = child_path(path, "prefixItems");
            for (i, item) in prefix.into_iter().enumerate() {
                self.visit(item, &child_path(&prefix_path, i.to_string()), false);
            }
        }
    }

    /// Descend into composition, conditional, definition and remaining
    /// keyword sub-schemas. Descendants are never the root.
    fn visit_subschemas(&mut self, node: NodeRef<'_>, path: &[String]) {
        for keyword in ["allOf", "anyOf", "oneOf"] {
            if let Some(branches) = node.schema_list(keyword) {
                let keyword_path = child_path(path, keyword);
                for (i, branch) in branches.into_iter().enumerate() {
                    self.visit(branch, &child_path(&keyword_path, i.to_string()), false);
                }
            }
        }

        for keyword in ["if", "then", "else"] {
            if let Some(branch) = node.schema(keyword) {
                self.visit(branch, &child_path(path, keyword), false);
            }
        }

        let defs_keyword = if node.has("$defs") { "$defs" } else { "definitions" };
        if let Some(defs) = node.schema_map(defs_keyword) {
            let defs_path = child_path(path, defs_keyword);
            for (name, def) in defs {
                self.visit(def, &child_path(&defs_path, name), false);
            }
        }

        for keyword in ["not", "propertyNames", "contains"] {
            if let Some(sub) = node.schema(keyword) {
                self.visit(sub, &child_path(path, keyword), false);
            }
        }

        for keyword in ["patternProperties", "dependentSchemas"] {
            if let Some(entries) = node.schema_map(keyword) {
                let keyword_path = child_path(path, keyword);
                for (name, sub) in entries {
                    self.visit(sub, &child_path(&keyword_path, name), false);
                }
            }
        }
    }

    fn run_custom_checks(&mut self, node: NodeRef<'_>, path: &[String], is_root: bool) {
        let rules = &self.constraints.rules;
        let context = FeatureContext::of(is_root);

        for rule in &rules.unsupported {
            match rule {
                ConstraintRule::Simple(_) => {}
                ConstraintRule::Custom(custom) => {
                    if custom.context.unwrap_or_default().covers(context) {
                        self.issues.extend((custom.validate)(node, path, is_root));
                    }
                }
            }
        }

        for validator in &rules.validators {
            self.issues.extend((validator.validate)(node, path, is_root));
        }
    }
}
