//! Integration tests for compatibility checking.

use std::sync::Arc;

use serde_json::{json, Value};
use schema_compat::{
    check, registry, traverse, ConstraintRegistry, CustomValidator, Feature, FeatureContext,
    ModelId, ModelPattern, ResolvedConstraints, RuleSet, SchemaDocument, SchemaNode, SimpleRule,
    ValidationIssue,
};

fn model(s: &str) -> ModelId {
    ModelId::parse(s).unwrap()
}

fn resolved(rules: RuleSet) -> ResolvedConstraints {
    ResolvedConstraints::new("acme", "m1", Arc::new(rules))
}

fn run(schema: &Value, rules: RuleSet) -> Vec<ValidationIssue> {
    traverse(&SchemaDocument::from_value(schema), &resolved(rules))
}

fn pointers(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(ValidationIssue::pointer).collect()
}

// === Scenarios ===

mod scenarios {
    use super::*;

    #[test]
    fn compliant_object_without_rules() {
        let schema = json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"],
            "additionalProperties": false
        });
        assert!(run(&schema, RuleSet::new("acme")).is_empty());
    }

    #[test]
    fn root_one_of() {
        let schema = json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] });
        let issues = run(&schema, RuleSet::new("acme").unsupported(Feature::OneOf));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, Vec::<String>::new());
        assert_eq!(issues[0].feature, "oneOf");
    }

    #[test]
    fn nested_one_of() {
        let schema = json!({
            "type": "object",
            "properties": {
                "animal": {
                    "oneOf": [
                        { "type": "object", "properties": { "kind": { "const": "dog" } } },
                        { "type": "object", "properties": { "kind": { "const": "cat" } } }
                    ]
                }
            }
        });
        let issues = run(&schema, RuleSet::new("acme").unsupported(Feature::OneOf));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec!["properties", "animal"]);
    }

    #[test]
    fn all_properties_required_validator() {
        let schema = json!({ "properties": { "a": {}, "b": {} }, "required": ["a"] });
        let rules = RuleSet::new("acme").validator(schema_compat::validators::all_properties_required());
        let issues = run(&schema, rules);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].feature, "optionalProperties");
        assert!(issues[0].message.contains("'b'"));
    }
}

// === Properties ===

mod properties {
    use super::*;

    #[test]
    fn no_refused_features_no_issues() {
        let rules = || {
            RuleSet::new("acme").unsupported_all(&[
                Feature::AllOf,
                Feature::OneOf,
                Feature::Not,
                Feature::PatternProperties,
                Feature::Minimum,
            ])
        };
        let schemas = [
            json!({ "type": "string" }),
            json!({ "type": "array", "items": { "anyOf": [{ "type": "string" }, { "type": "null" }] } }),
            json!({
                "type": "object",
                "properties": { "x": { "type": "integer", "maximum": 3 } },
                "$defs": { "y": { "type": "boolean" } }
            }),
        ];
        for schema in &schemas {
            assert!(run(schema, rules()).is_empty(), "unexpected issues for {schema}");
        }
    }

    #[test]
    fn refused_feature_reported_at_its_node() {
        let schema = json!({
            "type": "object",
            "properties": {
                "list": {
                    "type": "array",
                    "items": { "type": "object", "properties": { "id": { "type": "string", "pattern": "^[a-z]+$" } } }
                }
            }
        });
        let issues = run(&schema, RuleSet::new("acme").unsupported(Feature::Pattern));
        assert_eq!(
            pointers(&issues),
            vec!["/properties/list/items/properties/id"]
        );
    }

    #[test]
    fn root_and_nested_contexts_are_exclusive() {
        let root_only = || {
            RuleSet::new("acme")
                .unsupported(SimpleRule::new(Feature::Format).context(FeatureContext::Root))
        };
        let nested_only = || {
            RuleSet::new("acme")
                .unsupported(SimpleRule::new(Feature::Format).context(FeatureContext::Nested))
        };
        let at_root = json!({ "type": "string", "format": "email" });
        let in_items = json!({ "type": "array", "items": { "type": "string", "format": "email" } });

        assert_eq!(run(&at_root, root_only()).len(), 1);
        assert!(run(&in_items, root_only()).is_empty());
        assert!(run(&at_root, nested_only()).is_empty());
        assert_eq!(run(&in_items, nested_only()).len(), 1);
    }

    #[test]
    fn max_items_allow_list() {
        let rules = || {
            RuleSet::new("acme")
                .unsupported(SimpleRule::new(Feature::MaxItems).allow([json!(10)]))
        };
        assert!(run(&json!({ "type": "array", "maxItems": 10 }), rules()).is_empty());
        assert_eq!(run(&json!({ "type": "array", "maxItems": 11 }), rules()).len(), 1);
        assert!(run(&json!({ "type": "array" }), rules()).is_empty());
    }
}

// === Cycles ===

mod cycles {
    use super::*;

    /// `Node = { value: string, next: Node }` with `next` pointing back at the root.
    fn linked_list() -> SchemaDocument {
        let mut doc = SchemaDocument::new();
        let root = doc.root();
        let mut value = SchemaNode::new();
        value.set_value("type", json!("string"));
        let value = doc.add_node(value);
        doc.node_mut(root)
            .set_value("type", json!("object"))
            .set_schema_map("properties", [("value", value), ("next", root)]);
        doc
    }

    #[test]
    fn recursive_refused_once() {
        let issues = traverse(
            &linked_list(),
            &resolved(RuleSet::new("acme").unsupported(Feature::Recursive)),
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].feature, "recursive");
        assert_eq!(issues[0].path, vec!["properties", "next"]);
    }

    #[test]
    fn recursive_allowed_terminates() {
        assert!(traverse(&linked_list(), &resolved(RuleSet::new("acme"))).is_empty());
    }

    #[test]
    fn indirect_cycle_through_defs() {
        // root.$defs.a.items -> root.$defs.a
        let mut doc = SchemaDocument::new();
        let a = doc.add_node(SchemaNode::new());
        doc.node_mut(a)
            .set_value("type", json!("array"))
            .set_schema("items", a);
        let root = doc.root();
        doc.node_mut(root).set_schema_map("$defs", [("a", a)]);

        let issues = traverse(
            &doc,
            &resolved(RuleSet::new("acme").unsupported(Feature::Recursive)),
        );
        assert_eq!(pointers(&issues), vec!["/$defs/a/items"]);
    }

    #[test]
    fn validators_see_each_node_once() {
        let doc = linked_list();
        let counter = CustomValidator::new("count", |node, path, _| {
            vec![ValidationIssue::new(path, "seen", format!("{}", node.id().index()))]
        });
        let issues = traverse(&doc, &resolved(RuleSet::new("acme").validator(counter)));
        assert_eq!(issues.len(), 2);
    }
}

// === Registry ===

mod registry_resolution {
    use super::*;

    #[test]
    fn exact_beats_regex_registered_later() {
        let mut registry = ConstraintRegistry::new();
        registry
            .register(ModelPattern::exact("acme/pinned"), RuleSet::new("pinned"))
            .unwrap();
        registry
            .register(
                ModelPattern::regex("^acme/").unwrap(),
                RuleSet::new("family").unsupported(Feature::OneOf),
            )
            .unwrap();

        let report = check(&json!({ "oneOf": [{}] }), &model("acme/pinned"), &registry);
        assert!(report.compatible);
        assert_eq!(report.provider, "pinned");

        let report = check(&json!({ "oneOf": [{}] }), &model("acme/other"), &registry);
        assert!(!report.compatible);
    }

    #[test]
    fn narrower_regex_registered_later_wins() {
        let mut registry = ConstraintRegistry::with_builtins();
        registry
            .register(ModelPattern::regex("^openai/gpt-3\\.5").unwrap(), RuleSet::new("legacy"))
            .unwrap();
        assert_eq!(registry.resolve(&model("openai/gpt-3.5-turbo")).provider, "legacy");
        assert_eq!(registry.resolve(&model("openai/gpt-4o")).provider, "openai");
    }

    #[test]
    fn builtin_openai_rules() {
        let registry = ConstraintRegistry::with_builtins();
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "nick": { "type": "string" }
            },
            "required": ["name"]
        });
        let report = check(&schema, &model("openai/gpt-4o"), &registry);
        let features: Vec<&str> = report.issues.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(features, vec!["optionalProperties", "additionalProperties"]);
    }

    #[test]
    fn builtin_anthropic_rules() {
        let registry = ConstraintRegistry::with_builtins();
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                "age": { "type": "integer", "minimum": 0 }
            },
            "additionalProperties": false
        });
        let report = check(&schema, &model("anthropic/claude-sonnet-4"), &registry);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].feature, "minimum");
        assert_eq!(report.issues[0].pointer(), "/properties/age");
    }

    #[test]
    fn builtin_google_refuses_const() {
        let registry = ConstraintRegistry::with_builtins();
        let schema = json!({
            "type": "object",
            "properties": { "kind": { "type": "string", "const": "dog" } }
        });
        let report = check(&schema, &model("google/gemini-2.0-flash"), &registry);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].feature, "const");
        assert_eq!(report.issues[0].pointer(), "/properties/kind");
    }

    #[test]
    fn global_registry_accepts_registrations() {
        registry::register(
            ModelPattern::exact("integration-test/only-model"),
            RuleSet::new("integration").unsupported(Feature::Not),
        )
        .unwrap();
        let resolved = registry::resolve(&model("integration-test/only-model"));
        assert_eq!(resolved.provider, "integration");
        assert_eq!(registry::resolve(&model("openai/gpt-4o")).provider, "openai");
    }
}
