//! Arena storage for schema documents.
//!
//! Sub-schemas are stored as separate nodes addressed by [`NodeId`], so a
//! document can share a node between several parents or refer back to an
//! ancestor. Node identity is the `NodeId`: two nodes with equal contents
//! added separately are still distinct.
//!
//! Documents parsed from JSON are always trees. Shared and cyclic shapes
//! are built with [`SchemaDocument::add_node`] and the `set_schema*` setters.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Keywords whose value is a single sub-schema.
const SINGLE_SCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalProperties",
    "propertyNames",
    "not",
    "if",
    "then",
    "else",
    "contains",
];

/// Keywords whose value is an ordered list of sub-schemas.
const LIST_SCHEMA_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems", "items"];

/// Keywords whose value maps names to sub-schemas.
const MAP_SCHEMA_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Identity of a node within its [`SchemaDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Sub-schema reference held by a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSlot {
    Single(NodeId),
    List(Vec<NodeId>),
    Map(Vec<(String, NodeId)>),
}

/// One schema object.
///
/// Plain keyword values (`type`, `enum`, `minimum`, `additionalProperties: false`, ...)
/// live in `values`; sub-schemas live in `schemas`. A keyword is in at most one of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    values: Map<String, Value>,
    schemas: Vec<(String, SchemaSlot)>,
    boolean: Option<bool>,
}

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `true`/`false` schema appearing where a schema object was expected.
    pub fn boolean(value: bool) -> Self {
        Self {
            boolean: Some(value),
            ..Self::default()
        }
    }

    /// Set a plain keyword value, replacing any sub-schema under the same keyword.
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        let key = key.into();
        self.schemas.retain(|(k, _)| *k != key);
        self.values.insert(key, value);
        self
    }

    /// Set a single sub-schema keyword.
    pub fn set_schema(&mut self, key: impl Into<String>, id: NodeId) -> &mut Self {
        self.set_slot(key.into(), SchemaSlot::Single(id))
    }

    /// Set a list sub-schema keyword such as `anyOf`.
    pub fn set_schema_list(&mut self, key: impl Into<String>, ids: Vec<NodeId>) -> &mut Self {
        self.set_slot(key.into(), SchemaSlot::List(ids))
    }

    /// Set a map sub-schema keyword such as `properties`.
    pub fn set_schema_map<K: Into<String>>(
        &mut self,
        key: impl Into<String>,
        entries: impl IntoIterator<Item = (K, NodeId)>,
    ) -> &mut Self {
        let entries = entries.into_iter().map(|(k, id)| (k.into(), id)).collect();
        self.set_slot(key.into(), SchemaSlot::Map(entries))
    }

    fn set_slot(&mut self, key: String, slot: SchemaSlot) -> &mut Self {
        self.values.remove(&key);
        match self.schemas.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = slot,
            None => self.schemas.push((key, slot)),
        }
        self
    }

    fn slot(&self, key: &str) -> Option<&SchemaSlot> {
        self.schemas
            .iter()
            .find_map(|(k, slot)| (k == key).then_some(slot))
    }
}

/// A schema document: an arena of nodes plus the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    nodes: Vec<SchemaNode>,
    root: NodeId,
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDocument {
    /// A document holding a single empty root schema.
    pub fn new() -> Self {
        Self {
            nodes: vec![SchemaNode::new()],
            root: NodeId(0),
        }
    }

    /// Normalize a JSON document into an arena.
    ///
    /// A non-object root (e.g. `true`) becomes a boolean schema node, or an
    /// empty node for any other value.
    pub fn from_value(value: &Value) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.import(value);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// Add a node, returning its identity.
    pub fn add_node(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Mutable access for wiring sub-schemas after creation.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this document.
    pub fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    /// Read access to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this document.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node {} not in document", id.0);
        NodeRef { doc: self, id }
    }

    /// Read access to the root node.
    pub fn root_node(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the document back to JSON.
    ///
    /// A node reached again on its own ancestor chain renders as `{}`.
    pub fn to_value(&self) -> Value {
        let mut ancestors = HashSet::new();
        self.export(self.root, &mut ancestors)
    }

    fn import(&mut self, value: &Value) -> NodeId {
        let map = match value {
            Value::Object(map) => map,
            Value::Bool(b) => return self.add_node(SchemaNode::boolean(*b)),
            _ => return self.add_node(SchemaNode::new()),
        };

        // Reserve the slot first so parents precede their children
        let id = self.add_node(SchemaNode::new());
        let mut node = SchemaNode::new();

        for (key, child) in map {
            let key_str = key.as_str();
            match child {
                Value::Object(_) if SINGLE_SCHEMA_KEYWORDS.contains(&key_str) => {
                    let child_id = self.import(child);
                    node.set_schema(key.clone(), child_id);
                }
                Value::Array(arr)
                    if LIST_SCHEMA_KEYWORDS.contains(&key_str) && arr.iter().all(is_schema) =>
                {
                    let ids = arr.iter().map(|item| self.import(item)).collect();
                    node.set_schema_list(key.clone(), ids);
                }
                Value::Object(entries)
                    if MAP_SCHEMA_KEYWORDS.contains(&key_str) && entries.values().all(is_schema) =>
                {
                    let ids: Vec<(String, NodeId)> = entries
                        .iter()
                        .map(|(name, item)| (name.clone(), self.import(item)))
                        .collect();
                    node.set_schema_map(key.clone(), ids);
                }
                other => {
                    node.set_value(key.clone(), other.clone());
                }
            }
        }

        self.nodes[id.0] = node;
        id
    }

    fn export(&self, id: NodeId, ancestors: &mut HashSet<NodeId>) -> Value {
        if !ancestors.insert(id) {
            return Value::Object(Map::new());
        }
        let node = &self.nodes[id.0];
        let value = if let Some(b) = node.boolean {
            Value::Bool(b)
        } else {
            let mut out = node.values.clone();
            for (key, slot) in &node.schemas {
                let rendered = match slot {
                    SchemaSlot::Single(child) => self.export(*child, ancestors),
                    SchemaSlot::List(children) => Value::Array(
                        children
                            .iter()
                            .map(|child| self.export(*child, ancestors))
                            .collect(),
                    ),
                    SchemaSlot::Map(entries) => Value::Object(
                        entries
                            .iter()
                            .map(|(name, child)| (name.clone(), self.export(*child, ancestors)))
                            .collect(),
                    ),
                };
                out.insert(key.clone(), rendered);
            }
            Value::Object(out)
        };
        ancestors.remove(&id);
        value
    }
}

fn is_schema(value: &Value) -> bool {
    value.is_object() || value.is_boolean()
}

/// Borrowed view of one node, able to follow sub-schema links.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a SchemaDocument,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn inner(&self) -> &'a SchemaNode {
        &self.doc.nodes[self.id.0]
    }

    /// `Some(b)` for a boolean schema.
    pub fn as_boolean(&self) -> Option<bool> {
        self.inner().boolean
    }

    /// Plain keyword value, if present.
    pub fn value(&self, key: &str) -> Option<&'a Value> {
        self.inner().values.get(key)
    }

    /// Whether the keyword is present in any form.
    pub fn has(&self, key: &str) -> bool {
        self.inner().values.contains_key(key) || self.inner().slot(key).is_some()
    }

    /// Single sub-schema under `key`.
    pub fn schema(&self, key: &str) -> Option<NodeRef<'a>> {
        match self.inner().slot(key)? {
            SchemaSlot::Single(id) => Some(self.doc.node(*id)),
            _ => None,
        }
    }

    /// List sub-schemas under `key`.
    pub fn schema_list(&self, key: &str) -> Option<Vec<NodeRef<'a>>> {
        match self.inner().slot(key)? {
            SchemaSlot::List(ids) => Some(ids.iter().map(|id| self.doc.node(*id)).collect()),
            _ => None,
        }
    }

    /// Named sub-schemas under `key`, in document order.
    pub fn schema_map(&self, key: &str) -> Option<Vec<(&'a str, NodeRef<'a>)>> {
        match self.inner().slot(key)? {
            SchemaSlot::Map(entries) => Some(
                entries
                    .iter()
                    .map(|(name, id)| (name.as_str(), self.doc.node(*id)))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// The declared `type` when it is a single string.
    pub fn type_name(&self) -> Option<&'a str> {
        self.value("type").and_then(Value::as_str)
    }

    /// `type: "object"` or a `properties` keyword.
    pub fn is_object_schema(&self) -> bool {
        self.type_name() == Some("object") || self.has("properties")
    }

    /// `type: "array"` or an `items` keyword.
    pub fn is_array_schema(&self) -> bool {
        self.type_name() == Some("array") || self.has("items")
    }

    /// Names declared under `properties`, in document order.
    pub fn property_names(&self) -> Vec<&'a str> {
        match self.inner().slot("properties") {
            Some(SchemaSlot::Map(entries)) => entries.iter().map(|(name, _)| name.as_str()).collect(),
            _ => self
                .value("properties")
                .and_then(Value::as_object)
                .map(|props| props.keys().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }

    /// String entries of `required`.
    pub fn required(&self) -> Vec<&'a str> {
        self.value("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_splits_subschemas() {
        let doc = SchemaDocument::from_value(&json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["name"],
            "additionalProperties": false
        }));

        let root = doc.root_node();
        assert_eq!(root.type_name(), Some("object"));
        assert_eq!(root.value("additionalProperties"), Some(&json!(false)));
        assert!(root.schema("additionalProperties").is_none());

        let props = root.schema_map("properties").unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, "name");
        assert_eq!(props[1].1.schema("items").unwrap().type_name(), Some("string"));
        assert_eq!(root.required(), vec!["name"]);
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn tuple_items_become_list() {
        let doc = SchemaDocument::from_value(&json!({
            "type": "array",
            "items": [{ "type": "string" }, { "type": "number" }]
        }));
        let items = doc.root_node().schema_list("items").unwrap();
        assert_eq!(items.len(), 2);
        assert!(doc.root_node().schema("items").is_none());
    }

    #[test]
    fn boolean_list_entries_become_boolean_nodes() {
        let doc = SchemaDocument::from_value(&json!({ "anyOf": [true, { "type": "null" }] }));
        let branches = doc.root_node().schema_list("anyOf").unwrap();
        assert_eq!(branches[0].as_boolean(), Some(true));
        assert_eq!(branches[1].type_name(), Some("null"));
    }

    #[test]
    fn malformed_keyword_stays_plain() {
        let doc = SchemaDocument::from_value(&json!({ "allOf": [1, 2] }));
        assert!(doc.root_node().schema_list("allOf").is_none());
        assert_eq!(doc.root_node().value("allOf"), Some(&json!([1, 2])));
        assert!(doc.root_node().has("allOf"));
    }

    #[test]
    fn equal_nodes_are_distinct() {
        let doc = SchemaDocument::from_value(&json!({
            "properties": { "a": { "type": "string" }, "b": { "type": "string" } }
        }));
        let props = doc.root_node().schema_map("properties").unwrap();
        assert_ne!(props[0].1.id(), props[1].1.id());
    }

    #[test]
    fn to_value_round_trips_tree() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "anyOf": [{ "type": "string" }, false] } },
            "additionalProperties": false
        });
        let doc = SchemaDocument::from_value(&schema);
        assert_eq!(doc.to_value(), schema);
    }

    #[test]
    fn to_value_cuts_cycles() {
        let mut doc = SchemaDocument::new();
        let root = doc.root();
        doc.node_mut(root)
            .set_value("type", json!("object"))
            .set_schema_map("properties", [("child", root)]);

        assert_eq!(
            doc.to_value(),
            json!({ "type": "object", "properties": { "child": {} } })
        );
    }

    #[test]
    fn set_value_replaces_schema() {
        let mut doc = SchemaDocument::new();
        let child = doc.add_node(SchemaNode::new());
        let root = doc.root();
        doc.node_mut(root).set_schema("additionalProperties", child);
        assert!(doc.root_node().schema("additionalProperties").is_some());

        doc.node_mut(root)
            .set_value("additionalProperties", json!(false));
        assert!(doc.root_node().schema("additionalProperties").is_none());
        assert_eq!(
            doc.root_node().value("additionalProperties"),
            Some(&json!(false))
        );
    }
}
