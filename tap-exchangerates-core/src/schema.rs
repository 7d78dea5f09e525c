//! Append-only JSON schema for the `exchange_rate` stream.
//!
//! The schema starts with a single `date` property and gains one nullable
//! number property per currency code ever seen. Properties are never removed
//! or retyped. The evolver also remembers the last schema it handed out for
//! emission, so callers only re-emit when something actually changed.

use serde_json::{json, Map, Value};

/// Currencies added by one call to [`SchemaEvolver::observe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDelta {
    pub added: Vec<String>,
}

impl SchemaDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SchemaEvolver {
    properties: Map<String, Value>,
    last_emitted: Option<Map<String, Value>>,
}

impl Default for SchemaEvolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaEvolver {
    pub fn new() -> Self {
        let mut properties = Map::new();
        properties.insert(
            "date".to_string(),
            json!({ "type": "string", "format": "date-time" }),
        );
        Self {
            properties,
            last_emitted: None,
        }
    }

    /// Add a `["null", "number"]` property for every code not yet known.
    pub fn observe<'a, I>(&mut self, codes: I) -> SchemaDelta
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut delta = SchemaDelta::default();
        for code in codes {
            if !self.properties.contains_key(code) {
                self.properties
                    .insert(code.to_string(), json!({ "type": ["null", "number"] }));
                delta.added.push(code.to_string());
            }
        }
        delta
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The full JSON schema object.
    pub fn to_json(&self) -> Value {
        json!({
            "type": "object",
            "properties": Value::Object(self.properties.clone()),
        })
    }

    /// The schema to emit, if it differs from the last one marked emitted.
    pub fn pending(&self) -> Option<Value> {
        if self.last_emitted.as_ref() == Some(&self.properties) {
            None
        } else {
            Some(self.to_json())
        }
    }

    /// Record the current schema as emitted.
    pub fn mark_emitted(&mut self) {
        self.last_emitted = Some(self.properties.clone());
    }
}
