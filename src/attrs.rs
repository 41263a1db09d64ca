use serde::Serialize;
use serde_json::Value;

/// One attribute value as stored on a placement. Numbers keep their JSON
/// representation so re-encoding is byte-stable.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
    List(Vec<String>),
}

impl AttrValue {
    /// Text form used inside a directive string. Lists join with `,`
    /// before escaping.
    pub fn render(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Num(n) => n.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::List(items) => items.join(","),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            AttrValue::Str(s) => s.is_empty(),
            AttrValue::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Ordered key→value parameters of one placement occurrence. Insertion
/// order is preserved; `set` on an existing key replaces in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entries with empty strings and empty lists filtered out, in
    /// insertion order.
    pub fn non_empty_entries(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a JSONB attributes object. Null values are dropped; nested
    /// objects are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        let mut attrs = Self::new();
        let Some(obj) = value.as_object() else { return attrs };
        for (key, v) in obj {
            let Some(converted) = convert(v) else { continue };
            attrs.set(key.clone(), converted);
        }
        attrs
    }

    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.entries {
            obj.insert(k.clone(), serde_json::to_value(v).unwrap_or(Value::Null));
        }
        Value::Object(obj)
    }
}

fn convert(v: &Value) -> Option<AttrValue> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(AttrValue::Str(s.clone())),
        Value::Number(n) => Some(AttrValue::Num(n.clone())),
        Value::Bool(b) => Some(AttrValue::Bool(*b)),
        Value::Array(items) => Some(AttrValue::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        Value::Object(_) => Some(AttrValue::Str(v.to_string())),
    }
}
