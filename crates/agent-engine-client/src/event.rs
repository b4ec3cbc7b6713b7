//! Loosely structured events emitted by a remote agent stream.
//!
//! Events are kept as the raw JSON tree. Generic traversal ([`lookup`]) only
//! walks mapping keys; the one sequence the reducer cares about,
//! `content.parts`, is read through [`Event::first_part`], which accepts the
//! list form as well as an index-keyed mapping (`{"0": ...}`).

use serde_json::{Map, Value};

/// Walks `path` one dotted segment at a time through nested mappings.
///
/// Returns `None` as soon as a segment is missing or the current value is not
/// a mapping. Numeric segments are looked up as mapping keys, never as
/// sequence positions.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// [`lookup`] with a caller-supplied fallback for absent paths.
pub fn safe_path_get<'a>(record: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    lookup(record, path).unwrap_or(default)
}

/// Why a score candidate was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreRejection {
    Float,
    String,
    Bool,
    /// Integral but does not fit in `i64`.
    OutOfRange,
    /// Null, mapping or anything else.
    Other,
}

/// Result of decoding a score field. Only `Integer` is ever applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreValue {
    Integer(i64),
    Rejected(ScoreRejection),
}

impl ScoreValue {
    /// Strict decode: JSON integers are accepted, everything else is rejected
    /// without coercion (`"5"`, `5.0` and `true` included).
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None if n.is_u64() => Self::Rejected(ScoreRejection::OutOfRange),
                None => Self::Rejected(ScoreRejection::Float),
            },
            Value::String(_) => Self::Rejected(ScoreRejection::String),
            Value::Bool(_) => Self::Rejected(ScoreRejection::Bool),
            _ => Self::Rejected(ScoreRejection::Other),
        }
    }
}

/// One decoded event from the remote stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    tree: Value,
}

impl Event {
    /// Wraps a raw JSON record.
    pub fn from_value(raw: Value) -> Self {
        Self { tree: raw }
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.tree, path)
    }

    /// String at `path`, absent when missing or not a string.
    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Mapping at `path`, absent when missing or not a mapping.
    pub fn map_at(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }

    /// First content part, whether `parts` arrived as a list or as a
    /// mapping keyed by index.
    pub fn first_part(&self) -> Option<&Value> {
        match self.get("content.parts")? {
            Value::Array(parts) => parts.first(),
            Value::Object(parts) => parts.get("0"),
            _ => None,
        }
    }

    fn part_str(&self, path: &str) -> Option<&str> {
        self.first_part()
            .and_then(|part| lookup(part, path))
            .and_then(Value::as_str)
    }

    fn part_map(&self, path: &str) -> Option<&Map<String, Value>> {
        self.first_part()
            .and_then(|part| lookup(part, path))
            .and_then(Value::as_object)
    }

    pub fn function_call_name(&self) -> Option<&str> {
        self.part_str("function_call.name")
    }

    pub fn function_call_args(&self) -> Option<&Map<String, Value>> {
        self.part_map("function_call.args")
    }

    pub fn function_response_name(&self) -> Option<&str> {
        self.part_str("function_response.name")
    }

    pub fn function_response(&self) -> Option<&Map<String, Value>> {
        self.part_map("function_response.response")
    }

    pub fn artifact_delta(&self) -> Option<&Map<String, Value>> {
        self.map_at("actions.artifact_delta")
    }

    pub fn state_delta(&self) -> Option<&Map<String, Value>> {
        self.map_at("actions.state_delta")
    }

    /// Compact tag used for verbose logging: call name, else response name,
    /// else `text/other`.
    pub fn kind(&self) -> &str {
        self.function_call_name()
            .filter(|name| !name.is_empty())
            .or_else(|| self.function_response_name().filter(|name| !name.is_empty()))
            .unwrap_or("text/other")
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_mappings() {
        let record = json!({"a": {"b": {"c": 7}}});
        assert_eq!(lookup(&record, "a.b.c"), Some(&json!(7)));
        assert_eq!(lookup(&record, "a.b"), Some(&json!({"c": 7})));
    }

    #[test]
    fn lookup_stops_at_missing_segments_and_scalars() {
        let record = json!({"a": {"b": 1}, "s": "text"});
        assert_eq!(lookup(&record, "a.x"), None);
        assert_eq!(lookup(&record, "a.b.c"), None);
        assert_eq!(lookup(&record, "s.len"), None);
        assert_eq!(lookup(&record, "missing.deeper.still"), None);
        assert_eq!(lookup(&json!(null), "a"), None);
    }

    #[test]
    fn numeric_segments_do_not_index_raw_sequences() {
        let record = json!({"parts": [{"name": "x"}]});
        assert_eq!(lookup(&record, "parts.0.name"), None);

        let keyed = json!({"parts": {"0": {"name": "x"}}});
        assert_eq!(lookup(&keyed, "parts.0.name"), Some(&json!("x")));
    }

    #[test]
    fn safe_path_get_returns_default_when_absent() {
        let record = json!({"a": [1, 2]});
        let fallback = json!({});
        assert_eq!(safe_path_get(&record, "a.0", &fallback), &fallback);
        assert_eq!(safe_path_get(&record, "a", &fallback), &json!([1, 2]));
    }

    #[test]
    fn first_part_accepts_list_and_index_keyed_forms() {
        let listed = Event::from_value(json!({"content": {"parts": [{"text": "a"}, {"text": "b"}]}}));
        assert_eq!(listed.first_part(), Some(&json!({"text": "a"})));
        let keyed = Event::from_value(json!({"content": {"parts": {"0": {"text": "a"}}}}));
        assert_eq!(keyed.first_part(), Some(&json!({"text": "a"})));
        let empty = Event::from_value(json!({"content": {"parts": []}}));
        assert_eq!(empty.first_part(), None);
        let scalar = Event::from_value(json!({"content": {"parts": "text"}}));
        assert_eq!(scalar.first_part(), None);
    }

    #[test]
    fn first_part_tool_fields_are_addressable() {
        let event = Event::from_value(json!({
            "content": {"parts": [{"function_call": {"name": "set_score", "args": {"total_score": 8}}}]}
        }));
        assert_eq!(event.function_call_name(), Some("set_score"));
        assert_eq!(
            event.function_call_args().and_then(|args| args.get("total_score")),
            Some(&json!(8))
        );
    }

    #[test]
    fn score_decode_is_strict() {
        assert_eq!(ScoreValue::decode(&json!(5)), ScoreValue::Integer(5));
        assert_eq!(ScoreValue::decode(&json!(-3)), ScoreValue::Integer(-3));
        assert_eq!(
            ScoreValue::decode(&json!("5")),
            ScoreValue::Rejected(ScoreRejection::String)
        );
        assert_eq!(
            ScoreValue::decode(&json!(5.0)),
            ScoreValue::Rejected(ScoreRejection::Float)
        );
        assert_eq!(
            ScoreValue::decode(&json!(true)),
            ScoreValue::Rejected(ScoreRejection::Bool)
        );
        assert_eq!(
            ScoreValue::decode(&json!(u64::MAX)),
            ScoreValue::Rejected(ScoreRejection::OutOfRange)
        );
        assert_eq!(
            ScoreValue::decode(&json!(null)),
            ScoreValue::Rejected(ScoreRejection::Other)
        );
    }

    #[test]
    fn kind_prefers_call_then_response_then_fallback() {
        let call = Event::from_value(json!({"content": {"parts": [{"function_call": {"name": "set_score"}}]}}));
        assert_eq!(call.kind(), "set_score");
        let response = Event::from_value(
            json!({"content": {"parts": [{"function_response": {"name": "generate_images"}}]}}),
        );
        assert_eq!(response.kind(), "generate_images");
        let text = Event::from_value(json!({"content": {"parts": [{"text": "hi"}]}}));
        assert_eq!(text.kind(), "text/other");
        let empty_name = Event::from_value(
            json!({"content": {"parts": [{"function_call": {"name": ""}, "function_response": {"name": "r"}}]}}),
        );
        assert_eq!(empty_name.kind(), "r");
    }
}
