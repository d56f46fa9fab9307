//! # Boundary shapes
//!
//! The three values that cross between host and client. They carry serde
//! derives so a transport can encode them in any self-describing format;
//! in JSON they read as:
//!
//! - snapshot: `{"values": {...}, "methods": [...]}`
//! - call: `{"method": "name", "args": [...]}`
//! - result: `{"return": value}` or `{"throw": "message"}`

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Serialized description of an object: data values and method names.
///
/// A key appears in exactly one of `values` or `methods`, at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub values: Map<String, Value>,
    pub methods: Vec<String>,
}

impl Snapshot {
    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn has_method(&self, key: &str) -> bool {
        self.methods.iter().any(|method| method == key)
    }
}

/// A request to invoke `method` with positional `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Call {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Outcome of one call. Failures carry only a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallResult {
    Return(Value),
    Throw(String),
}

impl CallResult {
    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return(_))
    }

    /// Converts into a plain `Result`, the `Err` side holding the thrown message.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Self::Return(value) => Ok(value),
            Self::Throw(message) => Err(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_result_json_shape() {
        let ok = serde_json::to_value(CallResult::Return(json!("abc123"))).unwrap();
        assert_eq!(ok, json!({ "return": "abc123" }));

        let err = serde_json::to_value(CallResult::Throw("bad input".into())).unwrap();
        assert_eq!(err, json!({ "throw": "bad input" }));

        let parsed: CallResult = serde_json::from_value(json!({ "throw": "x" })).unwrap();
        assert_eq!(parsed, CallResult::Throw("x".into()));
    }

    #[test]
    fn test_call_args_default_to_empty() {
        let call: Call = serde_json::from_value(json!({ "method": "pia" })).unwrap();
        assert_eq!(call, Call::new("pia", vec![]));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut values = Map::new();
        values.insert("foo".into(), json!("abc"));
        let snapshot = Snapshot {
            values,
            methods: vec!["pia".into()],
        };

        let encoded = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(encoded, json!({ "values": { "foo": "abc" }, "methods": ["pia"] }));
        assert!(snapshot.has_value("foo"));
        assert!(snapshot.has_method("pia"));
        assert!(!snapshot.has_method("foo"));
    }
}
