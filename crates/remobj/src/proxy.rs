//! # Remote Object Stand-in
//!
//! Reconstructs a host object on the client from its [`Snapshot`].
//!
//! The stand-in is stateless: it holds the snapshot and a transport, and
//! nothing else. Construction never touches the transport.
//!
//! ## Invariants
//!
//! - Data values are read synchronously from the snapshot.
//! - Each method call sends exactly one [`Call`] and awaits exactly one result.
//! - A `Throw` result becomes [`Error::Remote`] carrying the transmitted message.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::message::Call;
use crate::message::CallResult;
use crate::message::Snapshot;
use crate::transport::Transport;
use crate::transport::TransportError;

/// A failure reported by the host for a remote call.
///
/// Only the message survives the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCallError {
    message: String,
}

impl RemoteCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error kind name, distinct from any host-side error type.
    pub fn name(&self) -> &'static str {
        "RemoteObjectCallError"
    }
}

impl fmt::Display for RemoteCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteCallError {}

/// Errors during a stand-in method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The host ran the call and it failed.
    Remote(RemoteCallError),
    /// The call or its result could not be moved.
    Transport(TransportError),
    /// The snapshot lists no method with this name; nothing was sent.
    NotAMethod(String),
    /// A typed argument or return value did not fit its declared type.
    Decode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(e) => write!(f, "{}", e),
            Self::Transport(e) => write!(f, "Transport failure: {}", e),
            Self::NotAMethod(key) => write!(f, "'{}' is not a method of the remote object", key),
            Self::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Remote(e) => Some(e),
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<RemoteCallError> for Error {
    fn from(e: RemoteCallError) -> Self {
        Self::Remote(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a property read on the stand-in yields.
#[derive(Debug)]
pub enum Property<'a> {
    Value(&'a Value),
    Method(RemoteMethod),
}

/// Client-side stand-in for a host object.
#[derive(Clone)]
pub struct RemoteObject {
    snapshot: Arc<Snapshot>,
    transport: Arc<dyn Transport>,
}

impl RemoteObject {
    pub fn new(snapshot: Snapshot, transport: Arc<dyn Transport>) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            transport,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Reads a property. Values take precedence; unknown keys read as `None`.
    pub fn get(&self, key: &str) -> Option<Property<'_>> {
        if let Some(value) = self.snapshot.values.get(key) {
            return Some(Property::Value(value));
        }
        self.method(key).map(Property::Method)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.snapshot.values.get(key)
    }

    /// Reads a value and deserializes it. A missing or ill-shaped value reads as `None`.
    pub fn value_as<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let value = self.value(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns a callable handle if the snapshot lists `key` as a method.
    pub fn method(&self, key: &str) -> Option<RemoteMethod> {
        if !self.snapshot.has_method(key) {
            return None;
        }
        Some(RemoteMethod {
            name: key.to_string(),
            transport: Arc::clone(&self.transport),
        })
    }

    /// Shorthand for `method(key)` followed by [`RemoteMethod::call`].
    pub async fn call(&self, key: &str, args: Vec<Value>) -> Result<Value> {
        let method = self
            .method(key)
            .ok_or_else(|| Error::NotAMethod(key.to_string()))?;
        method.call(args).await
    }
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

/// A method of a [`RemoteObject`], bound to its transport.
#[derive(Clone)]
pub struct RemoteMethod {
    name: String,
    transport: Arc<dyn Transport>,
}

impl RemoteMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends the call and waits for the host's result.
    pub async fn call(&self, args: Vec<Value>) -> Result<Value> {
        let call = Call::new(self.name.clone(), args);
        match self.transport.call(call).await? {
            CallResult::Return(value) => Ok(value),
            CallResult::Throw(message) => Err(Error::Remote(RemoteCallError::new(message))),
        }
    }
}

impl fmt::Debug for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMethod").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Serializes one typed argument for a call.
pub fn encode_arg<A: Serialize + ?Sized>(arg: &A) -> Result<Value> {
    serde_json::to_value(arg).map_err(|e| Error::Decode(e.to_string()))
}

/// Deserializes a returned value into its declared type.
pub fn decode_return<R: DeserializeOwned>(value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    use crate::transport;

    /// Records every call and answers with a fixed result.
    struct ScriptedTransport {
        reply: transport::Result<CallResult>,
        seen: Mutex<Vec<Call>>,
    }

    impl ScriptedTransport {
        fn new(reply: transport::Result<CallResult>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Call> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn call(&self, call: Call) -> transport::Result<CallResult> {
            self.seen.lock().unwrap().push(call);
            self.reply.clone()
        }
    }

    fn snapshot() -> Snapshot {
        let mut values = serde_json::Map::new();
        values.insert("foo".into(), json!("abc"));
        values.insert("bar".into(), json!(123));
        Snapshot {
            values,
            methods: vec!["pia".into()],
        }
    }

    #[test]
    fn test_values_read_without_transport() {
        let transport = ScriptedTransport::new(Ok(CallResult::Return(Value::Null)));
        let object = RemoteObject::new(snapshot(), transport.clone());

        assert_eq!(object.value("foo"), Some(&json!("abc")));
        assert_eq!(object.value_as::<u32>("bar"), Some(123));
        assert!(matches!(object.get("bar"), Some(Property::Value(v)) if *v == json!(123)));
        assert!(matches!(object.get("pia"), Some(Property::Method(m)) if m.name() == "pia"));
        assert!(object.get("missing").is_none());
        assert!(transport.seen().is_empty());
    }

    #[tokio::test]
    async fn test_method_call_packages_name_and_args() {
        let transport = ScriptedTransport::new(Ok(CallResult::Return(json!("abc123"))));
        let object = RemoteObject::new(snapshot(), transport.clone());

        let value = object.call("pia", vec![json!(1), json!("two")]).await.unwrap();

        assert_eq!(value, json!("abc123"));
        assert_eq!(transport.seen(), vec![Call::new("pia", vec![json!(1), json!("two")])]);
    }

    #[tokio::test]
    async fn test_throw_becomes_remote_call_error() {
        let transport = ScriptedTransport::new(Ok(CallResult::Throw("bad input".into())));
        let object = RemoteObject::new(snapshot(), transport);

        let err = object.call("pia", vec![]).await.unwrap_err();

        assert_eq!(err, Error::Remote(RemoteCallError::new("bad input")));
        assert_eq!(err.to_string(), "bad input");
        assert!(matches!(&err, Error::Remote(e) if e.name() == "RemoteObjectCallError"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_from_remote_failure() {
        let transport = ScriptedTransport::new(Err(TransportError::ConnectionLost("gone".into())));
        let object = RemoteObject::new(snapshot(), transport);

        let err = object.call("pia", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::ConnectionLost(_))));
    }

    #[tokio::test]
    async fn test_calling_a_value_sends_nothing() {
        let transport = ScriptedTransport::new(Ok(CallResult::Return(Value::Null)));
        let object = RemoteObject::new(snapshot(), transport.clone());

        let err = object.call("foo", vec![]).await.unwrap_err();

        assert_eq!(err, Error::NotAMethod("foo".into()));
        assert!(transport.seen().is_empty());
    }
}
