//! # Serializer and Dispatcher
//!
//! `Remote` is the host side of the boundary. It reduces a live object to a
//! [`Snapshot`] and executes [`Call`]s against that object, turning every
//! failure into a [`CallResult::Throw`] before anything crosses the boundary.
//!
//! ## Invariants
//!
//! - Both operations walk the same member sources, closest first.
//! - Serialization records each key once; the closest definition wins.
//! - Dispatch only considers callable members and skips over data or getters
//!   with the same name.
//! - An unexpected failure never leaks its message; the configured hooks are
//!   the only place it is observable.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::message::Call;
use crate::message::CallResult;
use crate::message::Snapshot;
use crate::object::Member;
use crate::object::Object;

/// Message returned for failures that are not safe to disclose.
pub const UNKNOWN_ERROR: &str = "Unknown error";

type Hook = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;
type Classifier = Arc<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

/// Dispatcher configuration.
///
/// Defaults: non-recursive, every error is expected (its message is forwarded),
/// both hooks are no-ops.
#[derive(Clone)]
pub struct RemoteOptions {
    recursive: bool,
    expected: Classifier,
    on_call_error: Hook,
    on_unexpected_call_error: Hook,
}

impl RemoteOptions {
    pub fn new() -> Self {
        Self {
            recursive: false,
            expected: Arc::new(|_| true),
            on_call_error: Arc::new(|_| {}),
            on_unexpected_call_error: Arc::new(|_| {}),
        }
    }

    /// Walk every ancestor prototype instead of only the immediate one.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Treats errors of type `E` as expected and every other error as unexpected.
    pub fn expected<E>(self) -> Self
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.expected_if(|error| error.is::<E>())
    }

    /// Installs an arbitrary classifier. Returning `true` discloses the message.
    pub fn expected_if<F>(mut self, classify: F) -> Self
    where
        F: Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    {
        self.expected = Arc::new(classify);
        self
    }

    /// Called on every failed call, before classification.
    pub fn on_call_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&anyhow::Error) + Send + Sync + 'static,
    {
        self.on_call_error = Arc::new(hook);
        self
    }

    /// Called only for failures the classifier rejects.
    pub fn on_unexpected_call_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&anyhow::Error) + Send + Sync + 'static,
    {
        self.on_unexpected_call_error = Arc::new(hook);
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RemoteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOptions")
            .field("recursive", &self.recursive)
            .finish_non_exhaustive()
    }
}

/// A host method panicked instead of returning.
///
/// Always classified as unexpected.
#[derive(Debug, Clone)]
pub struct MethodPanicked {
    pub method: String,
    pub message: String,
}

impl MethodPanicked {
    fn from_payload(method: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            method: method.to_string(),
            message,
        }
    }
}

impl fmt::Display for MethodPanicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method '{}' panicked: {}", self.method, self.message)
    }
}

impl std::error::Error for MethodPanicked {}

/// Host-side serializer and dispatcher.
///
/// Immutable after construction; share it behind an `Arc` across concurrent calls.
#[derive(Clone, Debug, Default)]
pub struct Remote {
    options: RemoteOptions,
}

impl Remote {
    pub fn new(options: RemoteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// Describes an object's readable members.
    ///
    /// Getters are evaluated once, with `object` as receiver. Methods are
    /// recorded by name only.
    pub fn serialize<T>(&self, object: &Object<T>) -> Snapshot {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut values = Map::new();
        let mut methods = Vec::new();

        for source in object.sources(self.options.recursive) {
            for (key, member) in source.iter() {
                if !seen.insert(key) {
                    trace!(key, "shadowed member skipped");
                    continue;
                }

                match member {
                    Member::Getter(getter) => {
                        values.insert(key.to_string(), getter(object));
                    }
                    Member::Method(_) => methods.push(key.to_string()),
                    Member::Value(value) => {
                        values.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        debug!(values = values.len(), methods = methods.len(), "serialized object");
        Snapshot { values, methods }
    }

    /// Invokes `call.method` on `object` and reports the outcome as data.
    pub async fn call<T>(&self, object: &Arc<Object<T>>, call: Call) -> CallResult
    where
        T: Send + Sync + 'static,
    {
        let Call { method, args } = call;

        let target = object
            .sources(self.options.recursive)
            .into_iter()
            .find_map(|source| source.get(&method).and_then(Member::as_method))
            .cloned();

        let Some(target) = target else {
            debug!(method = %method, "method not found");
            return CallResult::Throw(format!(
                "Method {} does not exist or is not accessible on object.",
                Value::String(method)
            ));
        };

        let this = Arc::clone(object);
        let outcome = AssertUnwindSafe(async move { target(this, args).await })
            .catch_unwind()
            .await;

        let (error, panicked) = match outcome {
            Ok(Ok(value)) => {
                debug!(method = %method, "call returned");
                return CallResult::Return(value);
            }
            Ok(Err(error)) => (error, false),
            Err(payload) => {
                let error = anyhow::Error::new(MethodPanicked::from_payload(&method, payload));
                (error, true)
            }
        };

        notify(&self.options.on_call_error, &error);

        if !panicked && (self.options.expected)(&error) {
            debug!(method = %method, error = %error, "call failed with expected error");
            return CallResult::Throw(error.to_string());
        }

        warn!(method = %method, error = %error, "call failed with unexpected error");
        notify(&self.options.on_unexpected_call_error, &error);
        CallResult::Throw(UNKNOWN_ERROR.to_string())
    }
}

/// Runs a hook, containing any panic it raises so the call still completes.
fn notify(hook: &Hook, error: &anyhow::Error) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| hook(error))).is_err() {
        warn!(error = %error, "call error hook panicked");
    }
}
