//! # Host object model
//!
//! A host object is an ordered chain of member sources: the object's own
//! members first, then its prototype, then the prototype's ancestors.
//!
//! ## Philosophy
//!
//! - **Explicit Chain**: Nothing is discovered through runtime reflection. Each
//!   source lists its own keys in definition order, tagged as data, getter, or method.
//! - **Implicit Base**: A prototype without a parent sits directly on the universal
//!   base object. That base is never modeled, so no walk ever reaches it.
//! - **Shared Prototypes**: Prototypes are immutable once built and shared behind
//!   `Arc`, the way one class prototype serves every instance.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

/// Accessor evaluated with the original object as receiver.
pub type Getter<T> = Arc<dyn Fn(&Object<T>) -> Value + Send + Sync>;

/// Invocable member. Receives the original object and the positional arguments.
pub type Method<T> =
    Arc<dyn Fn(Arc<Object<T>>, Vec<Value>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// A single member definition, as stored in a member source.
pub enum Member<T> {
    /// Plain data.
    Value(Value),
    /// Computed on read.
    Getter(Getter<T>),
    /// Callable; never evaluated during serialization.
    Method(Method<T>),
}

impl<T> Member<T> {
    /// Wraps a plain data value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Wraps a getter.
    pub fn getter<F, R>(f: F) -> Self
    where
        F: Fn(&Object<T>) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let getter: Getter<T> = Arc::new(move |this: &Object<T>| f(this).into());
        Self::Getter(getter)
    }

    /// Wraps an async method.
    ///
    /// The future is boxed once per invocation, and the resolved value is what
    /// crosses the boundary.
    pub fn method<F, Fut, R>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<Object<T>>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Value> + 'static,
    {
        let method: Method<T> = Arc::new(move |this: Arc<Object<T>>, args: Vec<Value>| {
            let fut = f(this, args);
            async move { fut.await.map(Into::into) }.boxed()
        });
        Self::Method(method)
    }

    /// Returns the method body if this member is callable.
    pub fn as_method(&self) -> Option<&Method<T>> {
        match self {
            Self::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Getter(getter) => Self::Getter(Arc::clone(getter)),
            Self::Method(method) => Self::Method(Arc::clone(method)),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Getter(_) => f.write_str("Getter"),
            Self::Method(_) => f.write_str("Method"),
        }
    }
}

/// The own members of one source, in definition order.
///
/// Keys are unique within a source: defining a key twice replaces the first
/// definition but keeps its original position.
pub struct Members<T> {
    entries: Vec<(String, Member<T>)>,
}

impl<T> Members<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Defines or redefines a member.
    pub fn define(&mut self, key: impl Into<String>, member: Member<T>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = member,
            None => self.entries.push((key, member)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Member<T>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, member)| member)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates members in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Member<T>)> {
        self.entries.iter().map(|(key, member)| (key.as_str(), member))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Members<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Members<T> {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone() }
    }
}

impl<T> fmt::Debug for Members<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A named member source shared by every object that inherits from it.
pub struct Prototype<T> {
    name: String,
    members: Members<T>,
    parent: Option<Arc<Prototype<T>>>,
}

impl<T> Prototype<T> {
    pub fn builder(name: impl Into<String>) -> PrototypeBuilder<T> {
        PrototypeBuilder {
            name: name.into(),
            members: Members::new(),
            parent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &Members<T> {
        &self.members
    }

    /// The next prototype up the chain, `None` when this one sits on the base object.
    pub fn parent(&self) -> Option<&Arc<Prototype<T>>> {
        self.parent.as_ref()
    }
}

impl<T> fmt::Debug for Prototype<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// Fluent builder for [`Prototype`].
pub struct PrototypeBuilder<T> {
    name: String,
    members: Members<T>,
    parent: Option<Arc<Prototype<T>>>,
}

impl<T: Send + Sync + 'static> PrototypeBuilder<T> {
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.define(key, Member::value(value));
        self
    }

    pub fn getter<F, R>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Object<T>) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.members.define(key, Member::getter(f));
        self
    }

    pub fn method<F, Fut, R>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<Object<T>>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Value> + 'static,
    {
        self.members.define(key, Member::method(f));
        self
    }

    /// Sets the parent prototype.
    pub fn extends(mut self, parent: Arc<Prototype<T>>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Arc<Prototype<T>> {
        Arc::new(Prototype {
            name: self.name,
            members: self.members,
            parent: self.parent,
        })
    }
}

/// A live host object: state, own members, and an optional prototype.
pub struct Object<T> {
    state: T,
    own: Members<T>,
    prototype: Option<Arc<Prototype<T>>>,
}

impl<T> Object<T> {
    /// An object with no own members that sits directly on the base object.
    pub fn new(state: T) -> Self {
        Self {
            state,
            own: Members::new(),
            prototype: None,
        }
    }

    pub fn builder(state: T) -> ObjectBuilder<T> {
        ObjectBuilder { object: Self::new(state) }
    }

    /// The native state behind this object.
    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn own(&self) -> &Members<T> {
        &self.own
    }

    pub fn prototype(&self) -> Option<&Arc<Prototype<T>>> {
        self.prototype.as_ref()
    }

    /// Returns the member sources to examine, closest first.
    ///
    /// Always starts with the object's own members. A non-recursive walk adds
    /// at most the immediate prototype; a recursive walk adds every ancestor.
    pub fn sources(&self, recursive: bool) -> Vec<&Members<T>> {
        let mut sources = vec![&self.own];
        let mut next = self.prototype.as_deref();

        while let Some(prototype) = next {
            sources.push(&prototype.members);
            if !recursive {
                break;
            }
            next = prototype.parent.as_deref();
        }

        sources
    }

    /// Reads a property through the whole chain.
    ///
    /// The closest definition wins. Getters run with this object as receiver.
    /// Methods are not values, so a key whose closest definition is a method
    /// reads as `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let member = self.sources(true).into_iter().find_map(|source| source.get(key))?;
        match member {
            Member::Value(value) => Some(value.clone()),
            Member::Getter(getter) => Some(getter(self)),
            Member::Method(_) => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Object<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("state", &self.state)
            .field("own", &self.own)
            .field("prototype", &self.prototype.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// Fluent builder for [`Object`].
pub struct ObjectBuilder<T> {
    object: Object<T>,
}

impl<T: Send + Sync + 'static> ObjectBuilder<T> {
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.object.own.define(key, Member::value(value));
        self
    }

    pub fn getter<F, R>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Object<T>) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.object.own.define(key, Member::getter(f));
        self
    }

    pub fn method<F, Fut, R>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<Object<T>>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Value> + 'static,
    {
        self.object.own.define(key, Member::method(f));
        self
    }

    pub fn prototype(mut self, prototype: Arc<Prototype<T>>) -> Self {
        self.object.prototype = Some(prototype);
        self
    }

    pub fn build(self) -> Object<T> {
        self.object
    }

    /// Builds the object behind an `Arc`, ready to be dispatched against.
    pub fn shared(self) -> Arc<Object<T>> {
        Arc::new(self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> Arc<Prototype<()>> {
        let base = Prototype::builder("Base")
            .value("kind", "base")
            .value("depth", 0)
            .build();
        Prototype::builder("Derived")
            .value("kind", "derived")
            .extends(base)
            .build()
    }

    #[test]
    fn test_sources_non_recursive_stops_at_immediate_prototype() {
        let object = Object::builder(()).value("own", true).prototype(chain()).build();
        let sources = object.sources(false);

        assert_eq!(sources.len(), 2);
        assert!(sources[0].contains("own"));
        assert!(sources[1].contains("kind"));
        assert!(!sources[1].contains("depth"));
    }

    #[test]
    fn test_sources_recursive_walks_every_ancestor() {
        let object = Object::builder(()).prototype(chain()).build();
        let sources = object.sources(true);

        assert_eq!(sources.len(), 3);
        assert!(sources[2].contains("depth"));
    }

    #[test]
    fn test_sources_plain_object_is_only_itself() {
        let object = Object::builder(()).value("a", 1).build();
        assert_eq!(object.sources(false).len(), 1);
        assert_eq!(object.sources(true).len(), 1);
    }

    #[test]
    fn test_get_closest_definition_wins() {
        let object = Object::builder(()).prototype(chain()).build();
        assert_eq!(object.get("kind"), Some(json!("derived")));
        assert_eq!(object.get("depth"), Some(json!(0)));
        assert_eq!(object.get("missing"), None);
    }

    #[test]
    fn test_get_evaluates_getter_against_original_object() {
        let proto = Prototype::builder("Point")
            .getter("sum", |this: &Object<(i64, i64)>| this.state().0 + this.state().1)
            .build();
        let object = Object::builder((2, 3)).prototype(proto).build();

        assert_eq!(object.get("sum"), Some(json!(5)));
    }

    #[test]
    fn test_get_method_reads_as_absent() {
        let object = Object::builder(())
            .method("run", |_this, _args| async move { Ok(Value::Null) })
            .build();
        assert_eq!(object.get("run"), None);
    }

    #[test]
    fn test_redefinition_replaces_in_place() {
        let mut members: Members<()> = Members::new();
        members.define("a", Member::value(1));
        members.define("b", Member::value(2));
        members.define("a", Member::value(3));

        let keys: Vec<&str> = members.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(members.len(), 2);
        assert!(matches!(members.get("a"), Some(Member::Value(v)) if *v == json!(3)));
    }
}
