//! # remobj
//!
//! Minimal remote method invocation for host objects.
//!
//! The host side ([`Remote`]) reduces an object to a [`Snapshot`] of data values
//! and method names, and dispatches [`Call`]s against the live object. The client
//! side ([`RemoteObject`]) rebuilds a stand-in from that snapshot: values are read
//! synchronously, methods are forwarded through a [`Transport`] and awaited.
//!
//! ```ignore
//! let remote = Arc::new(Remote::default());
//! let object = Object::builder(())
//!     .value("foo", "abc")
//!     .value("bar", 123)
//!     .method("pia", |this, _args| async move {
//!         let foo = this.get("foo").unwrap_or_default();
//!         let bar = this.get("bar").unwrap_or_default();
//!         Ok(format!("{}{}", foo.as_str().unwrap_or(""), bar))
//!     })
//!     .shared();
//!
//! let snapshot = remote.serialize(&object);
//! let stand_in = RemoteObject::new(snapshot, Arc::new(LocalTransport::new(remote, object)));
//! assert_eq!(stand_in.call("pia", vec![]).await?, "abc123");
//! ```

pub mod channel;
pub mod local;
pub mod macros;
pub mod message;
pub mod object;
pub mod proxy;
pub mod remote;
pub mod transport;

pub use local::LocalTransport;
pub use message::Call;
pub use message::CallResult;
pub use message::Snapshot;
pub use object::Member;
pub use object::Object;
pub use object::Prototype;
pub use proxy::RemoteCallError;
pub use proxy::RemoteMethod;
pub use proxy::RemoteObject;
pub use remote::Remote;
pub use remote::RemoteOptions;
pub use transport::Transport;
