//! In-memory transport that dispatches straight into a host object.
//!
//! No encoding, no task hops: the call runs on the caller's task. Useful for
//! tests and for wiring a stand-in to an object living in the same process.

use std::sync::Arc;

use crate::message::Call;
use crate::message::CallResult;
use crate::object::Object;
use crate::remote::Remote;
use crate::transport;
use crate::transport::Transport;

/// A transport bound to one host object and its dispatcher.
pub struct LocalTransport<T> {
    remote: Arc<Remote>,
    object: Arc<Object<T>>,
}

impl<T> LocalTransport<T> {
    pub fn new(remote: Arc<Remote>, object: Arc<Object<T>>) -> Self {
        Self { remote, object }
    }
}

impl<T> Clone for LocalTransport<T> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            object: Arc::clone(&self.object),
        }
    }
}

#[async_trait::async_trait]
impl<T> Transport for LocalTransport<T>
where
    T: Send + Sync + 'static,
{
    async fn call(&self, call: Call) -> transport::Result<CallResult> {
        Ok(self.remote.call(&self.object, call).await)
    }
}
