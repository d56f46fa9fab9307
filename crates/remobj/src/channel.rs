//! # In-process Channel Transport
//!
//! Connects a stand-in to a host object running on another task through a
//! pair of unbounded channels.
//!
//! The client half tags every call with a sequence number and parks the caller
//! on a oneshot. A pump task reads results and routes each one to the caller
//! with the matching sequence, so any number of calls can be in flight and
//! complete in any order.
//!
//! The host half receives calls and runs each one on its own task. There is
//! no cancellation: a caller that stops waiting does not stop the host task.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;

use crate::message::Call;
use crate::message::CallResult;
use crate::object::Object;
use crate::remote::Remote;
use crate::transport;
use crate::transport::Transport;
use crate::transport::TransportError;

/// A call tagged for correlation.
#[derive(Debug)]
struct Request {
    seq: u64,
    call: Call,
}

/// A result tagged with the sequence of the call it answers.
#[derive(Debug)]
struct Reply {
    seq: u64,
    result: CallResult,
}

/// Creates a connected client transport and host endpoint.
///
/// Must be called from within a Tokio runtime: the client's pump task is
/// spawned immediately. Drive the host with [`ChannelHost::serve`].
pub fn pair<T>(remote: Arc<Remote>, object: Arc<Object<T>>) -> (ChannelTransport, ChannelHost<T>)
where
    T: Send + Sync + 'static,
{
    let (call_tx, call_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();

    let transport = ChannelTransport::new(call_tx, reply_rx);
    let host = ChannelHost {
        rx: call_rx,
        tx: reply_tx,
        remote,
        object,
    };

    (transport, host)
}

/// Client half: implements [`Transport`] over the channel pair.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Request>,
    pending: Arc<DashMap<u64, oneshot::Sender<CallResult>>>,
    seq_gen: AtomicU64,
}

impl ChannelTransport {
    fn new(tx: mpsc::UnboundedSender<Request>, mut rx: mpsc::UnboundedReceiver<Reply>) -> Self {
        let pending: Arc<DashMap<u64, oneshot::Sender<CallResult>>> = Arc::new(DashMap::new());

        let pump_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(Reply { seq, result }) = rx.recv().await {
                match pump_pending.remove(&seq) {
                    Some((_, waiter)) => {
                        // the caller may have stopped waiting
                        let _ = waiter.send(result);
                    }
                    None => debug!(seq, "reply for unknown sequence dropped"),
                }
            }

            // Host is gone; dropping the senders fails every parked caller.
            debug!(pending = pump_pending.len(), "channel closed by host");
            pump_pending.clear();
        });

        Self {
            tx,
            pending,
            seq_gen: AtomicU64::new(1),
        }
    }

    /// Number of calls sent and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn call(&self, call: Call) -> transport::Result<CallResult> {
        let seq = self.seq_gen.fetch_add(1, Ordering::Relaxed);
        let (waiter, rx) = oneshot::channel();
        self.pending.insert(seq, waiter);

        if self.tx.send(Request { seq, call }).is_err() {
            self.pending.remove(&seq);
            return Err(TransportError::ConnectionLost("host endpoint closed".into()));
        }

        rx.await
            .map_err(|_| TransportError::ConnectionLost("host dropped the call".into()))
    }
}

/// Host half: owns the dispatcher and the object the calls run against.
pub struct ChannelHost<T> {
    rx: mpsc::UnboundedReceiver<Request>,
    tx: mpsc::UnboundedSender<Reply>,
    remote: Arc<Remote>,
    object: Arc<Object<T>>,
}

impl<T> ChannelHost<T>
where
    T: Send + Sync + 'static,
{
    /// Serves calls until every client transport is dropped.
    ///
    /// Each call runs on its own task, so a slow method never delays others.
    pub async fn serve(mut self) {
        while let Some(Request { seq, call }) = self.rx.recv().await {
            let remote = Arc::clone(&self.remote);
            let object = Arc::clone(&self.object);
            let tx = self.tx.clone();

            tokio::spawn(async move {
                let result = remote.call(&object, call).await;
                if tx.send(Reply { seq, result }).is_err() {
                    debug!(seq, "client gone before reply");
                }
            });
        }
        debug!("channel closed by client");
    }
}
