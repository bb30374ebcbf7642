use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use seriallink_frame::{LineReader, LineWriter, Message, MessageKind};
use seriallink_transport::LinkTransport;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::registry::{ListenerId, ListenerRegistry};
use crate::supervisor::TaskSupervisor;
use crate::tasks::{reader_loop, writer_loop};

/// A request/response multiplexer over one byte stream at a time.
///
/// All methods take `&self`; share the link between tasks with an [`Arc`].
#[derive(Debug)]
pub struct Link {
    config: LinkConfig,
    outgoing: mpsc::Sender<Message>,
    outgoing_rx: Arc<Mutex<mpsc::Receiver<Message>>>,
    registry: Arc<ListenerRegistry>,
    counter: AtomicU32,
    shutdown: CancellationToken,
}

impl Link {
    /// Create an idle link with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LinkConfig::default())
    }

    pub fn with_config(config: LinkConfig) -> Self {
        let (outgoing, outgoing_rx) = mpsc::channel(config.writer_capacity);
        Self {
            registry: Arc::new(ListenerRegistry::with_capacity(config.listener_capacity)),
            outgoing,
            outgoing_rx: Arc::new(Mutex::new(outgoing_rx)),
            counter: AtomicU32::new(0),
            shutdown: CancellationToken::new(),
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Run the writer and reader tasks on `transport` until both end.
    ///
    /// Returns the first fatal task error. The reader reaching end of stream
    /// does not stop the writer; call [`shutdown`](Self::shutdown) to end a
    /// link whose peer went away.
    pub async fn serve<T: LinkTransport>(&self, transport: T) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(LinkError::Shutdown);
        }
        let mut outgoing = self
            .outgoing_rx
            .clone()
            .try_lock_owned()
            .map_err(|_| LinkError::AlreadyServing)?;

        let (read, write) = transport.into_split();
        let frame_config = self.config.frame_config();
        let reader = LineReader::with_config(read, &frame_config);
        let writer = LineWriter::with_config(write, &frame_config);

        let mut supervisor = TaskSupervisor::new(self.shutdown.child_token());
        supervisor.run_with_cancel("link.writer", |token| async move {
            writer_loop(writer, &mut outgoing, token).await
        });
        let registry = self.registry.clone();
        supervisor.run_with_cancel("link.reader", |token| reader_loop(reader, registry, token));

        tracing::info!("link serving");
        let result = supervisor.wait().await;
        tracing::info!(ok = result.is_ok(), "link stopped");
        result
    }

    /// Stop the running tasks and fail pending requests with
    /// [`LinkError::Shutdown`]. Does not wait and does not close the
    /// transport. A link that has been shut down cannot serve again.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Enqueue a message for the writer as is.
    ///
    /// Never blocks: fails with [`LinkError::QueueFull`] when the outgoing
    /// queue is saturated.
    pub fn write(&self, message: Message) -> Result<()> {
        self.outgoing.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => LinkError::QueueFull {
                capacity: self.config.writer_capacity,
            },
            // Unreachable while `self` owns the receiver.
            mpsc::error::TrySendError::Closed(_) => LinkError::Shutdown,
        })
    }

    /// Send a notification.
    pub fn notify(&self, message: impl Into<Message>) -> Result<()> {
        let mut message = message.into();
        message.kind = MessageKind::Notification;
        message.id = 0;
        self.write(message)
    }

    /// Answer `request` with `message`.
    pub fn reply(&self, request: &Message, message: impl Into<Message>) -> Result<()> {
        if !request.is_request() {
            return Err(LinkError::NotARequest(request.kind));
        }
        let mut message = message.into();
        message.kind = MessageKind::Response;
        message.id = request.id;
        self.write(message)
    }

    /// Send a request and wait for the response carrying its identifier.
    ///
    /// Incoming traffic that is not the matching response is ignored. Fails
    /// with [`LinkError::Timeout`] once `request_timeout` elapses.
    pub async fn request(&self, message: impl Into<Message>) -> Result<Message> {
        let mut listener = ListenerGuard::register(&self.registry);

        let mut message = message.into();
        message.kind = MessageKind::Request;
        message.id = self.next_id();
        let id = message.id;

        let timeout = self.config.request_timeout;
        let deadline = Instant::now() + timeout;
        self.write(message)?;
        tracing::debug!(id, "request sent");

        let wait = async {
            while let Some(incoming) = listener.rx.recv().await {
                if incoming.answers(id) {
                    return Ok(incoming);
                }
            }
            Err(LinkError::ListenerClosed)
        };

        tokio::select! {
            _ = self.shutdown.cancelled() => Err(LinkError::Shutdown),
            result = tokio::time::timeout_at(deadline, wait) => match result {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(id, ?timeout, "request timed out");
                    Err(LinkError::Timeout(timeout))
                }
            },
        }
    }

    /// Subscribe to every incoming message.
    ///
    /// The caller must drain the receiver; a full queue misses messages.
    pub fn register(&self) -> (ListenerId, mpsc::Receiver<Message>) {
        self.registry.register()
    }

    pub fn unregister(&self, id: &ListenerId) {
        self.registry.unregister(id);
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Next correlation identifier. Starts at 1 and wraps at `u32::MAX`.
    fn next_id(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

/// A transient listener removed from the registry when dropped.
struct ListenerGuard<'a> {
    registry: &'a ListenerRegistry,
    id: ListenerId,
    rx: mpsc::Receiver<Message>,
}

impl<'a> ListenerGuard<'a> {
    fn register(registry: &'a ListenerRegistry) -> Self {
        let (id, rx) = registry.register();
        Self { registry, id, rx }
    }
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}
