use crate::key_token::map_key_event;
use edge_events::LoopEvent;

use crossterm::event::{Event as CEvent, EventStream};
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc::Sender, Notify};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{debug, info, trace, warn};

/// A handle that lets the main loop request the background input task
/// stop reading, without waiting for the next terminal event to arrive.
#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (AsyncInputShutdown { notify: notify.clone() }, ShutdownListener { notify })
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<LoopEvent>,
    stream: S,
    shutdown: ShutdownListener,
}

impl<S> AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<LoopEvent>, stream: S, shutdown: ShutdownListener) -> Self {
        Self { sender, stream, shutdown }
    }

    /// Read the stream until shutdown, channel closure, or stream end,
    /// forwarding every key press/repeat as a `LoopEvent::Key`.
    pub(crate) async fn run(mut self) -> ExitReason {
        loop {
            tokio::select! {
                _ = self.shutdown.wait() => return ExitReason::ShutdownSignal,
                next = self.stream.next() => {
                    match next {
                        None => return ExitReason::StreamEnded,
                        Some(Err(err)) => {
                            warn!(target: "input.thread", ?err, "stream_error");
                            return ExitReason::StreamError;
                        }
                        Some(Ok(event)) => {
                            if !self.handle_event(event).await {
                                return ExitReason::ChannelClosed;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Returns `false` once the receiving half has dropped, so `run` can
    /// stop reading rather than buffer input nobody will consume.
    async fn handle_event(&mut self, event: CEvent) -> bool {
        match event {
            CEvent::Key(key) => match map_key_event(&key) {
                Some(press) => {
                    trace!(target: "input.keypress", repeat = press.repeat, "keypress");
                    self.sender.send(LoopEvent::Key(press.key)).await.is_ok()
                }
                None => true,
            },
            CEvent::Resize(_, _) => true,
            _ => true,
        }
    }
}

/// Spawn the async input service backed by `crossterm::EventStream`,
/// forwarding every translated key press on `sender` as a
/// `LoopEvent::Key`. Returns the task's `JoinHandle` alongside a
/// shutdown handle that requests immediate termination.
pub(crate) fn spawn_async_event_task(
    sender: Sender<LoopEvent>,
) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, listener) = ShutdownListener::new_pair();
    let handle = task::spawn(async move {
        let span = tracing::debug_span!(target: "input.thread", "input_async_task");
        let _enter = span.enter();
        info!(target: "input.thread", "started");

        let stream = EventStream::new();
        let reason = AsyncEventStreamTask::new(sender, stream, listener).run().await;

        debug!(target: "input.thread", reason = reason.as_str(), "stopped");
    });

    (handle, shutdown)
}
