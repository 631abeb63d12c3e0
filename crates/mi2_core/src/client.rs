use std::sync::{Arc, PoisonError};

use serde::Serialize;
use tokio::{
    io::{AsyncRead, AsyncWrite, BufReader},
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    grammar::Value,
    message::{CommandMessage, EventKind, EventMessage, Message, MessageKind},
    stream::{Mi2InputStream, Mi2OutputStream},
    types::{Breakpoint, StopReason},
    Mi2Config, Mi2Error, Result,
};

type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
    /// Constructed, read loop never started.
    Idle,
    Listening,
    /// The read loop was stopped or hit end of input / an error.
    Stopped,
}

/// Notifications published by the read loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Console stream text, in arrival order.
    Log(String),
    Event(EventMessage),
    /// Sent after the matching `Event` for every `stopped` record.
    Stopped {
        reason: StopReason,
        event: EventMessage,
    },
    BreakpointInserted(Breakpoint),
    BreakpointRemoved(u32),
    /// Anything the client has no typed handling for.
    Unhandled { kind: MessageKind, message: Message },
    /// The read loop ended on an error other than cancellation.
    ReadFailed(String),
}

/// Per-subscriber bounded queues. Publishing waits for room in every live
/// queue, so a slow subscriber pauses the read loop instead of missing events.
struct Subscribers {
    senders: std::sync::Mutex<Vec<mpsc::Sender<ClientEvent>>>,
    capacity: usize,
}

impl Subscribers {
    fn new(capacity: usize) -> Self {
        Self {
            senders: std::sync::Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    fn subscribe(&self) -> mpsc::Receiver<ClientEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn live(&self) -> Vec<mpsc::Sender<ClientEvent>> {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| !tx.is_closed());
        senders.clone()
    }

    async fn publish(&self, event: ClientEvent) {
        for tx in self.live() {
            // A receiver dropped mid-send is pruned on the next publish.
            let _ = tx.send(event.clone()).await;
        }
    }
}

struct Shared {
    input: Mutex<Mi2InputStream<BoxedReader>>,
    output: Mutex<Option<Mi2OutputStream<BoxedWriter>>>,
    events: Subscribers,
    state: watch::Sender<ClientState>,
}

struct ReadLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives one MI2 peer over a byte stream.
///
/// Commands are fire-and-forget: [`Mi2Client::exec`] returns once the line is
/// written, and whatever gdb answers arrives through [`Mi2Client::subscribe`].
pub struct Mi2Client {
    shared: Arc<Shared>,
    read_loop: Option<ReadLoop>,
    closed: bool,
    config: Mi2Config,
}

impl Mi2Client {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_config(stream, Mi2Config::default())
    }

    pub fn with_config<S>(stream: S, config: Mi2Config) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(reader, writer, config)
    }

    /// Builds a client over separate halves, e.g. a child's stdout and stdin.
    pub fn from_parts<R, W>(reader: R, writer: W, config: Mi2Config) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);

        let events = Subscribers::new(config.event_capacity);
        let (state, _) = watch::channel(ClientState::Idle);

        let shared = Arc::new(Shared {
            input: Mutex::new(Mi2InputStream::with_config(BufReader::new(reader), &config)),
            output: Mutex::new(Some(Mi2OutputStream::new(writer))),
            events,
            state,
        });

        Self {
            shared,
            read_loop: None,
            closed: false,
            config,
        }
    }

    pub fn config(&self) -> &Mi2Config {
        &self.config
    }

    /// Subscribe before [`start_listening`](Self::start_listening) to see every
    /// message from the start of the session.
    ///
    /// Each subscriber gets every event in order through a queue of
    /// `event_capacity` entries. When a queue is full the read loop waits for it
    /// to drain, so keep receiving or drop the receiver. Dropped receivers are
    /// forgotten.
    pub fn subscribe(&self) -> mpsc::Receiver<ClientEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> ClientState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ClientState> {
        self.shared.state.subscribe()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ClientState::Listening
    }

    /// Spawns the read loop on the current tokio runtime.
    ///
    /// Fails while a loop is running, and also while a previously stopped loop
    /// has not yet observed its cancellation.
    pub fn start_listening(&mut self) -> Result<()> {
        if self.closed {
            return Err(Mi2Error::not_connected("the client has been closed"));
        }
        if self.is_listening() {
            return Err(Mi2Error::AlreadyListening(
                "the read loop is already running".to_string(),
            ));
        }
        if let Some(previous) = &self.read_loop {
            if !previous.handle.is_finished() {
                return Err(Mi2Error::AlreadyListening(
                    "the previous read loop is still shutting down".to_string(),
                ));
            }
        }

        let token = CancellationToken::new();
        self.shared.state.send_replace(ClientState::Listening);
        let handle = tokio::spawn(read_loop(self.shared.clone(), token.clone()));
        self.read_loop = Some(ReadLoop { token, handle });

        tracing::info!("MI2 read loop started");
        Ok(())
    }

    /// Cancels the read loop. The in-flight read ends quietly; no
    /// [`ClientEvent::ReadFailed`] is sent for it.
    pub fn stop_listening(&self) {
        let was_listening = self.shared.state.send_if_modified(|state| {
            let listening = *state == ClientState::Listening;
            if listening {
                *state = ClientState::Stopped;
            }
            listening
        });

        if let Some(read_loop) = &self.read_loop {
            read_loop.token.cancel();
        }

        if was_listening {
            tracing::info!("MI2 read loop stopped");
        }
    }

    /// Waits until the current read loop task has finished.
    pub async fn join_read_loop(&mut self) {
        let Some(read_loop) = self.read_loop.as_mut() else {
            return;
        };
        if read_loop.handle.is_finished() {
            return;
        }
        if let Err(e) = (&mut read_loop.handle).await {
            tracing::warn!("MI2 read loop task failed: {}", e);
        }
    }

    /// Writes `command` (with or without its leading `-`) to the peer.
    pub async fn exec(&self, command: &str) -> Result<()> {
        self.check_ready()?;

        let message = Message::Command(CommandMessage::new(command));
        let mut output = self.shared.output.lock().await;
        let output = output
            .as_mut()
            .ok_or_else(|| Mi2Error::not_connected("not connected to gdb"))?;

        tracing::debug!("Sending MI command: {}", command);
        output.write_message(&message).await
    }

    fn check_ready(&self) -> Result<()> {
        if self.closed {
            return Err(Mi2Error::not_connected("not connected to gdb"));
        }

        let Some(read_loop) = &self.read_loop else {
            return Err(Mi2Error::not_connected(
                "start_listening() must be called first",
            ));
        };

        if read_loop.token.is_cancelled() {
            if read_loop.handle.is_finished() {
                return Err(Mi2Error::not_connected("the read loop has ended"));
            }
            return Err(Mi2Error::Cancelled);
        }

        Ok(())
    }

    /// Stops listening and shuts down the write half. Later `exec` calls fail
    /// with [`Mi2Error::NotConnected`].
    pub async fn close(&mut self) -> Result<()> {
        self.stop_listening();
        self.closed = true;

        let output = self.shared.output.lock().await.take();
        if let Some(mut output) = output {
            output.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Mi2Client {
    fn drop(&mut self) {
        if let Some(read_loop) = &self.read_loop {
            read_loop.token.cancel();
        }
    }
}

async fn read_loop(shared: Arc<Shared>, token: CancellationToken) {
    let mut input = shared.input.lock().await;

    loop {
        let read = tokio::select! {
            biased;
            _ = token.cancelled() => Err(Mi2Error::Cancelled),
            result = input.read_message() => result,
        };

        match read {
            Ok(Some(message)) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = dispatch(&shared.events, message) => {}
                }
                if token.is_cancelled() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("MI2 peer closed the stream");
                break;
            }
            Err(e) if e.is_cancelled() => break,
            Err(e) => {
                tracing::warn!("MI2 read loop terminated: {}", e);
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    _ = shared.events.publish(ClientEvent::ReadFailed(e.to_string())) => {}
                }
                break;
            }
        }
    }

    drop(input);
    token.cancel();
    shared.state.send_if_modified(|state| {
        let listening = *state == ClientState::Listening;
        if listening {
            *state = ClientState::Stopped;
        }
        listening
    });
}

async fn dispatch(events: &Subscribers, message: Message) {
    match message {
        Message::Console(console) => {
            events
                .publish(ClientEvent::Log(console.into_message()))
                .await
        }
        Message::Event(event) => dispatch_event(events, event).await,
        other => {
            let kind = other.kind();
            tracing::debug!("Unhandled {} message", kind);
            events
                .publish(ClientEvent::Unhandled {
                    kind,
                    message: other,
                })
                .await
        }
    }
}

async fn dispatch_event(events: &Subscribers, event: EventMessage) {
    if event.kind() == EventKind::Result && event.name() == "error" {
        tracing::warn!(
            "gdb reported an error: {}",
            event.param_str("msg").unwrap_or("An unknown error occurred")
        );
    }

    let typed = typed_notification(&event);
    events.publish(ClientEvent::Event(event)).await;
    if let Some(typed) = typed {
        events.publish(typed).await;
    }
}

fn typed_notification(event: &EventMessage) -> Option<ClientEvent> {
    match (event.kind(), event.name()) {
        (_, "stopped") => Some(ClientEvent::Stopped {
            reason: StopReason::parse(event.param_str("reason")),
            event: event.clone(),
        }),
        (EventKind::Notify, "breakpoint-created" | "breakpoint-modified")
        | (EventKind::Result, "done") => event
            .param("bkpt")
            .and_then(Value::as_record)
            .map(|bkpt| ClientEvent::BreakpointInserted(Breakpoint::from_record(bkpt))),
        (EventKind::Notify, "breakpoint-deleted") => event
            .param_str("id")
            .and_then(|id| id.parse().ok())
            .map(ClientEvent::BreakpointRemoved),
        _ => None,
    }
}
