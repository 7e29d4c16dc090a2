//! Persistent channel to the session coordinator
//!
//! A [`Channel`] owns one TCP stream split into a reader task and a writer task.
//! Outbound intents are queued fire-and-forget. Inbound frames are decoded and
//! validated at this boundary, then handed to whichever [`Subscription`] is
//! currently installed. Malformed frames are dropped with a warning so they never
//! reach state derivation. Losing the stream is final: the channel reports
//! `Closed` once and does not reconnect.

use crate::session::ChannelState;
use log::{debug, error, info, warn};
use shared::{
    decode_body, encode_frame, frame_body_len, Intent, Notification, ProtocolError,
    FRAME_HEADER_LEN,
};
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("connection closed by coordinator")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Notification(Notification),
    Closed { reason: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelConfig {
    /// Simulated round-trip latency; half is added on each direction.
    pub fake_ping_ms: u64,
}

type SubscriberSlot = Arc<Mutex<Option<mpsc::UnboundedSender<ChannelEvent>>>>;

/// Receiving end of the channel's inbound events, valid until replaced or dropped.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl Subscription {
    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        self.rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.rx.recv().await
    }

    /// Everything queued so far, in arrival order.
    pub fn drain(&mut self) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct Channel {
    outbound: mpsc::UnboundedSender<Intent>,
    subscriber: SubscriberSlot,
    identity: watch::Receiver<Option<String>>,
    state: watch::Receiver<ChannelState>,
    reader: JoinHandle<()>,
}

impl Channel {
    pub async fn connect(address: &str, config: ChannelConfig) -> Result<Self, ChannelError> {
        info!("Connecting to coordinator at {}", address);
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (identity_tx, identity_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(ChannelState::Open);
        let subscriber: SubscriberSlot = Arc::new(Mutex::new(None));

        let reader = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&subscriber),
            identity_tx,
            state_tx,
            config.fake_ping_ms,
        ));
        // The writer exits on its own once every sender is gone.
        tokio::spawn(write_loop(write_half, outbound_rx, config.fake_ping_ms));

        info!("Channel open");
        Ok(Channel {
            outbound: outbound_tx,
            subscriber,
            identity: identity_rx,
            state: state_rx,
            reader,
        })
    }

    /// Installs a fresh receiver, releasing the previous one.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock_slot(&self.subscriber) = Some(tx);
        Subscription { rx }
    }

    pub fn unsubscribe(&self) {
        lock_slot(&self.subscriber).take();
    }

    pub fn send(&self, intent: Intent) {
        if !self.is_open() {
            warn!("Channel closed; dropping {:?}", intent);
            return;
        }
        if let Err(e) = self.outbound.send(intent) {
            warn!("Writer gone; dropping {:?}", e.0);
        }
    }

    pub fn identity(&self) -> Option<String> {
        self.identity.borrow().clone()
    }

    pub fn state(&self) -> ChannelState {
        self.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow() == ChannelState::Open
    }

    /// Tears the channel down: best-effort `Leave`, then no more inbound events.
    pub fn close(self) {
        info!("Closing channel");
        if self.is_open() {
            let _ = self.outbound.send(Intent::Leave);
        }
        self.unsubscribe();
        // Dropping `self` aborts the reader; the writer exits once the queue drains.
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn lock_slot(
    slot: &SubscriberSlot,
) -> MutexGuard<'_, Option<mpsc::UnboundedSender<ChannelEvent>>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn dispatch(slot: &SubscriberSlot, event: ChannelEvent) {
    let mut guard = lock_slot(slot);
    match guard.as_ref() {
        Some(tx) => {
            if tx.send(event).is_err() {
                debug!("Subscriber dropped; releasing slot");
                guard.take();
            }
        }
        None => debug!("No subscriber; discarding {:?}", event),
    }
}

/// Reads one frame. The outer error is fatal for the stream; the inner one only
/// condemns this frame.
async fn read_frame(
    reader: &mut OwnedReadHalf,
) -> Result<Result<Notification, ProtocolError>, ChannelError> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    if let Err(e) = reader.read_exact(&mut header).await {
        return Err(match e.kind() {
            ErrorKind::UnexpectedEof => ChannelError::Closed,
            _ => ChannelError::Io(e),
        });
    }

    // An oversized length prefix means framing is lost; there is no resync.
    let len = frame_body_len(header)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    Ok(decode_body::<Notification>(&body).and_then(|notification| {
        notification.validate()?;
        Ok(notification)
    }))
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    subscriber: SubscriberSlot,
    identity: watch::Sender<Option<String>>,
    state: watch::Sender<ChannelState>,
    fake_ping_ms: u64,
) {
    let reason = loop {
        match read_frame(&mut reader).await {
            Ok(Ok(notification)) => {
                if fake_ping_ms > 0 {
                    sleep(Duration::from_millis(fake_ping_ms / 2)).await;
                }
                debug!("Received {}", notification.kind());

                match notification {
                    Notification::Disconnected { reason } => break reason,
                    Notification::Connected { identity: ref id } => {
                        info!("Assigned identity {}", id);
                        identity.send_replace(Some(id.clone()));
                    }
                    _ => {}
                }
                dispatch(&subscriber, ChannelEvent::Notification(notification));
            }
            Ok(Err(e)) => warn!("Dropping malformed frame: {}", e),
            Err(e) => break e.to_string(),
        }
    };

    warn!("Channel closed: {}", reason);
    state.send_replace(ChannelState::Closed {
        reason: reason.clone(),
    });
    dispatch(&subscriber, ChannelEvent::Closed { reason });
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Intent>,
    fake_ping_ms: u64,
) {
    while let Some(intent) = outbound.recv().await {
        if fake_ping_ms > 0 {
            sleep(Duration::from_millis(fake_ping_ms / 2)).await;
        }

        let frame = match encode_frame(&intent) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping unencodable intent: {}", e);
                continue;
            }
        };

        if let Err(e) = writer.write_all(&frame).await {
            error!("Error sending intent: {}", e);
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!("Writer stopped");
}
