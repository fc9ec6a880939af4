//! Fragment relay: forwards an upstream fragment stream to a client byte
//! channel, one write per non-empty fragment, in arrival order.
//!
//! A session moves `Idle -> Streaming -> {Completed, Aborted}`. Both
//! terminal states release the upstream and close the outgoing channel
//! exactly once. A failed write, or the client hanging up while the relay
//! waits on the upstream, is treated as a disconnect: the upstream is not
//! polled again.
//!
//! By default nothing but fragment bytes reaches the client, so a client
//! cannot tell a finished answer from an aborted one. Enabling
//! [`RelayOptions::terminator`] appends an explicit end marker.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use neetprep_core::{Error, Result};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::types::Fragment;

/// Marker written before closing a stream that ended cleanly.
pub const COMPLETE_MARKER: &str = "\n[[END:complete]]";
/// Marker written before closing a stream cut short by an upstream failure.
pub const ABORTED_MARKER: &str = "\n[[END:aborted]]";

/// Outgoing byte channel to the client.
#[async_trait]
pub trait ByteSink: Send + Sync {
    /// Resolves once the receiver has accepted `bytes`.
    async fn write(&mut self, bytes: Bytes) -> Result<()>;

    /// Resolves once the receiver has gone away. Sinks that cannot observe
    /// this never resolve.
    async fn closed(&self) {
        futures::future::pending::<()>().await
    }

    /// Close the channel. Closing twice is a no-op.
    fn close(&mut self);
}

/// Item type of the response body fed by a [`ChannelSink`].
pub type BodyChunk = std::result::Result<Bytes, Infallible>;

/// [`ByteSink`] backed by a capacity-one channel; the receiving half is the
/// HTTP response body. A write waits until the body has taken the previous
/// chunk.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<BodyChunk>>,
}

impl ChannelSink {
    pub fn channel() -> (Self, ReceiverStream<BodyChunk>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx: Some(tx) }, ReceiverStream::new(rx))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[async_trait]
impl ByteSink for ChannelSink {
    async fn write(&mut self, bytes: Bytes) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::OutgoingWrite("channel already closed".into()))?;
        tx.send(Ok(bytes))
            .await
            .map_err(|_| Error::OutgoingWrite("client disconnected".into()))
    }

    async fn closed(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }

    fn close(&mut self) {
        self.tx.take();
    }
}

/// Relay behaviour knobs.
#[derive(Debug, Clone, Default)]
pub struct RelayOptions {
    /// Abort when no fragment arrives within this window.
    pub idle_timeout: Option<Duration>,
    /// Write [`COMPLETE_MARKER`] or [`ABORTED_MARKER`] before closing.
    pub terminator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    Aborted,
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayState::Idle => write!(f, "idle"),
            RelayState::Streaming => write!(f, "streaming"),
            RelayState::Completed => write!(f, "completed"),
            RelayState::Aborted => write!(f, "aborted"),
        }
    }
}

/// What a finished session did.
#[derive(Debug)]
pub struct RelayOutcome {
    pub state: RelayState,
    /// Fragment writes that the client accepted.
    pub writes: usize,
    pub bytes: usize,
    /// Empty fragments dropped without a write.
    pub skipped: usize,
    /// Why the session aborted, if it did.
    pub error: Option<Error>,
    pub duration: Duration,
}

/// One relay per request; owns the outgoing channel for its lifetime.
pub struct RelaySession<K: ByteSink> {
    sink: K,
    state: RelayState,
    closed: bool,
    options: RelayOptions,
}

impl<K: ByteSink> RelaySession<K> {
    pub fn new(sink: K, options: RelayOptions) -> Self {
        Self {
            sink,
            state: RelayState::Idle,
            closed: false,
            options,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Pump `upstream` into the sink until it ends, fails, or the sink
    /// refuses a write. The upstream is dropped before the sink is closed.
    pub async fn run<S>(&mut self, mut upstream: S) -> RelayOutcome
    where
        S: Stream<Item = Result<Fragment>> + Unpin + Send,
    {
        let start = Instant::now();
        let mut outcome = RelayOutcome {
            state: self.state,
            writes: 0,
            bytes: 0,
            skipped: 0,
            error: None,
            duration: Duration::ZERO,
        };

        if self.state != RelayState::Idle {
            outcome.error = Some(Error::Internal(format!(
                "relay session already {}",
                self.state
            )));
            return outcome;
        }
        self.state = RelayState::Streaming;

        let idle_timeout = self.options.idle_timeout;
        let failure = loop {
            let pull = async {
                match idle_timeout {
                    Some(limit) => tokio::time::timeout(limit, upstream.next())
                        .await
                        .map_err(|_| Error::IdleTimeout(limit)),
                    None => Ok(upstream.next().await),
                }
            };

            // A disconnect must not wait for the next fragment to surface.
            let next = tokio::select! {
                biased;
                _ = self.sink.closed() => {
                    break Some(Error::OutgoingWrite("client disconnected".into()));
                }
                pulled = pull => match pulled {
                    Ok(item) => item,
                    Err(e) => break Some(e),
                },
            };

            match next {
                None => break None,
                Some(Err(e)) => break Some(e),
                Some(Ok(fragment)) if fragment.is_empty() => outcome.skipped += 1,
                Some(Ok(fragment)) => {
                    let len = fragment.as_str().len();
                    if let Err(e) = self.sink.write(fragment.into_bytes()).await {
                        break Some(e);
                    }
                    outcome.writes += 1;
                    outcome.bytes += len;
                }
            }
        };
        drop(upstream);

        self.state = if failure.is_none() {
            RelayState::Completed
        } else {
            RelayState::Aborted
        };

        let client_gone = matches!(failure, Some(Error::OutgoingWrite(_)));
        if self.options.terminator && !client_gone {
            let marker = if failure.is_none() {
                COMPLETE_MARKER
            } else {
                ABORTED_MARKER
            };
            if let Err(e) = self.sink.write(Bytes::from_static(marker.as_bytes())).await {
                debug!("End marker not delivered: {}", e);
            }
        }
        self.close();

        outcome.state = self.state;
        outcome.duration = start.elapsed();
        match &failure {
            None => info!(
                "Relay completed: {} writes, {} bytes in {:?}",
                outcome.writes, outcome.bytes, outcome.duration
            ),
            Some(Error::OutgoingWrite(e)) => debug!(
                "Relay cancelled after {} writes: {}",
                outcome.writes, e
            ),
            Some(e) => warn!("Relay aborted after {} writes: {}", outcome.writes, e),
        }
        outcome.error = failure;
        outcome
    }

    /// Close the outgoing channel; later calls do nothing.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.close();
        }
    }
}
