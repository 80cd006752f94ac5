//! Drives a combination sequence into a client-facing event stream.
//!
//! Every run ends with the `END` sentinel unless the client goes away first.
//! Upstream failures are logged and turned into an immediate `END`.

use std::time::Duration;

use async_trait::async_trait;
use faresweep_core::CoreError;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::generator::Combinations;
use crate::models::TripCombination;

pub const END_SENTINEL: &str = "END";
pub const NO_FLIGHTS_MESSAGE: &str = "No flights found matching your criteria";

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Combination(TripCombination),
    NoFlights,
    End,
}

#[derive(Serialize)]
struct NoticePayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    message: &'a str,
}

impl StreamEvent {
    /// Body of the `data:` line for this event.
    pub fn wire_data(&self) -> Result<String, serde_json::Error> {
        match self {
            StreamEvent::Combination(combination) => serde_json::to_string(&combination.payload()),
            StreamEvent::NoFlights => serde_json::to_string(&NoticePayload {
                kind: "NO_FLIGHTS",
                message: NO_FLIGHTS_MESSAGE,
            }),
            StreamEvent::End => Ok(END_SENTINEL.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StreamWriteError {
    #[error("Client disconnected")]
    Disconnected,
    #[error("Stream already terminated")]
    Terminated,
}

#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, data: String) -> Result<(), StreamWriteError>;

    /// True once the consumer is known to be gone.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Sink backed by a bounded channel; the receiving half feeds the transport.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, data: String) -> Result<(), StreamWriteError> {
        self.tx.send(data).await.map_err(|_| StreamWriteError::Disconnected)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Init,
    Streaming,
    Empty,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    pub state: StreamState,
    pub emitted: usize,
    pub disconnected: bool,
}

pub struct StreamingCoordinator {
    pacing: Duration,
    state: StreamState,
    emitted: usize,
}

impl StreamingCoordinator {
    /// `pacing` is the pause between successive combination events; zero disables it.
    pub fn new(pacing: Duration) -> Self {
        Self {
            pacing,
            state: StreamState::Init,
            emitted: 0,
        }
    }

    pub async fn run<S: EventSink>(
        mut self,
        source: Result<Combinations, CoreError>,
        sink: &mut S,
    ) -> StreamOutcome {
        let combinations = match source {
            Ok(combinations) => combinations,
            Err(e) => {
                error!("Combination source failed: {}", e);
                return self.finish(sink).await;
            }
        };

        for combination in combinations {
            if self.state == StreamState::Streaming && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let event = StreamEvent::Combination(combination);
            let data = match event.wire_data() {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to encode combination event: {}", e);
                    return self.finish(sink).await;
                }
            };

            self.state = StreamState::Streaming;
            if let Err(e) = self.send(sink, data).await {
                return self.abandon(e);
            }
        }

        if self.state == StreamState::Init {
            self.state = StreamState::Empty;
            info!("No combinations matched, sending NO_FLIGHTS");
            let data = match StreamEvent::NoFlights.wire_data() {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to encode NO_FLIGHTS event: {}", e);
                    return self.finish(sink).await;
                }
            };
            if let Err(e) = self.send(sink, data).await {
                return self.abandon(e);
            }
        }

        self.finish(sink).await
    }

    async fn send<S: EventSink>(&mut self, sink: &mut S, data: String) -> Result<(), StreamWriteError> {
        if self.state == StreamState::Terminated {
            return Err(StreamWriteError::Terminated);
        }
        if sink.is_closed() {
            return Err(StreamWriteError::Disconnected);
        }
        sink.emit(data).await?;
        self.emitted += 1;
        Ok(())
    }

    async fn finish<S: EventSink>(mut self, sink: &mut S) -> StreamOutcome {
        let result = self.send(sink, END_SENTINEL.to_string()).await;
        self.state = StreamState::Terminated;
        match result {
            Ok(()) => {
                debug!("Stream terminated after {} events", self.emitted);
                self.outcome(false)
            }
            Err(e) => self.abandon(e),
        }
    }

    fn abandon(mut self, reason: StreamWriteError) -> StreamOutcome {
        debug!("Stopping stream after {} events: {}", self.emitted, reason);
        self.state = StreamState::Terminated;
        self.outcome(true)
    }

    fn outcome(&self, disconnected: bool) -> StreamOutcome {
        StreamOutcome {
            state: self.state,
            emitted: self.emitted,
            disconnected,
        }
    }
}
