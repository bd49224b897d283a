use crate::payload::parse_reading;
use crate::source::{BrokerEvent, BrokerSource};
use chrono::Local;
use std::time::Duration;
use tempgraph_core::{BoundedSeries, ConnectionState};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Long-lived subscriber that turns broker messages into samples.
///
/// The worker drives a [`BrokerSource`] through
/// `Disconnected → Connecting → Subscribed`, falling back to `Disconnected`
/// (and retrying after `reconnect_delay`) whenever the connection drops.
/// `Subscribed` is entered only once the broker acknowledges the
/// subscription, not when the request is sent.
/// Malformed payloads are logged and skipped; nothing here is fatal.
pub struct IngestionWorker<S> {
    source:          S,
    series:          BoundedSeries,
    topic:           String,
    reconnect_delay: Duration,
    state:           watch::Sender<ConnectionState>,
}

impl<S: BrokerSource> IngestionWorker<S> {
    pub fn new(
        source: S,
        series: BoundedSeries,
        topic: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            source,
            series,
            topic: topic.into(),
            reconnect_delay,
            state,
        }
    }

    /// Receiver that observes every connection state change.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires, then disconnect best-effort.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(topic = %self.topic, "Ingestion worker starting");
        let mut needs_subscribe = false;

        loop {
            if *self.state.borrow() == ConnectionState::Disconnected {
                self.transition(ConnectionState::Connecting);
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.source.next_event() => event,
            };

            match event {
                BrokerEvent::Connected => {
                    info!("Connected to broker");
                    needs_subscribe = true;
                }
                BrokerEvent::SubscribeAck { granted: true } => {
                    info!(topic = %self.topic, "Subscribed");
                    self.transition(ConnectionState::Subscribed);
                }
                BrokerEvent::SubscribeAck { granted: false } => {
                    warn!(
                        topic = %self.topic,
                        "Broker rejected the subscription; retrying in {:?}",
                        self.reconnect_delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                    needs_subscribe = true;
                }
                BrokerEvent::Message { topic, payload } => {
                    self.ingest(&topic, &payload);
                }
                BrokerEvent::Dropped(reason) => {
                    warn!(
                        "Broker connection lost: {reason}; reconnecting in {:?}",
                        self.reconnect_delay
                    );
                    needs_subscribe = false;
                    self.transition(ConnectionState::Disconnected);

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                    continue;
                }
                BrokerEvent::Other => {}
            }

            // Retried after every event until the request is sent.
            if needs_subscribe {
                match self.source.subscribe(&self.topic).await {
                    Ok(()) => {
                        debug!(topic = %self.topic, "Subscription requested");
                        needs_subscribe = false;
                    }
                    Err(e) => warn!("{e}; retrying"),
                }
            }
        }

        self.source.disconnect(&self.topic).await;
        self.transition(ConnectionState::Disconnected);
        info!("Ingestion worker stopped");
    }

    /// Append one payload to the series.  Returns whether it was accepted.
    fn ingest(&self, topic: &str, payload: &[u8]) -> bool {
        match parse_reading(payload) {
            Ok(value) => {
                self.series.append(value, Local::now());
                debug!(topic, value, "Reading");
                true
            }
            Err(e) => {
                warn!(topic, "Discarding message: {e}");
                false
            }
        }
    }

    fn transition(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "Broker connection state");
        }
    }
}
