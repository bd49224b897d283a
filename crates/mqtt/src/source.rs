use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeReasonCode};
use std::time::Duration;
use tempgraph_config::BrokerConfig;
use tempgraph_core::{GraphError, Result};
use tracing::debug;

/// Pending client requests (subscribe / disconnect) the event loop may queue.
const REQUEST_CAPACITY: usize = 10;

/// How long a best-effort disconnect waits for the DISCONNECT to flush.
const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// What the ingestion worker sees of a broker connection.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// The broker accepted a (re)connection.
    Connected,
    /// The broker answered a subscribe request.
    SubscribeAck { granted: bool },
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// Connecting failed or an established connection was lost.
    Dropped(String),
    /// Protocol traffic with no meaning for ingestion (acks, pings).
    Other,
}

/// A publish/subscribe connection that reconnects when polled after a drop.
#[async_trait]
pub trait BrokerSource: Send {
    /// Wait for the next connection event.  Polling after a
    /// [`BrokerEvent::Dropped`] starts a fresh connection attempt.
    async fn next_event(&mut self) -> BrokerEvent;

    /// Request a subscription to `topic`.  Called after every successful
    /// connect.  `Ok` means the request was sent; the broker's answer arrives
    /// later as [`BrokerEvent::SubscribeAck`].
    async fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Unsubscribe and disconnect, best effort.
    async fn disconnect(&mut self, topic: &str);
}

/// [`BrokerSource`] backed by a `rumqttc` client and event loop.
pub struct MqttSource {
    client:    AsyncClient,
    eventloop: EventLoop,
}

impl MqttSource {
    pub fn new(config: &BrokerConfig) -> Self {
        let mut options = MqttOptions::new(
            config.effective_client_id(),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(config.keep_alive());
        // Subscriptions are re-issued on every ConnAck.
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Self { client, eventloop }
    }
}

#[async_trait]
impl BrokerSource for MqttSource {
    async fn next_event(&mut self) -> BrokerEvent {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => BrokerEvent::Connected,
            Ok(Event::Incoming(Packet::SubAck(ack))) => BrokerEvent::SubscribeAck {
                granted: !ack.return_codes.is_empty()
                    && ack
                        .return_codes
                        .iter()
                        .all(|code| matches!(code, SubscribeReasonCode::Success(_))),
            },
            Ok(Event::Incoming(Packet::Publish(publish))) => BrokerEvent::Message {
                topic:   publish.topic,
                payload: publish.payload.to_vec(),
            },
            Ok(Event::Incoming(Packet::Disconnect)) => {
                BrokerEvent::Dropped("broker sent DISCONNECT".into())
            }
            Ok(event) => {
                debug!(?event, "mqtt");
                BrokerEvent::Other
            }
            Err(e) => BrokerEvent::Dropped(e.to_string()),
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        // try_* never blocks: the request queue is drained by `next_event`,
        // which runs on this same task.
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| GraphError::Connection(format!("subscribe '{topic}': {e}")))
    }

    async fn disconnect(&mut self, topic: &str) {
        let _ = self.client.try_unsubscribe(topic);
        let _ = self.client.try_disconnect();

        let flush = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        let _ = tokio::time::timeout(DISCONNECT_GRACE, flush).await;
    }
}
