// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT adapter.
//!
//! Subscription-based: a background task feeds broker publishes into a
//! bounded queue; `read_points` drains that queue instead of performing
//! a network round trip. Queue overflow rejects the newest message and
//! counts the drop.

use crate::{Adapter, AdapterError};
use acqd_core::{Clock, Device, Point, Quality, Reading, SystemClock, Value};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default inbound queue capacity.
const DEFAULT_QUEUE_CAPACITY: usize = 1000;
/// Default idle window before `read_points` returns.
const DEFAULT_DRAIN_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct InboundMessage {
    topic: String,
    payload: Vec<u8>,
    timestamp_ns: i64,
}

/// Map one drained message onto the requested points.
///
/// JSON object payloads yield one reading per point whose code matches
/// a key (booleans normalize to real booleans here, at the adapter
/// boundary). A scalar or non-JSON payload maps to the single requested
/// point, and is dropped when the request is ambiguous.
pub(crate) fn parse_payload(
    points: &[Point],
    topic: &str,
    payload: &[u8],
    timestamp_ns: i64,
) -> Vec<Reading> {
    let mut readings = Vec::new();

    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(map)) => {
            for point in points {
                if let Some(value) = map.get(&point.code) {
                    readings.push(Reading::good(
                        &point.code,
                        Value::from_json(value.clone()),
                        timestamp_ns,
                    ));
                }
            }
        }
        Ok(scalar) => {
            if let [point] = points {
                readings.push(Reading::good(
                    &point.code,
                    Value::from_json(scalar),
                    timestamp_ns,
                ));
            } else {
                tracing::debug!(topic, "scalar payload with {} points requested", points.len());
            }
        }
        Err(_) => {
            if let [point] = points {
                readings.push(Reading {
                    code: point.code.clone(),
                    value: Some(Value::Str(String::from_utf8_lossy(payload).into_owned())),
                    timestamp_ns,
                    quality: Quality::Good,
                    error: None,
                });
            } else {
                tracing::debug!(topic, "non-json payload with {} points requested", points.len());
            }
        }
    }
    readings
}

/// MQTT driver for one broker-mediated device.
#[derive(Debug)]
pub struct MqttAdapter {
    host: String,
    port: u16,
    client_id: String,
    topics: Vec<String>,
    qos: QoS,
    credentials: Option<(String, String)>,
    queue_capacity: usize,
    drain_window: Duration,
    client: Option<AsyncClient>,
    inbound: Option<mpsc::Receiver<InboundMessage>>,
    event_loop: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl MqttAdapter {
    pub fn new(device: &Device, _timeout: Duration) -> Self {
        let topics = match device.metadata.get("mqtt_topics") {
            Some(serde_json::Value::String(topic)) => vec![topic.clone()],
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let qos = match device.metadata.get("mqtt_qos").and_then(|v| v.as_u64()) {
            Some(0) => QoS::AtMostOnce,
            Some(2) => QoS::ExactlyOnce,
            _ => QoS::AtLeastOnce,
        };
        let credentials = match (device.meta_str("mqtt_username"), device.meta_str("mqtt_password"))
        {
            (Some(user), Some(pass)) => Some((user.to_string(), pass.to_string())),
            _ => None,
        };
        let queue_capacity = device
            .metadata
            .get("mqtt_queue_capacity")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
            .max(1);
        let drain_window = device
            .metadata
            .get("mqtt_drain_window_s")
            .and_then(|v| v.as_f64())
            .map(Duration::from_secs_f64)
            .unwrap_or(DEFAULT_DRAIN_WINDOW);

        Self {
            host: device.host.clone(),
            port: device.port,
            client_id: format!("acqd-{}", device.code),
            topics,
            qos,
            credentials,
            queue_capacity,
            drain_window,
            client: None,
            inbound: None,
            event_loop: None,
            connected: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total messages rejected on queue overflow.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Adapter for MqttAdapter {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        if self.client.is_some() {
            return Ok(());
        }
        if self.topics.is_empty() {
            return Err(AdapterError::Config(
                "mqtt device has no mqtt_topics configured".into(),
            ));
        }

        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(60));
        if let Some((user, pass)) = &self.credentials {
            options.set_credentials(user.clone(), pass.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, 10);
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let connected = Arc::clone(&self.connected);
        let dropped = Arc::clone(&self.dropped);
        let handle = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        connected.store(true, Ordering::Relaxed);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = InboundMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                            timestamp_ns: SystemClock.now_ns(),
                        };
                        if tx.try_send(message).is_err() {
                            // Receiver full or gone; full queues reject
                            // the newest message.
                            if tx.is_closed() {
                                break;
                            }
                            dropped.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(topic = %publish.topic, "mqtt queue full, dropping message");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        connected.store(false, Ordering::Relaxed);
                        if tx.is_closed() {
                            break;
                        }
                        tracing::warn!(error = %e, "mqtt event loop error, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Subscriptions queue through the running event loop.
        for topic in &self.topics {
            if let Err(e) = client.subscribe(topic.clone(), self.qos).await {
                handle.abort();
                return Err(AdapterError::Connection(format!(
                    "subscribe {}: {}",
                    topic, e
                )));
            }
            tracing::info!(topic, "mqtt subscribed");
        }

        self.client = Some(client);
        self.inbound = Some(rx);
        self.event_loop = Some(handle);
        self.connected.store(true, Ordering::Relaxed);
        tracing::info!(host = %self.host, port = self.port, "mqtt connected");
        Ok(())
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        if self.client.is_none() {
            self.connect()
                .await
                .map_err(|e| AdapterError::Read(format!("not connected: {}", e)))?;
        }
        let inbound = self
            .inbound
            .as_mut()
            .ok_or_else(|| AdapterError::Read("inbound queue missing".into()))?;

        let mut readings = Vec::new();
        // Bounded drain: stop once the queue has been idle for the
        // window, or after one full queue's worth of messages.
        for _ in 0..self.queue_capacity {
            match tokio::time::timeout(self.drain_window, inbound.recv()).await {
                Ok(Some(message)) => {
                    readings.extend(parse_payload(
                        points,
                        &message.topic,
                        &message.payload,
                        message.timestamp_ns,
                    ));
                }
                Ok(None) => {
                    return Err(AdapterError::Read("mqtt event loop stopped".into()));
                }
                Err(_) => break,
            }
        }
        Ok(readings)
    }

    async fn health(&mut self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Relaxed)
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            let _ = client.disconnect().await;
        }
        // Dropping the receiver lets the event-loop task observe the
        // closed channel and exit.
        self.inbound = None;
        if let Some(handle) = self.event_loop.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
        tracing::info!(host = %self.host, port = self.port, "mqtt disconnected");
    }
}

#[cfg(test)]
#[path = "mqtt_tests.rs"]
mod tests;
